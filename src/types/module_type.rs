// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device categories known to the gateway.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

use super::Channel;

/// Module variant implementing the codec of a device category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleKind {
    /// Eight relay outputs.
    Relay,
    /// Eight push-button or contact inputs.
    Input,
    /// Eight dimmer outputs.
    Dimmer,
    /// Thermostat with regulation mode.
    Temperature,
    /// System variable.
    Variable,
}

/// Device category, as carried in the first three characters of a frame.
///
/// # Examples
///
/// ```
/// use domintell_lib::types::{ModuleKind, ModuleType};
///
/// let module_type: ModuleType = "BIR".parse().unwrap();
/// assert_eq!(module_type.kind(), ModuleKind::Relay);
/// assert_eq!(module_type.channel_prefix(), Some("output"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModuleType {
    /// Bipolar relay module.
    Bir,
    /// Mono-polar relay module.
    Dmr,
    /// Bipolar relay module for shutters.
    Trp,
    /// Dimmer module.
    Dim,
    /// 0-10V dimmer module.
    D10,
    /// Push button with thermostat.
    Tsb,
    /// Temperature sensor.
    Te1,
    /// Temperature sensor with regulation.
    Te2,
    /// LCD thermostat.
    Lc3,
    /// Push button with LCD thermostat.
    Pbl,
    /// Four channel input module.
    Is4,
    /// Eight channel input module.
    Is8,
    /// System variable.
    Var,
}

impl ModuleType {
    /// Every known module type.
    pub const ALL: [Self; 13] = [
        Self::Bir,
        Self::Dmr,
        Self::Trp,
        Self::Dim,
        Self::D10,
        Self::Tsb,
        Self::Te1,
        Self::Te2,
        Self::Lc3,
        Self::Pbl,
        Self::Is4,
        Self::Is8,
        Self::Var,
    ];

    /// Returns the three character wire token.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bir => "BIR",
            Self::Dmr => "DMR",
            Self::Trp => "TRP",
            Self::Dim => "DIM",
            Self::D10 => "D10",
            Self::Tsb => "TSB",
            Self::Te1 => "TE1",
            Self::Te2 => "TE2",
            Self::Lc3 => "LC3",
            Self::Pbl => "PBL",
            Self::Is4 => "IS4",
            Self::Is8 => "IS8",
            Self::Var => "VAR",
        }
    }

    /// Returns the module variant handling this category.
    #[must_use]
    pub const fn kind(&self) -> ModuleKind {
        match self {
            Self::Bir | Self::Dmr | Self::Trp => ModuleKind::Relay,
            Self::Dim | Self::D10 => ModuleKind::Dimmer,
            Self::Tsb | Self::Te1 | Self::Te2 | Self::Lc3 | Self::Pbl => ModuleKind::Temperature,
            Self::Is4 | Self::Is8 => ModuleKind::Input,
            Self::Var => ModuleKind::Variable,
        }
    }

    /// Returns the channel name prefix used by hosts for IO modules.
    #[must_use]
    pub const fn channel_prefix(&self) -> Option<&'static str> {
        match self {
            Self::Bir | Self::Dmr => Some("output"),
            Self::Is4 | Self::Is8 => Some("contact"),
            _ => None,
        }
    }

    /// Returns the host channel name for an IO channel, e.g. `output-3`.
    #[must_use]
    pub fn channel_name(&self, channel: Channel) -> Option<String> {
        self.channel_prefix()
            .map(|prefix| format!("{prefix}-{}", channel.value()))
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleType {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|module_type| module_type.as_str() == s)
            .ok_or_else(|| ValueError::UnknownModuleType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_token() {
        for module_type in ModuleType::ALL {
            assert_eq!(module_type.as_str().parse::<ModuleType>(), Ok(module_type));
        }
    }

    #[test]
    fn rejects_unknown_and_lowercase_tokens() {
        assert!("XYZ".parse::<ModuleType>().is_err());
        assert!("bir".parse::<ModuleType>().is_err());
    }

    #[test]
    fn maps_to_variants() {
        assert_eq!(ModuleType::Trp.kind(), ModuleKind::Relay);
        assert_eq!(ModuleType::D10.kind(), ModuleKind::Dimmer);
        assert_eq!(ModuleType::Pbl.kind(), ModuleKind::Temperature);
        assert_eq!(ModuleType::Lc3.kind(), ModuleKind::Temperature);
        assert_eq!(ModuleType::Is4.kind(), ModuleKind::Input);
        assert_eq!(ModuleType::Var.kind(), ModuleKind::Variable);
    }

    #[test]
    fn only_io_types_have_prefixes() {
        assert_eq!(ModuleType::Dmr.channel_prefix(), Some("output"));
        assert_eq!(ModuleType::Is8.channel_prefix(), Some("contact"));
        assert_eq!(ModuleType::Trp.channel_prefix(), None);
        assert_eq!(ModuleType::Te1.channel_prefix(), None);
    }

    #[test]
    fn builds_channel_names() {
        let channel = Channel::new(3).unwrap();
        assert_eq!(
            ModuleType::Bir.channel_name(channel).as_deref(),
            Some("output-3")
        );
        assert_eq!(ModuleType::Var.channel_name(channel), None);
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thermostat regulation modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Regulation mode of a temperature module.
///
/// Status frames carry the mode by name while the set-mode command takes the
/// numeric code.
///
/// # Examples
///
/// ```
/// use domintell_lib::types::RegulationMode;
///
/// assert_eq!(RegulationMode::by_value(5).unwrap(), RegulationMode::Comfort);
/// assert!(RegulationMode::by_value(9).is_err());
/// assert_eq!("AUTO".parse::<RegulationMode>().unwrap().value(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegulationMode {
    /// Reduced set-point while nobody is home.
    Absence,
    /// Follows the programmed profile.
    Auto,
    /// Comfort set-point.
    Comfort,
    /// Frost protection.
    Frost,
}

impl RegulationMode {
    /// Returns the numeric code used by the set-mode command.
    #[must_use]
    pub const fn value(&self) -> u8 {
        match self {
            Self::Absence => 1,
            Self::Auto => 2,
            Self::Comfort => 5,
            Self::Frost => 6,
        }
    }

    /// Looks a mode up by its numeric code.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidRegulationMode` for undefined codes.
    pub const fn by_value(value: u8) -> Result<Self, ValueError> {
        match value {
            1 => Ok(Self::Absence),
            2 => Ok(Self::Auto),
            5 => Ok(Self::Comfort),
            6 => Ok(Self::Frost),
            other => Err(ValueError::InvalidRegulationMode(other)),
        }
    }

    /// Returns the name used in status frames.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Absence => "ABSENCE",
            Self::Auto => "AUTO",
            Self::Comfort => "COMFORT",
            Self::Frost => "FROST",
        }
    }
}

impl fmt::Display for RegulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegulationMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ABSENCE" => Ok(Self::Absence),
            "AUTO" => Ok(Self::Auto),
            "COMFORT" => Ok(Self::Comfort),
            "FROST" => Ok(Self::Frost),
            _ => Err(ValueError::InvalidRegulationModeName(s.to_string())),
        }
    }
}

impl TryFrom<u8> for RegulationMode {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::by_value(value)
    }
}

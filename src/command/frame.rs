// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Module command frames.

use std::fmt;

use crate::types::{Channel, ModuleAddress, ModuleType, RegulationMode};

use super::{SetPoint, WireCommand};

/// Operator suffix of a module command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    /// `%I`: switch on.
    On,
    /// `%O`: switch off.
    Off,
    /// `%S`: query status.
    Query,
    /// `%D<level>`: set dimmer level.
    Dim(u8),
    /// `%P<phase>`: push phase 1 to 4.
    Push(u8),
    /// `%T<temp>`: set thermostat set-point.
    SetPoint(SetPoint),
    /// `%M<code>`: set regulation mode.
    Mode(RegulationMode),
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("%I"),
            Self::Off => f.write_str("%O"),
            Self::Query => f.write_str("%S"),
            Self::Dim(level) => write!(f, "%D{level}"),
            Self::Push(phase) => write!(f, "%P{phase}"),
            Self::SetPoint(value) => write!(f, "%T{value}"),
            Self::Mode(mode) => write!(f, "%M{}", mode.value()),
        }
    }
}

/// Builder for a single module command frame.
///
/// A frame without an operator is a toggle.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandFrame {
    module_type: ModuleType,
    address: ModuleAddress,
    channel: Option<Channel>,
    op: Option<Op>,
}

impl CommandFrame {
    /// Starts a frame addressing a module.
    #[must_use]
    pub const fn new(module_type: ModuleType, address: ModuleAddress) -> Self {
        Self {
            module_type,
            address,
            channel: None,
            op: None,
        }
    }

    /// Addresses a single channel of the module.
    #[must_use]
    pub const fn channel(mut self, channel: Channel) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Addresses a channel if one is given.
    #[must_use]
    pub const fn maybe_channel(mut self, channel: Option<Channel>) -> Self {
        self.channel = channel;
        self
    }

    /// Sets the operator.
    #[must_use]
    pub const fn op(mut self, op: Op) -> Self {
        self.op = Some(op);
        self
    }
}

impl WireCommand for CommandFrame {
    fn to_wire(&self) -> String {
        let mut frame = format!("{}{}", self.module_type, self.address.wire());
        if let Some(channel) = self.channel {
            frame.push('-');
            frame.push_str(&channel.to_string());
        }
        if let Some(op) = self.op {
            frame.push_str(&op.to_string());
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ModuleAddress {
        ModuleAddress::from_hex("01A2B3").unwrap()
    }

    fn channel(index: u8) -> Channel {
        Channel::new(index).unwrap()
    }

    #[test]
    fn relay_frames() {
        let base = CommandFrame::new(ModuleType::Bir, address()).channel(channel(1));
        assert_eq!(base.clone().op(Op::On).to_wire(), "BIR 1A2B3-1%I");
        assert_eq!(base.clone().op(Op::Off).to_wire(), "BIR 1A2B3-1%O");
        assert_eq!(base.clone().op(Op::Query).to_wire(), "BIR 1A2B3-1%S");
        assert_eq!(base.to_wire(), "BIR 1A2B3-1");
    }

    #[test]
    fn dimmer_level_frame() {
        let frame = CommandFrame::new(ModuleType::Dim, address())
            .channel(channel(4))
            .op(Op::Dim(75));
        assert_eq!(frame.to_wire(), "DIM 1A2B3-4%D75");
    }

    #[test]
    fn push_phase_frames() {
        let frame = CommandFrame::new(ModuleType::Is8, address())
            .channel(channel(8))
            .op(Op::Push(3));
        assert_eq!(frame.to_wire(), "IS8 1A2B3-8%P3");
    }

    #[test]
    fn thermostat_frames_have_no_channel() {
        let set_point = CommandFrame::new(ModuleType::Te1, address())
            .op(Op::SetPoint(SetPoint::new(18.0).unwrap()));
        assert_eq!(set_point.to_wire(), "TE1 1A2B3%T18.0");
        let mode =
            CommandFrame::new(ModuleType::Te1, address()).op(Op::Mode(RegulationMode::Comfort));
        assert_eq!(mode.to_wire(), "TE1 1A2B3%M5");
    }

    #[test]
    fn bare_variable_toggle() {
        let frame = CommandFrame::new(ModuleType::Var, ModuleAddress::new(0x2A).unwrap());
        assert_eq!(frame.to_wire(), "VAR    2A");
    }
}

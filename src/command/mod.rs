// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command definitions and their wire encoding.
//!
//! The gateway speaks a compact text protocol. Module commands address a
//! module by type and address, optionally a channel, and end with an
//! operator code:
//!
//! ```text
//! <type><address>[-<channel>]%<op>[<arg>]
//! <type><address>[-<channel>]            (toggle)
//! ```
//!
//! | Operator | Meaning |
//! |----------|---------|
//! | `I` | Switch on |
//! | `O` | Switch off |
//! | `S` | Query status |
//! | `D<level>` | Set dimmer level |
//! | `P1`..`P4` | Push phases (short push start/end, long push start/end) |
//! | `T<temp>` | Set thermostat set-point |
//! | `M<mode>` | Set regulation mode |
//!
//! Session control uses bare tokens, see [`ControlCommand`].
//!
//! # Examples
//!
//! ```
//! use domintell_lib::command::{CommandFrame, Op, WireCommand};
//! use domintell_lib::types::{Channel, ModuleAddress, ModuleType};
//!
//! let address = ModuleAddress::from_hex("1A").unwrap();
//! let frame = CommandFrame::new(ModuleType::Bir, address)
//!     .channel(Channel::new(2).unwrap())
//!     .op(Op::On);
//! assert_eq!(frame.to_wire(), "BIR    1A-2%I");
//! ```

mod control;
mod frame;
mod set_point;

use std::fmt;

pub use control::ControlCommand;
pub use frame::{CommandFrame, Op};
pub use set_point::{SetPoint, format_set_point};

use crate::types::RegulationMode;

/// Anything that can be written to the gateway as a single datagram.
pub trait WireCommand {
    /// Returns the frame text.
    fn to_wire(&self) -> String;
}

impl WireCommand for String {
    fn to_wire(&self) -> String {
        self.clone()
    }
}

impl WireCommand for &str {
    fn to_wire(&self) -> String {
        (*self).to_string()
    }
}

/// A command a host asks a module to execute.
///
/// Which commands a module accepts depends on its variant; see
/// [`Module::execute`](crate::module::Module::execute).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Switch a channel on.
    On,
    /// Switch a channel off.
    Off,
    /// Toggle a channel, or a variable.
    Toggle,
    /// Ask the module to report its status.
    Refresh,
    /// Simulate a short push on an input.
    ShortPush,
    /// Simulate a long push on an input.
    LongPush,
    /// Set a dimmer channel level (0-100).
    SetLevel(u8),
    /// Set the thermostat set-point in degrees Celsius.
    SetPoint(f32),
    /// Set the thermostat regulation mode.
    SetMode(RegulationMode),
}

impl Command {
    /// Returns the command name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::Toggle => "TOGGLE",
            Self::Refresh => "REFRESH",
            Self::ShortPush => "SHORT_PUSH",
            Self::LongPush => "LONG_PUSH",
            Self::SetLevel(_) => "SET_LEVEL",
            Self::SetPoint(_) => "SET_POINT",
            Self::SetMode(_) => "SET_MODE",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

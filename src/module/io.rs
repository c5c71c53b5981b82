// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay and input modules.
//!
//! Both report eight channels as one status byte in hex (`I01`: channel 1
//! active). Relays accept switching commands, inputs accept simulated
//! pushes.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::command::{Command, CommandFrame, Op};
use crate::error::{CommandError, ParseError};
use crate::types::{Channel, InverterMask, ModuleAddress, ModuleType};

use super::{ModuleInfo, payload_body};

/// Effective state of the eight channels of a relay or input module.
///
/// # Examples
///
/// ```
/// use domintell_lib::module::IoState;
/// use domintell_lib::types::Channel;
///
/// let state = IoState::new(0x01);
/// assert!(state.is_active(Channel::new(1).unwrap()));
/// assert!(!state.is_active(Channel::new(2).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IoState(u8);

impl IoState {
    /// Creates a state from a channel mask, bit `n - 1` being channel `n`.
    #[must_use]
    pub const fn new(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns the channel mask.
    #[must_use]
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Returns true if the channel is active.
    #[must_use]
    pub const fn is_active(&self, channel: Channel) -> bool {
        self.0 & channel.bit() != 0
    }

    /// Lists the active channels in ascending order.
    #[must_use]
    pub fn active_channels(&self) -> Vec<Channel> {
        Channel::all().filter(|c| self.is_active(*c)).collect()
    }
}

#[derive(Debug, Default)]
struct IoData {
    raw: Option<u8>,
    inverter: InverterMask,
    infos: [Option<ModuleInfo>; Channel::COUNT as usize],
}

/// Eight channel relay or input module.
#[derive(Debug, Default)]
pub struct IoModule {
    data: RwLock<IoData>,
}

impl IoModule {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the last reported mask as sent by the module.
    #[must_use]
    pub fn raw_mask(&self) -> Option<u8> {
        self.data.read().raw
    }

    /// Returns the last reported state with the inverter mask applied.
    #[must_use]
    pub fn state(&self) -> Option<IoState> {
        let data = self.data.read();
        data.raw.map(|raw| IoState(data.inverter.apply(raw)))
    }

    /// Returns the inverter mask.
    #[must_use]
    pub fn inverter_mask(&self) -> InverterMask {
        self.data.read().inverter
    }

    /// Sets the mask XORed into later reports.
    pub fn set_inverter_mask(&self, mask: InverterMask) {
        self.data.write().inverter = mask;
    }

    /// Returns the info record of one channel.
    #[must_use]
    pub fn channel_info(&self, channel: Channel) -> Option<ModuleInfo> {
        self.data.read().infos[usize::from(channel.value() - 1)].clone()
    }

    /// Stores a per-channel info record.
    ///
    /// The channel digit follows the kind marker, the record follows the
    /// digit.
    pub(crate) fn store_info(&self, payload: &str) -> Result<Channel, ParseError> {
        let invalid = || ParseError::InvalidAppInfo(payload.to_string());
        let digit = payload.get(1..2).ok_or_else(invalid)?;
        let record = payload.get(2..).ok_or_else(invalid)?;

        let index: u8 = digit.parse().map_err(|_| invalid())?;
        let channel = Channel::new(index)?;
        let info = ModuleInfo::parse(record)?;

        self.data.write().infos[usize::from(index - 1)] = Some(info);
        Ok(channel)
    }

    /// Decodes a status payload such as `I05`.
    pub(crate) fn decode(&self, payload: &str) -> Result<IoState, ParseError> {
        let body = payload_body(payload)?.trim();
        let raw = u8::from_str_radix(body, 16).map_err(|_| ParseError::InvalidNumber {
            field: "channel mask",
            input: payload.to_string(),
        })?;

        let mut data = self.data.write();
        data.raw = Some(raw);
        Ok(IoState(data.inverter.apply(raw)))
    }
}

/// Encodes a relay command.
pub(crate) fn encode_relay(
    module_type: ModuleType,
    address: ModuleAddress,
    command: Command,
    channel: Option<Channel>,
) -> Result<Vec<CommandFrame>, CommandError> {
    let frame = CommandFrame::new(module_type, address);
    match command {
        Command::Refresh => Ok(vec![frame.maybe_channel(channel).op(Op::Query)]),
        Command::On | Command::Off | Command::Toggle => {
            let frame = frame.channel(channel.ok_or(CommandError::ChannelRequired { command })?);
            Ok(vec![match command {
                Command::On => frame.op(Op::On),
                Command::Off => frame.op(Op::Off),
                _ => frame,
            }])
        }
        _ => Err(CommandError::Unsupported {
            command,
            module_type,
        }),
    }
}

/// Encodes an input command.
///
/// A push is sent as its press and release phases.
pub(crate) fn encode_input(
    module_type: ModuleType,
    address: ModuleAddress,
    command: Command,
    channel: Option<Channel>,
) -> Result<Vec<CommandFrame>, CommandError> {
    let frame = CommandFrame::new(module_type, address);
    let phases = match command {
        Command::Refresh => return Ok(vec![frame.maybe_channel(channel).op(Op::Query)]),
        Command::ShortPush => [1, 2],
        Command::LongPush => [3, 4],
        _ => {
            return Err(CommandError::Unsupported {
                command,
                module_type,
            });
        }
    };

    let frame = frame.channel(channel.ok_or(CommandError::ChannelRequired { command })?);
    Ok(phases
        .into_iter()
        .map(|phase| frame.clone().op(Op::Push(phase)))
        .collect())
}

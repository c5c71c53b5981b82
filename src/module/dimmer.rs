// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Eight channel dimmer modules.
//!
//! Status reports carry eight two-character hex levels after the kind
//! marker, each left-padded with a space (`D 064 0 0 0 0 0 0`).

use parking_lot::RwLock;

use crate::command::{Command, CommandFrame, Op};
use crate::error::{CommandError, ParseError, ValueError};
use crate::types::{Channel, ModuleAddress, ModuleType};

use super::ModuleInfo;

/// Highest dimmer level.
pub const MAX_LEVEL: u8 = 100;

const FIELD_WIDTH: usize = 2;

#[derive(Debug, Default)]
struct DimmerData {
    levels: Option<[u8; 8]>,
    info: Option<ModuleInfo>,
}

/// Eight channel dimmer.
#[derive(Debug, Default)]
pub struct DimmerModule {
    data: RwLock<DimmerData>,
}

impl DimmerModule {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the last reported levels, channel 1 first.
    #[must_use]
    pub fn levels(&self) -> Option<[u8; 8]> {
        self.data.read().levels
    }

    /// Returns the level of one channel.
    #[must_use]
    pub fn level(&self, channel: Channel) -> Option<u8> {
        self.levels()
            .map(|levels| levels[usize::from(channel.value() - 1)])
    }

    pub(crate) fn info(&self) -> Option<ModuleInfo> {
        self.data.read().info.clone()
    }

    pub(crate) fn store_info(&self, payload: &str) -> Result<(), ParseError> {
        let record = payload
            .get(2..)
            .ok_or_else(|| ParseError::InvalidAppInfo(payload.to_string()))?;
        self.data.write().info = Some(ModuleInfo::parse(record)?);
        Ok(())
    }

    /// Decodes the eight levels of a status payload.
    pub(crate) fn decode(&self, payload: &str) -> Result<[u8; 8], ParseError> {
        let mut levels = [0u8; 8];
        for (index, level) in levels.iter_mut().enumerate() {
            let start = 1 + index * FIELD_WIDTH;
            let field = payload
                .get(start..start + FIELD_WIDTH)
                .ok_or_else(|| ParseError::TruncatedPayload(payload.to_string()))?
                .trim();
            let value = u8::from_str_radix(field, 16).map_err(|_| ParseError::InvalidNumber {
                field: "dimmer level",
                input: payload.to_string(),
            })?;
            if value > MAX_LEVEL {
                return Err(ValueError::OutOfRange {
                    min: 0,
                    max: u32::from(MAX_LEVEL),
                    actual: u32::from(value),
                }
                .into());
            }
            *level = value;
        }

        self.data.write().levels = Some(levels);
        Ok(levels)
    }
}

/// Encodes a dimmer command.
pub(crate) fn encode(
    module_type: ModuleType,
    address: ModuleAddress,
    command: Command,
    channel: Option<Channel>,
) -> Result<Vec<CommandFrame>, CommandError> {
    let frame = CommandFrame::new(module_type, address);
    let op = match command {
        Command::Refresh => return Ok(vec![frame.maybe_channel(channel).op(Op::Query)]),
        Command::On => Some(Op::On),
        Command::Off => Some(Op::Off),
        Command::Toggle => None,
        Command::SetLevel(level) if level > MAX_LEVEL => {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: u32::from(MAX_LEVEL),
                actual: u32::from(level),
            }
            .into());
        }
        Command::SetLevel(level) => Some(Op::Dim(level)),
        _ => {
            return Err(CommandError::Unsupported {
                command,
                module_type,
            });
        }
    };

    let frame = frame.channel(channel.ok_or(CommandError::ChannelRequired { command })?);
    Ok(vec![match op {
        Some(op) => frame.op(op),
        None => frame,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::WireCommand;

    fn channel(index: u8) -> Channel {
        Channel::new(index).unwrap()
    }

    fn encode_one(command: Command, channel: Option<Channel>) -> Result<String, CommandError> {
        let address = ModuleAddress::new(0x00_0123).unwrap();
        encode(ModuleType::Dim, address, command, channel).map(|frames| frames[0].to_wire())
    }

    #[test]
    fn decodes_padded_levels() {
        let module = DimmerModule::new();
        let levels = module.decode("D 064 0 0 0 0 0 0").unwrap();

        assert_eq!(levels, [0, 100, 0, 0, 0, 0, 0, 0]);
        assert_eq!(module.level(channel(2)), Some(100));
    }

    #[test]
    fn decodes_full_width_levels() {
        let module = DimmerModule::new();
        let levels = module.decode("D0A141E28323C4650").unwrap();
        assert_eq!(levels, [10, 20, 30, 40, 50, 60, 70, 80]);
    }

    #[test]
    fn short_payload_is_rejected() {
        let module = DimmerModule::new();
        assert!(matches!(
            module.decode("D 0 0"),
            Err(ParseError::TruncatedPayload(_))
        ));
        assert!(module.levels().is_none());
    }

    #[test]
    fn level_above_hundred_keeps_previous_levels() {
        let module = DimmerModule::new();
        module.decode("D 0 0 0 0 0 0 0 1").unwrap();

        assert!(matches!(
            module.decode("D 0FF 0 0 0 0 0 0"),
            Err(ParseError::Value(ValueError::OutOfRange { actual: 255, .. }))
        ));
        assert_eq!(module.levels(), Some([0, 0, 0, 0, 0, 0, 0, 1]));
    }

    #[test]
    fn stores_module_info() {
        let module = DimmerModule::new();
        module.store_info("D Salon[Living]").unwrap();
        assert_eq!(module.info().unwrap().location, "Living");
    }

    #[test]
    fn channel_commands() {
        let ch = Some(channel(4));
        assert_eq!(encode_one(Command::On, ch).unwrap(), "DIM   123-4%I");
        assert_eq!(encode_one(Command::Off, ch).unwrap(), "DIM   123-4%O");
        assert_eq!(encode_one(Command::Toggle, ch).unwrap(), "DIM   123-4");
        assert_eq!(encode_one(Command::Refresh, ch).unwrap(), "DIM   123-4%S");
        assert_eq!(encode_one(Command::SetLevel(40), ch).unwrap(), "DIM   123-4%D40");
        assert_eq!(encode_one(Command::Refresh, None).unwrap(), "DIM   123%S");
    }

    #[test]
    fn level_is_bounded() {
        assert_eq!(
            encode_one(Command::SetLevel(101), Some(channel(1))),
            Err(CommandError::Value(ValueError::OutOfRange {
                min: 0,
                max: 100,
                actual: 101
            }))
        );
    }

    #[test]
    fn level_needs_channel() {
        assert_eq!(
            encode_one(Command::SetLevel(10), None),
            Err(CommandError::ChannelRequired {
                command: Command::SetLevel(10)
            })
        );
    }

    #[test]
    fn rejects_push() {
        assert!(matches!(
            encode_one(Command::LongPush, Some(channel(1))),
            Err(CommandError::Unsupported { .. })
        ));
    }
}

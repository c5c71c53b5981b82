// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! System variables held by the master.

use parking_lot::RwLock;

use crate::command::{Command, CommandFrame};
use crate::error::{CommandError, ParseError};
use crate::types::{Channel, ModuleAddress, ModuleType};

use super::{ModuleInfo, payload_body};

#[derive(Debug, Default)]
struct VariableData {
    value: Option<u32>,
    info: Option<ModuleInfo>,
}

/// System variable.
#[derive(Debug, Default)]
pub struct VariableModule {
    data: RwLock<VariableData>,
}

impl VariableModule {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the last reported value.
    #[must_use]
    pub fn value(&self) -> Option<u32> {
        self.data.read().value
    }

    pub(crate) fn info(&self) -> Option<ModuleInfo> {
        self.data.read().info.clone()
    }

    /// Variable records carry no channel digit; the whole payload is the
    /// record.
    pub(crate) fn store_info(&self, payload: &str) -> Result<(), ParseError> {
        self.data.write().info = Some(ModuleInfo::parse(payload.trim())?);
        Ok(())
    }

    pub(crate) fn decode(&self, payload: &str) -> Result<u32, ParseError> {
        let body = payload_body(payload)?.trim();
        let value = u32::from_str_radix(body, 16).map_err(|_| ParseError::InvalidNumber {
            field: "variable value",
            input: payload.to_string(),
        })?;
        self.data.write().value = Some(value);
        Ok(value)
    }
}

/// Encodes a variable command.
///
/// Refresh is accepted and produces no frame.
pub(crate) fn encode(
    module_type: ModuleType,
    address: ModuleAddress,
    command: Command,
    _channel: Option<Channel>,
) -> Result<Vec<CommandFrame>, CommandError> {
    match command {
        Command::Toggle => Ok(vec![CommandFrame::new(module_type, address)]),
        Command::Refresh => Ok(Vec::new()),
        _ => Err(CommandError::Unsupported {
            command,
            module_type,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::WireCommand;

    fn address() -> ModuleAddress {
        ModuleAddress::new(0x2A).unwrap()
    }

    #[test]
    fn decodes_hex_value() {
        let module = VariableModule::new();
        assert_eq!(module.decode("O1F").unwrap(), 0x1F);
        assert_eq!(module.decode("D 01").unwrap(), 1);
        assert_eq!(module.value(), Some(1));
    }

    #[test]
    fn empty_value_is_rejected() {
        let module = VariableModule::new();
        assert!(matches!(
            module.decode("O"),
            Err(ParseError::TruncatedPayload(_))
        ));
        assert!(module.decode("O  ").is_err());
        assert!(module.value().is_none());
    }

    #[test]
    fn whole_payload_is_info_record() {
        let module = VariableModule::new();
        module.store_info("Night mode[House]").unwrap();
        assert_eq!(module.info().unwrap().name, "Night mode");
    }

    #[test]
    fn toggle_is_bare_address() {
        let frames = encode(ModuleType::Var, address(), Command::Toggle, None).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].to_wire(), "VAR    2A");
    }

    #[test]
    fn refresh_is_a_no_op() {
        let frames = encode(ModuleType::Var, address(), Command::Refresh, None).unwrap();
        assert!(frames.is_empty());
    }

    #[test]
    fn rejects_other_commands() {
        assert_eq!(
            encode(ModuleType::Var, address(), Command::On, None),
            Err(CommandError::Unsupported {
                command: Command::On,
                module_type: ModuleType::Var,
            })
        );
    }
}

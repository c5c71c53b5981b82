// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thermostat modules.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::command::{Command, CommandFrame, Op, SetPoint};
use crate::error::{CommandError, ParseError};
use crate::types::{Channel, ModuleAddress, ModuleType, RegulationMode};

use super::{ModuleInfo, payload_body};

/// Thermostat reading, as in `T 19.5 21.0 AUTO 21.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureStatus {
    /// Measured temperature.
    pub current: f32,
    /// Set-point in force.
    pub preset: f32,
    /// Regulation mode.
    pub mode: RegulationMode,
    /// Set-point of the active profile.
    pub profile: f32,
}

impl TemperatureStatus {
    /// Parses the four fields following the kind marker.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::TruncatedPayload` when fewer than four fields
    /// are present, or the error of the first field that fails to parse.
    pub fn parse(payload: &str) -> Result<Self, ParseError> {
        let truncated = || ParseError::TruncatedPayload(payload.to_string());
        let mut tokens = payload_body(payload)?.split_whitespace();
        let mut next = || tokens.next().ok_or_else(truncated);

        let current = parse_degrees(next()?, "current temperature")?;
        let preset = parse_degrees(next()?, "preset temperature")?;
        let mode = next()?.parse::<RegulationMode>()?;
        let profile = parse_degrees(next()?, "profile temperature")?;

        Ok(Self {
            current,
            preset,
            mode,
            profile,
        })
    }
}

fn parse_degrees(token: &str, field: &'static str) -> Result<f32, ParseError> {
    token.parse().map_err(|_| ParseError::InvalidNumber {
        field,
        input: token.to_string(),
    })
}

#[derive(Debug, Default)]
struct TemperatureData {
    status: Option<TemperatureStatus>,
    info: Option<ModuleInfo>,
}

/// Room thermostat.
#[derive(Debug, Default)]
pub struct TemperatureModule {
    data: RwLock<TemperatureData>,
}

impl TemperatureModule {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the last reading.
    #[must_use]
    pub fn status(&self) -> Option<TemperatureStatus> {
        self.data.read().status
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

    pub(crate) fn decode(&self, payload: &str) -> Result<TemperatureStatus, ParseError> {
        let status = TemperatureStatus::parse(payload)?;
        self.data.write().status = Some(status);
        Ok(status)
    }
}

/// Encodes a thermostat command. Thermostats have no channels.
pub(crate) fn encode(
    module_type: ModuleType,
    address: ModuleAddress,
    command: Command,
    _channel: Option<Channel>,
) -> Result<Vec<CommandFrame>, CommandError> {
    let op = match command {
        Command::Refresh => Op::Query,
        Command::SetPoint(value) => Op::SetPoint(SetPoint::new(value)?),
        Command::SetMode(mode) => Op::Mode(mode),
        _ => {
            return Err(CommandError::Unsupported {
                command,
                module_type,
            });
        }
    };
    Ok(vec![CommandFrame::new(module_type, address).op(op)])
}

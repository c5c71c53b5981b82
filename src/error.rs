// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `domintell_lib` library.
//!
//! This module provides the error hierarchy used across the library: value
//! validation, frame parsing, gateway communication, module resolution and
//! command encoding.

use thiserror::Error;

use crate::command::Command;
use crate::types::{ModuleAddress, ModuleKind, ModuleType};

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred during gateway communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing an inbound frame.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A module could not be resolved from the registry.
    #[error("module error: {0}")]
    Module(#[from] ModuleError),

    /// A command could not be encoded for a module.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// The connection configuration is unusable.
    #[error("invalid connection configuration: {0}")]
    InvalidConfiguration(String),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u32,
        /// Maximum allowed value.
        max: u32,
        /// The actual value that was provided.
        actual: u32,
    },

    /// A module address is not a 24-bit hexadecimal number.
    #[error("invalid module address: '{0}'")]
    InvalidAddress(String),

    /// A module type token is not one of the known device categories.
    #[error("unknown module type: '{0}'")]
    UnknownModuleType(String),

    /// A regulation mode code has no matching mode.
    #[error("invalid regulation mode code: {0}")]
    InvalidRegulationMode(u8),

    /// A regulation mode name has no matching mode.
    #[error("invalid regulation mode name: '{0}'")]
    InvalidRegulationModeName(String),

    /// A temperature set-point is not a finite number.
    #[error("invalid set-point: {0}")]
    InvalidSetPoint(f32),
}

/// Errors related to parsing inbound frames.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// A status payload is too short for its module variant.
    #[error("payload too short: '{0}'")]
    TruncatedPayload(String),

    /// A numeric field could not be parsed.
    #[error("failed to parse {field} from '{input}'")]
    InvalidNumber {
        /// The field that failed to parse.
        field: &'static str,
        /// The offending input.
        input: String,
    },

    /// An `APPINFO` record lacks its bracketed sections.
    #[error("malformed app info record: '{0}'")]
    InvalidAppInfo(String),

    /// A clock broadcast matched the pattern but is not a valid date.
    #[error("invalid system clock: '{0}'")]
    InvalidClock(String),

    /// A value inside the payload was rejected.
    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Errors related to the datagram transport.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Socket setup or I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configured host did not resolve to any address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// Errors raised when resolving a module from the registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModuleError {
    /// The cached module at this key is of another variant.
    #[error("module {address} is a {found:?} module, expected {expected:?}")]
    VariantMismatch {
        /// Address of the offending module.
        address: ModuleAddress,
        /// Variant implied by the requested module type.
        expected: ModuleKind,
        /// Variant of the cached instance.
        found: ModuleKind,
    },
}

impl ModuleError {
    /// Returns the address of the module that failed to resolve.
    #[must_use]
    pub fn address(&self) -> ModuleAddress {
        match self {
            Self::VariantMismatch { address, .. } => *address,
        }
    }
}

/// Errors raised when a command cannot be encoded for a module.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommandError {
    /// The module variant has no encoding for this command.
    #[error("unsupported command {command} for {module_type} module")]
    Unsupported {
        /// The rejected command.
        command: Command,
        /// Type of the module the command was sent to.
        module_type: ModuleType,
    },

    /// The command addresses a single channel but none was given.
    #[error("command {command} requires a channel")]
    ChannelRequired {
        /// The rejected command.
        command: Command,
    },

    /// A command argument was rejected.
    #[error(transparent)]
    Value(#[from] ValueError),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

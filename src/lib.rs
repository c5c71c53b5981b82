// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Domintell` Lib - A Rust library to drive a Domintell installation.
//!
//! This library talks to the master of a Domintell home automation bus
//! through a DETH02 gateway over UDP. It keeps a session open, tracks the
//! connection state and decodes the status frames the bus broadcasts into
//! typed module state.
//!
//! # Supported Modules
//!
//! - **Relays** (`BIR`, `DMR`, `TRP`): switch, toggle and query outputs
//! - **Inputs** (`IS4`, `IS8`): contact state, simulated short and long
//!   pushes
//! - **Dimmers** (`DIM`, `D10`): eight channel levels
//! - **Thermostats** (`TSB`, `TE1`, `TE2`, `LC3`, `PBL`): readings, set-point and
//!   regulation mode
//! - **Variables** (`VAR`): system variable values
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use domintell_lib::command::Command;
//! use domintell_lib::module::{Module, ModuleUpdate};
//! use domintell_lib::session::{Connection, ConnectionConfig, ConnectionState};
//! use domintell_lib::types::{Channel, ModuleAddress, ModuleType};
//!
//! #[tokio::main]
//! async fn main() -> domintell_lib::Result<()> {
//!     let connection = Connection::new(
//!         ConnectionConfig::new("192.168.1.20"),
//!         Arc::new(|state: ConnectionState, message: Option<&str>| {
//!             println!("Connection {state} {}", message.unwrap_or_default());
//!         }),
//!         Arc::new(|module: &Arc<Module>| {
//!             println!("Discovered {}", module.key());
//!         }),
//!     );
//!     connection.start()?;
//!
//!     let relay = connection.resolve_module(ModuleType::Bir, ModuleAddress::from_hex("1A2B3")?)?;
//!     relay.set_update_sink(|module: &Module, update: &ModuleUpdate| {
//!         println!("{} reported {:?}", module.key(), update);
//!     });
//!     relay.execute(Command::Toggle, Some(Channel::new(2)?))?;
//!
//!     connection.trigger_discovery();
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`session`]: supervised connection, state publication, configuration
//! - [`protocol`]: UDP transport, outbound queue, sender and receiver tasks
//! - [`registry`]: one shared [`Module`](module::Module) per type and address
//! - [`module`]: per-variant status decoding and command encoding
//! - [`command`]: wire encoding of commands
//! - [`types`]: addresses, module types, channels and other value types

pub mod command;
pub mod error;
pub mod module;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod types;

pub use command::Command;
pub use error::{CommandError, Error, ModuleError, ParseError, ProtocolError, Result, ValueError};
pub use module::{Module, ModuleUpdate, UpdateSink};
pub use registry::ModuleRegistry;
pub use session::{Connection, ConnectionConfig, ConnectionState};
pub use types::{Channel, ModuleAddress, ModuleType};

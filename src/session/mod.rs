// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session lifecycle and host-facing connection API.
//!
//! [`Connection`] owns everything a host needs: configuration, connection
//! state, the outbound queue and the module registry. State changes are
//! reported to a [`StateListener`] and can be watched through
//! [`Connection::subscribe_state`]; newly seen modules are reported to a
//! [`DiscoveryListener`].

mod config;
mod connection;
mod listener;
mod state;

pub use config::{
    ConnectionConfig, DEFAULT_MESSAGE_DELAY, DEFAULT_PING_INTERVAL, DEFAULT_PORT,
    DEFAULT_READ_TIMEOUT, DEFAULT_RECONNECT_DELAY,
};
pub use connection::{Connection, SessionId};
pub use listener::{DiscoveryListener, NoopListener, StateListener};
pub use state::{ConnectionState, StateCell, StateSnapshot};

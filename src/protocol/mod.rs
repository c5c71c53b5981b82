// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Datagram pipeline between the host and the gateway.
//!
//! A session runs two tasks sharing one [`Transport`]:
//!
//! - [`Sender`] drains the [`CommandQueue`] to the gateway, pausing
//!   between frames as the bus requires.
//! - [`Receiver`] reads frames, classifies them as [`InboundMessage`]s,
//!   drives the connection state and routes status frames to the module
//!   registry.
//!
//! The queue outlives sessions; sender and receiver are created for each
//! session attempt.

mod inbound;
mod queue;
mod receiver;
mod sender;
mod transport;

pub use inbound::InboundMessage;
pub use queue::{CommandQueue, DEFAULT_QUEUE_CAPACITY};
pub use receiver::{ClockSlot, Receiver, ReceiverExit};
pub use sender::Sender;
pub use transport::{READ_BUFFER_SIZE, Received, Transport, decode_latin1, encode_latin1};

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound half of a session.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::registry::ModuleRegistry;
use crate::session::{ConnectionState, StateCell};
use crate::types::SystemClock;

use super::{InboundMessage, Received, Transport};

/// Shared slot holding the last clock broadcast.
pub type ClockSlot = Arc<RwLock<Option<SystemClock>>>;

/// Why a receiver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverExit {
    /// The gateway refused the session.
    Fatal,
    /// Silence or a socket failure.
    Error,
    /// The gateway closed the session.
    SessionClosed,
    /// The session was cancelled locally.
    Cancelled,
}

/// Reads gateway frames and drives the connection state.
///
/// | Frame | Effect |
/// |-------|--------|
/// | `INFO:Session opened`, `INFO:World`, clock | `ONLINE` |
/// | `INFO:Auth failed`, `INFO:Access denied` | `FATAL`, stop |
/// | `INFO:Session timeout`, `INFO:Session closed` | stop |
/// | anything with `APPINFO` | logged |
/// | other | routed to the module registry |
///
/// A silent read window while online degrades the state to `STALE`; a
/// second one ends the session with `ERROR`.
#[derive(Debug)]
pub struct Receiver {
    transport: Arc<Transport>,
    state: Arc<StateCell>,
    registry: Arc<ModuleRegistry>,
    clock: ClockSlot,
}

impl Receiver {
    /// Creates a receiver for one session.
    #[must_use]
    pub fn new(
        transport: Arc<Transport>,
        state: Arc<StateCell>,
        registry: Arc<ModuleRegistry>,
        clock: ClockSlot,
    ) -> Self {
        Self {
            transport,
            state,
            registry,
            clock,
        }
    }

    /// Processes frames until the session ends or is cancelled.
    pub async fn run(self, cancel: CancellationToken) -> ReceiverExit {
        tracing::debug!("Receiver started");
        let exit = loop {
            let received = tokio::select! {
                biased;
                () = cancel.cancelled() => break ReceiverExit::Cancelled,
                received = self.transport.receive() => received,
            };

            match received {
                Ok(Received::Frame(frame)) => {
                    if let Some(exit) = self.handle_frame(&frame) {
                        break exit;
                    }
                }
                Ok(Received::Timeout) => {
                    if self.state.is_online() {
                        tracing::debug!("No message received within the read timeout");
                        self.state.publish(ConnectionState::Stale, None);
                    } else {
                        tracing::debug!("Still no message received, stopping the receiver");
                        self.state.publish(
                            ConnectionState::Error,
                            Some("Cannot connect to Domintell system.".to_string()),
                        );
                        break ReceiverExit::Error;
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Error receiving packet");
                    self.state
                        .publish(ConnectionState::Error, Some(format!("I/O error: {e}")));
                    break ReceiverExit::Error;
                }
            }
        };
        tracing::debug!(?exit, "Receiver stopped");
        exit
    }

    fn handle_frame(&self, frame: &str) -> Option<ReceiverExit> {
        match InboundMessage::classify(frame) {
            InboundMessage::SessionOpened => {
                self.state.publish(ConnectionState::Online, None);
            }
            InboundMessage::AuthFailed => {
                self.state
                    .publish(ConnectionState::Fatal, Some("Authentication failed".to_string()));
                return Some(ReceiverExit::Fatal);
            }
            InboundMessage::AccessDenied => {
                self.state
                    .publish(ConnectionState::Fatal, Some("Access denied".to_string()));
                return Some(ReceiverExit::Fatal);
            }
            InboundMessage::SessionClosed => {
                tracing::info!(frame, "Session closed by the gateway");
                return Some(ReceiverExit::SessionClosed);
            }
            InboundMessage::World => {
                tracing::trace!("Gateway replied to HELLO");
                self.state.publish(ConnectionState::Online, None);
            }
            InboundMessage::Clock(Ok(clock)) => {
                tracing::trace!(%clock, "Gateway reported its clock");
                *self.clock.write() = Some(clock);
                self.state.publish(ConnectionState::Online, None);
            }
            InboundMessage::Clock(Err(e)) => {
                tracing::debug!(frame, error = %e, "Unable to parse system clock");
            }
            InboundMessage::AppInfoNotice => {
                tracing::trace!(frame, "APPINFO message");
            }
            InboundMessage::Status(frame) => {
                self.registry.dispatch_status(&frame);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parking_lot::Mutex;
    use tokio::net::UdpSocket;

    use super::*;
    use crate::protocol::CommandQueue;
    use crate::session::NoopListener;
    use crate::types::ModuleType;

    struct Harness {
        receiver: Receiver,
        states: Arc<Mutex<Vec<ConnectionState>>>,
        registry: Arc<ModuleRegistry>,
        clock: ClockSlot,
        gateway: UdpSocket,
    }

    async fn harness(read_timeout: Duration) -> Harness {
        let gateway = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = gateway.local_addr().unwrap().port();
        let transport = Transport::open("127.0.0.1", port, read_timeout).await.unwrap();
        gateway
            .connect(transport.local_addr().unwrap())
            .await
            .unwrap();

        let states = Arc::new(Mutex::new(Vec::new()));
        let states_clone = states.clone();
        let state = Arc::new(StateCell::new(Arc::new(
            move |state: ConnectionState, _: Option<&str>| states_clone.lock().push(state),
        )));
        let registry = Arc::new(ModuleRegistry::new(CommandQueue::new(), Arc::new(NoopListener)));
        let clock = ClockSlot::default();
        let receiver = Receiver::new(
            Arc::new(transport),
            state,
            Arc::clone(&registry),
            Arc::clone(&clock),
        );
        Harness {
            receiver,
            states,
            registry,
            clock,
            gateway,
        }
    }

    async fn run(receiver: Receiver) -> ReceiverExit {
        tokio::time::timeout(Duration::from_secs(2), receiver.run(CancellationToken::new()))
            .await
            .expect("receiver should stop")
    }

    #[tokio::test]
    async fn online_degrades_to_stale_before_error() {
        let h = harness(Duration::from_millis(100)).await;
        h.gateway.send(b"INFO:Session opened").await.unwrap();

        assert_eq!(run(h.receiver).await, ReceiverExit::Error);
        assert_eq!(
            *h.states.lock(),
            vec![
                ConnectionState::Online,
                ConnectionState::Stale,
                ConnectionState::Error
            ]
        );
    }

    #[tokio::test]
    async fn auth_failure_is_fatal() {
        let h = harness(Duration::from_secs(1)).await;
        h.gateway.send(b"INFO:Auth failed").await.unwrap();

        assert_eq!(run(h.receiver).await, ReceiverExit::Fatal);
        assert_eq!(*h.states.lock(), vec![ConnectionState::Fatal]);
    }

    #[tokio::test]
    async fn session_closed_ends_without_state_change() {
        let h = harness(Duration::from_secs(1)).await;
        h.gateway.send(b"INFO:Session closed").await.unwrap();

        assert_eq!(run(h.receiver).await, ReceiverExit::SessionClosed);
        assert!(h.states.lock().is_empty());
    }

    #[tokio::test]
    async fn clock_is_stored_and_status_dispatched() {
        let h = harness(Duration::from_secs(1)).await;
        h.gateway.send(b"12:00 01/03/24").await.unwrap();
        h.gateway.send(b"DIM00002A D 0 0 0 0 0 0 0 0").await.unwrap();
        h.gateway.send(b"INFO:Session timeout").await.unwrap();

        assert_eq!(run(h.receiver).await, ReceiverExit::SessionClosed);
        assert_eq!(h.clock.read().unwrap().to_string(), "12:00 01/03/24");
        assert_eq!(*h.states.lock(), vec![ConnectionState::Online]);

        let address = crate::types::ModuleAddress::new(0x2A).unwrap();
        let dimmer = h.registry.get(ModuleType::Dim, address).unwrap();
        assert_eq!(dimmer.dimmer_levels(), Some([0; 8]));
    }

    #[tokio::test]
    async fn cancellation_stops_receiver() {
        let h = harness(Duration::from_secs(5)).await;
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(h.receiver.run(cancel).await, ReceiverExit::Cancelled);
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound half of a session.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::command::{ControlCommand, WireCommand};
use crate::session::StateCell;

use super::{CommandQueue, Transport};

/// Drains the command queue to the gateway.
///
/// Queued frames are only forwarded while the session is online, except
/// `LOGIN`. Frames dequeued at other times are dropped. The bus needs a
/// pause after each frame.
#[derive(Debug, Clone)]
pub struct Sender {
    transport: Arc<Transport>,
    state: Arc<StateCell>,
    queue: CommandQueue,
    message_delay: Duration,
}

impl Sender {
    /// Creates a sender for one session.
    #[must_use]
    pub fn new(
        transport: Arc<Transport>,
        state: Arc<StateCell>,
        queue: CommandQueue,
        message_delay: Duration,
    ) -> Self {
        Self {
            transport,
            state,
            queue,
            message_delay,
        }
    }

    /// Forwards queued frames until cancelled.
    ///
    /// A send that already started completes before the loop exits.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::debug!("Sender started");
        loop {
            let frame = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                frame = self.queue.pop() => frame,
            };

            if self.state.is_online() || ControlCommand::is_login(&frame) {
                self.send(&frame).await;
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(self.message_delay) => {}
                }
            } else {
                tracing::debug!(frame = %frame, "Skipping command as the connection is not online");
            }
        }
        tracing::debug!("Sender stopped");
    }

    /// Opens the session: `LOGIN` then `PING`, bypassing the queue.
    pub async fn login(&self) {
        self.send_control(ControlCommand::Login).await;
        self.send_control(ControlCommand::Ping).await;
    }

    /// Sends the `HELLO` liveness probe.
    pub async fn hello(&self) {
        self.send_control(ControlCommand::Hello).await;
    }

    /// Closes the session.
    pub async fn logout(&self) {
        self.send_control(ControlCommand::Logout).await;
    }

    async fn send_control(&self, command: ControlCommand) {
        self.send(&command.to_wire()).await;
    }

    async fn send(&self, frame: &str) {
        if let Err(e) = self.transport.send(frame).await {
            tracing::debug!(frame, error = %e, "Could not send message");
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::UdpSocket;

    use super::*;
    use crate::session::{ConnectionState, NoopListener};

    struct Harness {
        sender: Sender,
        state: Arc<StateCell>,
        queue: CommandQueue,
        gateway: UdpSocket,
    }

    async fn harness() -> Harness {
        let gateway = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = gateway.local_addr().unwrap().port();
        let transport = Transport::open("127.0.0.1", port, Duration::from_secs(1))
            .await
            .unwrap();
        let state = Arc::new(StateCell::new(Arc::new(NoopListener)));
        let queue = CommandQueue::new();
        let sender = Sender::new(
            Arc::new(transport),
            Arc::clone(&state),
            queue.clone(),
            Duration::from_millis(1),
        );
        Harness {
            sender,
            state,
            queue,
            gateway,
        }
    }

    async fn next_frame(gateway: &UdpSocket) -> String {
        let mut buffer = [0u8; 256];
        let (len, _) = tokio::time::timeout(Duration::from_secs(1), gateway.recv_from(&mut buffer))
            .await
            .expect("frame expected")
            .unwrap();
        String::from_utf8_lossy(&buffer[..len]).into_owned()
    }

    #[tokio::test]
    async fn login_sends_login_then_ping() {
        let h = harness().await;
        h.sender.login().await;

        assert_eq!(next_frame(&h.gateway).await, "LOGIN");
        assert_eq!(next_frame(&h.gateway).await, "PING");
    }

    #[tokio::test]
    async fn drops_commands_while_offline_except_login() {
        let h = harness().await;
        h.queue.push("BIR 1A2B3-1%I");
        h.queue.push(ControlCommand::Login);

        let cancel = CancellationToken::new();
        let task = tokio::spawn(h.sender.clone().run(cancel.clone()));

        assert_eq!(next_frame(&h.gateway).await, "LOGIN");

        h.state.publish(ConnectionState::Online, None);
        h.queue.push("BIR 1A2B3-2%O");
        assert_eq!(next_frame(&h.gateway).await, "BIR 1A2B3-2%O");

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_sender_stops_dequeuing() {
        let h = harness().await;
        h.state.publish(ConnectionState::Online, None);

        let cancel = CancellationToken::new();
        cancel.cancel();
        h.sender.clone().run(cancel).await;

        h.queue.push("HELLO");
        assert_eq!(h.queue.len(), 1);
    }
}

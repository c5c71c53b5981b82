// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! UDP datagram channel to the gateway.
//!
//! Frames are ISO-8859-1 text, one frame per datagram.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;

use crate::error::ProtocolError;

/// Size of the receive buffer. Gateway frames fit well within it.
pub const READ_BUFFER_SIZE: usize = 256;

/// Outcome of a receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// A frame, decoded and trimmed.
    Frame(String),
    /// Nothing arrived within the read timeout.
    Timeout,
}

/// Socket connected to one gateway.
///
/// Send and receive take `&self` so the sender and receiver tasks can share
/// one transport. The socket closes when the last reference is dropped.
#[derive(Debug)]
pub struct Transport {
    socket: UdpSocket,
    peer: SocketAddr,
    read_timeout: Duration,
}

impl Transport {
    /// Resolves the gateway and connects a socket to it.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidAddress` if the host does not resolve
    /// and `ProtocolError::Io` if the socket cannot be set up.
    pub async fn open(host: &str, port: u16, read_timeout: Duration) -> Result<Self, ProtocolError> {
        let peer = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| ProtocolError::InvalidAddress(format!("{host}:{port}: {e}")))?
            .next()
            .ok_or_else(|| ProtocolError::InvalidAddress(format!("{host}:{port}")))?;

        let local: SocketAddr = if peer.is_ipv4() {
            (std::net::Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(peer).await?;
        tracing::debug!(%peer, local = ?socket.local_addr().ok(), "Socket connected");

        Ok(Self {
            socket,
            peer,
            read_timeout,
        })
    }

    /// Returns the gateway address.
    #[must_use]
    pub const fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Returns the local socket address.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Io` if the socket cannot report it.
    pub fn local_addr(&self) -> Result<SocketAddr, ProtocolError> {
        Ok(self.socket.local_addr()?)
    }

    /// Sends one frame.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Io` if the datagram could not be sent.
    pub async fn send(&self, frame: &str) -> Result<(), ProtocolError> {
        tracing::trace!(frame, "Sending message");
        self.socket.send(&encode_latin1(frame)).await?;
        Ok(())
    }

    /// Waits for one frame, up to the read timeout.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Io` if the socket fails.
    pub async fn receive(&self) -> Result<Received, ProtocolError> {
        let mut buffer = [0u8; READ_BUFFER_SIZE];
        let Ok(result) = tokio::time::timeout(self.read_timeout, self.socket.recv(&mut buffer)).await
        else {
            return Ok(Received::Timeout);
        };

        let len = result?;
        if len == READ_BUFFER_SIZE {
            tracing::warn!(len, "Datagram fills the receive buffer and may be truncated");
        }
        let frame = decode_latin1(&buffer[..len]).trim().to_string();
        tracing::trace!(frame = %frame, "Received packet");
        Ok(Received::Frame(frame))
    }
}

/// Decodes ISO-8859-1 bytes; every byte maps to the code point of its value.
#[must_use]
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// Encodes text as ISO-8859-1, replacing characters outside it with `?`.
#[must_use]
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn peer_pair(read_timeout: Duration) -> (Transport, UdpSocket) {
        let gateway = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = gateway.local_addr().unwrap().port();
        let transport = Transport::open("127.0.0.1", port, read_timeout).await.unwrap();
        gateway
            .connect(transport.local_addr().unwrap())
            .await
            .unwrap();
        (transport, gateway)
    }

    #[test]
    fn latin1_round_trip() {
        let bytes = [b'C', 0xE9, b't', 0xE9];
        let text = decode_latin1(&bytes);
        assert_eq!(text, "Cété");
        assert_eq!(encode_latin1(&text), bytes);
    }

    #[test]
    fn unmappable_characters_become_question_marks() {
        assert_eq!(encode_latin1("a€b"), b"a?b");
    }

    #[tokio::test]
    async fn unresolvable_host_is_rejected() {
        let result = Transport::open("", 17481, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(ProtocolError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn send_reaches_gateway() {
        let (transport, gateway) = peer_pair(Duration::from_secs(1)).await;
        transport.send("LOGIN").await.unwrap();

        let mut buffer = [0u8; 64];
        let len = gateway.recv(&mut buffer).await.unwrap();
        assert_eq!(&buffer[..len], b"LOGIN");
    }

    #[tokio::test]
    async fn receive_trims_line_endings() {
        let (transport, gateway) = peer_pair(Duration::from_secs(1)).await;
        gateway.send(b"INFO:World\r\n").await.unwrap();

        let received = transport.receive().await.unwrap();
        assert_eq!(received, Received::Frame("INFO:World".to_string()));
    }

    #[tokio::test]
    async fn full_buffer_is_still_delivered() {
        let (transport, gateway) = peer_pair(Duration::from_secs(1)).await;
        gateway.send(&[b'A'; 300]).await.unwrap();

        let Received::Frame(frame) = transport.receive().await.unwrap() else {
            panic!("expected a frame");
        };
        assert_eq!(frame.len(), READ_BUFFER_SIZE);
    }

    #[tokio::test]
    async fn silence_times_out() {
        let (transport, _gateway) = peer_pair(Duration::from_millis(50)).await;
        assert_eq!(transport.receive().await.unwrap(), Received::Timeout);
    }
}

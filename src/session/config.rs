// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Gateway connection settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::protocol::DEFAULT_QUEUE_CAPACITY;

/// Default UDP port of the DETH02 gateway.
pub const DEFAULT_PORT: u16 = 17481;

/// Default receive timeout.
///
/// The master broadcasts its clock at least once a minute, so a silent
/// window slightly longer than that means the session is unhealthy.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(61);

/// Default interval between `HELLO` liveness probes.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(60);

/// Default pause before reconnecting after a session ended.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Default minimum gap between two outbound frames required by the bus.
pub const DEFAULT_MESSAGE_DELAY: Duration = Duration::from_millis(25);

/// Settings of a gateway connection.
///
/// Durations are (de)serialized as milliseconds. Missing fields take their
/// defaults.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use domintell_lib::session::ConnectionConfig;
///
/// let config = ConnectionConfig::new("192.168.1.20")
///     .with_reconnect_delay(Duration::from_secs(10));
/// assert_eq!(config.port, 17481);
/// assert!(config.is_valid());
///
/// let config = ConnectionConfig::from_json(r#"{"host": "deth02", "port": 17482}"#).unwrap();
/// assert_eq!(config.port, 17482);
/// assert_eq!(config.read_timeout, Duration::from_secs(61));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Gateway host name or IP address.
    pub host: String,
    /// Gateway UDP port.
    pub port: u16,
    /// Silence tolerated before the session degrades.
    #[serde(with = "millis")]
    pub read_timeout: Duration,
    /// Interval between `HELLO` probes.
    #[serde(with = "millis")]
    pub ping_interval: Duration,
    /// Pause before reconnecting.
    #[serde(with = "millis")]
    pub reconnect_delay: Duration,
    /// Minimum gap between outbound frames.
    #[serde(with = "millis")]
    pub message_delay: Duration,
    /// Outbound frames buffered while offline.
    pub queue_capacity: usize,
}

impl ConnectionConfig {
    /// Creates a configuration for a gateway with default settings.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfiguration` if the JSON does not describe a
    /// configuration.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::InvalidConfiguration(e.to_string()))
    }

    /// Sets the gateway port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the receive timeout.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the liveness probe interval.
    #[must_use]
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Sets the reconnect delay.
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets the minimum gap between outbound frames.
    #[must_use]
    pub fn with_message_delay(mut self, delay: Duration) -> Self {
        self.message_delay = delay;
        self
    }

    /// Sets the outbound queue capacity.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Returns true if the host and port are usable.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.host.trim().is_empty() && self.port != 0
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            ping_interval: DEFAULT_PING_INTERVAL,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            message_delay: DEFAULT_MESSAGE_DELAY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::cast_possible_truncation)] // u64 milliseconds span 584 million years
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

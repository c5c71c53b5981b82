// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connection state and its publication.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::StateListener;

/// State of the gateway session.
///
/// ```text
/// INITIALIZING -> STARTING_SESSION -> ONLINE <-> STALE
///                                       |          |
///                                       v          v
///                                    STOPPING -> OFFLINE
/// ERROR: transport failure or silence, retried after a delay
/// FATAL: credentials refused, never retried
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    /// Socket open, session not requested yet.
    Initializing,
    /// Login sent, waiting for the gateway.
    StartingSession,
    /// Session open and traffic flowing.
    Online,
    /// Session open but silent for one receive window.
    Stale,
    /// Session being torn down.
    Stopping,
    /// No session.
    #[default]
    Offline,
    /// Session lost; a reconnect follows.
    Error,
    /// Gateway refused the session; no reconnect.
    Fatal,
}

impl ConnectionState {
    /// Returns true if commands are forwarded to the gateway.
    #[must_use]
    pub const fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }

    /// Returns true if no further session will be attempted.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Fatal)
    }

    /// Returns the upper snake case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "INITIALIZING",
            Self::StartingSession => "STARTING_SESSION",
            Self::Online => "ONLINE",
            Self::Stale => "STALE",
            Self::Stopping => "STOPPING",
            Self::Offline => "OFFLINE",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A published state with its optional explanation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateSnapshot {
    /// The state.
    pub state: ConnectionState,
    /// Human readable reason, set for errors.
    pub message: Option<String>,
}

/// Single source of truth for the connection state.
///
/// Writers publish through [`publish`](Self::publish); readers take
/// consistent snapshots or subscribe to changes.
pub struct StateCell {
    sender: watch::Sender<StateSnapshot>,
    listener: Arc<dyn StateListener>,
}

impl StateCell {
    /// Creates a cell in the `OFFLINE` state.
    #[must_use]
    pub fn new(listener: Arc<dyn StateListener>) -> Self {
        let (sender, _) = watch::channel(StateSnapshot::default());
        Self { sender, listener }
    }

    /// Publishes a state and notifies the listener.
    pub fn publish(&self, state: ConnectionState, message: Option<String>) {
        let previous = self.sender.send_replace(StateSnapshot {
            state,
            message: message.clone(),
        });
        if previous.state != state {
            tracing::info!(from = %previous.state, to = %state, message = ?message, "Connection state changed");
        }
        self.listener.state_changed(state, message.as_deref());
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.sender.borrow().state
    }

    /// Returns the current state and message.
    #[must_use]
    pub fn current(&self) -> StateSnapshot {
        self.sender.borrow().clone()
    }

    /// Returns true if the state is `ONLINE`.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.state().is_online()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot> {
        self.sender.subscribe()
    }
}

impl fmt::Debug for StateCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCell")
            .field("current", &*self.sender.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::session::NoopListener;

    #[test]
    fn display_is_upper_snake_case() {
        assert_eq!(ConnectionState::StartingSession.to_string(), "STARTING_SESSION");
        assert_eq!(ConnectionState::Offline.to_string(), "OFFLINE");
    }

    #[test]
    fn serde_matches_display() {
        let json = serde_json::to_string(&ConnectionState::StartingSession).unwrap();
        assert_eq!(json, "\"STARTING_SESSION\"");
    }

    #[test]
    fn only_online_forwards_commands() {
        assert!(ConnectionState::Online.is_online());
        assert!(!ConnectionState::Stale.is_online());
        assert!(ConnectionState::Fatal.is_terminal());
        assert!(!ConnectionState::Error.is_terminal());
    }

    #[test]
    fn starts_offline() {
        let cell = StateCell::new(Arc::new(NoopListener));
        assert_eq!(cell.current(), StateSnapshot::default());
        assert_eq!(cell.state(), ConnectionState::Offline);
    }

    #[test]
    fn publish_notifies_listener_and_watchers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let cell = StateCell::new(Arc::new(move |state: ConnectionState, message: Option<&str>| {
            seen_clone.lock().push((state, message.map(str::to_string)));
        }));
        let mut watcher = cell.subscribe();

        cell.publish(ConnectionState::Online, None);
        cell.publish(ConnectionState::Error, Some("Timeout".to_string()));

        assert!(watcher.has_changed().unwrap());
        assert_eq!(watcher.borrow_and_update().state, ConnectionState::Error);
        assert_eq!(
            *seen.lock(),
            vec![
                (ConnectionState::Online, None),
                (ConnectionState::Error, Some("Timeout".to_string())),
            ]
        );
        assert!(!cell.is_online());
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session control tokens.

use std::fmt;

use super::WireCommand;

/// Bare control messages understood by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlCommand {
    /// Liveness probe; answered with `INFO:World`.
    Hello,
    /// Sent right after `LOGIN` to open the session.
    Ping,
    /// Opens a session.
    Login,
    /// Closes the session.
    Logout,
    /// Asks every module to describe itself.
    AppInfo,
}

impl ControlCommand {
    /// Returns the literal token.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hello => "HELLO",
            Self::Ping => "PING",
            Self::Login => "LOGIN",
            Self::Logout => "LOGOUT",
            Self::AppInfo => "APPINFO",
        }
    }

    /// Returns true if `frame` is the login token.
    ///
    /// Login is the only frame forwarded while the session is not online.
    #[must_use]
    pub fn is_login(frame: &str) -> bool {
        frame == Self::Login.as_str()
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl WireCommand for ControlCommand {
    fn to_wire(&self) -> String {
        self.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_tokens() {
        assert_eq!(ControlCommand::Hello.to_wire(), "HELLO");
        assert_eq!(ControlCommand::Ping.to_wire(), "PING");
        assert_eq!(ControlCommand::Login.to_wire(), "LOGIN");
        assert_eq!(ControlCommand::Logout.to_wire(), "LOGOUT");
        assert_eq!(ControlCommand::AppInfo.to_wire(), "APPINFO");
    }

    #[test]
    fn login_detection_is_exact() {
        assert!(ControlCommand::is_login("LOGIN"));
        assert!(!ControlCommand::is_login("LOGOUT"));
        assert!(!ControlCommand::is_login("login"));
        assert!(!ControlCommand::is_login("LOGIN "));
    }
}

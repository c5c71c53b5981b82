// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Classification of frames sent by the gateway.

use crate::error::ParseError;
use crate::types::SystemClock;

const SESSION_OPENED: &str = "INFO:Session opened";
const AUTH_FAILED: &str = "INFO:Auth failed";
const ACCESS_DENIED: &str = "INFO:Access denied";
const SESSION_TIMEOUT: &str = "INFO:Session timeout";
const SESSION_CLOSED: &str = "INFO:Session closed";
const WORLD: &str = "INFO:World";
const APPINFO: &str = "APPINFO";

/// A frame received from the gateway.
///
/// # Examples
///
/// ```
/// use domintell_lib::protocol::InboundMessage;
///
/// assert_eq!(InboundMessage::classify("INFO:Session opened"), InboundMessage::SessionOpened);
/// assert_eq!(
///     InboundMessage::classify("BIR01A2B3I01"),
///     InboundMessage::Status("BIR01A2B3I01".to_string())
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// The gateway accepted the login.
    SessionOpened,
    /// The gateway rejected the credentials.
    AuthFailed,
    /// The gateway refused access.
    AccessDenied,
    /// The gateway ended the session.
    SessionClosed,
    /// Answer to `HELLO`.
    World,
    /// Clock broadcast; the error is kept when the text is not a real date.
    Clock(Result<SystemClock, ParseError>),
    /// Echo of an `APPINFO` request.
    AppInfoNotice,
    /// Anything else: a module status frame.
    Status(String),
}

impl InboundMessage {
    /// Classifies a trimmed frame.
    ///
    /// Control messages are checked first, in a fixed priority order.
    #[must_use]
    pub fn classify(frame: &str) -> Self {
        if frame.starts_with(SESSION_OPENED) {
            Self::SessionOpened
        } else if frame.starts_with(AUTH_FAILED) {
            Self::AuthFailed
        } else if frame.starts_with(ACCESS_DENIED) {
            Self::AccessDenied
        } else if frame.starts_with(SESSION_TIMEOUT) || frame.starts_with(SESSION_CLOSED) {
            Self::SessionClosed
        } else if frame.starts_with(WORLD) {
            Self::World
        } else if SystemClock::matches(frame) {
            Self::Clock(SystemClock::parse(frame))
        } else if frame.contains(APPINFO) {
            Self::AppInfoNotice
        } else {
            Self::Status(frame.to_string())
        }
    }
}

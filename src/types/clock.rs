// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Clock broadcast sent by the installation master.
//!
//! The master broadcasts its local time at least once a minute in the form
//! `HH:MM DD/MM/YY`, each field using one or two digits. Receiving it is also
//! the liveness signal the receive timeout relies on.

use std::fmt;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

static CLOCK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{1,2}) (\d{1,2})/(\d{1,2})/(\d{1,2})$")
        .expect("clock pattern is a valid regex")
});

/// Local time of the installation master.
///
/// # Examples
///
/// ```
/// use domintell_lib::types::SystemClock;
///
/// let clock = SystemClock::parse("9:05 15/1/24").unwrap();
/// assert_eq!(clock.naive().format("%Y-%m-%d %H:%M").to_string(), "2024-01-15 09:05");
///
/// assert!(!SystemClock::matches("INFO:World"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SystemClock {
    naive: NaiveDateTime,
}

impl SystemClock {
    /// Returns true if the text has the shape of a clock broadcast.
    #[must_use]
    pub fn matches(text: &str) -> bool {
        CLOCK_PATTERN.is_match(text)
    }

    /// Parses a clock broadcast.
    ///
    /// Two digit years are taken as years of the 21st century.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidClock` if the text does not match the
    /// broadcast pattern or names an impossible date or time.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let invalid = || ParseError::InvalidClock(text.to_string());
        let captures = CLOCK_PATTERN.captures(text).ok_or_else(invalid)?;
        let field = |index: usize| -> Result<u32, ParseError> {
            captures
                .get(index)
                .and_then(|m| m.as_str().parse().ok())
                .ok_or_else(invalid)
        };

        let (hour, minute) = (field(1)?, field(2)?);
        let (day, month, year) = (field(3)?, field(4)?, field(5)?);
        let year = i32::try_from(2000 + year).map_err(|_| invalid())?;

        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)?;
        Ok(Self {
            naive: NaiveDateTime::new(date, time),
        })
    }

    /// Returns the clock as a naive datetime in the master's local zone.
    #[must_use]
    pub const fn naive(&self) -> NaiveDateTime {
        self.naive
    }
}

impl From<NaiveDateTime> for SystemClock {
    fn from(naive: NaiveDateTime) -> Self {
        Self { naive }
    }
}

impl fmt::Display for SystemClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.naive.format("%H:%M %d/%m/%y"))
    }
}

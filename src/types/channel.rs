// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Channel addressing for multi-channel modules.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Index of an output or input on an eight channel module.
///
/// Channels are numbered from 1 to 8. Channel `n` is bit `n - 1` of the
/// status mask reported by relay and input modules.
///
/// # Examples
///
/// ```
/// use domintell_lib::types::Channel;
///
/// let channel = Channel::new(3).unwrap();
/// assert_eq!(channel.bit(), 0b0000_0100);
/// assert!(Channel::new(0).is_err());
/// assert!(Channel::new(9).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Channel(u8);

impl Channel {
    /// Number of channels on a multi-channel module.
    pub const COUNT: u8 = 8;

    /// Creates a channel index.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` unless `index` is within 1-8.
    pub fn new(index: u8) -> Result<Self, ValueError> {
        if index == 0 || index > Self::COUNT {
            return Err(ValueError::OutOfRange {
                min: 1,
                max: u32::from(Self::COUNT),
                actual: u32::from(index),
            });
        }
        Ok(Self(index))
    }

    /// Returns the 1-based index.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Returns the status mask bit of this channel.
    #[must_use]
    pub const fn bit(&self) -> u8 {
        1 << (self.0 - 1)
    }

    /// Iterates over channels 1 to 8.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=Self::COUNT).map(Self)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for Channel {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Channel> for u8 {
    fn from(channel: Channel) -> Self {
        channel.0
    }
}

/// Installation specific mask XORed into relay and input status.
///
/// Some installations wire contacts as normally closed; the mask flips the
/// reported bits before they are mapped to channels.
///
/// # Examples
///
/// ```
/// use domintell_lib::types::InverterMask;
///
/// let mask = InverterMask::from_binary_str("00000101");
/// assert_eq!(mask.apply(0b0000_0001), 0b0000_0100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct InverterMask(u8);

impl InverterMask {
    /// Creates a mask from its raw bits.
    #[must_use]
    pub const fn new(bits: u8) -> Self {
        Self(bits)
    }

    /// Parses a mask written in base 2, as found in host configuration.
    ///
    /// Invalid input yields the empty mask.
    #[must_use]
    pub fn from_binary_str(text: &str) -> Self {
        match u8::from_str_radix(text.trim(), 2) {
            Ok(bits) => Self(bits),
            Err(_) => {
                tracing::debug!(mask = %text, "Invalid inverter mask, using 0 instead");
                Self(0)
            }
        }
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Returns true if no bit is inverted.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Applies the mask to a raw status mask.
    #[must_use]
    pub const fn apply(&self, raw: u8) -> u8 {
        raw ^ self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_bits() {
        assert_eq!(Channel::new(1).unwrap().bit(), 0x01);
        assert_eq!(Channel::new(8).unwrap().bit(), 0x80);
    }

    #[test]
    fn all_yields_eight_channels() {
        let values: Vec<u8> = Channel::all().map(|c| c.value()).collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn channel_out_of_range() {
        let err = Channel::new(9).unwrap_err();
        assert_eq!(
            err,
            ValueError::OutOfRange {
                min: 1,
                max: 8,
                actual: 9
            }
        );
    }

    #[test]
    fn inverter_mask_parses_binary() {
        assert_eq!(InverterMask::from_binary_str("11110000").bits(), 0xF0);
        assert_eq!(InverterMask::from_binary_str(" 1 ").bits(), 0x01);
    }

    #[test]
    fn invalid_inverter_mask_is_empty() {
        assert!(InverterMask::from_binary_str("12").is_empty());
        assert!(InverterMask::from_binary_str("").is_empty());
        assert!(InverterMask::from_binary_str("111111111").is_empty());
    }

    #[test]
    fn inverter_mask_xors_raw_status() {
        let mask = InverterMask::new(0xFF);
        assert_eq!(mask.apply(0x01), 0xFE);
        assert_eq!(InverterMask::default().apply(0x5A), 0x5A);
    }
}

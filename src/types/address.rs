// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Module address type.
//!
//! Every device on the bus is addressed by a 24-bit number written as
//! hexadecimal. The gateway pads addresses with spaces on the wire, so the
//! textual forms differ from the numeric identity: two addresses are equal
//! when their integer values are equal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValueError;

/// Width of an address field in a frame.
pub const ADDRESS_WIDTH: usize = 6;

/// A 24-bit module address.
///
/// # Examples
///
/// ```
/// use domintell_lib::types::ModuleAddress;
///
/// let address = ModuleAddress::from_hex("1a").unwrap();
/// assert_eq!(address.value(), 26);
/// assert_eq!(address.to_string(), "00001A");
/// assert_eq!(address.wire(), "    1A");
/// assert_eq!(address.hex(), "1A");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleAddress(u32);

impl ModuleAddress {
    /// Largest representable address.
    pub const MAX: u32 = 0x00FF_FFFF;

    /// Creates an address from its numeric value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if the value does not fit in 24 bits.
    pub fn new(value: u32) -> Result<Self, ValueError> {
        if value > Self::MAX {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: Self::MAX,
                actual: value,
            });
        }
        Ok(Self(value))
    }

    /// Parses an address from its hexadecimal form.
    ///
    /// Surrounding whitespace is ignored since the gateway pads address
    /// fields with spaces.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidAddress` if the text is empty, not
    /// hexadecimal or larger than 24 bits.
    pub fn from_hex(text: &str) -> Result<Self, ValueError> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.len() > ADDRESS_WIDTH {
            return Err(ValueError::InvalidAddress(text.to_string()));
        }
        u32::from_str_radix(trimmed, 16)
            .map(Self)
            .map_err(|_| ValueError::InvalidAddress(text.to_string()))
    }

    /// Returns the numeric address.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Returns the unpadded uppercase hexadecimal form.
    #[must_use]
    pub fn hex(&self) -> String {
        format!("{:X}", self.0)
    }

    /// Returns the address as it appears in outbound frames: right-aligned
    /// in a six character field padded with spaces.
    #[must_use]
    pub fn wire(&self) -> String {
        format!("{:>width$X}", self.0, width = ADDRESS_WIDTH)
    }
}

impl fmt::Display for ModuleAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06X}", self.0)
    }
}

impl FromStr for ModuleAddress {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<u32> for ModuleAddress {
    type Error = ValueError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Serialize for ModuleAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ModuleAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_hex() {
        let address = ModuleAddress::from_hex("1a").unwrap();
        assert_eq!(address.value(), 26);
        assert_eq!(address.to_string(), "00001A");
    }

    #[test]
    fn parses_space_padded_field() {
        let address = ModuleAddress::from_hex("  2B3F").unwrap();
        assert_eq!(address.value(), 0x2B3F);
    }

    #[test]
    fn canonical_form_is_always_six_chars() {
        for value in [0, 0xF, 0xABC, 0x01_A2B3, ModuleAddress::MAX] {
            let address = ModuleAddress::new(value).unwrap();
            assert_eq!(address.to_string().len(), ADDRESS_WIDTH);
            assert_eq!(address.wire().len(), ADDRESS_WIDTH);
        }
    }

    #[test]
    fn wire_form_is_space_padded() {
        let address = ModuleAddress::new(0x1A).unwrap();
        assert_eq!(address.wire(), "    1A");
        let address = ModuleAddress::new(0x01_A2B3).unwrap();
        assert_eq!(address.wire(), " 1A2B3");
    }

    #[test]
    fn compares_by_value_not_text() {
        let padded = ModuleAddress::from_hex("00001A").unwrap();
        let spaced = ModuleAddress::from_hex("    1a").unwrap();
        assert_eq!(padded, spaced);
    }

    #[test]
    fn rejects_invalid_text() {
        assert!(ModuleAddress::from_hex("").is_err());
        assert!(ModuleAddress::from_hex("   ").is_err());
        assert!(ModuleAddress::from_hex("XYZ").is_err());
        assert!(ModuleAddress::from_hex("1000000").is_err());
    }

    #[test]
    fn rejects_values_over_24_bits() {
        let err = ModuleAddress::new(0x0100_0000).unwrap_err();
        assert!(matches!(err, ValueError::OutOfRange { .. }));
    }

    #[test]
    fn serializes_as_canonical_string() {
        let address = ModuleAddress::new(0x2A).unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, "\"00002A\"");
        let back: ModuleAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thermostat set-point formatting.
//!
//! The gateway expects the set-point as two integer digits and one fraction
//! digit (`18.0`, `05.5`). The value is rounded to the nearest tenth, ties
//! going to the even tenth. Rounding works on the exact binary value of the
//! `f32`, so `18.25` (exactly representable) rounds to `18.2` while `18.35`
//! (stored as `18.3500004`) rounds to `18.4`. Only the two least significant
//! integer digits are kept.

use std::fmt;

use crate::error::ValueError;

/// A finite thermostat set-point in degrees Celsius.
///
/// # Examples
///
/// ```
/// use domintell_lib::command::SetPoint;
///
/// let set_point = SetPoint::new(18.0).unwrap();
/// assert_eq!(set_point.to_string(), "18.0");
/// assert!(SetPoint::new(f32::NAN).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct SetPoint(f32);

impl SetPoint {
    /// Creates a set-point.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidSetPoint` for NaN or infinite values.
    pub fn new(value: f32) -> Result<Self, ValueError> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(ValueError::InvalidSetPoint(value))
        }
    }

    /// Returns the set-point in degrees Celsius.
    #[must_use]
    pub const fn value(&self) -> f32 {
        self.0
    }
}

impl fmt::Display for SetPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_set_point(self.0).unwrap_or_default())
    }
}

/// Formats a set-point for the `%T` operator.
///
/// Returns `None` for NaN or infinite input.
///
/// # Examples
///
/// ```
/// use domintell_lib::command::format_set_point;
///
/// assert_eq!(format_set_point(18.0).as_deref(), Some("18.0"));
/// assert_eq!(format_set_point(5.25).as_deref(), Some("05.2"));
/// assert_eq!(format_set_point(f32::NAN), None);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation)] // saturating cast, the value is reduced modulo 100 below
pub fn format_set_point(value: f32) -> Option<String> {
    if !value.is_finite() {
        return None;
    }

    // f32 to f64 widening and the scaling by ten are both exact
    let tenths = (f64::from(value) * 10.0).round_ties_even() as i64;
    let magnitude = tenths.unsigned_abs();
    let sign = if tenths < 0 { "-" } else { "" };
    let integer = (magnitude / 10) % 100;
    let fraction = magnitude % 10;
    Some(format!("{sign}{integer:02}.{fraction}"))
}

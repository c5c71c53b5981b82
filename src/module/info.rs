// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Descriptive records returned by `APPINFO`.

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Name and location of a module or channel, as configured on the master.
///
/// Records have the shape `name[location]` optionally followed by
/// `[extra]`.
///
/// # Examples
///
/// ```
/// use domintell_lib::module::ModuleInfo;
///
/// let info = ModuleInfo::parse("Kitchen light[Ground floor][TYPE=LIGHT]").unwrap();
/// assert_eq!(info.name, "Kitchen light");
/// assert_eq!(info.location, "Ground floor");
/// assert_eq!(info.extra.as_deref(), Some("TYPE=LIGHT"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    /// Display name.
    pub name: String,
    /// Room or zone.
    pub location: String,
    /// Free-form trailing section, if present.
    pub extra: Option<String>,
}

impl ModuleInfo {
    /// Parses an info record.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidAppInfo` if the location brackets are
    /// missing.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let invalid = || ParseError::InvalidAppInfo(text.to_string());

        let open = text.find('[').ok_or_else(invalid)?;
        let close = text[open..].find(']').map(|i| open + i).ok_or_else(invalid)?;
        let rest = &text[close + 1..];

        let extra = rest.find('[').map(|start| {
            let extra = &rest[start + 1..];
            extra.strip_suffix(']').unwrap_or(extra).to_string()
        });

        Ok(Self {
            name: text[..open].to_string(),
            location: text[open + 1..close].to_string(),
            extra,
        })
    }
}

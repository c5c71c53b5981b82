// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for the Domintell bus.
//!
//! These types validate their contents at construction so that the codec
//! and the registry only ever handle well-formed addresses, channels and
//! modes.

mod address;
mod channel;
mod clock;
mod module_type;
mod regulation;

pub use address::{ADDRESS_WIDTH, ModuleAddress};
pub use channel::{Channel, InverterMask};
pub use clock::SystemClock;
pub use module_type::{ModuleKind, ModuleType};
pub use regulation::RegulationMode;

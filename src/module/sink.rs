// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Observer for decoded module status.

use std::sync::Arc;

use parking_lot::RwLock;

use super::{IoState, Module, TemperatureStatus};

/// Decoded status carried to an [`UpdateSink`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModuleUpdate {
    /// Relay or input channel states, after the inverter mask.
    Io(IoState),
    /// Levels of the eight dimmer channels.
    Dimmer([u8; 8]),
    /// Thermostat reading.
    Temperature(TemperatureStatus),
    /// Value of a system variable.
    Variable(u32),
}

/// Receives every status update decoded by a module.
///
/// Implemented for any `Fn(&Module, &ModuleUpdate)` closure.
///
/// # Examples
///
/// ```
/// use domintell_lib::module::{Module, ModuleUpdate, UpdateSink};
///
/// fn log_updates() -> impl UpdateSink {
///     |module: &Module, update: &ModuleUpdate| {
///         println!("{} {:?}", module.address(), update);
///     }
/// }
/// ```
pub trait UpdateSink: Send + Sync {
    /// Called after the module stored a new decoded status.
    fn module_updated(&self, module: &Module, update: &ModuleUpdate);
}

impl<F> UpdateSink for F
where
    F: Fn(&Module, &ModuleUpdate) + Send + Sync,
{
    fn module_updated(&self, module: &Module, update: &ModuleUpdate) {
        self(module, update);
    }
}

/// Holds the single sink registered on a module.
#[derive(Default)]
pub(crate) struct SinkSlot {
    sink: RwLock<Option<Arc<dyn UpdateSink>>>,
}

impl SinkSlot {
    pub(crate) fn replace(&self, sink: Arc<dyn UpdateSink>) -> Option<Arc<dyn UpdateSink>> {
        self.sink.write().replace(sink)
    }

    pub(crate) fn take(&self) -> Option<Arc<dyn UpdateSink>> {
        self.sink.write().take()
    }

    pub(crate) fn is_set(&self) -> bool {
        self.sink.read().is_some()
    }

    pub(crate) fn dispatch(&self, module: &Module, update: &ModuleUpdate) {
        // Clone out so a sink may replace itself without deadlocking
        let sink = self.sink.read().clone();
        if let Some(sink) = sink {
            sink.module_updated(module, update);
        }
    }
}

impl std::fmt::Debug for SinkSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkSlot")
            .field("registered", &self.is_set())
            .finish()
    }
}

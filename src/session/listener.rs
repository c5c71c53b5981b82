// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host callbacks for connection and discovery events.

use std::sync::Arc;

use crate::module::Module;

use super::ConnectionState;

/// Receives every connection state change.
///
/// Implemented for any `Fn(ConnectionState, Option<&str>)` closure.
pub trait StateListener: Send + Sync {
    /// Called after the state was published.
    fn state_changed(&self, state: ConnectionState, message: Option<&str>);
}

impl<F> StateListener for F
where
    F: Fn(ConnectionState, Option<&str>) + Send + Sync,
{
    fn state_changed(&self, state: ConnectionState, message: Option<&str>) {
        self(state, message);
    }
}

/// Told about each module the first time it is seen.
///
/// Implemented for any `Fn(&Arc<Module>)` closure.
pub trait DiscoveryListener: Send + Sync {
    /// Called once per newly created module.
    fn module_discovered(&self, module: &Arc<Module>);
}

impl<F> DiscoveryListener for F
where
    F: Fn(&Arc<Module>) + Send + Sync,
{
    fn module_discovered(&self, module: &Arc<Module>) {
        self(module);
    }
}

/// Listener that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl StateListener for NoopListener {
    fn state_changed(&self, _state: ConnectionState, _message: Option<&str>) {}
}

impl DiscoveryListener for NoopListener {
    fn module_discovered(&self, _module: &Arc<Module>) {}
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cache of known bus modules.
//!
//! Modules are created lazily the first time they are resolved, either by
//! the host asking for a module or by a status frame naming one. Each
//! `(type, address)` pair maps to exactly one shared instance for the
//! lifetime of the registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ModuleError;
use crate::module::{Module, ModuleKey};
use crate::protocol::CommandQueue;
use crate::session::DiscoveryListener;
use crate::types::{ModuleAddress, ModuleType};

/// Length of the type token at the start of a status frame.
const TYPE_LEN: usize = 3;

/// Length of the type token plus the address.
const HEADER_LEN: usize = 9;

/// Thread-safe map from module key to module.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use domintell_lib::protocol::CommandQueue;
/// use domintell_lib::registry::ModuleRegistry;
/// use domintell_lib::session::NoopListener;
/// use domintell_lib::types::{ModuleAddress, ModuleType};
///
/// let registry = ModuleRegistry::new(CommandQueue::new(), Arc::new(NoopListener));
/// let address = ModuleAddress::from_hex("1A").unwrap();
///
/// let first = registry.resolve(ModuleType::Bir, address).unwrap();
/// let second = registry.resolve(ModuleType::Bir, address).unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
pub struct ModuleRegistry {
    modules: Mutex<HashMap<ModuleKey, Arc<Module>>>,
    queue: CommandQueue,
    discovery: Arc<dyn DiscoveryListener>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    ///
    /// Modules it creates push their commands to `queue`; each creation is
    /// reported once to `discovery`.
    #[must_use]
    pub fn new(queue: CommandQueue, discovery: Arc<dyn DiscoveryListener>) -> Self {
        Self {
            modules: Mutex::new(HashMap::new()),
            queue,
            discovery,
        }
    }

    /// Returns the module for a key, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::VariantMismatch` if the cached module at this
    /// key is of a different variant than `module_type` implies.
    pub fn resolve(
        &self,
        module_type: ModuleType,
        address: ModuleAddress,
    ) -> Result<Arc<Module>, ModuleError> {
        let key = ModuleKey::new(module_type, address);
        let created = {
            let mut modules = self.modules.lock();
            if let Some(module) = modules.get(&key) {
                let expected = module_type.kind();
                if module.kind() != expected {
                    return Err(ModuleError::VariantMismatch {
                        address,
                        expected,
                        found: module.kind(),
                    });
                }
                return Ok(Arc::clone(module));
            }

            let module = Arc::new(Module::new(module_type, address, self.queue.clone()));
            modules.insert(key, Arc::clone(&module));
            module
        };

        tracing::debug!(module = %key, kind = ?created.kind(), "Module discovered");
        self.discovery.module_discovered(&created);
        Ok(created)
    }

    /// Routes a status frame to its module.
    ///
    /// The frame is a three character type token, a six character address
    /// and the payload. Frames that cannot be routed are logged and
    /// ignored. Returns the module the payload was given to.
    pub fn dispatch_status(&self, frame: &str) -> Option<Arc<Module>> {
        let (Some(type_token), Some(address), Some(payload)) = (
            frame.get(..TYPE_LEN),
            frame.get(TYPE_LEN..HEADER_LEN),
            frame.get(HEADER_LEN..),
        ) else {
            tracing::debug!(frame, "Frame too short for a status message, ignoring");
            return None;
        };

        let module_type = match type_token.parse::<ModuleType>() {
            Ok(module_type) => module_type,
            Err(e) => {
                tracing::debug!(frame, error = %e, "Unsupported module type, ignoring");
                return None;
            }
        };
        let address = match ModuleAddress::from_hex(address) {
            Ok(address) => address,
            Err(e) => {
                tracing::debug!(frame, error = %e, "Invalid module address, ignoring");
                return None;
            }
        };

        match self.resolve(module_type, address) {
            Ok(module) => {
                module.decode(payload.trim());
                Some(module)
            }
            Err(e) => {
                tracing::warn!(frame, error = %e, "Unable to resolve module");
                None
            }
        }
    }

    /// Returns a cached module without creating it.
    #[must_use]
    pub fn get(&self, module_type: ModuleType, address: ModuleAddress) -> Option<Arc<Module>> {
        self.modules
            .lock()
            .get(&ModuleKey::new(module_type, address))
            .cloned()
    }

    /// Returns the number of known modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.lock().len()
    }

    /// Returns true if no module is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.lock().is_empty()
    }

    /// Returns a snapshot of the known modules, ordered by key.
    #[must_use]
    pub fn modules(&self) -> Vec<Arc<Module>> {
        let mut modules: Vec<_> = self.modules.lock().values().cloned().collect();
        modules.sort_by_key(|module| module.key());
        modules
    }

    /// Forgets every module.
    pub fn clear(&self) {
        self.modules.lock().clear();
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.len())
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::module::IoState;
    use crate::session::NoopListener;
    use crate::types::{Channel, ModuleKind};

    fn registry() -> ModuleRegistry {
        ModuleRegistry::new(CommandQueue::new(), Arc::new(NoopListener))
    }

    fn counting_registry() -> (ModuleRegistry, Arc<AtomicU32>) {
        let count = Arc::new(AtomicU32::new(0));
        let count_clone = count.clone();
        let listener = move |_: &Arc<Module>| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        };
        (ModuleRegistry::new(CommandQueue::new(), Arc::new(listener)), count)
    }

    fn address(text: &str) -> ModuleAddress {
        ModuleAddress::from_hex(text).unwrap()
    }

    #[test]
    fn resolve_returns_same_instance() {
        let registry = registry();
        for module_type in ModuleType::ALL {
            let first = registry.resolve(module_type, address("10")).unwrap();
            let second = registry.resolve(module_type, address("10")).unwrap();
            assert!(Arc::ptr_eq(&first, &second));
        }
        assert_eq!(registry.len(), ModuleType::ALL.len());
    }

    #[test]
    fn discovery_reported_once_per_key() {
        let (registry, count) = counting_registry();
        registry.resolve(ModuleType::Bir, address("1")).unwrap();
        registry.resolve(ModuleType::Bir, address("1")).unwrap();
        registry.resolve(ModuleType::Dmr, address("1")).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dispatch_creates_relay_and_decodes() {
        let registry = registry();
        let module = registry.dispatch_status("BIR01A2B3I01").unwrap();

        assert_eq!(module.kind(), ModuleKind::Relay);
        assert_eq!(module.address().value(), 0x01_A2B3);
        assert_eq!(module.io_state(), Some(IoState::new(0x01)));
        assert!(module.io_state().unwrap().is_active(Channel::new(1).unwrap()));

        let cached = registry.get(ModuleType::Bir, address("01A2B3")).unwrap();
        assert!(Arc::ptr_eq(&module, &cached));
    }

    #[test]
    fn dispatch_accepts_space_padded_address() {
        let registry = registry();
        let module = registry.dispatch_status("VAR    2AO05").unwrap();
        assert_eq!(module.address().value(), 0x2A);
        assert_eq!(module.variable_value(), Some(5));
    }

    #[test]
    fn dispatch_ignores_unroutable_frames() {
        let (registry, count) = counting_registry();
        assert!(registry.dispatch_status("BIR01A2").is_none());
        assert!(registry.dispatch_status("XYZ01A2B3I01").is_none());
        assert!(registry.dispatch_status("BIRZZZZZZI01").is_none());
        assert!(registry.is_empty());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dispatch_ignores_non_latin_header() {
        let registry = registry();
        assert!(registry.dispatch_status("BIé1A2B3I01").is_none());
    }

    #[test]
    fn modules_snapshot_is_sorted() {
        let registry = registry();
        registry.resolve(ModuleType::Var, address("2")).unwrap();
        registry.resolve(ModuleType::Bir, address("9")).unwrap();
        registry.resolve(ModuleType::Bir, address("3")).unwrap();

        let keys: Vec<String> = registry
            .modules()
            .iter()
            .map(|m| m.key().to_string())
            .collect();
        assert_eq!(keys, vec!["BIR000003", "BIR000009", "VAR000002"]);
    }

    #[test]
    fn clear_forgets_modules() {
        let registry = registry();
        let before = registry.resolve(ModuleType::Is4, address("4")).unwrap();
        registry.clear();
        assert!(registry.is_empty());

        let after = registry.resolve(ModuleType::Is4, address("4")).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn concurrent_resolve_yields_one_instance() {
        let (registry, count) = counting_registry();
        let registry = Arc::new(registry);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.resolve(ModuleType::Dim, address("77")).unwrap())
            })
            .collect();
        let modules: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(modules.iter().all(|m| Arc::ptr_eq(m, &modules[0])));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}

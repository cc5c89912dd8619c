//! Process-wide memo of dependency install locations.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::requirements::HostFacts;

type Slot = Arc<Mutex<Option<PathBuf>>>;

/// Memoized dependency install paths.
///
/// Safe to share between concurrent builds. Each dependency is looked up
/// at most once successfully: a caller resolving a name holds that name's
/// slot for the duration of the lookup, so racing callers wait and then
/// observe the stored path. Failed lookups are not stored.
#[derive(Debug, Default)]
pub struct InstallPathCache {
    slots: RwLock<HashMap<String, Slot>>,
}

impl InstallPathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The memoized path for `name`, resolving it through `host` on first use.
    pub fn get_or_resolve(&self, name: &str, host: &dyn HostFacts) -> Option<PathBuf> {
        let slot = self.slot(name);
        let mut stored = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(path) = stored.as_ref() {
            return Some(path.clone());
        }

        let resolved = host.dependency_prefix(name);
        if let Some(path) = &resolved {
            tracing::debug!("memoized install path for {}: {}", name, path.display());
            *stored = Some(path.clone());
        }
        resolved
    }

    /// The memoized path, without resolving.
    pub fn get(&self, name: &str) -> Option<PathBuf> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let slot = slots.get(name)?;
        let stored = slot.lock().unwrap_or_else(PoisonError::into_inner);
        stored.clone()
    }

    /// Number of memoized paths.
    pub fn len(&self) -> usize {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots
            .values()
            .filter(|s| s.lock().unwrap_or_else(PoisonError::into_inner).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, name: &str) -> Slot {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(name.to_string()).or_default())
    }
}

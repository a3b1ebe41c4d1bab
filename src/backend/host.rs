//! Host Environment
//!
//! The host decides whether storage exists at all and which named storage
//! areas are available. A store resolves its backend by name through the host
//! at construction time.

use crate::backend::{Backend, MemoryBackend};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Name of the per-session storage area.
pub const SESSION_STORAGE: &str = "sessionStorage";

/// Name of the persistent storage area.
pub const LOCAL_STORAGE: &str = "localStorage";

/// An environment that may provide named storage areas.
pub trait Host: Send + Sync {
    /// Returns true if the environment has a storage capability at all.
    fn is_supported(&self) -> bool;

    /// Looks up a storage area by name.
    fn storage(&self, name: &str) -> Option<Arc<dyn Backend>>;
}

/// A host whose storage areas live in process memory unless replaced.
///
/// `MemoryHost::new()` provides in-memory `sessionStorage` and `localStorage`.
/// Any area can be swapped for another backend, for example a
/// [`FileBackend`](crate::backend::FileBackend) for `localStorage`.
pub struct MemoryHost {
    supported: bool,
    stores: RwLock<HashMap<String, Arc<dyn Backend>>>,
}

impl std::fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("MemoryHost")
            .field("supported", &self.supported)
            .field("stores", &stores.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Creates a host with empty in-memory session and local storage.
    pub fn new() -> Self {
        let host = Self::empty();
        host.register(SESSION_STORAGE, Arc::new(MemoryBackend::new()));
        host.register(LOCAL_STORAGE, Arc::new(MemoryBackend::new()));
        host
    }

    /// Creates a supported host with no storage areas.
    pub fn empty() -> Self {
        Self {
            supported: true,
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a host that reports no storage capability.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Replaces a named storage area, returning `self` for chaining.
    pub fn with_storage(self, name: &str, backend: Arc<dyn Backend>) -> Self {
        self.register(name, backend);
        self
    }

    /// Installs or replaces a named storage area.
    pub fn register(&self, name: &str, backend: Arc<dyn Backend>) {
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        stores.insert(name.to_string(), backend);
    }
}

impl Host for MemoryHost {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn storage(&self, name: &str) -> Option<Arc<dyn Backend>> {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        stores.get(name).cloned()
    }
}

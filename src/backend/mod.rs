//! Raw Storage Backends
//!
//! This module defines the capability the store is built on: a synchronous,
//! string-to-string key-value area shaped like browser web storage. The store
//! never owns the bytes; it reads and writes them through a [`Backend`] that
//! other namespaces and other store instances may share.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                         Host                             │
//! │   is_supported()          storage("sessionStorage")      │
//! │                           storage("localStorage")        │
//! └───────────────┬──────────────────────────┬───────────────┘
//!                 │                          │
//!                 ▼                          ▼
//!        ┌─────────────────┐        ┌─────────────────┐
//!        │  MemoryBackend  │        │   FileBackend   │
//!        │  (RwLock map)   │        │ (JSON on disk)  │
//!        └─────────────────┘        └─────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use stashkv::backend::{Backend, MemoryBackend};
//!
//! let backend = MemoryBackend::new();
//! backend.set("app.name", "\"Ariz\"".to_string());
//! assert_eq!(backend.get("app.name").as_deref(), Some("\"Ariz\""));
//! assert_eq!(backend.keys(), vec!["app.name".to_string()]);
//! ```

pub mod file;
pub mod host;
pub mod memory;

pub use file::FileBackend;
pub use host::{Host, MemoryHost, LOCAL_STORAGE, SESSION_STORAGE};
pub use memory::MemoryBackend;

/// A synchronous string key-value area.
///
/// All methods take `&self`; implementations use interior locking so one
/// backend can be shared between store instances and their sweepers.
pub trait Backend: Send + Sync {
    /// Returns the raw value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String);

    /// Removes `key`. Removing a missing key is a no-op.
    fn remove(&self, key: &str);

    /// Removes every key.
    fn clear(&self);

    /// Returns a snapshot of all keys in enumeration order.
    fn keys(&self) -> Vec<String>;

    /// Availability probe run before a store binds to this backend.
    fn is_available(&self) -> bool {
        true
    }

    /// Returns the number of keys.
    fn len(&self) -> usize {
        self.keys().len()
    }

    /// Returns true if the backend holds no keys.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! # stashkv - Namespaced, Expiring Key-Value Storage
//!
//! stashkv layers namespaces and per-entry expiry over a synchronous,
//! string-valued key-value area shaped like browser web storage. Several
//! independent consumers can share one storage area without stepping on each
//! other's keys, and entries can expire after a time-to-live.
//!
//! ## Features
//!
//! - **Namespaces**: Every key is stored as `"<namespace>.<key>"`
//! - **TTL Support**: Values are wrapped in a JSON envelope with an optional expiry
//! - **Pluggable Backends**: In-memory, file-backed, or anything implementing [`Backend`]
//! - **Background Cleanup**: A Tokio task evicts expired entries on an interval
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              stashkv                                    │
//! │                                                                         │
//! │  ┌─────────────┐    ┌──────────────────┐    ┌──────────────────────┐    │
//! │  │   Caller    │───>│ NamespacedStore  │───>│  Backend (shared)    │    │
//! │  │             │<───│  envelope, ttl   │<───│  Memory / File / ... │    │
//! │  └─────────────┘    └──────────────────┘    └──────────────────────┘    │
//! │                                                        ▲                │
//! │                                                        │                │
//! │                     ┌──────────────────────────────────┴──────────────┐ │
//! │                     │           ExpirySweeper                         │ │
//! │                     │      (Background Tokio Task)                    │ │
//! │                     └─────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use stashkv::backend::MemoryHost;
//! use stashkv::{NamespacedStore, StoreConfig};
//! use serde_json::json;
//! use std::time::Duration;
//!
//! let host = MemoryHost::new();
//! let cart = NamespacedStore::open(&host, StoreConfig::default().with_namespace("cart")).unwrap();
//! let auth = NamespacedStore::open(&host, StoreConfig::default().with_namespace("auth")).unwrap();
//!
//! cart.set([("items", json!(["apple", "pear"]))], false, None);
//! auth.set([("token", json!("abc123"))], false, Some(Duration::from_secs(900)));
//!
//! assert_eq!(cart.keys(), vec!["items"]);
//! assert_eq!(auth.keys(), vec!["token"]);
//! ```
//!
//! ## Module Overview
//!
//! - [`backend`]: The raw storage capability and host environment
//! - [`storage`]: Envelope format, namespaced store, expiry sweeper, clocks
//! - [`config`]: Options recognized when opening a store
//! - [`error`]: Errors reported while opening a store
//!
//! ## Design Highlights
//!
//! ### Lazy Visibility + Active Expiry
//!
//! Keys with TTL are handled in two ways:
//! 1. **Lazy**: Reads check the expiry and treat expired entries as absent
//! 2. **Active**: A background task periodically removes them from the backend
//!
//! Reads never write, so a `get` on an expired key leaves it in place until
//! the next sweep.

pub mod backend;
pub mod config;
pub mod error;
pub mod storage;

// Re-export commonly used types for convenience
pub use backend::{Backend, FileBackend, Host, MemoryBackend, MemoryHost};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use storage::{ExpirySweeper, NamespacedStore, Visit};

/// Version of stashkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

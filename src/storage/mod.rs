//! Storage Module
//!
//! This module provides the namespacing and expiry logic layered on top of a
//! raw [`Backend`](crate::backend::Backend): the stored envelope format, the
//! namespaced store itself, the background expiry sweeper and the clocks it
//! reads time from.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    NamespacedStore                          │
//! │   "ns" + "." + key   ──>   Envelope { expiry, value }       │
//! └──────────────────────────────┬──────────────────────────────┘
//!                                │ get / set / remove / keys
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Backend (shared, raw strings)               │
//! └─────────────────────────────────────────────────────────────┘
//!                                ▲
//!                                │ cleanup()
//!              ┌─────────────────┴─────────┐
//!              │     ExpirySweeper         │
//!              │  (Background Tokio Task)  │
//!              └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Namespacing**: Independent consumers share one backend without collisions
//! - **TTL Support**: Entries can carry an absolute expiry timestamp
//! - **Lazy Visibility**: Expired entries are hidden from reads immediately
//! - **Active Expiry**: Background sweeper removes them from the backend
//!
//! ## Example
//!
//! ```
//! use stashkv::backend::MemoryBackend;
//! use stashkv::storage::{ManualClock, NamespacedStore};
//! use stashkv::StoreConfig;
//! use serde_json::json;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let clock = ManualClock::new(0);
//! let store = NamespacedStore::with_clock(
//!     Arc::new(MemoryBackend::new()),
//!     StoreConfig::default(),
//!     Arc::new(clock.clone()),
//! )
//! .unwrap();
//!
//! store.set([("otp", json!(123456))], false, Some(Duration::from_secs(30)));
//! assert!(store.has("otp"));
//!
//! clock.advance(Duration::from_secs(31));
//! assert!(!store.has("otp"));
//! assert_eq!(store.cleanup(), 1);
//! ```

pub mod clock;
pub mod envelope;
pub mod expiry;
pub mod namespaced;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use envelope::{Envelope, Lookup};
pub use expiry::{ExpirySweeper, Sweep};
pub use namespaced::{NamespacedStore, StoreStats, Visit, SEPARATOR};

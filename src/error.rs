//! Store Construction Errors
//!
//! Every failure the store can report happens while binding to a backend.
//! After construction, operations absorb problems (undecodable entries read as
//! absent) instead of returning errors.

use thiserror::Error;

/// Errors that can occur while opening a [`NamespacedStore`](crate::NamespacedStore).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The host has no storage capability
    #[error("storage is not supported by this host")]
    Unsupported,

    /// The named backend is missing or failed its availability probe
    #[error("storage \"{0}\" is not available")]
    Unavailable(String),

    /// The namespace contains the reserved separator
    #[error("invalid namespace {0:?}: must not contain '.'")]
    InvalidNamespace(String),

    /// Another consumer already stores keys under this namespace
    #[error("namespace {0:?} is already in use")]
    DuplicateNamespace(String),
}

/// Result type for store construction.
pub type StoreResult<T> = Result<T, StoreError>;

//! In-Memory Backend
//!
//! An insertion-ordered map behind an `RwLock`. New keys are appended to the
//! enumeration order, overwrites keep their position, removals drop the key.
//! This mirrors how web storage enumerates its keys closely enough for tests
//! that depend on ordering.

use crate::backend::Backend;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Default)]
struct Inner {
    data: HashMap<String, String>,
    order: Vec<String>,
}

/// A thread-safe, in-memory [`Backend`].
#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: RwLock<Inner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-populated with raw entries, in the given order.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let backend = Self::new();
        for (key, value) in entries {
            let key: String = key.into();
            backend.set(&key, value.into());
        }
        backend
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &str) -> Option<String> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.data.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.data.insert(key.to_string(), value).is_none() {
            inner.order.push(key.to_string());
        }
    }

    fn remove(&self, key: &str) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.data.remove(key).is_some() {
            inner.order.retain(|k| k != key);
        }
    }

    fn clear(&self) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.data.clear();
        inner.order.clear();
    }

    fn keys(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.order.clone()
    }

    fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.data.len()
    }
}

//! Namespaced, Expiring Store
//!
//! This module implements the store consumers actually talk to. It binds one
//! namespace to one shared [`Backend`] and maps every call onto raw reads and
//! writes of prefixed keys holding JSON [`Envelope`]s.
//!
//! ## Key Layout
//!
//! ```text
//!   local key        raw backend key
//!   ─────────        ───────────────
//!   "token"    ───>  "auth.token"
//!   "a.b.c"    ───>  "auth.a.b.c"      (namespace ends at the first '.')
//! ```
//!
//! ## Expiry
//!
//! Reads never evict. An expired entry is invisible to `get`, `keys`,
//! `iterate` and friends, but stays in the backend until [`NamespacedStore::cleanup`]
//! runs, either explicitly or from the background sweeper.
//!
//! ## Concurrency Model
//!
//! The sweeper runs on a Tokio task, so a store serializes its own
//! read-then-write operations (`set`, `remove_key`, `remove_value`, `clear`,
//! `cleanup`) behind one mutex. Each of those runs to completion before the
//! next starts. There is no coordination between different store instances
//! sharing a backend.

use crate::backend::{Backend, Host};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::storage::envelope::{Envelope, Lookup};
use crate::storage::expiry::{ExpirySweeper, Sweep};
use crate::storage::{Clock, SystemClock};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Separator between the namespace and the local key.
pub const SEPARATOR: char = '.';

/// What an [`iterate`](NamespacedStore::iterate) callback wants next.
///
/// Callbacks may return `Visit` directly, a `bool` (`false` stops), or `()`
/// which always continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    Stop,
}

impl From<()> for Visit {
    fn from(_: ()) -> Self {
        Visit::Continue
    }
}

impl From<bool> for Visit {
    fn from(keep_going: bool) -> Self {
        if keep_going {
            Visit::Continue
        } else {
            Visit::Stop
        }
    }
}

/// Operation counters for one store instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub get_ops: u64,
    pub set_ops: u64,
    pub del_ops: u64,
    /// Entries evicted by cleanup passes
    pub expired: u64,
}

/// State shared between a store handle and its sweeper task.
struct StoreInner {
    backend: Arc<dyn Backend>,
    namespace: String,
    /// `namespace` followed by the separator
    prefix: String,
    clock: Arc<dyn Clock>,

    /// Serializes read-then-write operations against the sweeper
    op_lock: Mutex<()>,

    get_count: AtomicU64,
    set_count: AtomicU64,
    del_count: AtomicU64,
    expired_count: AtomicU64,
}

impl StoreInner {
    fn lock(&self) -> MutexGuard<'_, ()> {
        self.op_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn raw_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Snapshot of `(raw key, local key)` pairs in this namespace.
    ///
    /// Taken up front so removals during a scan cannot disturb it.
    fn namespaced_keys(&self) -> Vec<(String, String)> {
        self.backend
            .keys()
            .into_iter()
            .filter_map(|raw| {
                let local = raw.strip_prefix(&self.prefix)?.to_string();
                Some((raw, local))
            })
            .collect()
    }

    fn lookup_raw(&self, raw_key: &str, now_ms: u64) -> Lookup {
        let raw = self.backend.get(raw_key);
        let lookup = Lookup::classify(raw.as_deref(), now_ms);
        if raw.is_some() && lookup == Lookup::Absent {
            warn!(key = raw_key, "Ignoring entry that is not a valid envelope");
        }
        lookup
    }

    fn lookup(&self, key: &str) -> Lookup {
        self.get_count.fetch_add(1, Ordering::Relaxed);
        self.lookup_raw(&self.raw_key(key), self.clock.now_ms())
    }

    /// Walks live entries in backend order until `visit` says stop.
    ///
    /// Returns `Visit::Stop` if the walk was cut short.
    fn scan<F>(&self, mut visit: F) -> Visit
    where
        F: FnMut(&str, &str, Value) -> Visit,
    {
        for (raw, local) in self.namespaced_keys() {
            let now = self.clock.now_ms();
            if let Lookup::Live(value) = self.lookup_raw(&raw, now) {
                if visit(&raw, &local, value) == Visit::Stop {
                    return Visit::Stop;
                }
            }
        }
        Visit::Continue
    }

    fn cleanup(&self) -> usize {
        let _guard = self.lock();
        let now = self.clock.now_ms();
        let mut evicted = 0usize;

        for (raw, _) in self.namespaced_keys() {
            let Some(text) = self.backend.get(&raw) else {
                continue;
            };
            match Envelope::decode(&text) {
                Ok(envelope) if envelope.is_expired(now) => {
                    self.backend.remove(&raw);
                    evicted += 1;
                    trace!(key = %raw, "Evicted expired entry");
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(key = %raw, error = %e, "Skipping undecodable entry during cleanup");
                }
            }
        }

        if evicted > 0 {
            self.expired_count
                .fetch_add(evicted as u64, Ordering::Relaxed);
            debug!(namespace = %self.namespace, evicted, "Cleanup pass finished");
        }

        evicted
    }
}

impl Sweep for StoreInner {
    fn sweep(&self) -> usize {
        self.cleanup()
    }

    fn label(&self) -> &str {
        &self.namespace
    }
}

/// A namespaced view over a shared [`Backend`] with per-entry expiry.
///
/// # Example
///
/// ```
/// use stashkv::backend::MemoryBackend;
/// use stashkv::{NamespacedStore, StoreConfig};
/// use serde_json::json;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let backend = Arc::new(MemoryBackend::new());
/// let store = NamespacedStore::with_backend(backend, StoreConfig::default().with_namespace("auth"))
///     .unwrap();
///
/// store.set([("user", json!("Ariz"))], false, None);
/// store.set([("token", json!("abc123"))], false, Some(Duration::from_secs(3600)));
///
/// assert_eq!(store.get("user"), Some(json!("Ariz")));
/// assert_eq!(store.keys(), vec!["user", "token"]);
/// ```
pub struct NamespacedStore {
    inner: Arc<StoreInner>,
    /// Present while a background sweep is scheduled
    sweeper: Option<ExpirySweeper>,
}

impl std::fmt::Debug for NamespacedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespacedStore")
            .field("namespace", &self.inner.namespace)
            .field("sweeper", &self.sweeper.is_some())
            .field("stats", &self.stats())
            .finish()
    }
}

impl NamespacedStore {
    /// Returns true if `host` has any storage capability.
    pub fn is_supported(host: &dyn Host) -> bool {
        host.is_supported()
    }

    /// Opens a store on the backend `host` provides under `config.store`.
    ///
    /// Fails, logging a diagnostic, when the host has no storage, the named
    /// backend is missing or unavailable, or the namespace is rejected.
    pub fn open(host: &dyn Host, config: StoreConfig) -> StoreResult<Self> {
        Self::open_with_clock(host, config, Arc::new(SystemClock))
    }

    /// Like [`open`](Self::open), reading time from `clock`.
    pub fn open_with_clock(
        host: &dyn Host,
        config: StoreConfig,
        clock: Arc<dyn Clock>,
    ) -> StoreResult<Self> {
        if !host.is_supported() {
            error!("Storage is not supported by this host");
            return Err(StoreError::Unsupported);
        }

        let Some(backend) = host.storage(&config.store) else {
            error!(store = %config.store, "Storage is not available");
            return Err(StoreError::Unavailable(config.store));
        };

        Self::with_clock(backend, config, clock)
    }

    /// Opens a store directly on `backend`. `config.store` is only used in
    /// diagnostics.
    pub fn with_backend(backend: Arc<dyn Backend>, config: StoreConfig) -> StoreResult<Self> {
        Self::with_clock(backend, config, Arc::new(SystemClock))
    }

    /// Opens a store directly on `backend`, reading time from `clock`.
    pub fn with_clock(
        backend: Arc<dyn Backend>,
        config: StoreConfig,
        clock: Arc<dyn Clock>,
    ) -> StoreResult<Self> {
        if !backend.is_available() {
            error!(store = %config.store, "Storage is not available");
            return Err(StoreError::Unavailable(config.store));
        }

        let namespace = config.namespace.clone();
        if namespace.contains(SEPARATOR) {
            error!(namespace = %namespace, "Namespace must not contain '.'");
            return Err(StoreError::InvalidNamespace(namespace));
        }

        let prefix = format!("{}{}", namespace, SEPARATOR);
        if !config.allow_duplicate_namespaces
            && backend.keys().iter().any(|key| key.starts_with(&prefix))
        {
            error!(namespace = %namespace, "Namespace is already in use");
            return Err(StoreError::DuplicateNamespace(namespace));
        }

        let inner = Arc::new(StoreInner {
            backend,
            namespace,
            prefix,
            clock,
            op_lock: Mutex::new(()),
            get_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            del_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        });

        inner.cleanup();

        let sweeper = ExpirySweeper::start(Arc::clone(&inner), config.cleanup_interval());
        if sweeper.is_none() {
            warn!(
                namespace = %inner.namespace,
                "No async runtime available, periodic cleanup disabled"
            );
        }

        info!(namespace = %inner.namespace, store = %config.store, "Namespaced store opened");

        Ok(Self { inner, sweeper })
    }

    /// Returns the namespace this store writes under.
    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    /// Returns the shared backend.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.inner.backend
    }

    /// Gets the value for a key.
    ///
    /// Returns `None` if the key doesn't exist, has expired, or holds text
    /// that is not a valid envelope. Expired entries are left in place.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.lookup(key).into_value()
    }

    /// Returns every live entry in backend enumeration order.
    pub fn get_all(&self) -> Map<String, Value> {
        let mut all = Map::new();
        self.inner.scan(|_, local, value| {
            all.insert(local.to_string(), value);
            Visit::Continue
        });
        all
    }

    /// Writes each entry of `data`.
    ///
    /// A key that already holds a live value is skipped unless `overwrite` is
    /// set. An expired entry counts as absent. A non-zero `ttl` makes the new
    /// entries expire that long from now.
    ///
    /// # Returns
    ///
    /// Returns the number of entries written.
    pub fn set<I, K>(&self, data: I, overwrite: bool, ttl: Option<Duration>) -> usize
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let _guard = self.inner.lock();
        let mut written = 0;

        for (key, value) in data {
            let key = key.as_ref();
            if !overwrite && self.inner.lookup(key).is_live() {
                trace!(namespace = %self.inner.namespace, key, "Keeping existing value");
                continue;
            }

            let envelope = Envelope::with_ttl(value, self.inner.clock.now_ms(), ttl);
            self.inner
                .backend
                .set(&self.inner.raw_key(key), envelope.encode());
            self.inner.set_count.fetch_add(1, Ordering::Relaxed);
            written += 1;
        }

        written
    }

    /// Deletes a key and returns the value it held.
    ///
    /// The raw entry is always removed; an expired entry yields `None`.
    pub fn remove_key(&self, key: &str) -> Option<Value> {
        let _guard = self.inner.lock();
        let previous = self.inner.lookup(key).into_value();

        self.inner.backend.remove(&self.inner.raw_key(key));
        self.inner.del_count.fetch_add(1, Ordering::Relaxed);

        previous
    }

    /// Removes every live entry strictly equal to `value`.
    ///
    /// Primitives (null, booleans, numbers, strings) compare by value.
    /// Arrays and objects never match: a freshly decoded composite is never
    /// the same value as the caller's.
    ///
    /// # Returns
    ///
    /// The removed local keys, in scan order.
    pub fn remove_value(&self, value: &Value) -> Vec<String> {
        let _guard = self.inner.lock();
        let mut removed = Vec::new();

        self.inner.scan(|raw, local, stored| {
            if strictly_equal(&stored, value) {
                self.inner.backend.remove(raw);
                self.inner.del_count.fetch_add(1, Ordering::Relaxed);
                removed.push(local.to_string());
            }
            Visit::Continue
        });

        removed
    }

    /// Runs one eviction pass over this namespace.
    ///
    /// Removes entries whose expiry is set and in the past. Entries without
    /// an expiry are never touched, nor are entries that fail to decode.
    ///
    /// # Returns
    ///
    /// Returns the number of entries that were evicted.
    pub fn cleanup(&self) -> usize {
        self.inner.cleanup()
    }

    /// Calls `callback` for each live entry in backend order.
    ///
    /// Iteration stops as soon as the callback returns `false` or
    /// [`Visit::Stop`]. Returning `()` or `true` continues.
    ///
    /// The callback may call back into the store; each entry is read just
    /// before it is visited.
    ///
    /// # Example
    ///
    /// ```
    /// # use stashkv::backend::MemoryBackend;
    /// # use stashkv::{NamespacedStore, StoreConfig};
    /// # use serde_json::json;
    /// # use std::sync::Arc;
    /// let store = NamespacedStore::with_backend(Arc::new(MemoryBackend::new()), StoreConfig::default())
    ///     .unwrap();
    /// store.set([("a", json!(1)), ("b", json!(2)), ("c", json!(3))], false, None);
    ///
    /// let mut seen = Vec::new();
    /// store.iterate(|key, _| {
    ///     seen.push(key.to_string());
    ///     key != "b"
    /// });
    /// assert_eq!(seen, vec!["a", "b"]);
    /// ```
    pub fn iterate<F, R>(&self, mut callback: F)
    where
        F: FnMut(&str, &Value) -> R,
        R: Into<Visit>,
    {
        self.inner
            .scan(|_, local, value| callback(local, &value).into());
    }

    /// Returns the live local keys in backend order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        self.inner.scan(|_, local, _| {
            keys.push(local.to_string());
            Visit::Continue
        });
        keys
    }

    /// Returns the number of live entries.
    pub fn size(&self) -> usize {
        self.keys().len()
    }

    /// Returns true if the key holds a live value.
    ///
    /// Stored falsy values such as `0`, `""`, `false` and `null` count.
    pub fn has(&self, key: &str) -> bool {
        self.inner.lookup(key).is_live()
    }

    /// Removes every entry in this namespace, expired or not. Other
    /// namespaces are untouched.
    ///
    /// # Returns
    ///
    /// Returns the number of raw entries removed.
    pub fn clear(&self) -> usize {
        let _guard = self.inner.lock();
        let keys = self.inner.namespaced_keys();

        for (raw, _) in &keys {
            self.inner.backend.remove(raw);
        }
        self.inner
            .del_count
            .fetch_add(keys.len() as u64, Ordering::Relaxed);

        debug!(namespace = %self.inner.namespace, removed = keys.len(), "Namespace cleared");
        keys.len()
    }

    /// Wipes the entire backend, including every other namespace.
    pub fn clear_all(&self) {
        let _guard = self.inner.lock();
        self.inner.backend.clear();
        warn!(namespace = %self.inner.namespace, "Entire backend cleared");
    }

    /// Cancels the background sweep.
    ///
    /// # Returns
    ///
    /// Returns `true` if a sweep was running.
    pub fn stop_sweeper(&mut self) -> bool {
        // Dropping the handle signals the task
        self.sweeper.take().is_some()
    }

    /// Returns true while a background sweep is scheduled.
    pub fn has_sweeper(&self) -> bool {
        self.sweeper.as_ref().is_some_and(ExpirySweeper::is_running)
    }

    /// Returns this store's operation counters.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            get_ops: self.inner.get_count.load(Ordering::Relaxed),
            set_ops: self.inner.set_count.load(Ordering::Relaxed),
            del_ops: self.inner.del_count.load(Ordering::Relaxed),
            expired: self.inner.expired_count.load(Ordering::Relaxed),
        }
    }
}

/// Identity-style equality over decoded JSON.
fn strictly_equal(stored: &Value, wanted: &Value) -> bool {
    match (stored, wanted) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => {
            a == b || matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
        }
        _ => false,
    }
}

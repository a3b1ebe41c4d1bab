//! Store Configuration
//!
//! Options recognized when opening a store. The serialized names match the
//! options consumers pass in JSON:
//!
//! ```json
//! { "store": "localStorage", "cleanupTimer": 30, "namespace": "cart", "allowDuplicateNamespaces": false }
//! ```
//!
//! Every field is optional and falls back to [`StoreConfig::default`].
//! `cleanupTimer` is a number of seconds and may be fractional (`0.5`).

use crate::backend::SESSION_STORAGE;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Default sweep interval in seconds.
pub const DEFAULT_CLEANUP_SECS: u64 = 15;

/// Shortest sweep interval the store will schedule.
pub const MIN_CLEANUP_INTERVAL: Duration = Duration::from_millis(10);

/// Default namespace label.
pub const DEFAULT_NAMESPACE: &str = "stash";

/// Configuration for a [`NamespacedStore`](crate::NamespacedStore).
///
/// # Example
///
/// ```
/// use stashkv::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_namespace("cart")
///     .with_cleanup_interval(Duration::from_secs(30))
///     .with_allow_duplicate_namespaces(false);
///
/// assert_eq!(config.namespace, "cart");
/// assert_eq!(config.store, "sessionStorage");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Which named backend to bind (default: "sessionStorage")
    pub store: String,

    /// Interval between sweeps (default: 15s), read from seconds in JSON
    #[serde(deserialize_with = "deserialize_secs")]
    pub cleanup_timer: Duration,

    /// Prefix for every key this store writes (default: "stash")
    pub namespace: String,

    /// When false, opening fails if the namespace already has keys
    pub allow_duplicate_namespaces: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store: SESSION_STORAGE.to_string(),
            cleanup_timer: Duration::from_secs(DEFAULT_CLEANUP_SECS),
            namespace: DEFAULT_NAMESPACE.to_string(),
            allow_duplicate_namespaces: true,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_store(mut self, store: impl Into<String>) -> Self {
        self.store = store.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_timer = interval;
        self
    }

    pub fn with_allow_duplicate_namespaces(mut self, allow: bool) -> Self {
        self.allow_duplicate_namespaces = allow;
        self
    }

    /// Returns the sweep interval.
    ///
    /// Never shorter than [`MIN_CLEANUP_INTERVAL`], so a zero timer cannot spin.
    pub fn cleanup_interval(&self) -> Duration {
        self.cleanup_timer.max(MIN_CLEANUP_INTERVAL)
    }
}

/// Reads a non-negative number of seconds, integer or fractional.
fn deserialize_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs)
        .map_err(|e| serde::de::Error::custom(format!("invalid cleanupTimer {}: {}", secs, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();

        assert_eq!(config.store, "sessionStorage");
        assert_eq!(config.cleanup_interval(), Duration::from_secs(15));
        assert_eq!(config.namespace, "stash");
        assert!(config.allow_duplicate_namespaces);
    }

    #[test]
    fn test_from_json_recognized_options() {
        let config = StoreConfig::from_json(
            r#"{"store":"localStorage","cleanupTimer":30,"namespace":"cart","allowDuplicateNamespaces":false}"#,
        )
        .unwrap();

        assert_eq!(config.store, "localStorage");
        assert_eq!(config.cleanup_timer, Duration::from_secs(30));
        assert_eq!(config.namespace, "cart");
        assert!(!config.allow_duplicate_namespaces);
    }

    #[test]
    fn test_from_json_partial() {
        let config = StoreConfig::from_json(r#"{"namespace":"ui"}"#).unwrap();
        assert_eq!(config, StoreConfig::default().with_namespace("ui"));
    }

    #[test]
    fn test_fractional_cleanup_timer() {
        let config = StoreConfig::from_json(r#"{"cleanupTimer":0.5}"#).unwrap();
        assert_eq!(config.cleanup_interval(), Duration::from_millis(500));

        let config = StoreConfig::default().with_cleanup_interval(Duration::from_millis(500));
        assert_eq!(config.cleanup_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_invalid_cleanup_timer() {
        assert!(StoreConfig::from_json(r#"{"cleanupTimer":-1}"#).is_err());
        assert!(StoreConfig::from_json(r#"{"cleanupTimer":"15"}"#).is_err());
    }

    #[test]
    fn test_zero_interval_clamped() {
        let config = StoreConfig::default().with_cleanup_interval(Duration::ZERO);
        assert_eq!(config.cleanup_interval(), MIN_CLEANUP_INTERVAL);

        let config = StoreConfig::from_json(r#"{"cleanupTimer":0}"#).unwrap();
        assert_eq!(config.cleanup_interval(), MIN_CLEANUP_INTERVAL);
    }
}

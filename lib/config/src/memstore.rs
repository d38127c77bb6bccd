use std::time::Duration;

use serde::Deserialize;

/// In-memory primary backends emulating the DA network.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemstoreConfig {
    /// Use memstores instead of the network clients for the enabled primary backends.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "MemstoreConfig::default_max_blob_size_bytes")]
    pub max_blob_size_bytes: u64,
    /// Blobs are pruned after this period; `0` keeps them forever.
    #[serde(default)]
    pub blob_expiration_ms: u64,
    #[serde(default)]
    pub put_latency_ms: u64,
    #[serde(default)]
    pub get_latency_ms: u64,
    /// Number of L1 blocks after the reference block during which a V2 cert may be included.
    #[serde(default = "MemstoreConfig::default_rbn_recency_window")]
    pub rbn_recency_window: u64,
}

impl Default for MemstoreConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_blob_size_bytes: Self::default_max_blob_size_bytes(),
            blob_expiration_ms: 0,
            put_latency_ms: 0,
            get_latency_ms: 0,
            rbn_recency_window: Self::default_rbn_recency_window(),
        }
    }
}

impl MemstoreConfig {
    const fn default_max_blob_size_bytes() -> u64 {
        16 * 1024 * 1024
    }

    const fn default_rbn_recency_window() -> u64 {
        14_400
    }

    pub fn blob_expiration(&self) -> Option<Duration> {
        (self.blob_expiration_ms > 0).then(|| Duration::from_millis(self.blob_expiration_ms))
    }

    pub fn put_latency(&self) -> Duration {
        Duration::from_millis(self.put_latency_ms)
    }

    pub fn get_latency(&self) -> Duration {
        Duration::from_millis(self.get_latency_ms)
    }
}

//! In-memory primary backends emulating the DA network.
//!
//! Blobs are kept in an [`EphemeralDb`] keyed by the keccak256 hash of the cert issued on dispersal,
//! so a blob can only be retrieved with the exact cert returned by `put`. Blobs expire to emulate
//! the limited retention of DA operators.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use da_gateway_config::MemstoreConfig;
use da_gateway_da_client::types::{to_non_retriable_error, BackendError};
use tokio::sync::{watch, RwLock};

pub use self::{
    cert::MemstoreCert,
    v1::MemstoreV1,
    v2::{encode_payload, MemstoreV2},
};

mod cert;
mod v1;
mod v2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemStoreError {
    #[error("blob of {size} bytes exceeds the maximum size of {max_size} bytes")]
    BlobTooLarge { size: usize, max_size: u64 },
    #[error("blob already exists")]
    BlobAlreadyExists,
    #[error("blob not found")]
    BlobNotFound,
    #[error("cert cannot be decoded: {0}")]
    IncorrectCert(String),
    #[error("payload does not match the digest committed to by the cert")]
    DigestMismatch,
    #[error(
        "cert with reference block {reference_block_number} was included at L1 block \
         {l1_inclusion_block_number}, outside of the recency window of {recency_window} blocks"
    )]
    StaleCert {
        reference_block_number: u64,
        l1_inclusion_block_number: u64,
        recency_window: u64,
    },
}

impl From<MemStoreError> for BackendError {
    fn from(err: MemStoreError) -> Self {
        to_non_retriable_error(err)
    }
}

#[derive(Debug, Default)]
struct MemStoreData {
    store: HashMap<[u8; 32], Vec<u8>>,
    key_starts: HashMap<[u8; 32], Instant>,
}

/// Expiring key-value storage shared by the memstore backends.
#[derive(Debug)]
pub struct EphemeralDb {
    config: MemstoreConfig,
    data: RwLock<MemStoreData>,
}

impl EphemeralDb {
    fn new(config: MemstoreConfig) -> Self {
        Self {
            config,
            data: RwLock::default(),
        }
    }

    fn config(&self) -> &MemstoreConfig {
        &self.config
    }

    async fn simulate_put_latency(&self) {
        let latency = self.config.put_latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    async fn simulate_get_latency(&self) {
        let latency = self.config.get_latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn check_size(&self, value: &[u8]) -> Result<(), MemStoreError> {
        if value.len() as u64 > self.config.max_blob_size_bytes {
            return Err(MemStoreError::BlobTooLarge {
                size: value.len(),
                max_size: self.config.max_blob_size_bytes,
            });
        }
        Ok(())
    }

    async fn insert(&self, key: [u8; 32], value: Vec<u8>) -> Result<(), MemStoreError> {
        let mut data = self.data.write().await;
        if data.store.contains_key(&key) {
            return Err(MemStoreError::BlobAlreadyExists);
        }
        data.key_starts.insert(key, Instant::now());
        data.store.insert(key, value);
        Ok(())
    }

    async fn fetch(&self, key: &[u8; 32]) -> Result<Vec<u8>, MemStoreError> {
        let data = self.data.read().await;
        // Entries may outlive their expiration until the next pruning pass.
        let is_expired = match (self.config.blob_expiration(), data.key_starts.get(key)) {
            (Some(expiration), Some(start)) => start.elapsed() > expiration,
            _ => false,
        };
        if is_expired {
            return Err(MemStoreError::BlobNotFound);
        }
        data.store
            .get(key)
            .cloned()
            .ok_or(MemStoreError::BlobNotFound)
    }

    /// Removes expired blobs, returning the number of removed entries.
    pub async fn prune_expired(&self) -> usize {
        let Some(expiration) = self.config.blob_expiration() else {
            return 0;
        };
        let mut data = self.data.write().await;
        let to_remove: Vec<_> = data
            .key_starts
            .iter()
            .filter(|(_, start)| start.elapsed() > expiration)
            .map(|(key, _)| *key)
            .collect();
        for key in &to_remove {
            data.store.remove(key);
            data.key_starts.remove(key);
        }
        to_remove.len()
    }

    /// Whether stored blobs expire, i.e. whether pruning has anything to do.
    pub fn expires_blobs(&self) -> bool {
        self.config.blob_expiration().is_some()
    }

    /// Periodically prunes expired blobs until a stop signal is received. If blobs never expire,
    /// only waits for the stop signal.
    pub async fn run_pruning_loop(
        self: Arc<Self>,
        mut stop_receiver: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let Some(expiration) = self.config.blob_expiration() else {
            tracing::info!("Memstore blobs never expire, pruning is disabled");
            // A dropped sender is treated as a stop signal.
            let _ = stop_receiver.wait_for(|stop| *stop).await;
            return Ok(());
        };
        let interval = expiration.min(Duration::from_secs(60));

        loop {
            if *stop_receiver.borrow() {
                break;
            }
            let pruned = self.prune_expired().await;
            if pruned > 0 {
                tracing::debug!("Pruned {pruned} expired memstore blobs");
            }
            if tokio::time::timeout(interval, stop_receiver.changed())
                .await
                .is_ok()
            {
                break;
            }
        }
        tracing::info!("Stop signal received, memstore pruning is shutting down");
        Ok(())
    }
}

//! Cache and fallback replication.

use std::{
    sync::{Arc, Mutex as StdMutex},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use da_gateway_config::StorageConfig;
use da_gateway_da_client::{types::BackendError, SecondaryStore};
use da_gateway_types::keccak256;
use tokio::sync::{mpsc, watch, Mutex};

use crate::{
    errors::{AggregateError, SecondaryError},
    metrics::{Outcome, ReadResult, METRICS},
};

/// Minimum delay between attempts of a secondary write.
const WRITE_RETRY_MIN_DELAY: Duration = Duration::from_millis(100);

/// Verifies a payload read from secondary storage against the cert it was requested with.
#[async_trait]
pub trait PayloadVerifier: Send + Sync {
    async fn verify(&self, cert: &[u8], payload: &[u8]) -> Result<(), BackendError>;
}

/// Replication request handed over to the background write loop.
#[derive(Debug)]
pub struct PutNotify {
    pub commitment: Vec<u8>,
    pub value: Vec<u8>,
}

#[derive(Debug)]
struct AsyncWrites {
    sender: mpsc::Sender<PutNotify>,
    /// Taken by the write loop once it starts.
    receiver: StdMutex<Option<mpsc::Receiver<PutNotify>>>,
}

/// Owns the cache and fallback tiers.
///
/// Every secondary backend is addressed by `keccak256(cert)`. Writes go to every backend of both tiers;
/// reads consult the backends of a single tier in the configured order.
#[derive(Debug)]
pub struct SecondaryManager {
    caches: Vec<Arc<dyn SecondaryStore>>,
    fallbacks: Vec<Arc<dyn SecondaryStore>>,
    write_on_cache_miss: bool,
    error_on_insert_failure: bool,
    write_max_attempts: usize,
    verify_lock: Mutex<()>,
    async_writes: Option<AsyncWrites>,
}

impl SecondaryManager {
    /// Creates a manager for the provided tiers. `config` must be validated beforehand.
    pub fn new(
        caches: Vec<Arc<dyn SecondaryStore>>,
        fallbacks: Vec<Arc<dyn SecondaryStore>>,
        config: &StorageConfig,
    ) -> Self {
        let async_writes = config.async_writes_enabled().then(|| {
            let (sender, receiver) = mpsc::channel(config.async_put_workers);
            AsyncWrites {
                sender,
                receiver: StdMutex::new(Some(receiver)),
            }
        });
        Self {
            caches,
            fallbacks,
            write_on_cache_miss: config.write_on_cache_miss,
            error_on_insert_failure: config.error_on_secondary_insert_failure,
            write_max_attempts: config.secondary_write_max_attempts.max(1),
            verify_lock: Mutex::new(()),
            async_writes,
        }
    }

    /// Manager without secondary backends.
    pub fn disabled() -> Self {
        Self::new(Vec::new(), Vec::new(), &StorageConfig::default())
    }

    pub fn enabled(&self) -> bool {
        self.caching_enabled() || self.fallback_enabled()
    }

    pub fn caching_enabled(&self) -> bool {
        !self.caches.is_empty()
    }

    pub fn fallback_enabled(&self) -> bool {
        !self.fallbacks.is_empty()
    }

    pub fn write_on_cache_miss_enabled(&self) -> bool {
        self.write_on_cache_miss
    }

    pub fn async_writes_enabled(&self) -> bool {
        self.async_writes.is_some()
    }

    /// Replicates `value` to the secondary tiers, either in place or via the background write loop.
    ///
    /// In asynchronous mode, this waits only for the loop to accept the request, so replication
    /// failures are never returned.
    pub async fn replicate(&self, commitment: &[u8], value: &[u8]) -> Result<(), SecondaryError> {
        let Some(async_writes) = &self.async_writes else {
            tracing::debug!("Replicating payload to secondary backends synchronously");
            return self.handle_redundant_writes(commitment, value).await;
        };

        tracing::debug!("Publishing payload to the async secondary write loop");
        let notify = PutNotify {
            commitment: commitment.to_vec(),
            value: value.to_vec(),
        };
        if async_writes.sender.send(notify).await.is_err() {
            tracing::error!("Secondary write loop is not running; payload is not replicated");
        }
        Ok(())
    }

    /// Writes `value` to every cache and fallback backend.
    ///
    /// Fails if no write succeeded. If some writes failed, fails only in the
    /// error-on-secondary-insert-failure mode.
    pub async fn handle_redundant_writes(
        &self,
        commitment: &[u8],
        value: &[u8],
    ) -> Result<(), SecondaryError> {
        let key = keccak256(commitment);
        let stores = self.caches.iter().chain(&self.fallbacks);
        let total = self.caches.len() + self.fallbacks.len();

        let mut successes = 0;
        let mut errors = vec![];
        for store in stores {
            let backend = store.backend_type();
            let started_at = Instant::now();
            let result = self.put_with_retries(store.as_ref(), &key, value).await;
            METRICS.secondary_write_latency[&(backend.as_str(), Outcome::of(&result))]
                .observe(started_at.elapsed());

            match result {
                Ok(()) => {
                    tracing::debug!(%backend, "Wrote payload to secondary backend");
                    successes += 1;
                }
                Err(err) => {
                    tracing::warn!(%backend, "Failed writing payload to secondary backend: {err}");
                    errors.push(anyhow::Error::from(err).context(format!("{backend} write")));
                }
            }
        }

        if successes == 0 && total > 0 {
            return Err(SecondaryError::NoSuccessfulWrites {
                total,
                errors: AggregateError(errors),
            });
        }
        if !errors.is_empty() && self.error_on_insert_failure {
            return Err(SecondaryError::PartialFailure {
                failed: errors.len(),
                total,
                errors: AggregateError(errors),
            });
        }
        Ok(())
    }

    async fn put_with_retries(
        &self,
        store: &dyn SecondaryStore,
        key: &[u8],
        value: &[u8],
    ) -> Result<(), BackendError> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(WRITE_RETRY_MIN_DELAY)
            .with_max_times(self.write_max_attempts - 1);
        (|| store.put(key, value))
            .retry(&backoff)
            .when(BackendError::is_retriable)
            .notify(|err, delay| {
                tracing::debug!(
                    backend = %store.backend_type(),
                    "Retrying secondary write in {delay:?} after error: {err}"
                );
            })
            .await
    }

    /// Reads the payload for `commitment` from the first backend of a tier that returns a verified value.
    ///
    /// Misses, errors and verification failures all move on to the next backend.
    pub async fn multi_source_read(
        &self,
        commitment: &[u8],
        fallback: bool,
        verifier: &dyn PayloadVerifier,
    ) -> Result<Vec<u8>, SecondaryError> {
        let key = keccak256(commitment);
        let stores = if fallback {
            &self.fallbacks
        } else {
            &self.caches
        };

        for store in stores {
            let backend = store.backend_type();
            let started_at = Instant::now();
            let result = store.get(&key).await;
            METRICS.secondary_read_latency[&(backend.as_str(), Outcome::of(&result))]
                .observe(started_at.elapsed());

            let value = match result {
                Ok(Some(value)) => value,
                Ok(None) => {
                    tracing::debug!(%backend, "Payload not found in secondary backend");
                    METRICS.secondary_read_result[&(backend.as_str(), ReadResult::Miss)].inc();
                    continue;
                }
                Err(err) => {
                    tracing::warn!(%backend, "Failed reading payload from secondary backend: {err}");
                    METRICS.secondary_read_result[&(backend.as_str(), ReadResult::Error)].inc();
                    continue;
                }
            };

            let verification = {
                let _guard = self.verify_lock.lock().await;
                verifier.verify(commitment, &value).await
            };
            if let Err(err) = verification {
                tracing::warn!(%backend, "Payload from secondary backend failed verification: {err}");
                METRICS.secondary_read_result[&(backend.as_str(), ReadResult::VerificationFailed)]
                    .inc();
                continue;
            }

            METRICS.secondary_read_result[&(backend.as_str(), ReadResult::Hit)].inc();
            return Ok(value);
        }
        Err(SecondaryError::NotFoundInRedundantBackends)
    }

    fn take_write_receiver(&self) -> anyhow::Result<mpsc::Receiver<PutNotify>> {
        let Some(async_writes) = &self.async_writes else {
            anyhow::bail!("asynchronous secondary writes are disabled");
        };
        let mut receiver = async_writes
            .receiver
            .lock()
            .map_err(|_| anyhow::anyhow!("secondary write loop state is poisoned"))?;
        receiver
            .take()
            .ok_or_else(|| anyhow::anyhow!("secondary write loop is already started"))
    }

    /// Runs the background loop performing asynchronous secondary writes until a stop signal is received.
    ///
    /// # Errors
    ///
    /// Fails if asynchronous writes are disabled or if the loop was already started.
    pub async fn run_write_loop(
        self: Arc<Self>,
        mut stop_receiver: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let mut receiver = self.take_write_receiver()?;
        tracing::info!("Started secondary write loop");
        loop {
            if *stop_receiver.borrow() {
                break;
            }
            tokio::select! {
                notify = receiver.recv() => {
                    let Some(notify) = notify else {
                        break;
                    };
                    // Runs detached from the request that produced the payload, which is already answered.
                    if let Err(err) = self
                        .handle_redundant_writes(&notify.commitment, &notify.value)
                        .await
                    {
                        tracing::error!("Asynchronous secondary write failed: {err}");
                    }
                }
                _ = stop_receiver.changed() => break,
            }
        }
        tracing::info!("Stop signal received, secondary write loop is shutting down");
        Ok(())
    }
}

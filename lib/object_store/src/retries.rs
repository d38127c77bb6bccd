use std::{future::Future, time::Duration};

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};

use crate::raw::{Bucket, ObjectStore, ObjectStoreError};

/// Store wrapper that retries transient errors.
#[derive(Debug)]
pub(crate) struct StoreWithRetries<S> {
    inner: S,
    max_retries: u16,
}

impl<S: ObjectStore> StoreWithRetries<S> {
    /// Creates a store based on the provided async initialization closure.
    pub async fn try_new<Fut>(
        max_retries: u16,
        init_fn: impl FnMut() -> Fut,
    ) -> Result<Self, ObjectStoreError>
    where
        Fut: Future<Output = Result<S, ObjectStoreError>>,
    {
        let inner = Self::retry(max_retries, "init", init_fn).await?;
        Ok(Self { inner, max_retries })
    }

    async fn retry<T, Fut>(
        max_retries: u16,
        operation: &'static str,
        f: impl FnMut() -> Fut,
    ) -> Result<T, ObjectStoreError>
    where
        Fut: Future<Output = Result<T, ObjectStoreError>>,
    {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_secs(5))
            .with_max_times(usize::from(max_retries));
        f.retry(&backoff)
            .when(ObjectStoreError::is_transient)
            .notify(|err, delay| {
                tracing::warn!(
                    "Transient error during object store {operation}, retrying in {delay:?}: {err}"
                );
            })
            .await
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for StoreWithRetries<S> {
    async fn get_raw(&self, bucket: Bucket, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        Self::retry(self.max_retries, "get_raw", || {
            self.inner.get_raw(bucket, key)
        })
        .await
    }

    async fn put_raw(
        &self,
        bucket: Bucket,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), ObjectStoreError> {
        Self::retry(self.max_retries, "put_raw", || {
            self.inner.put_raw(bucket, key, value.clone())
        })
        .await
    }

    async fn remove_raw(&self, bucket: Bucket, key: &str) -> Result<(), ObjectStoreError> {
        Self::retry(self.max_retries, "remove_raw", || {
            self.inner.remove_raw(bucket, key)
        })
        .await
    }

    fn storage_prefix_raw(&self, bucket: Bucket) -> String {
        self.inner.storage_prefix_raw(bucket)
    }
}

use std::sync::Arc;

use da_gateway_da_client::{types::BackendError, SecondaryStore};

#[derive(Debug, thiserror::Error)]
pub enum KeccakError {
    #[error("keccak commitments are not supported: no object store is configured")]
    NotConfigured,
    #[error("key is not the keccak256 hash of the value: {0}")]
    KeyMismatch(#[source] BackendError),
    #[error("value stored under the key is corrupted: {0}")]
    CorruptedValue(#[source] BackendError),
    #[error("no value is stored under the key")]
    NotFound,
    #[error("keccak backend failed: {0}")]
    Backend(#[source] BackendError),
}

/// Content-addressed storage where every key is the keccak256 hash of its value.
///
/// The invariant is checked before every write and after every read.
#[derive(Debug)]
pub struct KeccakManager {
    store: Option<Arc<dyn SecondaryStore>>,
}

impl KeccakManager {
    pub fn new(store: Option<Arc<dyn SecondaryStore>>) -> Self {
        Self { store }
    }

    fn store(&self) -> Result<&dyn SecondaryStore, KeccakError> {
        self.store.as_deref().ok_or(KeccakError::NotConfigured)
    }

    pub async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KeccakError> {
        let store = self.store()?;
        store
            .verify(key, value)
            .await
            .map_err(KeccakError::KeyMismatch)?;
        store.put(key, value).await.map_err(KeccakError::Backend)
    }

    pub async fn get(&self, key: &[u8]) -> Result<Vec<u8>, KeccakError> {
        let store = self.store()?;
        let value = store
            .get(key)
            .await
            .map_err(KeccakError::Backend)?
            .ok_or(KeccakError::NotFound)?;
        store
            .verify(key, &value)
            .await
            .map_err(KeccakError::CorruptedValue)?;
        Ok(value)
    }
}

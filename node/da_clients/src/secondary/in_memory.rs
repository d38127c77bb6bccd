use std::collections::HashMap;

use async_trait::async_trait;
use da_gateway_da_client::{types::BackendError, SecondaryStore};
use da_gateway_types::BackendType;
use tokio::sync::RwLock;

/// Process-local [`SecondaryStore`]. Used as a cache tier in development setups.
#[derive(Debug)]
pub struct InMemorySecondary {
    backend_type: BackendType,
    values: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl InMemorySecondary {
    /// Creates a store reporting `backend_type` in logs and metrics.
    pub fn new(backend_type: BackendType) -> Self {
        Self {
            backend_type,
            values: RwLock::default(),
        }
    }
}

#[async_trait]
impl SecondaryStore for InMemorySecondary {
    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), BackendError> {
        self.values.write().await.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, BackendError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn verify(&self, key: &[u8], value: &[u8]) -> Result<(), BackendError> {
        super::verify_keccak_key(key, value)
    }

    fn backend_type(&self) -> BackendType {
        self.backend_type
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use da_gateway_config::ObjectStoreConfig;
use da_gateway_da_client::{types::BackendError, SecondaryStore};
use da_gateway_object_store::{Bucket, ObjectStore, ObjectStoreError, ObjectStoreFactory};
use da_gateway_types::BackendType;

/// [`SecondaryStore`] keeping values in a bucket of an object store. Keys are hex-encoded
/// to form object names.
#[derive(Clone, Debug)]
pub struct ObjectStoreSecondary {
    object_store: Arc<dyn ObjectStore>,
    bucket: Bucket,
}

impl ObjectStoreSecondary {
    pub fn new(object_store: Arc<dyn ObjectStore>, bucket: Bucket) -> Self {
        Self {
            object_store,
            bucket,
        }
    }

    pub async fn from_config(
        object_store_conf: ObjectStoreConfig,
        bucket: Bucket,
    ) -> anyhow::Result<Self> {
        let object_store = ObjectStoreFactory::new(object_store_conf)
            .create_store()
            .await?;
        Ok(Self::new(object_store, bucket))
    }
}

fn to_backend_error(err: ObjectStoreError) -> BackendError {
    BackendError {
        is_retriable: err.is_transient(),
        error: anyhow::Error::from(err),
    }
}

#[async_trait]
impl SecondaryStore for ObjectStoreSecondary {
    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), BackendError> {
        self.object_store
            .put_raw(self.bucket, &hex::encode(key), value.to_vec())
            .await
            .map_err(to_backend_error)
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, BackendError> {
        match self.object_store.get_raw(self.bucket, &hex::encode(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(ObjectStoreError::KeyNotFound(_)) => Ok(None),
            Err(err) => Err(to_backend_error(err)),
        }
    }

    async fn verify(&self, key: &[u8], value: &[u8]) -> Result<(), BackendError> {
        super::verify_keccak_key(key, value)
    }

    fn backend_type(&self) -> BackendType {
        BackendType::ObjectStore
    }
}

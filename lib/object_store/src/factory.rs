use std::sync::Arc;

use anyhow::Context as _;
use da_gateway_config::{ObjectStoreConfig, ObjectStoreMode};
use tokio::sync::OnceCell;

use crate::{
    file::FileBackedObjectStore,
    mock::MockObjectStore,
    raw::{ObjectStore, ObjectStoreError},
    retries::StoreWithRetries,
    s3::S3Store,
};

/// Factory of [`ObjectStore`]s that caches the store instance once it's created.
///
/// Components should depend on `Arc<dyn ObjectStore>` rather than on the factory. This allows to
/// inject mock store implementations in tests.
#[derive(Debug)]
pub struct ObjectStoreFactory {
    config: ObjectStoreConfig,
    store: OnceCell<Arc<dyn ObjectStore>>,
}

impl ObjectStoreFactory {
    /// Creates an object store factory based on the provided `config`.
    pub fn new(config: ObjectStoreConfig) -> Self {
        Self {
            config,
            store: OnceCell::new(),
        }
    }

    /// Creates an [`ObjectStore`] or returns a cached store if one was created previously.
    ///
    /// # Errors
    ///
    /// Returns an error if store initialization fails (e.g., because of incorrect configuration).
    pub async fn create_store(&self) -> anyhow::Result<Arc<dyn ObjectStore>> {
        self.store
            .get_or_try_init(|| async {
                Self::create_from_config(&self.config)
                    .await
                    .with_context(|| {
                        format!(
                            "failed creating object store with configuration {:?}",
                            self.config
                        )
                    })
            })
            .await
            .cloned()
    }

    async fn create_from_config(
        config: &ObjectStoreConfig,
    ) -> Result<Arc<dyn ObjectStore>, ObjectStoreError> {
        match &config.mode {
            ObjectStoreMode::S3 {
                bucket,
                region,
                endpoint,
            } => {
                tracing::trace!("Initialized S3 object store for bucket `{bucket}`");
                let store = StoreWithRetries::try_new(config.max_retries, || {
                    S3Store::new(bucket.clone(), region.clone(), endpoint.clone())
                })
                .await?;
                Ok(Arc::new(store))
            }
            ObjectStoreMode::FileBacked {
                file_backed_base_path,
            } => {
                tracing::trace!("Initialized FileBacked object store");
                let store = StoreWithRetries::try_new(config.max_retries, || {
                    FileBackedObjectStore::new(file_backed_base_path.clone())
                })
                .await?;
                Ok(Arc::new(store))
            }
            ObjectStoreMode::Mock => {
                tracing::warn!("Using mock object store; payloads will not survive a restart");
                Ok(MockObjectStore::arc())
            }
        }
    }
}

//! Wiring of the storage layer from configuration.

use std::sync::Arc;

use anyhow::Context as _;
use da_gateway_config::{MemstoreConfig, ObjectStoreConfig, StorageConfig};
use da_gateway_da_client::{EigenDAV1Store, EigenDAV2Store, SecondaryStore};
use da_gateway_da_clients::{
    memstore::{EphemeralDb, MemstoreV1, MemstoreV2},
    secondary::{InMemorySecondary, ObjectStoreSecondary},
};
use da_gateway_object_store::{Bucket, ObjectStore, ObjectStoreFactory};
use da_gateway_types::{BackendType, EigenDABackend};
use tokio::{sync::watch, task::JoinHandle};

use crate::{EigenDAManager, KeccakManager, SecondaryManager};

/// Storage layer components built from configuration.
#[derive(Debug)]
pub struct StorageComponents {
    pub manager: Arc<EigenDAManager>,
    pub keccak_manager: Arc<KeccakManager>,
    secondary: Arc<SecondaryManager>,
    memstore_dbs: Vec<Arc<EphemeralDb>>,
}

impl StorageComponents {
    /// Spawns the secondary write loop (if asynchronous writes are enabled) and pruning loops for
    /// memstores with expiring blobs. Must be called once. Every task runs until the stop signal.
    pub fn spawn_background_tasks(
        &self,
        stop_receiver: &watch::Receiver<bool>,
    ) -> Vec<JoinHandle<anyhow::Result<()>>> {
        let mut tasks = Vec::with_capacity(self.memstore_dbs.len() + 1);
        if self.secondary.async_writes_enabled() {
            let secondary = self.secondary.clone();
            tasks.push(tokio::spawn(
                secondary.run_write_loop(stop_receiver.clone()),
            ));
        }
        for db in self.memstore_dbs.iter().filter(|db| db.expires_blobs()) {
            tasks.push(tokio::spawn(db.clone().run_pruning_loop(stop_receiver.clone())));
        }
        tasks
    }
}

/// Builds the storage layer. `storage` must be validated beforehand.
///
/// # Errors
///
/// Fails on configurations that cannot be wired, e.g. an `object_store` target without an object store.
pub async fn build_storage(
    storage: &StorageConfig,
    memstore: &MemstoreConfig,
    object_store: Option<ObjectStoreConfig>,
) -> anyhow::Result<StorageComponents> {
    anyhow::ensure!(
        memstore.enabled,
        "only memstore primary backends are available; set the memstore to be enabled"
    );

    let mut memstore_dbs = vec![];
    let mut v1: Option<Arc<dyn EigenDAV1Store>> = None;
    let mut v2: Option<Arc<dyn EigenDAV2Store>> = None;
    for backend in &storage.backends_to_enable {
        match backend {
            EigenDABackend::V1 => {
                let store = MemstoreV1::new(memstore.clone());
                memstore_dbs.push(store.db());
                v1 = Some(Arc::new(store));
            }
            EigenDABackend::V2 => {
                let store = MemstoreV2::new(memstore.clone());
                memstore_dbs.push(store.db());
                v2 = Some(Arc::new(store));
            }
        }
        tracing::info!("Enabled EigenDA {backend} memstore backend");
    }

    let object_store = match object_store {
        Some(config) => Some(
            ObjectStoreFactory::new(config)
                .create_store()
                .await
                .context("failed creating object store")?,
        ),
        None => None,
    };

    let caches = build_secondaries(&storage.cache_backends(), object_store.as_ref())
        .context("invalid cache targets")?;
    let fallbacks = build_secondaries(&storage.fallback_backends(), object_store.as_ref())
        .context("invalid fallback targets")?;
    tracing::info!(
        "Using {} cache and {} fallback secondary backends; async writes: {}",
        caches.len(),
        fallbacks.len(),
        storage.async_writes_enabled()
    );
    let secondary = Arc::new(SecondaryManager::new(caches, fallbacks, storage));

    let manager = EigenDAManager::new(v1, v2, secondary.clone(), storage.dispersal_backend)?;
    let keccak_store = object_store.map(|store| {
        Arc::new(ObjectStoreSecondary::new(store, Bucket::KeccakPreimages))
            as Arc<dyn SecondaryStore>
    });

    Ok(StorageComponents {
        manager: Arc::new(manager),
        keccak_manager: Arc::new(KeccakManager::new(keccak_store)),
        secondary,
        memstore_dbs,
    })
}

fn build_secondaries(
    targets: &[BackendType],
    object_store: Option<&Arc<dyn ObjectStore>>,
) -> anyhow::Result<Vec<Arc<dyn SecondaryStore>>> {
    targets
        .iter()
        .map(|&target| -> anyhow::Result<Arc<dyn SecondaryStore>> {
            match target {
                BackendType::ObjectStore => {
                    let object_store = object_store.context(
                        "`object_store` secondary target requires an object store to be configured",
                    )?;
                    Ok(Arc::new(ObjectStoreSecondary::new(
                        object_store.clone(),
                        Bucket::SecondaryPayloads,
                    )))
                }
                BackendType::CacheV1Memory | BackendType::CacheV2Memory => {
                    Ok(Arc::new(InMemorySecondary::new(target)))
                }
                BackendType::PrimaryV1 | BackendType::PrimaryV2 | BackendType::Unknown => {
                    anyhow::bail!("`{target}` cannot be used as a secondary backend")
                }
            }
        })
        .collect()
}

use anyhow::Context as _;
use serde::de::DeserializeOwned;

use crate::{ApiConfig, MemstoreConfig, ObjectStoreConfig, StorageConfig};

pub trait FromEnv: Sized {
    fn from_env() -> anyhow::Result<Self>;
}

/// Convenience function that loads the structure from the environment variables given the prefix.
pub fn envy_load<T: DeserializeOwned>(name: &str, prefix: &str) -> anyhow::Result<T> {
    envy::prefixed(prefix)
        .from_env()
        .with_context(|| format!("Cannot load config <{name}>"))
}

impl FromEnv for StorageConfig {
    fn from_env() -> anyhow::Result<Self> {
        envy_load("storage", "DA_GATEWAY_STORAGE_")
    }
}

impl FromEnv for MemstoreConfig {
    fn from_env() -> anyhow::Result<Self> {
        envy_load("memstore", "DA_GATEWAY_MEMSTORE_")
    }
}

impl FromEnv for ApiConfig {
    fn from_env() -> anyhow::Result<Self> {
        envy_load("api", "DA_GATEWAY_API_")
    }
}

impl ObjectStoreConfig {
    const ENV_PREFIX: &'static str = "DA_GATEWAY_OBJECT_STORE_";

    /// Loads the object store config if its mode is set in the environment.
    pub fn from_env_optional() -> anyhow::Result<Option<Self>> {
        let mode_var = format!("{}MODE", Self::ENV_PREFIX);
        if std::env::var_os(mode_var).is_none() {
            return Ok(None);
        }
        Self::from_env().map(Some)
    }
}

impl FromEnv for ObjectStoreConfig {
    fn from_env() -> anyhow::Result<Self> {
        envy_load("object_store", Self::ENV_PREFIX)
    }
}

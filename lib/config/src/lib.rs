//! Configuration of the DA gateway.
//!
//! Every config is a plain `serde` struct that can be loaded from the environment via [`FromEnv`].
//! Configs are validated once at startup and are immutable afterwards.

#![allow(clippy::upper_case_acronyms, clippy::derive_partial_eq_without_eq)]

pub use self::{
    api::ApiConfig,
    env::{envy_load, FromEnv},
    memstore::MemstoreConfig,
    object_store::{ObjectStoreConfig, ObjectStoreMode},
    storage::{ConfigError, StorageConfig, TargetTier},
};

mod api;
mod env;
mod memstore;
mod object_store;
mod storage;
#[cfg(test)]
mod test_utils;
mod utils;

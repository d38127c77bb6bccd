//! This crate provides the [object storage abstraction](ObjectStore) that allows to get,
//! put and remove binary blobs. The following implementations are available:
//!
//! - File-based storage saving blobs as separate files in the local filesystem
//! - S3-based storage (also usable with S3-compatible services such as MinIO)
//! - In-memory mock storage
//!
//! A store trait object should be constructed using an [`ObjectStoreFactory`] based on the configuration.

// Linter settings.
#![warn(missing_debug_implementations, bare_trait_objects)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::doc_markdown
)]

mod factory;
mod file;
mod mock;
mod raw;
mod retries;
mod s3;

pub use self::{
    factory::ObjectStoreFactory,
    file::FileBackedObjectStore,
    mock::MockObjectStore,
    raw::{BoxedError, Bucket, ObjectStore, ObjectStoreError},
};

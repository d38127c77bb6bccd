//! Types shared by every DA gateway crate.
//!
//! - [`BackendType`] identifies a storage kind for logging, metrics and configured target names.
//! - [`EigenDABackend`] selects the primary protocol version that receives writes.
//! - [`VersionedCert`] tags a serialized certificate with the [`VersionByte`] of the backend that produced it.
//! - [`GetOpts`] carries per-read options.

// Linter settings.
#![warn(missing_debug_implementations, bare_trait_objects)]

pub use self::{
    backend::{BackendType, EigenDABackend, ParseEigenDABackendError},
    cert::{GetOpts, UnknownVersionByte, VersionByte, VersionedCert},
    hash::keccak256,
};

mod backend;
mod cert;
mod hash;
pub mod commitment;

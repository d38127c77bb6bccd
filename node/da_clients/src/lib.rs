//! Concrete backends plugged into the DA gateway storage layer.
//!
//! Primary backends emulate the DA network in memory ([`memstore`]). Secondary backends
//! ([`secondary`]) keep payload replicas in an object store or in process memory.

pub mod memstore;
pub mod secondary;

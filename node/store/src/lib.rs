//! Storage routing layer of the DA gateway.
//!
//! [`EigenDAManager`] routes writes to the active primary backend and reads to the backend matching
//! the cert version, layering the cache and fallback tiers of [`SecondaryManager`] around it.
//! [`KeccakManager`] serves content-addressed preimages independently of version routing.

pub use self::{
    errors::{AggregateError, SecondaryError, StoreError},
    keccak::{KeccakError, KeccakManager},
    manager::EigenDAManager,
    secondary::{PayloadVerifier, PutNotify, SecondaryManager},
};

pub mod builder;
mod errors;
mod keccak;
mod manager;
mod metrics;
mod secondary;
#[cfg(test)]
mod tests;

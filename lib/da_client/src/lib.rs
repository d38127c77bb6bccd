use std::fmt;

use async_trait::async_trait;
use da_gateway_types::{BackendType, VersionedCert};

use crate::types::BackendError;

pub mod types;

/// Primary backend speaking the V1 protocol. Its certs are tagged with the legacy version byte.
#[async_trait]
pub trait EigenDAV1Store: Sync + Send + fmt::Debug {
    /// Disperses the payload, returning the serialized cert.
    async fn put(&self, payload: &[u8]) -> Result<Vec<u8>, BackendError>;

    /// Fetches and decodes the payload referenced by the cert.
    async fn get(&self, cert: &[u8]) -> Result<Vec<u8>, BackendError>;

    /// Checks that the payload is the one committed to by the cert.
    async fn verify(&self, cert: &[u8], payload: &[u8]) -> Result<(), BackendError>;
}

/// Primary backend speaking the V2 protocol.
#[async_trait]
pub trait EigenDAV2Store: Sync + Send + fmt::Debug {
    /// Disperses the payload, returning the serialized cert.
    async fn put(&self, payload: &[u8]) -> Result<Vec<u8>, BackendError>;

    /// Fetches the payload referenced by the cert. With `return_encoded_payload`, the payload is
    /// returned as stored on the network, without decoding.
    async fn get(
        &self,
        cert: &VersionedCert,
        return_encoded_payload: bool,
    ) -> Result<Vec<u8>, BackendError>;

    /// Structurally verifies the cert. `l1_inclusion_block_number == 0` skips the recency check.
    async fn verify_cert(
        &self,
        cert: &VersionedCert,
        l1_inclusion_block_number: u64,
    ) -> Result<(), BackendError>;
}

/// Non-authoritative key-value backend used as a cache or fallback.
#[async_trait]
pub trait SecondaryStore: Sync + Send + fmt::Debug {
    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), BackendError>;

    /// Returns `Ok(None)` on a miss.
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, BackendError>;

    /// Checks the content-addressing invariant `key == keccak256(value)`.
    async fn verify(&self, key: &[u8], value: &[u8]) -> Result<(), BackendError>;

    fn backend_type(&self) -> BackendType;
}

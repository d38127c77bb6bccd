use std::sync::Arc;

use async_trait::async_trait;
use da_gateway_config::MemstoreConfig;
use da_gateway_da_client::{types::BackendError, EigenDAV2Store};
use da_gateway_types::{keccak256, VersionedCert};

use super::{EphemeralDb, MemStoreError, MemstoreCert};

/// Encodes a payload the way it is laid out on the network: a zero version byte,
/// the big-endian `u32` payload length, then the payload itself.
pub fn encode_payload(payload: &[u8]) -> Vec<u8> {
    let len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
    let mut encoded = Vec::with_capacity(payload.len() + 5);
    encoded.push(0);
    encoded.extend_from_slice(&len.to_be_bytes());
    encoded.extend_from_slice(payload);
    encoded
}

/// In-memory [`EigenDAV2Store`].
#[derive(Debug, Clone)]
pub struct MemstoreV2 {
    db: Arc<EphemeralDb>,
}

impl MemstoreV2 {
    pub fn new(config: MemstoreConfig) -> Self {
        Self {
            db: Arc::new(EphemeralDb::new(config)),
        }
    }

    /// Storage of this backend, used to run the pruning loop.
    pub fn db(&self) -> Arc<EphemeralDb> {
        self.db.clone()
    }
}

#[async_trait]
impl EigenDAV2Store for MemstoreV2 {
    async fn put(&self, payload: &[u8]) -> Result<Vec<u8>, BackendError> {
        self.db.simulate_put_latency().await;
        self.db.check_size(payload)?;

        let cert = MemstoreCert::generate(payload).encode();
        self.db.insert(keccak256(&cert), payload.to_vec()).await?;
        tracing::debug!("Stored {} bytes in V2 memstore", payload.len());
        Ok(cert)
    }

    async fn get(
        &self,
        cert: &VersionedCert,
        return_encoded_payload: bool,
    ) -> Result<Vec<u8>, BackendError> {
        self.db.simulate_get_latency().await;
        MemstoreCert::decode(&cert.serialized_cert)?;
        let payload = self.db.fetch(&keccak256(&cert.serialized_cert)).await?;
        Ok(if return_encoded_payload {
            encode_payload(&payload)
        } else {
            payload
        })
    }

    async fn verify_cert(
        &self,
        cert: &VersionedCert,
        l1_inclusion_block_number: u64,
    ) -> Result<(), BackendError> {
        let cert = MemstoreCert::decode(&cert.serialized_cert)?;
        if l1_inclusion_block_number == 0 {
            return Ok(());
        }
        let recency_window = self.db.config().rbn_recency_window;
        if l1_inclusion_block_number > cert.reference_block_number.saturating_add(recency_window)
        {
            return Err(MemStoreError::StaleCert {
                reference_block_number: cert.reference_block_number,
                l1_inclusion_block_number,
                recency_window,
            }
            .into());
        }
        Ok(())
    }
}

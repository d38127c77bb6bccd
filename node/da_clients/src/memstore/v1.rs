use std::sync::Arc;

use async_trait::async_trait;
use da_gateway_config::MemstoreConfig;
use da_gateway_da_client::{types::BackendError, EigenDAV1Store};
use da_gateway_types::keccak256;

use super::{EphemeralDb, MemstoreCert};

/// In-memory [`EigenDAV1Store`].
#[derive(Debug, Clone)]
pub struct MemstoreV1 {
    db: Arc<EphemeralDb>,
}

impl MemstoreV1 {
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
impl EigenDAV1Store for MemstoreV1 {
    async fn put(&self, payload: &[u8]) -> Result<Vec<u8>, BackendError> {
        self.db.simulate_put_latency().await;
        self.db.check_size(payload)?;

        let cert = MemstoreCert::generate(payload).encode();
        self.db.insert(keccak256(&cert), payload.to_vec()).await?;
        tracing::debug!("Stored {} bytes in V1 memstore", payload.len());
        Ok(cert)
    }

    async fn get(&self, cert: &[u8]) -> Result<Vec<u8>, BackendError> {
        self.db.simulate_get_latency().await;
        MemstoreCert::decode(cert)?;
        Ok(self.db.fetch(&keccak256(cert)).await?)
    }

    async fn verify(&self, cert: &[u8], payload: &[u8]) -> Result<(), BackendError> {
        let cert = MemstoreCert::decode(cert)?;
        Ok(cert.verify_payload(payload)?)
    }
}

use da_gateway_types::keccak256;
use rand::{rngs::OsRng, Rng};
use serde::{Deserialize, Serialize};

use super::MemStoreError;

/// Reference block numbers of generated certs start here, so that the recency check never fails
/// for realistic L1 inclusion blocks.
const BASE_REFERENCE_BLOCK_NUMBER: u64 = 4_294_967_200;

/// Pseudo-random cert issued by the memstores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemstoreCert {
    pub reference_block_number: u64,
    /// keccak256 of the dispersed payload.
    pub payload_digest: [u8; 32],
    /// Makes certs for identical payloads distinct.
    pub nonce: u64,
}

impl MemstoreCert {
    pub(super) fn generate(payload: &[u8]) -> Self {
        Self {
            reference_block_number: BASE_REFERENCE_BLOCK_NUMBER + OsRng.gen_range(0..32),
            payload_digest: keccak256(payload),
            nonce: OsRng.gen(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        // Serializing a fixed-size struct into a `Vec` cannot fail.
        bincode::serialize(self).unwrap_or_default()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, MemStoreError> {
        bincode::deserialize(bytes).map_err(|err| MemStoreError::IncorrectCert(err.to_string()))
    }

    pub(super) fn verify_payload(&self, payload: &[u8]) -> Result<(), MemStoreError> {
        if keccak256(payload) == self.payload_digest {
            Ok(())
        } else {
            Err(MemStoreError::DigestMismatch)
        }
    }
}

use sha3::{Digest, Keccak256};

/// Computes the keccak256 digest of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

//! Secondary backends holding payload replicas.

use da_gateway_da_client::types::{to_non_retriable_error, BackendError};
use da_gateway_types::keccak256;

pub use self::{in_memory::InMemorySecondary, object_store::ObjectStoreSecondary};

mod in_memory;
mod object_store;

fn verify_keccak_key(key: &[u8], value: &[u8]) -> Result<(), BackendError> {
    let expected = keccak256(value);
    if key == expected.as_slice() {
        Ok(())
    } else {
        Err(to_non_retriable_error(anyhow::anyhow!(
            "key 0x{} does not match keccak256 of the value 0x{}",
            hex::encode(key),
            hex::encode(expected)
        )))
    }
}

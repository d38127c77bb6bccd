//! Standard commitment encoding used by the REST front-end.
//!
//! A commitment is the version byte followed by the serialized cert.

use crate::{UnknownVersionByte, VersionByte, VersionedCert};

#[derive(Debug, thiserror::Error)]
pub enum CommitmentError {
    #[error("commitment is empty")]
    Empty,
    #[error(transparent)]
    UnknownVersion(#[from] UnknownVersionByte),
    #[error("commitment contains no cert after the version byte")]
    MissingCert,
}

pub fn encode_commitment(cert: &VersionedCert) -> Vec<u8> {
    let mut commitment = Vec::with_capacity(cert.serialized_cert.len() + 1);
    commitment.push(u8::from(cert.version));
    commitment.extend_from_slice(&cert.serialized_cert);
    commitment
}

pub fn decode_commitment(commitment: &[u8]) -> Result<VersionedCert, CommitmentError> {
    let (&version, cert) = commitment.split_first().ok_or(CommitmentError::Empty)?;
    let version = VersionByte::try_from(version)?;
    if cert.is_empty() {
        return Err(CommitmentError::MissingCert);
    }
    Ok(VersionedCert::new(cert.to_vec(), version))
}

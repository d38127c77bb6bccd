use std::fmt;

use serde::{Deserialize, Serialize};

use crate::EigenDABackend;

/// Version of a certificate, i.e. which primary backend produced it and must verify it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VersionByte {
    /// Legacy certs produced by the V1 backend.
    V0 = 0x00,
    V1 = 0x01,
    V2 = 0x02,
}

impl VersionByte {
    /// Version byte of the certs produced by dispersing to `backend`.
    pub const fn for_dispersal(backend: EigenDABackend) -> Self {
        match backend {
            EigenDABackend::V1 => Self::V0,
            EigenDABackend::V2 => Self::V2,
        }
    }

    pub const fn is_legacy(self) -> bool {
        matches!(self, Self::V0)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown cert version byte {0:#04x}")]
pub struct UnknownVersionByte(pub u8);

impl TryFrom<u8> for VersionByte {
    type Error = UnknownVersionByte;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::V0),
            0x01 => Ok(Self::V1),
            0x02 => Ok(Self::V2),
            _ => Err(UnknownVersionByte(value)),
        }
    }
}

impl From<VersionByte> for u8 {
    fn from(version: VersionByte) -> Self {
        version as u8
    }
}

impl fmt::Display for VersionByte {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:#04x}", *self as u8)
    }
}

/// Serialized certificate tagged with its version. Immutable once created.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VersionedCert {
    pub version: VersionByte,
    pub serialized_cert: Vec<u8>,
}

impl VersionedCert {
    pub fn new(serialized_cert: Vec<u8>, version: VersionByte) -> Self {
        Self {
            version,
            serialized_cert,
        }
    }
}

impl fmt::Debug for VersionedCert {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("VersionedCert")
            .field("version", &self.version)
            .field("serialized_cert", &hex::encode(&self.serialized_cert))
            .finish()
    }
}

/// Per-request read options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetOpts {
    /// L1 block at which the cert was included; `0` skips the recency check.
    pub l1_inclusion_block_number: u64,
    /// Return the encoded payload as stored on the DA network. Such reads bypass secondary storage.
    pub return_encoded_payload: bool,
}

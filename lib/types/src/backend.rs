use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

/// Kind of storage backend known to the gateway.
///
/// Parsing never fails: unrecognized names map to [`BackendType::Unknown`] so that configuration
/// validation can reject them with a meaningful message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum BackendType {
    PrimaryV1,
    PrimaryV2,
    CacheV1Memory,
    CacheV2Memory,
    ObjectStore,
    Unknown,
}

impl BackendType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PrimaryV1 => "eigenda_v1",
            Self::PrimaryV2 => "eigenda_v2",
            Self::CacheV1Memory => "memstore_v1",
            Self::CacheV2Memory => "memstore_v2",
            Self::ObjectStore => "object_store",
            Self::Unknown => "unknown",
        }
    }

    /// Case-insensitive parse. Surrounding whitespace is ignored.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        Self::iter()
            .find(|backend| backend.as_str().eq_ignore_ascii_case(name))
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Protocol version of the primary DA backend that receives dispersals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EigenDABackend {
    #[serde(alias = "V1")]
    V1,
    #[serde(alias = "V2")]
    V2,
}

impl EigenDABackend {
    /// Compact representation used to store the backend in an atomic cell.
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            _ => None,
        }
    }

    /// Primary backend type serving this protocol version.
    pub const fn backend_type(self) -> BackendType {
        match self {
            Self::V1 => BackendType::PrimaryV1,
            Self::V2 => BackendType::PrimaryV2,
        }
    }
}

impl fmt::Display for EigenDABackend {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown EigenDA backend `{0}`, expected `v1` or `v2`")]
pub struct ParseEigenDABackendError(String);

impl FromStr for EigenDABackend {
    type Err = ParseEigenDABackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" => Ok(Self::V1),
            "v2" => Ok(Self::V2),
            _ => Err(ParseEigenDABackendError(s.to_owned())),
        }
    }
}

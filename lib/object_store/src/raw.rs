use std::{error, fmt};

use async_trait::async_trait;

/// Buckets for the objects kept by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Bucket {
    /// Replicas of dispersed payloads keyed by the hash of their cert.
    SecondaryPayloads,
    /// Preimages keyed by their keccak256 hash.
    KeccakPreimages,
}

impl Bucket {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SecondaryPayloads => "secondary_payloads",
            Self::KeccakPreimages => "keccak_preimages",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Thread-safe boxed error.
pub type BoxedError = Box<dyn error::Error + Send + Sync>;

/// Errors during [`ObjectStore`] operations.
#[derive(Debug)]
#[non_exhaustive]
pub enum ObjectStoreError {
    /// Object store initialization failed.
    Initialization {
        source: BoxedError,
        is_transient: bool,
    },
    /// An object with the specified key is not found.
    KeyNotFound(BoxedError),
    /// Other error has occurred when accessing the store (e.g., a network error).
    Other {
        source: BoxedError,
        is_transient: bool,
    },
}

impl ObjectStoreError {
    /// Gives a best-effort estimate whether this error is transient.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Initialization { is_transient, .. } | Self::Other { is_transient, .. } => {
                *is_transient
            }
            Self::KeyNotFound(_) => false,
        }
    }

    pub(crate) fn other(source: impl Into<BoxedError>, is_transient: bool) -> Self {
        Self::Other {
            source: source.into(),
            is_transient,
        }
    }
}

impl fmt::Display for ObjectStoreError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initialization {
                source,
                is_transient,
            } => {
                let kind = if *is_transient { "transient" } else { "fatal" };
                write!(
                    formatter,
                    "{kind} error initializing object store: {source}"
                )
            }
            Self::KeyNotFound(err) => write!(formatter, "key not found: {err}"),
            Self::Other {
                source,
                is_transient,
            } => {
                let kind = if *is_transient { "transient" } else { "fatal" };
                write!(formatter, "{kind} error accessing object store: {source}")
            }
        }
    }
}

impl error::Error for ObjectStoreError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Initialization { source, .. } | Self::Other { source, .. } => {
                Some(source.as_ref())
            }
            Self::KeyNotFound(err) => Some(err.as_ref()),
        }
    }
}

/// Functionality to fetch and store byte blobs from an object store (S3, local filesystem etc).
///
/// The methods of this trait are low-level. The secondary backends build on top of them,
/// deriving keys from cert hashes.
///
/// # Implementation details
///
/// Implementations must be thread-safe. A single store is shared among all requests, including
/// the background replication loop.
#[async_trait]
pub trait ObjectStore: 'static + fmt::Debug + Send + Sync {
    /// Fetches the value for the given key from the given bucket if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::KeyNotFound`] if the key is absent, and other variants on I/O failures.
    async fn get_raw(&self, bucket: Bucket, key: &str) -> Result<Vec<u8>, ObjectStoreError>;

    /// Stores the value associating it with the key into the given bucket.
    /// If the key already exists, the value is replaced.
    ///
    /// # Errors
    ///
    /// Returns I/O errors specific to the storage.
    async fn put_raw(
        &self,
        bucket: Bucket,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), ObjectStoreError>;

    /// Removes a value associated with the key from the bucket if it exists.
    ///
    /// # Errors
    ///
    /// Returns I/O errors specific to the storage.
    async fn remove_raw(&self, bucket: Bucket, key: &str) -> Result<(), ObjectStoreError>;

    /// Location of the bucket, used for logging.
    fn storage_prefix_raw(&self, bucket: Bucket) -> String;
}

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::{fs, io};

use crate::raw::{Bucket, ObjectStore, ObjectStoreError};

impl From<io::Error> for ObjectStoreError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => ObjectStoreError::KeyNotFound(err.into()),
            kind => ObjectStoreError::Other {
                is_transient: matches!(kind, io::ErrorKind::Interrupted | io::ErrorKind::TimedOut),
                source: err.into(),
            },
        }
    }
}

/// [`ObjectStore`] implementation storing objects as files in the local filesystem.
/// Each bucket is a subdirectory of the base path.
#[derive(Debug)]
pub struct FileBackedObjectStore {
    base_dir: PathBuf,
}

impl FileBackedObjectStore {
    /// Creates a new file-backed store with its root at the specified path, creating directories
    /// for all known buckets.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors.
    pub async fn new(base_dir: impl Into<PathBuf>) -> Result<Self, ObjectStoreError> {
        let base_dir = base_dir.into();
        for bucket in [Bucket::SecondaryPayloads, Bucket::KeccakPreimages] {
            let bucket_path = base_dir.join(bucket.as_str());
            fs::create_dir_all(&bucket_path)
                .await
                .map_err(|err| ObjectStoreError::Initialization {
                    source: err.into(),
                    is_transient: false,
                })?;
        }
        Ok(Self { base_dir })
    }

    fn filename(&self, bucket: Bucket, key: &str) -> PathBuf {
        self.base_dir.join(bucket.as_str()).join(key)
    }
}

#[async_trait]
impl ObjectStore for FileBackedObjectStore {
    async fn get_raw(&self, bucket: Bucket, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let filename = self.filename(bucket, key);
        fs::read(filename).await.map_err(Into::into)
    }

    async fn put_raw(
        &self,
        bucket: Bucket,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), ObjectStoreError> {
        let filename = self.filename(bucket, key);
        // Write to a temporary file first so that concurrent readers never observe a partial object.
        let tmp_filename = filename.with_extension("tmp");
        fs::write(&tmp_filename, value).await?;
        fs::rename(tmp_filename, filename).await.map_err(Into::into)
    }

    async fn remove_raw(&self, bucket: Bucket, key: &str) -> Result<(), ObjectStoreError> {
        let filename = self.filename(bucket, key);
        match fs::remove_file(filename).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn storage_prefix_raw(&self, bucket: Bucket) -> String {
        self.base_dir.join(bucket.as_str()).display().to_string()
    }
}

use serde::Deserialize;

/// Kind of object store and its location.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "mode")]
pub enum ObjectStoreMode {
    /// Files under a local directory.
    FileBacked { file_backed_base_path: String },
    /// S3 or an S3-compatible service; `endpoint` overrides the AWS endpoint (e.g. MinIO).
    S3 {
        bucket: String,
        region: Option<String>,
        endpoint: Option<String>,
    },
    /// Process-local map, for development only.
    Mock,
}

/// Configuration for the object store
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObjectStoreConfig {
    #[serde(flatten)]
    pub mode: ObjectStoreMode,
    #[serde(default = "ObjectStoreConfig::default_max_retries")]
    pub max_retries: u16,
}

impl ObjectStoreConfig {
    const fn default_max_retries() -> u16 {
        5
    }

    pub fn for_tests() -> Self {
        Self {
            mode: ObjectStoreMode::Mock,
            max_retries: 1,
        }
    }
}

//! S3-based [`ObjectStore`] implementation.

use std::fmt;

use async_trait::async_trait;
use aws_sdk_s3::{
    config::Region,
    error::{ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
    Client,
};

use crate::raw::{Bucket, ObjectStore, ObjectStoreError};

/// [`ObjectStore`] implementation based on S3 or an S3-compatible service.
/// Gateway buckets are mapped to key prefixes inside a single S3 bucket.
pub(crate) struct S3Store {
    bucket: String,
    client: Client,
}

impl fmt::Debug for S3Store {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("S3Store")
            .field("bucket", &self.bucket)
            // Skip `client` as its representation may contain credentials
            .finish_non_exhaustive()
    }
}

impl S3Store {
    pub async fn new(
        bucket: String,
        region: Option<String>,
        endpoint: Option<String>,
    ) -> Result<Self, ObjectStoreError> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let sdk_config = loader.load().await;

        let mut config = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = endpoint {
            // S3-compatible services generally don't support virtual-hosted-style addressing.
            config = config.endpoint_url(endpoint).force_path_style(true);
        }
        Ok(Self {
            bucket,
            client: Client::from_conf(config.build()),
        })
    }

    fn filename(bucket: Bucket, key: &str) -> String {
        format!("{bucket}/{key}")
    }
}

fn convert_sdk_error<E, R>(err: SdkError<E, R>, is_not_found: bool) -> ObjectStoreError
where
    E: std::error::Error + ProvideErrorMetadata + Send + Sync + 'static,
    R: fmt::Debug + Send + Sync + 'static,
{
    if is_not_found {
        return ObjectStoreError::KeyNotFound(err.into());
    }
    let is_transient = matches!(
        &err,
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_)
    ) || matches!(
        err.code(),
        Some("SlowDown" | "InternalError" | "ServiceUnavailable" | "RequestTimeout")
    );
    ObjectStoreError::other(err, is_transient)
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get_raw(&self, bucket: Bucket, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let filename = Self::filename(bucket, key);
        tracing::trace!(
            "Fetching data from S3 for key {filename} from bucket {}",
            self.bucket
        );
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&filename)
            .send()
            .await
            .map_err(|err| {
                let is_not_found = err
                    .as_service_error()
                    .is_some_and(|err| err.is_no_such_key());
                convert_sdk_error(err, is_not_found)
            })?;
        let body = output
            .body
            .collect()
            .await
            .map_err(|err| ObjectStoreError::other(err, true))?;
        Ok(body.into_bytes().to_vec())
    }

    async fn put_raw(
        &self,
        bucket: Bucket,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), ObjectStoreError> {
        let filename = Self::filename(bucket, key);
        tracing::trace!(
            "Storing data to S3 for key {filename} in bucket {}",
            self.bucket
        );
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(filename)
            .body(ByteStream::from(value))
            .send()
            .await
            .map_err(|err| convert_sdk_error(err, false))?;
        Ok(())
    }

    async fn remove_raw(&self, bucket: Bucket, key: &str) -> Result<(), ObjectStoreError> {
        let filename = Self::filename(bucket, key);
        tracing::trace!(
            "Removing data from S3 for key {filename} from bucket {}",
            self.bucket
        );
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(filename)
            .send()
            .await
            .map_err(|err| convert_sdk_error(err, false))?;
        Ok(())
    }

    fn storage_prefix_raw(&self, bucket: Bucket) -> String {
        format!("s3://{}/{bucket}", self.bucket)
    }
}

use std::fmt;

use da_gateway_da_client::types::BackendError;
use da_gateway_types::{EigenDABackend, VersionByte};

/// Failures of several backends, in the order they occurred.
#[derive(Debug)]
pub struct AggregateError(pub Vec<anyhow::Error>);

impl AggregateError {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                formatter.write_str("; ")?;
            }
            write!(formatter, "[{}] {err:#}", i + 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

#[derive(Debug, thiserror::Error)]
pub enum SecondaryError {
    #[error("all {total} secondary writes failed: {errors}")]
    NoSuccessfulWrites { total: usize, errors: AggregateError },
    #[error(
        "{failed} of {total} secondary writes failed (error-on-secondary-insert-failure mode): {errors}"
    )]
    PartialFailure {
        failed: usize,
        total: usize,
        errors: AggregateError,
    },
    #[error("payload not found in any redundant backend")]
    NotFoundInRedundantBackends,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no EigenDA backend is initialized for certs with version byte {0}")]
    BackendNotInitialized(VersionByte),
    #[error("EigenDA {0} dispersal requested but not configured")]
    DispersalBackendNotConfigured(EigenDABackend),
    #[error("cert verification failed: {0}")]
    CertVerification(#[source] BackendError),
    #[error("returning encoded payload is not supported for {0} certs")]
    UnsupportedEncodedPayload(VersionByte),
    #[error("primary backend failed: {0}")]
    Primary(#[source] BackendError),
    #[error(transparent)]
    Secondary(#[from] SecondaryError),
    #[error("all backends failed: {0}")]
    Exhausted(AggregateError),
}

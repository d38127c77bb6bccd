use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use da_gateway_store::{KeccakError, StoreError};
use da_gateway_types::commitment::CommitmentError;

#[derive(Debug)]
pub(crate) enum ApiError {
    InvalidHex(hex::FromHexError),
    InvalidCommitment(CommitmentError),
    Store(StoreError),
    Keccak(KeccakError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<KeccakError> for ApiError {
    fn from(err: KeccakError) -> Self {
        Self::Keccak(err)
    }
}

impl From<CommitmentError> for ApiError {
    fn from(err: CommitmentError) -> Self {
        Self::InvalidCommitment(err)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidHex(_) | Self::InvalidCommitment(_) => StatusCode::BAD_REQUEST,
            Self::Store(err) => match err {
                StoreError::UnsupportedEncodedPayload(_) => StatusCode::BAD_REQUEST,
                StoreError::CertVerification(_) => StatusCode::IM_A_TEAPOT,
                // Tier misses are folded into `Exhausted`, and `Secondary` only carries replication
                // failures, so no store error maps to 404.
                StoreError::BackendNotInitialized(_)
                | StoreError::DispersalBackendNotConfigured(_)
                | StoreError::Primary(_)
                | StoreError::Secondary(_)
                | StoreError::Exhausted(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Keccak(err) => match err {
                KeccakError::NotConfigured | KeccakError::KeyMismatch(_) => StatusCode::BAD_REQUEST,
                KeccakError::NotFound => StatusCode::NOT_FOUND,
                KeccakError::CorruptedValue(_) | KeccakError::Backend(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn message(&self) -> String {
        match self {
            Self::InvalidHex(err) => format!("invalid hex: {err}"),
            Self::InvalidCommitment(err) => format!("invalid commitment: {err}"),
            Self::Store(err) => err.to_string(),
            Self::Keccak(err) => err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let message = if status_code.is_server_error() {
            // Do not expose backend details to the client, but log them.
            tracing::warn!("Internal error: {}", self.message());
            "internal server error".to_owned()
        } else {
            self.message()
        };
        (status_code, message).into_response()
    }
}

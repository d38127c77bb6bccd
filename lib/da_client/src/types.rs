use std::{error, fmt};

/// `BackendError` is the error type returned by the gateway backends.
#[derive(Debug)]
pub struct BackendError {
    pub error: anyhow::Error,
    pub is_retriable: bool,
}

impl BackendError {
    pub fn is_retriable(&self) -> bool {
        self.is_retriable
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_retriable {
            "retriable"
        } else {
            "fatal"
        };
        write!(f, "{kind} backend error: {:#}", self.error)
    }
}

impl error::Error for BackendError {}

pub fn to_retriable_error(error: impl Into<anyhow::Error>) -> BackendError {
    BackendError {
        error: error.into(),
        is_retriable: true,
    }
}

pub fn to_non_retriable_error(error: impl Into<anyhow::Error>) -> BackendError {
    BackendError {
        error: error.into(),
        is_retriable: false,
    }
}

use backend::BackendError;
use ingest::IngestError;
use resultset::ResultSetError;
use std::fmt::{Display, Formatter};

/// The top-level error surfaced by the `Store` facade.
#[derive(Debug)]
pub enum StoreError {
    InvalidKey(String),
    InvalidAggregation(String),
    Backend(BackendError),
    Ingest(IngestError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::InvalidKey(key) => f.write_fmt(format_args!("invalid series key: {}", key)),
            StoreError::InvalidAggregation(name) => {
                f.write_fmt(format_args!("unknown aggregation function: {}", name))
            }
            StoreError::Backend(err) => Display::fmt(err, f),
            StoreError::Ingest(err) => Display::fmt(err, f),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        StoreError::Backend(err)
    }
}

impl From<IngestError> for StoreError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::InvalidKey(key) => StoreError::InvalidKey(key),
            IngestError::Backend(err) => StoreError::Backend(err),
        }
    }
}

impl From<ResultSetError> for StoreError {
    fn from(err: ResultSetError) -> Self {
        match err {
            ResultSetError::InvalidAggregation(name) => StoreError::InvalidAggregation(name),
            ResultSetError::KeyMismatch { found, .. } => StoreError::InvalidKey(found),
        }
    }
}

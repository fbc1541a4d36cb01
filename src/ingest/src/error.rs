use backend::BackendError;
use std::fmt::{Display, Formatter};

/// An error from the ingest engine.
#[derive(Debug)]
pub enum IngestError {
    InvalidKey(String),
    Backend(BackendError),
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::InvalidKey(key) => f.write_fmt(format_args!("invalid series key: {}", key)),
            IngestError::Backend(err) => Display::fmt(err, f),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<BackendError> for IngestError {
    fn from(err: BackendError) -> Self {
        IngestError::Backend(err)
    }
}

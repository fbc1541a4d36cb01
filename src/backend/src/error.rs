use bucket::BucketError;
use std::fmt::{Display, Formatter};

/// An error from a backend's storage operations.
#[derive(Debug)]
pub enum BackendError {
    NotFound { key: String, range_key: Option<u32> },
    Conflict { key: String, range_key: u32 },
    Bucket(BucketError),
    Io(std::io::Error),
    Redis(redis::RedisError),
    Dynamo(String),
    /// A record's JSON or hex encoding was malformed.
    Encoding(String),
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotFound { key, range_key: Some(rk) } => {
                f.write_fmt(format_args!("no record for key {} at range_key {}", key, rk))
            }
            BackendError::NotFound { key, range_key: None } => {
                f.write_fmt(format_args!("no records for key {}", key))
            }
            BackendError::Conflict { key, range_key } => f.write_fmt(format_args!(
                "a record already exists for key {} at range_key {}",
                key, range_key
            )),
            BackendError::Bucket(err) => Display::fmt(err, f),
            BackendError::Io(err) => Display::fmt(err, f),
            BackendError::Redis(err) => Display::fmt(err, f),
            BackendError::Dynamo(msg) => f.write_str(msg),
            BackendError::Encoding(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<BucketError> for BackendError {
    fn from(err: BucketError) -> Self {
        BackendError::Bucket(err)
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(err)
    }
}

impl From<redis::RedisError> for BackendError {
    fn from(err: redis::RedisError) -> Self {
        BackendError::Redis(err)
    }
}

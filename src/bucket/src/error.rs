use columns::ColumnError;
use std::fmt::{Display, Formatter};

/// An error from constructing or mutating a bucket.
#[derive(Debug, Eq, PartialEq)]
pub enum BucketError {
    /// A calendar bucket was constructed with a range key that isn't the
    /// window-left for its bucket type.
    InvalidRangeKey(u32),
    /// A tuple of the wrong arity was inserted into the value column.
    WrongArity { expected: usize, found: usize },
    /// The on-wire bytes were too short or malformed to decode a bucket.
    Truncated,
}

impl Display for BucketError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BucketError::InvalidRangeKey(rk) => {
                f.write_fmt(format_args!("invalid range key: {}", rk))
            }
            BucketError::WrongArity { expected, found } => f.write_fmt(format_args!(
                "tuple has wrong arity, expected {} but found {}",
                expected, found
            )),
            BucketError::Truncated => f.write_str("bucket bytes are truncated"),
        }
    }
}

impl std::error::Error for BucketError {}

impl From<ColumnError> for BucketError {
    fn from(err: ColumnError) -> Self {
        match err {
            ColumnError::WrongArity { expected, found } => {
                BucketError::WrongArity { expected, found }
            }
            ColumnError::Truncated => BucketError::Truncated,
        }
    }
}

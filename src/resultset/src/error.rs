use std::fmt::{Display, Formatter};

/// An error from building or aggregating a `ResultSet`.
#[derive(Debug, Eq, PartialEq)]
pub enum ResultSetError {
    /// A bucket handed to `ResultSet::new` belonged to a different key.
    KeyMismatch { expected: String, found: String },
    /// An unrecognised aggregation function name.
    InvalidAggregation(String),
}

impl Display for ResultSetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultSetError::KeyMismatch { expected, found } => f.write_fmt(format_args!(
                "bucket key {} does not match result set key {}",
                found, expected
            )),
            ResultSetError::InvalidAggregation(name) => {
                f.write_fmt(format_args!("unknown aggregation function: {}", name))
            }
        }
    }
}

impl std::error::Error for ResultSetError {}

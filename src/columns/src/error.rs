use std::fmt::{Display, Formatter};

/// An error from the column containers.
#[derive(Debug, Eq, PartialEq)]
pub enum ColumnError {
    /// A tuple was inserted/appended whose arity didn't match the column.
    WrongArity { expected: usize, found: usize },
    /// The on-wire bytes for a value column weren't a multiple of the
    /// element width for the declared value type.
    Truncated,
}

impl Display for ColumnError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnError::WrongArity { expected, found } => f.write_fmt(format_args!(
                "tuple has wrong arity, expected {} but found {}",
                expected, found
            )),
            ColumnError::Truncated => f.write_str("value column bytes are truncated"),
        }
    }
}

impl std::error::Error for ColumnError {}

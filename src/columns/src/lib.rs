mod error;
mod timestamps;
mod value;

pub use error::ColumnError;
pub use timestamps::TimestampColumn;
pub use value::{Value, ValueColumn, ValueType};

mod aggregate;
mod error;
mod resultset;

pub use aggregate::{AggregateValue, AggregationFn, Grouping};
pub use error::ResultSetError;
pub use resultset::ResultSet;

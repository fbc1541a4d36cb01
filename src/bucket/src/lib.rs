mod bucket;
mod bucket_type;
mod error;

pub use bucket::Bucket;
pub use bucket_type::{BucketType, SplitLimit};
pub use error::BucketError;

mod backend;
mod backends;
mod error;
mod index;
mod record;

pub use backend::Backend;
pub use backends::dynamo::{DynamoBackend, DynamoBackendConfig};
pub use backends::file::{FileBackend, FileBackendConfig};
pub use backends::redis::{RedisBackend, RedisBackendConfig};
pub use error::BackendError;
pub use record::Record;

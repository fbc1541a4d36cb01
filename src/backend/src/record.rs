use crate::error::BackendError;
use bucket::Bucket;
use serde::{Deserialize, Serialize};

/// The line-delimited/sorted-set-member record shape shared by the file
/// and Redis adapters: the bucket codec's bytes, hex-encoded so the
/// surrounding container stays plain JSON.
#[derive(Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    pub range_key: u32,
    pub data: String,
}

impl Record {
    pub fn from_bucket(bucket: &Bucket) -> Self {
        Record {
            key: bucket.key().to_string(),
            range_key: bucket.range_key(),
            data: hex::encode(bucket.to_bytes()),
        }
    }

    pub fn to_bucket(&self) -> Result<Bucket, BackendError> {
        let bytes = hex::decode(&self.data).map_err(|e| BackendError::Encoding(e.to_string()))?;
        Ok(Bucket::from_bytes(self.key.clone(), &bytes)?)
    }
}

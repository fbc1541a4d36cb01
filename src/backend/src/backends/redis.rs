use crate::backend::Backend;
use crate::error::BackendError;
use crate::record::Record;
use ::redis::{Client, Commands};
use bucket::Bucket;

#[derive(Clone, Debug)]
pub struct RedisBackendConfig {
    pub host: String,
    pub port: u16,
    pub db: i64,
    /// Applied with `EXPIRE` after every write; `None` leaves keys with no TTL.
    pub expire_seconds: Option<u64>,
}

impl Default for RedisBackendConfig {
    fn default() -> Self {
        RedisBackendConfig {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            expire_seconds: None,
        }
    }
}

/// One sorted set per key (score = `range_key`, member = the JSON record),
/// matching the file backend's record shape so a bucket moved between
/// backends decodes identically.
pub struct RedisBackend {
    config: RedisBackendConfig,
    client: Client,
}

impl RedisBackend {
    pub fn new(config: RedisBackendConfig) -> Result<Self, BackendError> {
        let url = format!("redis://{}:{}/{}", config.host, config.port, config.db);
        let client = Client::open(url).map_err(BackendError::from)?;
        Ok(RedisBackend { config, client })
    }

    fn connection(&self) -> Result<::redis::Connection, BackendError> {
        Ok(self.client.get_connection()?)
    }

    fn members_in_score_range(
        con: &mut ::redis::Connection,
        key: &str,
        min: String,
        max: String,
    ) -> Result<Vec<String>, BackendError> {
        Ok(con.zrangebyscore(zset_key(key), min, max)?)
    }

    fn decode_all(key: &str, members: Vec<String>) -> Result<Vec<Bucket>, BackendError> {
        members
            .iter()
            .map(|m| {
                let record: Record =
                    serde_json::from_str(m).map_err(|e| BackendError::Encoding(e.to_string()))?;
                record.to_bucket()
            })
            .map(|r| r)
            .collect::<Result<Vec<Bucket>, BackendError>>()
            .map(|mut v| {
                v.sort_by_key(Bucket::range_key);
                let _ = key;
                v
            })
    }

    fn expire_if_configured(&self, con: &mut ::redis::Connection, key: &str) -> Result<(), BackendError> {
        if let Some(seconds) = self.config.expire_seconds {
            let _: () = con.expire(zset_key(key), seconds as usize)?;
        }
        Ok(())
    }
}

fn zset_key(key: &str) -> String {
    format!("stss:{}", key)
}

impl Backend for RedisBackend {
    fn get(&self, key: &str, range_key: u32) -> Result<Bucket, BackendError> {
        let mut con = self.connection()?;
        let score = range_key as f64;
        let members = Self::members_in_score_range(&mut con, key, score.to_string(), score.to_string())?;
        let buckets = Self::decode_all(key, members)?;
        buckets
            .into_iter()
            .find(|b| b.range_key() == range_key)
            .ok_or(BackendError::NotFound { key: key.to_string(), range_key: Some(range_key) })
    }

    fn insert(&self, bucket: &Bucket) -> Result<(), BackendError> {
        let mut con = self.connection()?;
        let score = bucket.range_key() as f64;
        let existing = Self::members_in_score_range(&mut con, bucket.key(), score.to_string(), score.to_string())?;
        if !existing.is_empty() {
            return Err(BackendError::Conflict {
                key: bucket.key().to_string(),
                range_key: bucket.range_key(),
            });
        }
        let record = Record::from_bucket(bucket);
        let member = serde_json::to_string(&record).map_err(|e| BackendError::Encoding(e.to_string()))?;
        let _: () = con.zadd(zset_key(bucket.key()), member, score)?;
        self.expire_if_configured(&mut con, bucket.key())?;
        Ok(())
    }

    fn update(&self, bucket: &Bucket) -> Result<(), BackendError> {
        let mut con = self.connection()?;
        let score = bucket.range_key() as f64;
        let zkey = zset_key(bucket.key());
        let _: () = con.zrembyscore(&zkey, score, score)?;
        let record = Record::from_bucket(bucket);
        let member = serde_json::to_string(&record).map_err(|e| BackendError::Encoding(e.to_string()))?;
        let _: () = con.zadd(&zkey, member, score)?;
        self.expire_if_configured(&mut con, bucket.key())?;
        Ok(())
    }

    fn query(&self, key: &str, range_min: u32, range_max: u32) -> Result<Vec<Bucket>, BackendError> {
        let mut con = self.connection()?;
        let mut members =
            Self::members_in_score_range(&mut con, key, range_min.to_string(), range_max.to_string())?;
        let left: Vec<String> = con.zrevrangebyscore_limit(
            zset_key(key),
            format!("({}", range_min),
            "-inf",
            0,
            1,
        )?;
        let mut all = left;
        all.append(&mut members);
        Self::decode_all(key, all)
    }

    fn first(&self, key: &str, n: usize) -> Result<Vec<Bucket>, BackendError> {
        let mut con = self.connection()?;
        let members: Vec<String> = con.zrange(zset_key(key), 0, n as isize - 1)?;
        if members.is_empty() {
            return Err(BackendError::NotFound { key: key.to_string(), range_key: None });
        }
        Self::decode_all(key, members)
    }

    fn last(&self, key: &str, n: usize) -> Result<Vec<Bucket>, BackendError> {
        let mut con = self.connection()?;
        let members: Vec<String> = con.zrevrange(zset_key(key), 0, n as isize - 1)?;
        if members.is_empty() {
            return Err(BackendError::NotFound { key: key.to_string(), range_key: None });
        }
        let mut buckets = Self::decode_all(key, members)?;
        buckets.reverse();
        Ok(buckets)
    }

    fn left(&self, key: &str, range_key: u32, n: usize) -> Result<Vec<Bucket>, BackendError> {
        let mut con = self.connection()?;
        let members: Vec<String> = con.zrevrangebyscore_limit(
            zset_key(key),
            range_key.to_string(),
            "-inf",
            0,
            n as isize,
        )?;
        if members.is_empty() {
            return Err(BackendError::NotFound { key: key.to_string(), range_key: Some(range_key) });
        }
        let mut buckets = Self::decode_all(key, members)?;
        buckets.reverse();
        Ok(buckets)
    }

    fn range(&self, key: &str) -> Result<Option<(u32, u32)>, BackendError> {
        match (self.first(key, 1), self.last(key, 1)) {
            (Ok(first), Ok(last)) => {
                match (first[0].ts_min(), last[0].ts_max()) {
                    (Some(a), Some(b)) => Ok(Some((a, b))),
                    _ => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    fn count(&self, key: &str) -> Result<usize, BackendError> {
        let mut con = self.connection()?;
        let members: Vec<String> = con.zrange(zset_key(key), 0, -1)?;
        Ok(Self::decode_all(key, members)?.iter().map(Bucket::len).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bucket::BucketType;
    use columns::{Value, ValueType};

    #[test]
    fn test_zset_key_namespaces_by_series() {
        assert_eq!(zset_key("cpu"), "stss:cpu");
        assert_eq!(zset_key("mem"), "stss:mem");
    }

    #[test]
    fn test_record_round_trip_through_json_member() {
        let mut bucket = Bucket::new("cpu", ValueType::RawFloat, BucketType::Dynamic, 0).unwrap();
        bucket.insert_point(1, Value::Float(1.5), false).unwrap();
        let record = Record::from_bucket(&bucket);
        let member = serde_json::to_string(&record).unwrap();
        let decoded: Record = serde_json::from_str(&member).unwrap();
        let decoded_bucket = decoded.to_bucket().unwrap();
        assert_eq!(decoded_bucket, bucket);
    }

    #[test]
    fn test_default_config_matches_source_defaults() {
        let config = RedisBackendConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 6379);
        assert_eq!(config.db, 0);
        assert_eq!(config.expire_seconds, None);
    }
}

use crate::backend::Backend;
use crate::error::BackendError;
use crate::index;
use crate::record::Record;
use bucket::Bucket;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Clone, Debug)]
pub struct FileBackendConfig {
    pub root: PathBuf,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        FileBackendConfig { root: PathBuf::from(".") }
    }
}

/// One `<root>/<key>.stss` file per key, line-delimited JSON records with
/// hex-encoded bucket bytes. A key's whole file is loaded into an
/// in-process cache on first access and rewritten in full on any mutation.
pub struct FileBackend {
    config: FileBackendConfig,
    cache: Mutex<HashMap<String, BTreeMap<u32, Bucket>>>,
}

impl FileBackend {
    pub fn new(config: FileBackendConfig) -> Self {
        FileBackend { config, cache: Mutex::new(HashMap::new()) }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.config.root.join(format!("{}.stss", key))
    }

    fn load_key(
        &self,
        key: &str,
        cache: &mut HashMap<String, BTreeMap<u32, Bucket>>,
    ) -> Result<(), BackendError> {
        if cache.contains_key(key) {
            return Ok(());
        }
        let path = self.path_for(key);
        let mut buckets = BTreeMap::new();
        if path.exists() {
            let file = File::open(&path)?;
            for line in BufReader::new(file).lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let record: Record =
                    serde_json::from_str(&line).map_err(|e| BackendError::Encoding(e.to_string()))?;
                let bucket = record.to_bucket()?;
                buckets.insert(bucket.range_key(), bucket);
            }
        }
        tracing::debug!(key = %key, path = %path.display(), count = buckets.len(), "loaded key into file backend cache");
        cache.insert(key.to_string(), buckets);
        Ok(())
    }

    fn persist(&self, key: &str, buckets: &BTreeMap<u32, Bucket>) -> Result<(), BackendError> {
        fs::create_dir_all(&self.config.root)?;
        let path = self.path_for(key);
        let mut file = File::create(&path)?;
        for bucket in buckets.values() {
            let record = Record::from_bucket(bucket);
            let line = serde_json::to_string(&record).map_err(|e| BackendError::Encoding(e.to_string()))?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}

impl Backend for FileBackend {
    fn get(&self, key: &str, range_key: u32) -> Result<Bucket, BackendError> {
        let mut cache = self.cache.lock().unwrap();
        self.load_key(key, &mut cache)?;
        cache[key].get(&range_key).cloned().ok_or(BackendError::NotFound {
            key: key.to_string(),
            range_key: Some(range_key),
        })
    }

    fn insert(&self, bucket: &Bucket) -> Result<(), BackendError> {
        let mut cache = self.cache.lock().unwrap();
        self.load_key(bucket.key(), &mut cache)?;
        let buckets = cache.get_mut(bucket.key()).unwrap();
        if buckets.contains_key(&bucket.range_key()) {
            return Err(BackendError::Conflict {
                key: bucket.key().to_string(),
                range_key: bucket.range_key(),
            });
        }
        buckets.insert(bucket.range_key(), bucket.clone());
        self.persist(bucket.key(), buckets)
    }

    fn update(&self, bucket: &Bucket) -> Result<(), BackendError> {
        let mut cache = self.cache.lock().unwrap();
        self.load_key(bucket.key(), &mut cache)?;
        let buckets = cache.get_mut(bucket.key()).unwrap();
        buckets.insert(bucket.range_key(), bucket.clone());
        self.persist(bucket.key(), buckets)
    }

    fn query(&self, key: &str, range_min: u32, range_max: u32) -> Result<Vec<Bucket>, BackendError> {
        let mut cache = self.cache.lock().unwrap();
        self.load_key(key, &mut cache)?;
        let buckets = &cache[key];
        let range_keys: Vec<u32> = buckets.keys().cloned().collect();
        let values: Vec<&Bucket> = buckets.values().collect();
        Ok(index::query_indices(&range_keys, range_min, range_max)
            .into_iter()
            .map(|i| values[i].clone())
            .collect())
    }

    fn first(&self, key: &str, n: usize) -> Result<Vec<Bucket>, BackendError> {
        let mut cache = self.cache.lock().unwrap();
        self.load_key(key, &mut cache)?;
        let buckets = &cache[key];
        if buckets.is_empty() {
            return Err(BackendError::NotFound { key: key.to_string(), range_key: None });
        }
        let range_keys: Vec<u32> = buckets.keys().cloned().collect();
        let values: Vec<&Bucket> = buckets.values().collect();
        Ok(index::first_indices(&range_keys, n).into_iter().map(|i| values[i].clone()).collect())
    }

    fn last(&self, key: &str, n: usize) -> Result<Vec<Bucket>, BackendError> {
        let mut cache = self.cache.lock().unwrap();
        self.load_key(key, &mut cache)?;
        let buckets = &cache[key];
        if buckets.is_empty() {
            return Err(BackendError::NotFound { key: key.to_string(), range_key: None });
        }
        let range_keys: Vec<u32> = buckets.keys().cloned().collect();
        let values: Vec<&Bucket> = buckets.values().collect();
        Ok(index::last_indices(&range_keys, n).into_iter().map(|i| values[i].clone()).collect())
    }

    fn left(&self, key: &str, range_key: u32, n: usize) -> Result<Vec<Bucket>, BackendError> {
        let mut cache = self.cache.lock().unwrap();
        self.load_key(key, &mut cache)?;
        let buckets = &cache[key];
        let range_keys: Vec<u32> = buckets.keys().cloned().collect();
        let values: Vec<&Bucket> = buckets.values().collect();
        let indices = index::left_indices(&range_keys, range_key, n);
        if indices.is_empty() {
            return Err(BackendError::NotFound { key: key.to_string(), range_key: Some(range_key) });
        }
        Ok(indices.into_iter().map(|i| values[i].clone()).collect())
    }

    fn range(&self, key: &str) -> Result<Option<(u32, u32)>, BackendError> {
        let mut cache = self.cache.lock().unwrap();
        self.load_key(key, &mut cache)?;
        let buckets = &cache[key];
        match (buckets.values().next(), buckets.values().next_back()) {
            (Some(first), Some(last)) => match (first.ts_min(), last.ts_max()) {
                (Some(a), Some(b)) => Ok(Some((a, b))),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    fn count(&self, key: &str) -> Result<usize, BackendError> {
        let mut cache = self.cache.lock().unwrap();
        self.load_key(key, &mut cache)?;
        Ok(cache[key].values().map(Bucket::len).sum())
    }
}

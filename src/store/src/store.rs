use crate::config::StoreConfig;
use crate::error::StoreError;
use backend::Backend;
use columns::Value;
use ingest::{normalize_key, IngestStats};
use resultset::ResultSet;

/// One item of an `insert_bulk` call.
pub struct BulkInsert {
    pub key: String,
    pub data: Vec<(u32, Value)>,
}

/// Applies `StoreConfig`'s bucketing policy over one concrete `Backend`,
/// validating keys and exposing the public insert/query surface.
pub struct Store<B: Backend> {
    config: StoreConfig,
    backend: B,
}

impl<B: Backend> Store<B> {
    pub fn new(config: StoreConfig, backend: B) -> Self {
        Store { config, backend }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn insert(&self, key: &str, mut data: Vec<(u32, Value)>) -> Result<IngestStats, StoreError> {
        let span = tracing::info_span!("store.insert", key = key, count = data.len());
        let _guard = span.enter();
        Ok(ingest::insert(
            &self.backend,
            key,
            self.config.bucket_type,
            self.config.dynamic_target,
            self.config.dynamic_max,
            &mut data,
        )?)
    }

    /// Inserts each item independently; one failing key doesn't stop the
    /// rest from being attempted.
    pub fn insert_bulk(&self, items: Vec<BulkInsert>) -> Vec<Result<IngestStats, StoreError>> {
        let span = tracing::info_span!("store.insert_bulk", count = items.len());
        let _guard = span.enter();
        items.into_iter().map(|item| self.insert(&item.key, item.data)).collect()
    }

    pub fn query(&self, key: &str, ts_min: u32, ts_max: u32) -> Result<ResultSet, StoreError> {
        let span = tracing::info_span!("store.query", key = key, ts_min, ts_max);
        let _guard = span.enter();
        let key = normalize_key(key)?;
        let buckets = self.backend.query(&key, ts_min, ts_max)?;
        let mut result_set = ResultSet::new(key, &buckets)?;
        result_set.trim(ts_min, ts_max);
        Ok(result_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::{FileBackend, FileBackendConfig};
    use bucket::BucketType;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, Store<FileBackend>) {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(FileBackendConfig { root: dir.path().to_path_buf() });
        let config = StoreConfig { bucket_type: BucketType::Dynamic, dynamic_target: 3, dynamic_max: 3, ..Default::default() };
        (dir, Store::new(config, backend))
    }

    #[test]
    fn test_insert_then_query_round_trips() {
        let (_dir, store) = store();
        store.insert("cpu", vec![(1, Value::Float(1.0)), (2, Value::Float(2.0))]).unwrap();
        let rs = store.query("CPU", 0, 10).unwrap();
        let points: Vec<(u32, Value)> = rs.all().collect();
        assert_eq!(points, vec![(1, Value::Float(1.0)), (2, Value::Float(2.0))]);
    }

    #[test]
    fn test_query_trims_to_requested_range() {
        let (_dir, store) = store();
        store
            .insert("cpu", vec![(1, Value::Float(1.0)), (5, Value::Float(5.0)), (9, Value::Float(9.0))])
            .unwrap();
        let rs = store.query("cpu", 2, 8).unwrap();
        let ts: Vec<u32> = rs.all().map(|(t, _)| t).collect();
        assert_eq!(ts, vec![5]);
    }

    #[test]
    fn test_insert_rejects_invalid_key() {
        let (_dir, store) = store();
        let err = store.insert("bad key!", vec![(1, Value::Float(1.0))]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }

    #[test]
    fn test_insert_bulk_runs_each_item_independently() {
        let (_dir, store) = store();
        let results = store.insert_bulk(vec![
            BulkInsert { key: "cpu".to_string(), data: vec![(1, Value::Float(1.0))] },
            BulkInsert { key: "bad key!".to_string(), data: vec![(1, Value::Float(1.0))] },
            BulkInsert { key: "mem".to_string(), data: vec![(2, Value::Float(2.0))] },
        ]);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }
}

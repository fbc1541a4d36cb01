use crate::error::IngestError;
use crate::key::normalize_key;
use crate::stats::IngestStats;
use backend::{Backend, BackendError};
use bucket::{Bucket, BucketType, SplitLimit};
use columns::{Value, ValueType};

/// Orchestrates one insert: locate the last bucket, decide append vs.
/// merge, evaluate splits, write the result back through `backend`.
///
/// `data` is sorted ascending in place (mirroring the source, which sorts
/// the caller's list before doing anything else) and must be non-empty;
/// the value type of a brand new series is taken from `data[0]`.
pub fn insert<B: Backend>(
    backend: &B,
    key: &str,
    bucket_type: BucketType,
    dynamic_target: usize,
    dynamic_max: usize,
    data: &mut Vec<(u32, Value)>,
) -> Result<IngestStats, IngestError> {
    let key = normalize_key(key)?;
    data.sort_by_key(|(t, _)| *t);

    let ts_min = data.first().map(|(t, _)| *t).unwrap_or(0);
    let ts_max = data.last().map(|(t, _)| *t).unwrap_or(0);
    let count = data.len();
    let value_type = data[0].1.value_type();

    let last_bucket = match backend.last(&key, 1) {
        Ok(mut buckets) => buckets.pop().expect("last(key, 1) returned an empty vec on Ok"),
        Err(BackendError::NotFound { .. }) => fresh_bucket(&key, value_type, bucket_type, ts_min)?,
        Err(err) => return Err(err.into()),
    };

    let mut appended = 0usize;
    let mut inserted = 0usize;
    let mut merged = false;
    let mut updated: Vec<Bucket>;

    let is_append = match last_bucket.ts_max() {
        None => true,
        Some(last_ts_max) => ts_min >= last_ts_max,
    };

    if is_append {
        tracing::debug!(key = %key, count, "append fast path");
        let mut bucket = last_bucket;
        appended += bucket.insert(data)?;
        updated = vec![bucket];
    } else {
        tracing::debug!(key = %key, ts_min, ts_max, "merge path");
        merged = true;
        let mut merge = backend.query(&key, ts_min, ts_max)?;
        assert!(!merge.is_empty(), "+left neighbour rule guarantees a non-empty merge set");
        assert!(
            merge[0].ts_min().map(|t| t <= ts_min).unwrap_or(true),
            "leftmost merge bucket must start at or before ts_min"
        );

        let mut i = data.len();
        let mut m = merge.len() - 1;
        while i > 0 {
            let (t, v) = data[i - 1];
            let bucket_start = merge[m].ts_min().unwrap_or(merge[m].range_key());
            if t >= bucket_start {
                inserted += merge[m].insert_point(t, v, false)?;
                i -= 1;
            } else if m > 0 {
                m -= 1;
            } else {
                // No bucket starts at or before `t`; it belongs in the leftmost one.
                inserted += merge[m].insert_point(t, v, false)?;
                i -= 1;
            }
        }
        updated = merge;
    }

    let mut splits = 0usize;
    let last_index = updated.len().saturating_sub(1);
    let mut final_buckets = Vec::with_capacity(updated.len());
    for (idx, bucket) in updated.drain(..).enumerate() {
        let needs_soft = bucket.split_needed(SplitLimit::Soft, dynamic_target, dynamic_max);
        let needs_hard = bucket.split_needed(SplitLimit::Hard, dynamic_target, dynamic_max);
        if !needs_soft || (idx != last_index && !needs_hard) {
            final_buckets.push(bucket);
        } else {
            splits += 1;
            final_buckets.extend(bucket.split(dynamic_target));
        }
    }

    if appended == 0 && inserted == 0 {
        tracing::debug!(key = %key, "no new points, write-back skipped");
        return Ok(IngestStats {
            key,
            ts_min,
            ts_max,
            count,
            appended,
            inserted,
            updated: 0,
            splits: 0,
            merged,
        });
    }

    for bucket in &final_buckets {
        if bucket.existing() {
            backend.update(bucket)?;
        } else {
            backend.insert(bucket)?;
        }
    }

    tracing::debug!(
        key = %key,
        appended,
        inserted,
        updated = final_buckets.len(),
        splits,
        "write-back complete"
    );

    Ok(IngestStats {
        key,
        ts_min,
        ts_max,
        count,
        appended,
        inserted,
        updated: final_buckets.len(),
        splits,
        merged,
    })
}

fn fresh_bucket(
    key: &str,
    value_type: ValueType,
    bucket_type: BucketType,
    ts_min: u32,
) -> Result<Bucket, IngestError> {
    let range_key = if bucket_type.is_calendar() { bucket_type.left(ts_min) } else { ts_min };
    Ok(Bucket::new(key, value_type, bucket_type, range_key).map_err(BackendError::from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::FileBackend;
    use backend::FileBackendConfig;
    use tempfile::tempdir;

    fn backend() -> (tempfile::TempDir, FileBackend) {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(FileBackendConfig { root: dir.path().to_path_buf() });
        (dir, backend)
    }

    #[test]
    fn test_rejects_invalid_key() {
        let (_dir, backend) = backend();
        let mut data = vec![(1u32, Value::Float(1.0))];
        let err = insert(&backend, "bad key!", BucketType::Dynamic, 3, 3, &mut data)
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidKey(_)));
    }

    #[test]
    fn test_append_fast_path() {
        let (_dir, backend) = backend();
        let mut data = vec![(1, Value::Float(1.1)), (2, Value::Float(2.2))];
        insert(&backend, "hi", BucketType::Dynamic, 3, 3, &mut data).unwrap();

        let mut data2 = vec![(4, Value::Float(4.4))];
        let stats =
            insert(&backend, "hi", BucketType::Dynamic, 3, 3, &mut data2).unwrap();
        assert_eq!(stats.appended, 1);
        assert!(!stats.merged);

        let last = backend.last("hi", 1).unwrap();
        assert_eq!(last[0].len(), 3);
        assert_eq!(last[0].at(2), (4, Value::Float(4.4)));
    }

    #[test]
    fn test_dynamic_split_on_overflow() {
        let (_dir, backend) = backend();
        let mut data = vec![(1, Value::Float(1.1)), (2, Value::Float(2.2)), (4, Value::Float(4.4))];
        insert(&backend, "hi", BucketType::Dynamic, 3, 3, &mut data).unwrap();

        let mut data2 = vec![(3, Value::Float(3.3))];
        let stats =
            insert(&backend, "hi", BucketType::Dynamic, 3, 3, &mut data2).unwrap();
        assert_eq!(stats.splits, 1);
        assert_eq!(stats.updated, 2);

        let first = backend.first("hi", 2).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].len(), 3);
        assert_eq!(first[1].len(), 1);
        assert_eq!(first[1].at(0).0, 4);
    }

    #[test]
    fn test_hourly_split_straddling_two_hours() {
        let (_dir, backend) = backend();
        let mut data: Vec<(u32, Value)> = (0..70u32).map(|i| (i * 60, Value::Float(1.1))).collect();
        insert(&backend, "hi", BucketType::Hourly, 100, 200, &mut data).unwrap();

        let all = backend.first("hi", 10).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].len(), 60);
        assert_eq!(all[1].len(), 10);
    }

    #[test]
    fn test_weekly_split_produces_expected_sizes() {
        let (_dir, backend) = backend();
        let mut data: Vec<(u32, Value)> = (0..20u32).map(|i| (i * 86400, Value::Float(1.1))).collect();
        insert(&backend, "hi", BucketType::Weekly, 100, 200, &mut data).unwrap();

        let all = backend.first("hi", 10).unwrap();
        let lens: Vec<usize> = all.iter().map(Bucket::len).collect();
        assert_eq!(lens, vec![4, 7, 7, 2]);
    }

    #[test]
    fn test_out_of_order_merge_distributes_into_existing_buckets() {
        let (_dir, backend) = backend();
        let mut data = vec![
            (1, Value::Int(2)),
            (2, Value::Int(3)),
            (5, Value::Int(6)),
            (6, Value::Int(7)),
            (9, Value::Int(10)),
            (0, Value::Int(1)),
        ];
        insert(&backend, "hi", BucketType::Dynamic, 2, 2, &mut data).unwrap();

        let mut data2 = vec![
            (3, Value::Int(4)),
            (4, Value::Int(5)),
            (7, Value::Int(8)),
            (8, Value::Int(9)),
        ];
        let stats =
            insert(&backend, "hi", BucketType::Dynamic, 2, 2, &mut data2).unwrap();
        assert!(stats.merged);

        let buckets = backend.query("hi", 0, 10).unwrap();
        let mut points = Vec::new();
        for b in &buckets {
            for i in 0..b.len() {
                points.push(b.at(i));
            }
        }
        points.sort_by_key(|(t, _)| *t);
        points.dedup_by_key(|(t, _)| *t);
        assert_eq!(points.len(), 10);
        for (t, v) in points {
            assert_eq!(v, Value::Int(t + 1));
        }
    }

    #[test]
    fn test_idempotent_reinsert_skips_duplicates() {
        let (_dir, backend) = backend();
        let mut data = vec![(1, Value::Float(1.0)), (2, Value::Float(2.0))];
        insert(&backend, "hi", BucketType::Dynamic, 10, 20, &mut data.clone())
            .unwrap();
        let stats =
            insert(&backend, "hi", BucketType::Dynamic, 10, 20, &mut data).unwrap();
        assert_eq!(stats.appended, 0);
        assert_eq!(stats.inserted, 0);
        assert_eq!(stats.updated, 0);
    }
}

use crate::bucket_type::{BucketType, SplitLimit};
use crate::error::BucketError;
use columns::{TimestampColumn, Value, ValueColumn, ValueType};

/// Size (in bytes) of the fixed bucket header: value_type(u16) +
/// bucket_type(u16) + count(u32).
const HEADER_SIZE: usize = 8;

/// A single bucket: a contiguous, self-describing run of time-ordered
/// samples for one series, persisted as one backend record.
#[derive(Clone, Debug)]
pub struct Bucket {
    key: String,
    value_type: ValueType,
    bucket_type: BucketType,
    range_key: u32,
    range_max: u32,
    timestamps: TimestampColumn,
    values: ValueColumn,
    existing: bool,
    dirty: bool,
}

impl Bucket {
    /// Creates a fresh, empty bucket. For calendar bucket types `range_key`
    /// must already be the window-left for that type, or this fails.
    pub fn new(
        key: impl Into<String>,
        value_type: ValueType,
        bucket_type: BucketType,
        range_key: u32,
    ) -> Result<Self, BucketError> {
        let range_max = if bucket_type.is_calendar() {
            let left = bucket_type.left(range_key);
            if left != range_key {
                return Err(BucketError::InvalidRangeKey(range_key));
            }
            bucket_type.right(range_key)
        } else {
            u32::MAX
        };

        Ok(Bucket {
            key: key.into(),
            value_type,
            bucket_type,
            range_key,
            range_max,
            timestamps: TimestampColumn::new(),
            values: ValueColumn::new(value_type),
            existing: false,
            dirty: false,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn bucket_type(&self) -> BucketType {
        self.bucket_type
    }

    pub fn range_key(&self) -> u32 {
        self.range_key
    }

    pub fn range_max(&self) -> u32 {
        self.range_max
    }

    pub fn existing(&self) -> bool {
        self.existing
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn reset_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Last stored timestamp, or -1 (represented as `None`) if the bucket
    /// is empty - used by the ingest engine's append fast path, which treats
    /// an empty last bucket as "append always succeeds".
    pub fn ts_max(&self) -> Option<u32> {
        if self.timestamps.is_empty() {
            None
        } else {
            Some(self.timestamps.get(self.timestamps.len() - 1))
        }
    }

    pub fn ts_min(&self) -> Option<u32> {
        if self.timestamps.is_empty() {
            None
        } else {
            Some(self.timestamps.get(0))
        }
    }

    pub fn at(&self, i: usize) -> (u32, Value) {
        (self.timestamps.get(i), self.values.get(i))
    }

    pub fn timestamps(&self) -> &TimestampColumn {
        &self.timestamps
    }

    pub fn values(&self) -> &ValueColumn {
        &self.values
    }

    /// Inserts a single point. Returns `1` if the column grew or was
    /// overwritten, `0` if a duplicate timestamp was silently skipped.
    pub fn insert_point(&mut self, t: u32, v: Value, overwrite: bool) -> Result<usize, BucketError> {
        let i = self.timestamps.lower_bound(t);
        if i == self.timestamps.len() {
            self.timestamps.append(t);
            self.values.append(v)?;
            self.dirty = true;
            return Ok(1);
        }
        if self.timestamps.get(i) == t {
            if overwrite {
                self.values.set(i, v)?;
                self.dirty = true;
                return Ok(1);
            }
            tracing::debug!(key = %self.key, timestamp = t, "duplicate insert, skipping");
            return Ok(0);
        }
        self.timestamps.insert_at(i, t);
        self.values.insert_at(i, v)?;
        self.dirty = true;
        Ok(1)
    }

    /// Inserts a whole (already timestamp-sorted or not) series of points,
    /// returning the number that weren't silently-skipped duplicates.
    pub fn insert(&mut self, series: &[(u32, Value)]) -> Result<usize, BucketError> {
        let mut counter = 0;
        for (t, v) in series {
            counter += self.insert_point(*t, *v, false)?;
        }
        Ok(counter)
    }

    pub fn split_needed(&self, limit: SplitLimit, dynamic_target: usize, dynamic_max: usize) -> bool {
        if self.is_empty() {
            return false;
        }
        match self.bucket_type {
            BucketType::Dynamic => match limit {
                SplitLimit::Hard => self.len() > dynamic_max,
                SplitLimit::Soft => self.len() > dynamic_target,
            },
            BucketType::ResultSet => false,
            _ => {
                let l = self.bucket_type.left(self.ts_min().unwrap());
                let r = self.bucket_type.left(self.ts_max().unwrap());
                l != r
            }
        }
    }

    /// Partitions this bucket into invariant-satisfying pieces, in
    /// chronological order. The first piece reuses this bucket's identity
    /// (`existing` flag preserved); the rest are brand new dirty buckets.
    pub fn split(self, dynamic_target: usize) -> Vec<Bucket> {
        if self.is_empty() {
            let mut solo = self;
            solo.dirty = true;
            return vec![solo];
        }

        let mut boundaries = Vec::new();
        match self.bucket_type {
            BucketType::Dynamic => {
                let piece_len = dynamic_target.max(1);
                let mut remaining = self.len();
                while remaining > 0 {
                    let len = piece_len.min(remaining);
                    boundaries.push(len);
                    remaining -= len;
                }
            }
            BucketType::ResultSet => {
                let mut solo = self;
                solo.dirty = true;
                return vec![solo];
            }
            calendar_type => {
                let mut window_left = calendar_type.left(self.timestamps.get(0));
                let mut count = 0usize;
                for i in 0..self.len() {
                    let w = calendar_type.left(self.timestamps.get(i));
                    if w != window_left && count > 0 {
                        boundaries.push(count);
                        count = 0;
                        window_left = w;
                    }
                    count += 1;
                }
                boundaries.push(count);
            }
        }

        let key = self.key.clone();
        let value_type = self.value_type;
        let bucket_type = self.bucket_type;
        let was_existing = self.existing;
        let mut remaining_timestamps = self.timestamps;
        let mut remaining_values = self.values;

        let mut pieces = Vec::with_capacity(boundaries.len());
        for (idx, len) in boundaries.into_iter().enumerate() {
            let tail_timestamps = remaining_timestamps.split_off(len);
            let tail_values = remaining_values.split_off(len);
            let head_timestamps = std::mem::replace(&mut remaining_timestamps, tail_timestamps);
            let head_values = std::mem::replace(&mut remaining_values, tail_values);

            let range_key = if bucket_type.is_calendar() {
                bucket_type.left(head_timestamps.get(0))
            } else {
                head_timestamps.get(0)
            };
            let range_max = if bucket_type.is_calendar() {
                bucket_type.right(range_key)
            } else {
                u32::MAX
            };

            pieces.push(Bucket {
                key: key.clone(),
                value_type,
                bucket_type,
                range_key,
                range_max,
                timestamps: head_timestamps,
                values: head_values,
                existing: idx == 0 && was_existing,
                dirty: true,
            });
        }
        pieces
    }

    /// Little-endian on-wire encoding: see the bucket binary codec
    /// described in the module docs.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + self.len() * 4 * (1 + self.value_type.arity().max(1)));
        buf.extend_from_slice(&self.value_type.wire_tag().to_le_bytes());
        buf.extend_from_slice(&self.bucket_type.wire_tag().to_le_bytes());
        buf.extend_from_slice(&(self.len() as u32).to_le_bytes());
        self.timestamps.to_bytes(&mut buf);
        self.values.to_bytes(&mut buf);
        buf
    }

    pub fn from_bytes(key: impl Into<String>, bytes: &[u8]) -> Result<Self, BucketError> {
        if bytes.len() < HEADER_SIZE {
            return Err(BucketError::Truncated);
        }
        let value_type = ValueType::from_wire_tag(u16::from_le_bytes([bytes[0], bytes[1]]))
            .ok_or(BucketError::Truncated)?;
        let bucket_type = BucketType::from_wire_tag(u16::from_le_bytes([bytes[2], bytes[3]]))
            .ok_or(BucketError::Truncated)?;
        let count = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;

        let ts_end = HEADER_SIZE + count * 4;
        if bytes.len() < ts_end {
            return Err(BucketError::Truncated);
        }
        let timestamps =
            TimestampColumn::from_bytes(&bytes[HEADER_SIZE..ts_end]).ok_or(BucketError::Truncated)?;
        let values = ValueColumn::from_bytes(value_type, count, &bytes[ts_end..])?;

        let key = key.into();
        let range_key = if bucket_type.is_calendar() {
            if count > 0 {
                bucket_type.left(timestamps.get(0))
            } else {
                0
            }
        } else if count > 0 {
            timestamps.get(0)
        } else {
            0
        };
        let range_max = if bucket_type.is_calendar() {
            bucket_type.right(range_key)
        } else {
            u32::MAX
        };

        Ok(Bucket {
            key,
            value_type,
            bucket_type,
            range_key,
            range_max,
            timestamps,
            values,
            existing: true,
            dirty: false,
        })
    }
}

impl PartialEq for Bucket {
    /// A cheap structural proxy, not a deep element-wise compare: agreement
    /// on key, types, dirty flag, length, and the first/last timestamps.
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.dirty == other.dirty
            && self.value_type == other.value_type
            && self.bucket_type == other.bucket_type
            && self.len() == other.len()
            && self.ts_min() == other.ts_min()
            && self.ts_max() == other.ts_max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_misaligned_calendar_range_key() {
        let err = Bucket::new("k", ValueType::RawFloat, BucketType::Daily, 12345).unwrap_err();
        assert_eq!(err, BucketError::InvalidRangeKey(12345));
    }

    #[test]
    fn test_insert_point_append_and_skip_duplicate() {
        let mut b = Bucket::new("k", ValueType::RawFloat, BucketType::Dynamic, 0).unwrap();
        assert_eq!(b.insert_point(5, Value::Float(1.0), false).unwrap(), 1);
        assert_eq!(b.insert_point(5, Value::Float(2.0), false).unwrap(), 0);
        assert_eq!(b.at(0), (5, Value::Float(1.0)));
        assert!(b.dirty());
    }

    #[test]
    fn test_insert_point_overwrite() {
        let mut b = Bucket::new("k", ValueType::RawFloat, BucketType::Dynamic, 0).unwrap();
        b.insert_point(5, Value::Float(1.0), false).unwrap();
        assert_eq!(b.insert_point(5, Value::Float(9.0), true).unwrap(), 1);
        assert_eq!(b.at(0), (5, Value::Float(9.0)));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn test_insert_point_out_of_order() {
        let mut b = Bucket::new("k", ValueType::RawInt, BucketType::Dynamic, 0).unwrap();
        for t in [5, 1, 3, 2, 4] {
            b.insert_point(t, Value::Int(t), false).unwrap();
        }
        let ts: Vec<u32> = (0..b.len()).map(|i| b.at(i).0).collect();
        assert_eq!(ts, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_round_trip_raw_float() {
        let mut b = Bucket::new("k", ValueType::RawFloat, BucketType::Dynamic, 0).unwrap();
        b.insert(&[(1, Value::Float(1.5)), (2, Value::Float(2.5))]).unwrap();
        let bytes = b.to_bytes();
        let decoded = Bucket::from_bytes("k", &bytes).unwrap();
        assert_eq!(decoded, b);
        assert!(decoded.existing());
        assert!(!decoded.dirty());
        assert_eq!(decoded.at(0), (1, Value::Float(1.5)));
        assert_eq!(decoded.at(1), (2, Value::Float(2.5)));
    }

    #[test]
    fn test_round_trip_tuple() {
        let mut b = Bucket::new("k", ValueType::TupleFloat2, BucketType::Dynamic, 0).unwrap();
        b.insert(&[(1, Value::Tuple2([1.0, 2.0])), (2, Value::Tuple2([3.0, 4.0]))])
            .unwrap();
        let bytes = b.to_bytes();
        let decoded = Bucket::from_bytes("k", &bytes).unwrap();
        assert_eq!(decoded, b);
        assert_eq!(decoded.at(1), (2, Value::Tuple2([3.0, 4.0])));
    }

    #[test]
    fn test_round_trip_basic_aggregation() {
        let mut b = Bucket::new("k", ValueType::BasicAggregation, BucketType::Dynamic, 0).unwrap();
        b.insert(&[
            (1, Value::Aggregation { min: 1.0, max: 5.0, sum: 12.0, count: 4.0 }),
            (2, Value::Aggregation { min: 2.0, max: 6.0, sum: 20.0, count: 5.0 }),
        ])
        .unwrap();
        let bytes = b.to_bytes();
        let decoded = Bucket::from_bytes("k", &bytes).unwrap();
        assert_eq!(decoded, b);
        assert_eq!(decoded.value_type(), ValueType::BasicAggregation);
        // The broken implementation this guards against collapsed every
        // arity-4 tuple shape into `Value::Tuple4`; assert the dedicated
        // `Aggregation` shape survives the codec round-trip instead.
        assert_eq!(
            decoded.at(0),
            (1, Value::Aggregation { min: 1.0, max: 5.0, sum: 12.0, count: 4.0 })
        );
        assert_eq!(
            decoded.at(1),
            (2, Value::Aggregation { min: 2.0, max: 6.0, sum: 20.0, count: 5.0 })
        );
    }

    #[test]
    fn test_split_needed_dynamic() {
        let mut b = Bucket::new("k", ValueType::RawInt, BucketType::Dynamic, 0).unwrap();
        for t in 0..5 {
            b.insert_point(t, Value::Int(t), false).unwrap();
        }
        assert!(!b.split_needed(SplitLimit::Soft, 5, 10));
        assert!(b.split_needed(SplitLimit::Soft, 4, 10));
        assert!(!b.split_needed(SplitLimit::Hard, 4, 10));
        assert!(b.split_needed(SplitLimit::Hard, 4, 4));
    }

    #[test]
    fn test_split_needed_calendar() {
        let mut b = Bucket::new("k", ValueType::RawFloat, BucketType::Hourly, 0).unwrap();
        b.insert_point(0, Value::Float(1.0), false).unwrap();
        assert!(!b.split_needed(SplitLimit::Soft, 0, 0));
        b.insert_point(3600, Value::Float(1.0), false).unwrap();
        assert!(b.split_needed(SplitLimit::Soft, 0, 0));
        assert!(b.split_needed(SplitLimit::Hard, 0, 0));
    }

    #[test]
    fn test_split_dynamic_cuts_into_runs() {
        let mut b = Bucket::new("k", ValueType::RawInt, BucketType::Dynamic, 0).unwrap();
        for t in 0..7 {
            b.insert_point(t, Value::Int(t), false).unwrap();
        }
        let pieces = b.split(3);
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0].len(), 3);
        assert_eq!(pieces[1].len(), 3);
        assert_eq!(pieces[2].len(), 1);
        assert!(pieces.iter().all(Bucket::dirty));
        assert_eq!(pieces[1].range_key(), 3);
        assert_eq!(pieces[2].range_key(), 6);
    }

    #[test]
    fn test_split_hourly_straddling_two_hours() {
        let mut b = Bucket::new("k", ValueType::RawFloat, BucketType::Hourly, 0).unwrap();
        for i in 0..70u32 {
            b.insert_point(i * 60, Value::Float(1.1), false).unwrap();
        }
        let pieces = b.split(100);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].len(), 60);
        assert_eq!(pieces[1].len(), 10);
        assert_eq!(pieces[0].range_key(), 0);
        assert_eq!(pieces[1].range_key(), 3600);
    }

    #[test]
    fn test_split_weekly_straddling_several_weeks() {
        // 1970-01-05 is a Monday; start the series 3 days into that week.
        let monday = 4 * 86400;
        let start = monday + 3 * 86400;
        let range_key = calendar::weekly_left(start);
        let mut b = Bucket::new("k", ValueType::RawFloat, BucketType::Weekly, range_key).unwrap();
        for i in 0..20u32 {
            b.insert_point(start + i * 86400, Value::Float(1.1), false).unwrap();
        }
        let pieces = b.split(100);
        let lens: Vec<usize> = pieces.iter().map(Bucket::len).collect();
        assert_eq!(lens, vec![4, 7, 7, 2]);
    }

    #[test]
    fn test_equality_ignores_interior_values() {
        let mut a = Bucket::new("k", ValueType::RawFloat, BucketType::Dynamic, 0).unwrap();
        a.insert(&[(1, Value::Float(1.0)), (2, Value::Float(2.0))]).unwrap();
        let mut b = Bucket::new("k", ValueType::RawFloat, BucketType::Dynamic, 0).unwrap();
        b.insert(&[(1, Value::Float(99.0)), (2, Value::Float(2.0))]).unwrap();
        assert_eq!(a, b);
    }
}

use crate::aggregate::{self, AggregateValue, AggregationFn, Grouping};
use crate::error::ResultSetError;
use bucket::Bucket;
use columns::Value;

/// The in-memory concatenation of a key's buckets for one query, trimmed
/// to the requested range. Buckets are assumed already sorted across each
/// other (the backend returns them in ascending `range_key` order and
/// §3's invariant 2 keeps each one internally sorted), so flattening is a
/// plain concatenation, not a merge.
#[derive(Clone, Debug)]
pub struct ResultSet {
    key: String,
    timestamps: Vec<u32>,
    values: Vec<Value>,
}

impl ResultSet {
    pub fn new(key: impl Into<String>, buckets: &[Bucket]) -> Result<Self, ResultSetError> {
        let key = key.into();
        let mut timestamps = Vec::new();
        let mut values = Vec::new();
        for bucket in buckets {
            if bucket.key() != key {
                return Err(ResultSetError::KeyMismatch {
                    expected: key,
                    found: bucket.key().to_string(),
                });
            }
            for i in 0..bucket.len() {
                let (t, v) = bucket.at(i);
                timestamps.push(t);
                values.push(v);
            }
        }
        Ok(ResultSet { key, timestamps, values })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Shrinks the columns to the inclusive range `[ts_min, ts_max]`,
    /// implemented as the half-open index range
    /// `[lower_bound(ts_min), upper_bound(ts_max))`.
    pub fn trim(&mut self, ts_min: u32, ts_max: u32) {
        let start = self.timestamps.partition_point(|&t| t < ts_min);
        let end = self.timestamps.partition_point(|&t| t <= ts_max);
        self.timestamps = self.timestamps[start..end].to_vec();
        self.values = self.values[start..end].to_vec();
    }

    /// All `(timestamp, value)` pairs in order.
    pub fn all(&self) -> impl Iterator<Item = (u32, Value)> + '_ {
        self.timestamps.iter().copied().zip(self.values.iter().copied())
    }

    /// Consecutive runs of samples sharing the same `hourly_left`.
    ///
    /// Materialised eagerly as owned groups rather than a true lazy
    /// iterator-of-iterators: grouping by adjacency over the same backing
    /// columns would need a sub-iterator borrowing `self` while the outer
    /// iterator also holds it, which Rust's borrow checker doesn't allow
    /// without GAT-heavy plumbing this workspace doesn't otherwise use.
    pub fn hourly(&self) -> Vec<Vec<(u32, Value)>> {
        self.group_by(Grouping::Hourly)
    }

    /// Consecutive runs of samples sharing the same `daily_left`.
    pub fn daily(&self) -> Vec<Vec<(u32, Value)>> {
        self.group_by(Grouping::Daily)
    }

    fn group_by(&self, grouping: Grouping) -> Vec<Vec<(u32, Value)>> {
        let mut groups: Vec<Vec<(u32, Value)>> = Vec::new();
        let mut current_window: Option<u32> = None;
        for (t, v) in self.all() {
            let window = grouping.left(t);
            if current_window != Some(window) {
                groups.push(Vec::new());
                current_window = Some(window);
            }
            groups.last_mut().unwrap().push((t, v));
        }
        groups
    }

    /// One `(window_left, reduced_value)` pair per non-empty group.
    pub fn aggregation(
        &self,
        group: &str,
        fn_name: &str,
    ) -> Result<Vec<(u32, AggregateValue)>, ResultSetError> {
        let grouping = Grouping::from_name(group)?;
        let fn_ = AggregationFn::from_name(fn_name)?;
        Ok(self
            .group_by(grouping)
            .into_iter()
            .map(|group| {
                let window_left = grouping.left(group[0].0);
                let values: Vec<Value> = group.into_iter().map(|(_, v)| v).collect();
                (window_left, aggregate::reduce(fn_, &values))
            })
            .collect())
    }
}

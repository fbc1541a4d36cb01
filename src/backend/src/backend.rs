use crate::error::BackendError;
use bucket::Bucket;

/// A sorted multi-map from `(key, range_key)` to a bucket, implemented by
/// each concrete storage adapter. All three implementations (file, Redis,
/// DynamoDB) must honour the "+left neighbour" rule in `query`: a query for
/// `range_key ∈ [range_min, range_max]` also returns the greatest bucket
/// with `range_key < range_min`, if one exists, since samples at or after
/// `range_min` may still live in the bucket immediately to its left.
pub trait Backend {
    /// Fetches the single record at `(key, range_key)`.
    fn get(&self, key: &str, range_key: u32) -> Result<Bucket, BackendError>;

    /// Inserts a brand new record. Must fail with `Conflict` if one already
    /// exists at `(key, bucket.range_key())`.
    fn insert(&self, bucket: &Bucket) -> Result<(), BackendError>;

    /// Overwrites the record at `(key, bucket.range_key())`, creating it if
    /// the backend's semantics allow (the DynamoDB adapter reuses `insert`).
    fn update(&self, bucket: &Bucket) -> Result<(), BackendError>;

    /// Buckets whose `range_key ∈ [range_min, range_max]`, ascending, plus
    /// the left neighbour (see trait docs).
    fn query(&self, key: &str, range_min: u32, range_max: u32) -> Result<Vec<Bucket>, BackendError>;

    /// The `n` smallest-range_key records, ascending.
    fn first(&self, key: &str, n: usize) -> Result<Vec<Bucket>, BackendError>;

    /// The `n` largest-range_key records, descending.
    fn last(&self, key: &str, n: usize) -> Result<Vec<Bucket>, BackendError>;

    /// The `n` records with `range_key <= range_key`, greatest first.
    fn left(&self, key: &str, range_key: u32, n: usize) -> Result<Vec<Bucket>, BackendError>;

    /// `(ts_min, ts_max)` spanning all of `key`'s data, or `None` if `key`
    /// has no records.
    fn range(&self, key: &str) -> Result<Option<(u32, u32)>, BackendError>;

    /// Sum of `len(bucket)` across every bucket stored for `key`.
    fn count(&self, key: &str) -> Result<usize, BackendError>;
}

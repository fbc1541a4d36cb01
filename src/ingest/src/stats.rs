/// Summary of one `ingest` call, returned to the caller through the store
/// facade.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestStats {
    pub key: String,
    pub ts_min: u32,
    pub ts_max: u32,
    pub count: usize,
    /// Points accepted via the append fast path.
    pub appended: usize,
    /// Points accepted via the merge path (including the left-neighbour bucket).
    pub inserted: usize,
    /// Number of buckets written back to the backend (post-split).
    pub updated: usize,
    /// Number of pre-split buckets that were split into multiple pieces.
    pub splits: usize,
    /// Whether the merge path (rather than the append fast path) was taken.
    pub merged: bool,
}

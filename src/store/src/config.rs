use bucket::BucketType;

/// Bucketing policy and thresholds applied to every key a `Store` ingests.
/// Mirrors the Python source's `TSDB.__init__` settings dict, but as
/// explicit typed fields rather than a `**kwargs` bag.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub bucket_type: BucketType,
    pub dynamic_target: usize,
    pub dynamic_max: usize,
    /// Reserved, unused: no caching layer exists in this store (see the
    /// source's `cache`/`event` hooks, which are absent from the code this
    /// spec was distilled from).
    pub enable_caching: bool,
    /// Reserved, unused: no event-emission layer exists.
    pub enable_events: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            bucket_type: BucketType::Daily,
            dynamic_target: 100,
            dynamic_max: 200,
            enable_caching: false,
            enable_events: false,
        }
    }
}

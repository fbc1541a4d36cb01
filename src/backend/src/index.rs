//! Pure planning functions shared by the file and Redis adapters, which
//! both keep (or can cheaply derive) a sorted `Vec<u32>` of a key's
//! range_keys before deciding which records to actually fetch/return.

/// Indices into `range_keys` (ascending) that `Backend::query` must return:
/// everything in `[range_min, range_max]`, plus the left neighbour.
pub fn query_indices(range_keys: &[u32], range_min: u32, range_max: u32) -> Vec<usize> {
    let mut indices = Vec::new();
    let start = range_keys.partition_point(|&rk| rk < range_min);
    if start > 0 {
        indices.push(start - 1);
    }
    let mut i = start;
    while i < range_keys.len() && range_keys[i] <= range_max {
        indices.push(i);
        i += 1;
    }
    indices
}

/// Indices of the `n` smallest range_keys, ascending.
pub fn first_indices(range_keys: &[u32], n: usize) -> Vec<usize> {
    (0..range_keys.len().min(n)).collect()
}

/// Indices of the `n` largest range_keys, descending.
pub fn last_indices(range_keys: &[u32], n: usize) -> Vec<usize> {
    let len = range_keys.len();
    let take = len.min(n);
    (0..take).map(|i| len - 1 - i).collect()
}

/// Indices of the `n` records with `range_key <= range_key`, descending.
pub fn left_indices(range_keys: &[u32], range_key: u32, n: usize) -> Vec<usize> {
    let end = range_keys.partition_point(|&rk| rk <= range_key);
    let take = end.min(n);
    (0..take).map(|i| end - 1 - i).collect()
}

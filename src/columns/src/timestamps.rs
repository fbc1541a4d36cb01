use std::convert::TryInto;

/// The packed `u32` timestamp column shared by every bucket, regardless of
/// value type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimestampColumn(Vec<u32>);

impl TimestampColumn {
    pub fn new() -> Self {
        TimestampColumn(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, i: usize) -> u32 {
        self.0[i]
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// The first index `i` such that `self[i] >= t`, or `len()` if none.
    pub fn lower_bound(&self, t: u32) -> usize {
        self.0.partition_point(|&x| x < t)
    }

    pub fn insert_at(&mut self, i: usize, t: u32) {
        self.0.insert(i, t);
    }

    pub fn append(&mut self, t: u32) {
        self.0.push(t);
    }

    pub fn split_off(&mut self, at: usize) -> TimestampColumn {
        TimestampColumn(self.0.split_off(at))
    }

    pub fn to_bytes(&self, buf: &mut Vec<u8>) {
        for t in &self.0 {
            buf.extend_from_slice(&t.to_le_bytes());
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<TimestampColumn> {
        if bytes.len() % 4 != 0 {
            return None;
        }
        let values = bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes(chunk.try_into().unwrap()))
            .collect();
        Some(TimestampColumn(values))
    }
}

impl From<Vec<u32>> for TimestampColumn {
    fn from(v: Vec<u32>) -> Self {
        TimestampColumn(v)
    }
}

impl IntoIterator for TimestampColumn {
    type Item = u32;
    type IntoIter = std::vec::IntoIter<u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

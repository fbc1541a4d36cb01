use crate::error::ColumnError;
use std::convert::TryInto;

/// The shape of the value column for a bucket, fixed at construction and
/// immutable afterwards. The wire tag values match the on-disk format this
/// store is byte-compatible with.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ValueType {
    RawFloat,
    RawInt,
    TupleFloat2,
    TupleFloat3,
    TupleFloat4,
    BasicAggregation,
}

impl ValueType {
    pub fn wire_tag(self) -> u16 {
        match self {
            ValueType::RawFloat => 1,
            ValueType::RawInt => 2,
            ValueType::TupleFloat2 => 3,
            ValueType::TupleFloat3 => 4,
            ValueType::TupleFloat4 => 5,
            ValueType::BasicAggregation => 6,
        }
    }

    pub fn from_wire_tag(tag: u16) -> Option<Self> {
        match tag {
            1 => Some(ValueType::RawFloat),
            2 => Some(ValueType::RawInt),
            3 => Some(ValueType::TupleFloat2),
            4 => Some(ValueType::TupleFloat3),
            5 => Some(ValueType::TupleFloat4),
            6 => Some(ValueType::BasicAggregation),
            _ => None,
        }
    }

    /// Number of parallel f32/u32 sub-arrays backing this value type.
    pub fn arity(self) -> usize {
        match self {
            ValueType::RawFloat => 1,
            ValueType::RawInt => 1,
            ValueType::TupleFloat2 => 2,
            ValueType::TupleFloat3 => 3,
            ValueType::TupleFloat4 => 4,
            ValueType::BasicAggregation => 4,
        }
    }
}

/// A single decoded value from a bucket's value column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Float(f32),
    Int(u32),
    Tuple2([f32; 2]),
    Tuple3([f32; 3]),
    Tuple4([f32; 4]),
    Aggregation { min: f32, max: f32, sum: f32, count: f32 },
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Float(_) => ValueType::RawFloat,
            Value::Int(_) => ValueType::RawInt,
            Value::Tuple2(_) => ValueType::TupleFloat2,
            Value::Tuple3(_) => ValueType::TupleFloat3,
            Value::Tuple4(_) => ValueType::TupleFloat4,
            Value::Aggregation { .. } => ValueType::BasicAggregation,
        }
    }

    fn as_f32_components(&self) -> Option<Vec<f32>> {
        match self {
            Value::Float(v) => Some(vec![*v]),
            Value::Tuple2(t) => Some(t.to_vec()),
            Value::Tuple3(t) => Some(t.to_vec()),
            Value::Tuple4(t) => Some(t.to_vec()),
            Value::Aggregation { min, max, sum, count } => Some(vec![*min, *max, *sum, *count]),
            Value::Int(_) => None,
        }
    }
}

/// Packed parallel-array storage for a bucket's value column. Exactly one
/// variant is live per bucket, matching the bucket's `ValueType`.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueColumn {
    Float(Vec<f32>),
    Int(Vec<u32>),
    /// `n` parallel f32 arrays, arity fixed by the outer `ValueType`.
    Tuple(Vec<Vec<f32>>),
    /// Also 4 parallel f32 arrays (`[min, max, sum, count]`), kept as its own
    /// variant rather than folded into `Tuple` - both shapes pack 4 f32
    /// arrays identically on the wire, so array count alone can't tell a
    /// `TupleFloat4` apart from a `BasicAggregation` once decoded.
    Aggregation(Vec<Vec<f32>>),
}

impl ValueColumn {
    pub fn new(value_type: ValueType) -> Self {
        match value_type {
            ValueType::RawFloat => ValueColumn::Float(Vec::new()),
            ValueType::RawInt => ValueColumn::Int(Vec::new()),
            ValueType::TupleFloat2 | ValueType::TupleFloat3 | ValueType::TupleFloat4 => {
                ValueColumn::Tuple(vec![Vec::new(); value_type.arity()])
            }
            ValueType::BasicAggregation => {
                ValueColumn::Aggregation(vec![Vec::new(); value_type.arity()])
            }
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            ValueColumn::Float(_) => ValueType::RawFloat,
            ValueColumn::Int(_) => ValueType::RawInt,
            ValueColumn::Tuple(arrays) => match arrays.len() {
                2 => ValueType::TupleFloat2,
                3 => ValueType::TupleFloat3,
                4 => ValueType::TupleFloat4,
                n => panic!("unsupported tuple arity {}", n),
            },
            ValueColumn::Aggregation(_) => ValueType::BasicAggregation,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ValueColumn::Float(v) => v.len(),
            ValueColumn::Int(v) => v.len(),
            ValueColumn::Tuple(arrays) | ValueColumn::Aggregation(arrays) => {
                arrays.first().map(Vec::len).unwrap_or(0)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, i: usize) -> Value {
        match self {
            ValueColumn::Float(v) => Value::Float(v[i]),
            ValueColumn::Int(v) => Value::Int(v[i]),
            ValueColumn::Tuple(arrays) => match arrays.len() {
                2 => Value::Tuple2([arrays[0][i], arrays[1][i]]),
                3 => Value::Tuple3([arrays[0][i], arrays[1][i], arrays[2][i]]),
                4 => Value::Tuple4([arrays[0][i], arrays[1][i], arrays[2][i], arrays[3][i]]),
                n => panic!("unsupported tuple arity {}", n),
            },
            ValueColumn::Aggregation(arrays) => Value::Aggregation {
                min: arrays[0][i],
                max: arrays[1][i],
                sum: arrays[2][i],
                count: arrays[3][i],
            },
        }
    }

    pub fn append(&mut self, value: Value) -> Result<(), ColumnError> {
        self.insert_at(self.len(), value)
    }

    pub fn insert_at(&mut self, i: usize, value: Value) -> Result<(), ColumnError> {
        match self {
            ValueColumn::Float(v) => match value {
                Value::Float(f) => {
                    v.insert(i, f);
                    Ok(())
                }
                _ => Err(ColumnError::WrongArity { expected: 1, found: 0 }),
            },
            ValueColumn::Int(v) => match value {
                Value::Int(n) => {
                    v.insert(i, n);
                    Ok(())
                }
                _ => Err(ColumnError::WrongArity { expected: 1, found: 0 }),
            },
            ValueColumn::Tuple(arrays) | ValueColumn::Aggregation(arrays) => {
                let components = value
                    .as_f32_components()
                    .ok_or(ColumnError::WrongArity { expected: arrays.len(), found: 0 })?;
                if components.len() != arrays.len() {
                    return Err(ColumnError::WrongArity {
                        expected: arrays.len(),
                        found: components.len(),
                    });
                }
                for (array, component) in arrays.iter_mut().zip(components) {
                    array.insert(i, component);
                }
                Ok(())
            }
        }
    }

    /// Overwrites the element at `i` in place.
    pub fn set(&mut self, i: usize, value: Value) -> Result<(), ColumnError> {
        match self {
            ValueColumn::Float(v) => match value {
                Value::Float(f) => {
                    v[i] = f;
                    Ok(())
                }
                _ => Err(ColumnError::WrongArity { expected: 1, found: 0 }),
            },
            ValueColumn::Int(v) => match value {
                Value::Int(n) => {
                    v[i] = n;
                    Ok(())
                }
                _ => Err(ColumnError::WrongArity { expected: 1, found: 0 }),
            },
            ValueColumn::Tuple(arrays) | ValueColumn::Aggregation(arrays) => {
                let components = value
                    .as_f32_components()
                    .ok_or(ColumnError::WrongArity { expected: arrays.len(), found: 0 })?;
                if components.len() != arrays.len() {
                    return Err(ColumnError::WrongArity {
                        expected: arrays.len(),
                        found: components.len(),
                    });
                }
                for (array, component) in arrays.iter_mut().zip(components) {
                    array[i] = component;
                }
                Ok(())
            }
        }
    }

    /// Splits the column at `at`, returning a new column holding
    /// `[at, len)` and leaving `[0, at)` in `self`, mirroring `Vec::split_off`.
    pub fn split_off(&mut self, at: usize) -> ValueColumn {
        match self {
            ValueColumn::Float(v) => ValueColumn::Float(v.split_off(at)),
            ValueColumn::Int(v) => ValueColumn::Int(v.split_off(at)),
            ValueColumn::Tuple(arrays) => {
                ValueColumn::Tuple(arrays.iter_mut().map(|a| a.split_off(at)).collect())
            }
            ValueColumn::Aggregation(arrays) => {
                ValueColumn::Aggregation(arrays.iter_mut().map(|a| a.split_off(at)).collect())
            }
        }
    }

    pub fn to_bytes(&self, buf: &mut Vec<u8>) {
        match self {
            ValueColumn::Float(v) => {
                for f in v {
                    buf.extend_from_slice(&f.to_le_bytes());
                }
            }
            ValueColumn::Int(v) => {
                for n in v {
                    buf.extend_from_slice(&n.to_le_bytes());
                }
            }
            ValueColumn::Tuple(arrays) | ValueColumn::Aggregation(arrays) => {
                for array in arrays {
                    for f in array {
                        buf.extend_from_slice(&f.to_le_bytes());
                    }
                }
            }
        }
    }

    /// Decodes `count` elements of `value_type` from `bytes`. Tuple value
    /// types split the byte stream evenly across their `n` sub-arrays:
    /// each sub-array gets exactly `bytes.len() / n` bytes.
    pub fn from_bytes(value_type: ValueType, count: usize, bytes: &[u8]) -> Result<Self, ColumnError> {
        match value_type {
            ValueType::RawFloat => Ok(ValueColumn::Float(read_f32_array(bytes, count)?)),
            ValueType::RawInt => Ok(ValueColumn::Int(read_u32_array(bytes, count)?)),
            ValueType::TupleFloat2 | ValueType::TupleFloat3 | ValueType::TupleFloat4 => {
                Ok(ValueColumn::Tuple(read_f32_arrays(value_type.arity(), count, bytes)?))
            }
            ValueType::BasicAggregation => {
                Ok(ValueColumn::Aggregation(read_f32_arrays(value_type.arity(), count, bytes)?))
            }
        }
    }
}

fn read_f32_arrays(arity: usize, count: usize, bytes: &[u8]) -> Result<Vec<Vec<f32>>, ColumnError> {
    if bytes.len() != count * 4 * arity {
        return Err(ColumnError::Truncated);
    }
    let chunk_len = bytes.len() / arity;
    (0..arity)
        .map(|i| read_f32_array(&bytes[i * chunk_len..(i + 1) * chunk_len], count))
        .collect()
}

fn read_f32_array(bytes: &[u8], count: usize) -> Result<Vec<f32>, ColumnError> {
    if bytes.len() != count * 4 {
        return Err(ColumnError::Truncated);
    }
    bytes
        .chunks_exact(4)
        .map(|chunk| Ok(f32::from_le_bytes(chunk.try_into().unwrap())))
        .collect()
}

fn read_u32_array(bytes: &[u8], count: usize) -> Result<Vec<u32>, ColumnError> {
    if bytes.len() != count * 4 {
        return Err(ColumnError::Truncated);
    }
    bytes
        .chunks_exact(4)
        .map(|chunk| Ok(u32::from_le_bytes(chunk.try_into().unwrap())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_column_round_trip() {
        let mut col = ValueColumn::new(ValueType::RawFloat);
        col.append(Value::Float(1.5)).unwrap();
        col.append(Value::Float(2.5)).unwrap();
        let mut bytes = vec![];
        col.to_bytes(&mut bytes);
        let decoded = ValueColumn::from_bytes(ValueType::RawFloat, 2, &bytes).unwrap();
        assert_eq!(decoded, col);
    }

    #[test]
    fn test_tuple_column_round_trip() {
        let mut col = ValueColumn::new(ValueType::TupleFloat3);
        col.append(Value::Tuple3([1.0, 2.0, 3.0])).unwrap();
        col.append(Value::Tuple3([4.0, 5.0, 6.0])).unwrap();
        let mut bytes = vec![];
        col.to_bytes(&mut bytes);
        // Columnar layout: 3 contiguous arrays of 2 elements each.
        assert_eq!(bytes.len(), 3 * 2 * 4);
        let decoded = ValueColumn::from_bytes(ValueType::TupleFloat3, 2, &bytes).unwrap();
        assert_eq!(decoded, col);
        assert_eq!(decoded.get(0), Value::Tuple3([1.0, 2.0, 3.0]));
        assert_eq!(decoded.get(1), Value::Tuple3([4.0, 5.0, 6.0]));
    }

    #[test]
    fn test_wrong_arity_rejected() {
        let mut col = ValueColumn::new(ValueType::TupleFloat2);
        let err = col.append(Value::Tuple3([1.0, 2.0, 3.0])).unwrap_err();
        assert_eq!(err, ColumnError::WrongArity { expected: 2, found: 3 });
    }

    #[test]
    fn test_insert_at_shifts_existing_elements() {
        let mut col = ValueColumn::new(ValueType::RawInt);
        col.append(Value::Int(1)).unwrap();
        col.append(Value::Int(3)).unwrap();
        col.insert_at(1, Value::Int(2)).unwrap();
        assert_eq!(col.get(0), Value::Int(1));
        assert_eq!(col.get(1), Value::Int(2));
        assert_eq!(col.get(2), Value::Int(3));
    }

    #[test]
    fn test_split_off() {
        let mut col = ValueColumn::new(ValueType::RawFloat);
        for v in [1.0, 2.0, 3.0, 4.0] {
            col.append(Value::Float(v)).unwrap();
        }
        let tail = col.split_off(2);
        assert_eq!(col.len(), 2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail.get(0), Value::Float(3.0));
    }

    #[test]
    fn test_aggregation_value_round_trip() {
        let mut col = ValueColumn::new(ValueType::BasicAggregation);
        col.append(Value::Aggregation { min: 1.0, max: 5.0, sum: 12.0, count: 4.0 })
            .unwrap();
        let mut bytes = vec![];
        col.to_bytes(&mut bytes);
        let decoded = ValueColumn::from_bytes(ValueType::BasicAggregation, 1, &bytes).unwrap();
        assert_eq!(
            decoded.get(0),
            Value::Aggregation { min: 1.0, max: 5.0, sum: 12.0, count: 4.0 }
        );
    }
}

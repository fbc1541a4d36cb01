use crate::error::ResultSetError;
use columns::Value;

/// The window a `ResultSet` groups adjacent samples by.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Grouping {
    Hourly,
    Daily,
}

impl Grouping {
    pub fn from_name(name: &str) -> Result<Self, ResultSetError> {
        match name {
            "hourly" => Ok(Grouping::Hourly),
            "daily" => Ok(Grouping::Daily),
            other => Err(ResultSetError::InvalidAggregation(other.to_string())),
        }
    }

    pub fn left(self, ts: u32) -> u32 {
        match self {
            Grouping::Hourly => calendar::hourly_left(ts),
            Grouping::Daily => calendar::daily_left(ts),
        }
    }
}

/// One of the six reduction functions `ResultSet::aggregation` can apply to
/// a group of values.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AggregationFn {
    Sum,
    Count,
    Min,
    Max,
    Amp,
    Mean,
}

impl AggregationFn {
    pub fn from_name(name: &str) -> Result<Self, ResultSetError> {
        match name {
            "sum" => Ok(AggregationFn::Sum),
            "count" => Ok(AggregationFn::Count),
            "min" => Ok(AggregationFn::Min),
            "max" => Ok(AggregationFn::Max),
            "amp" => Ok(AggregationFn::Amp),
            "mean" => Ok(AggregationFn::Mean),
            other => Err(ResultSetError::InvalidAggregation(other.to_string())),
        }
    }
}

/// The scalar or vector result of reducing one group of `Value`s.
#[derive(Clone, Debug, PartialEq)]
pub enum AggregateValue {
    Float(f32),
    Int(u32),
    Tuple(Vec<f32>),
}

/// Reduces a non-empty group of same-shaped values with `fn_`.
///
/// `count` is shape-independent. Every other function operates
/// component-wise: a scalar value type collapses to `Float`/`Int`, a tuple
/// value type collapses to one `Tuple` of the same arity - e.g. `sum` of a
/// run of `Tuple2` points is the component-wise vector sum, not a single
/// number.
pub fn reduce(fn_: AggregationFn, values: &[Value]) -> AggregateValue {
    assert!(!values.is_empty(), "aggregation groups are never empty");
    if fn_ == AggregationFn::Count {
        return AggregateValue::Int(values.len() as u32);
    }

    if let Value::Int(_) = values[0] {
        let ints: Vec<u32> = values
            .iter()
            .map(|v| match v {
                Value::Int(n) => *n,
                _ => unreachable!("all values in a bucket share one ValueType"),
            })
            .collect();
        return AggregateValue::Int(reduce_ints(fn_, &ints));
    }

    let vectors: Vec<Vec<f32>> = values.iter().map(components).collect();
    let arity = vectors[0].len();
    let reduced: Vec<f32> = (0..arity)
        .map(|i| {
            let column: Vec<f32> = vectors.iter().map(|v| v[i]).collect();
            reduce_floats(fn_, &column)
        })
        .collect();

    if arity == 1 {
        AggregateValue::Float(reduced[0])
    } else {
        AggregateValue::Tuple(reduced)
    }
}

fn components(value: &Value) -> Vec<f32> {
    match value {
        Value::Float(f) => vec![*f],
        Value::Tuple2(t) => t.to_vec(),
        Value::Tuple3(t) => t.to_vec(),
        Value::Tuple4(t) => t.to_vec(),
        Value::Aggregation { min, max, sum, count } => vec![*min, *max, *sum, *count],
        Value::Int(_) => unreachable!("integer values take the dedicated int path"),
    }
}

fn reduce_ints(fn_: AggregationFn, values: &[u32]) -> u32 {
    match fn_ {
        AggregationFn::Sum => values.iter().sum(),
        AggregationFn::Min => *values.iter().min().unwrap(),
        AggregationFn::Max => *values.iter().max().unwrap(),
        AggregationFn::Amp => values.iter().max().unwrap() - values.iter().min().unwrap(),
        // Integer mean uses integer division, matching an integer column
        // type with an integer accumulator.
        AggregationFn::Mean => values.iter().sum::<u32>() / values.len() as u32,
        AggregationFn::Count => unreachable!("handled shape-independently"),
    }
}

fn reduce_floats(fn_: AggregationFn, values: &[f32]) -> f32 {
    match fn_ {
        AggregationFn::Sum => values.iter().sum(),
        AggregationFn::Min => values.iter().cloned().fold(f32::INFINITY, f32::min),
        AggregationFn::Max => values.iter().cloned().fold(f32::NEG_INFINITY, f32::max),
        AggregationFn::Amp => {
            let max = values.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            let min = values.iter().cloned().fold(f32::INFINITY, f32::min);
            max - min
        }
        AggregationFn::Mean => values.iter().sum::<f32>() / values.len() as f32,
        AggregationFn::Count => unreachable!("handled shape-independently"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping_and_fn_name_parsing() {
        assert_eq!(Grouping::from_name("hourly").unwrap(), Grouping::Hourly);
        assert!(Grouping::from_name("weekly").is_err());
        assert_eq!(AggregationFn::from_name("mean").unwrap(), AggregationFn::Mean);
        assert!(AggregationFn::from_name("median").is_err());
    }

    #[test]
    fn test_float_sum_and_mean() {
        let values = vec![Value::Float(1.0), Value::Float(2.0), Value::Float(3.0)];
        assert_eq!(reduce(AggregationFn::Sum, &values), AggregateValue::Float(6.0));
        assert_eq!(reduce(AggregationFn::Mean, &values), AggregateValue::Float(2.0));
        assert_eq!(reduce(AggregationFn::Amp, &values), AggregateValue::Float(2.0));
        assert_eq!(reduce(AggregationFn::Count, &values), AggregateValue::Int(3));
    }

    #[test]
    fn test_int_mean_uses_integer_division() {
        let values = vec![Value::Int(1), Value::Int(2)];
        assert_eq!(reduce(AggregationFn::Mean, &values), AggregateValue::Int(1));
    }

    #[test]
    fn test_tuple_reduces_component_wise() {
        let values = vec![Value::Tuple2([1.0, 10.0]), Value::Tuple2([3.0, 20.0])];
        assert_eq!(reduce(AggregationFn::Sum, &values), AggregateValue::Tuple(vec![4.0, 30.0]));
    }
}

//! Aggregates over a result set
//!
//! Every function here takes the records a pipeline execution produced,
//! never the raw table. Numeric aggregates read JSON numbers; under the
//! loose policy numeric strings count as numbers too. Absent fields are
//! skipped everywhere.

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::Value;

use crate::condition::{sort_order, EqualityPolicy};
use crate::record::{self, Record, ValueKey};

use super::errors::{QueryError, QueryResult};

/// Descriptive statistics of a numeric column
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

fn as_number(value: &Value, policy: EqualityPolicy) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if policy == EqualityPolicy::Loose => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Numeric values of `field`, in record order
pub fn numeric_values(records: &[Record], field: &str, policy: EqualityPolicy) -> Vec<f64> {
    records
        .iter()
        .filter_map(|r| record::field(r, field))
        .filter_map(|v| as_number(v, policy))
        .collect()
}

/// Sum of the numeric values; zero for an empty column
pub fn sum(records: &[Record], field: &str, policy: EqualityPolicy) -> f64 {
    numeric_values(records, field, policy).iter().sum()
}

/// Mean of the numeric values
pub fn avg(records: &[Record], field: &str, policy: EqualityPolicy) -> QueryResult<f64> {
    let values = numeric_values(records, field, policy);
    if values.is_empty() {
        return Err(QueryError::empty_aggregate(field));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

fn extreme(records: &[Record], field: &str, wanted: Ordering) -> QueryResult<Value> {
    records
        .iter()
        .filter_map(|r| record::field(r, field))
        .filter(|v| !v.is_null())
        .fold(None::<&Value>, |best, v| match best {
            Some(b) if sort_order(Some(v), Some(b)) != wanted => Some(b),
            _ => Some(v),
        })
        .cloned()
        .ok_or_else(|| QueryError::empty_aggregate(field))
}

/// Smallest present, non-null value (first one on ties)
pub fn min(records: &[Record], field: &str) -> QueryResult<Value> {
    extreme(records, field, Ordering::Less)
}

/// Largest present, non-null value (first one on ties)
pub fn max(records: &[Record], field: &str) -> QueryResult<Value> {
    extreme(records, field, Ordering::Greater)
}

/// Values of `field`, skipping records where it is absent
pub fn pluck(records: &[Record], field: &str) -> Vec<Value> {
    records
        .iter()
        .filter_map(|r| record::field(r, field))
        .cloned()
        .collect()
}

/// `pluck` with duplicates removed, first occurrence wins
pub fn pluck_distinct(records: &[Record], field: &str) -> Vec<Value> {
    let mut seen = std::collections::HashSet::new();
    pluck(records, field)
        .into_iter()
        .filter(|v| seen.insert(ValueKey::from_json(v)))
        .collect()
}

/// `pluck` over the records whose `condition_field` equals `condition_value`
pub fn pluck_where(
    records: &[Record],
    field: &str,
    condition_field: &str,
    condition_value: &Value,
    policy: EqualityPolicy,
) -> Vec<Value> {
    records
        .iter()
        .filter(|r| {
            record::field(r, condition_field)
                .map(|v| policy.equals(v, condition_value))
                .unwrap_or(false)
        })
        .filter_map(|r| record::field(r, field))
        .cloned()
        .collect()
}

/// Mean, min, max and population standard deviation of a numeric column
pub fn stats(records: &[Record], field: &str, policy: EqualityPolicy) -> QueryResult<ColumnStats> {
    let values = numeric_values(records, field, policy);
    if values.is_empty() {
        return Err(QueryError::empty_aggregate(field));
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(ColumnStats {
        mean,
        min,
        max,
        std_dev: variance.sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<Record> {
        vec![
            json!({"name": "John", "age": 30, "team": "a"}),
            json!({"name": "Jane", "age": 25, "team": "b"}),
            json!({"name": "Alice", "age": "28", "team": "a"}),
            json!({"name": "Bob", "age": null}),
            json!({"name": "Eve"}),
        ]
        .into_iter()
        .map(|v| v.as_object().unwrap().clone())
        .collect()
    }

    #[test]
    fn test_sum_strict_skips_strings() {
        assert_eq!(sum(&rows(), "age", EqualityPolicy::Strict), 55.0);
        assert_eq!(sum(&rows(), "age", EqualityPolicy::Loose), 83.0);
        assert_eq!(sum(&[], "age", EqualityPolicy::Strict), 0.0);
    }

    #[test]
    fn test_avg_empty_fails() {
        let err = avg(&rows(), "salary", EqualityPolicy::Strict).unwrap_err();
        assert_eq!(err.code(), "JSONSQL_EMPTY_AGGREGATE");
        assert_eq!(avg(&rows(), "age", EqualityPolicy::Strict).unwrap(), 27.5);
    }

    #[test]
    fn test_min_max_skip_null_and_absent() {
        assert_eq!(max(&rows(), "age").unwrap(), json!("28"));
        assert_eq!(min(&rows(), "age").unwrap(), json!(25));
        assert!(min(&rows(), "salary").is_err());
    }

    #[test]
    fn test_pluck_keeps_null_skips_absent() {
        assert_eq!(pluck(&rows(), "age"), vec![json!(30), json!(25), json!("28"), Value::Null]);
    }

    #[test]
    fn test_pluck_distinct_and_where() {
        assert_eq!(pluck_distinct(&rows(), "team"), vec![json!("a"), json!("b")]);
        assert_eq!(
            pluck_where(&rows(), "name", "team", &json!("a"), EqualityPolicy::Strict),
            vec![json!("John"), json!("Alice")]
        );
    }

    #[test]
    fn test_stats_population_std_dev() {
        let records: Vec<Record> = [2, 4, 4, 4, 5, 5, 7, 9]
            .iter()
            .map(|v| json!({ "v": v }).as_object().unwrap().clone())
            .collect();
        let s = stats(&records, "v", EqualityPolicy::Strict).unwrap();
        assert_eq!(s.mean, 5.0);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
        assert_eq!(s.std_dev, 2.0);
    }

    #[test]
    fn test_stats_empty_fails() {
        assert!(stats(&[], "v", EqualityPolicy::Strict).is_err());
    }
}

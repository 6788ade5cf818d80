//! Scalar comparison rules
//!
//! Equality and ordering are governed by an `EqualityPolicy`:
//!
//! - `Strict` (default): values must share a JSON type. Numbers compare
//!   numerically, so `1 == 1.0`. `"1"` never equals `1`.
//! - `Loose`: scalar coercion. Numeric strings compare numerically with
//!   numbers and with each other, booleans and nulls compare by
//!   truthiness, a number against a non-numeric string compares as text.
//!
//! `sort_order` is separate. Loose coercion is not transitive, so sorting
//! always orders by type rank first and by value within a type.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::record::ValueKey;

/// Value comparison strictness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EqualityPolicy {
    #[default]
    Strict,
    Loose,
}

impl EqualityPolicy {
    /// Value equality under this policy
    pub fn equals(self, a: &Value, b: &Value) -> bool {
        match self {
            EqualityPolicy::Strict => ValueKey::from_json(a) == ValueKey::from_json(b),
            EqualityPolicy::Loose => loose_equals(a, b),
        }
    }

    /// Ordering under this policy; `None` if the values are not comparable.
    pub fn compare(self, a: &Value, b: &Value) -> Option<Ordering> {
        match self {
            EqualityPolicy::Strict => strict_compare(a, b),
            EqualityPolicy::Loose => loose_compare(a, b),
        }
    }
}

fn strict_compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => Some(compare_numbers(x, y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Numeric ordering that stays exact for integers.
///
/// Integral floats compare as integers, so `Equal` here agrees with
/// `ValueKey` identity.
pub(crate) fn compare_numbers(x: &Number, y: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (exact_integer(x), exact_integer(y)) {
        return a.cmp(&b);
    }
    let a = x.as_f64().unwrap_or(0.0);
    let b = y.as_f64().unwrap_or(0.0);
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn exact_integer(n: &Number) -> Option<i128> {
    if let Some(i) = n.as_i64() {
        return Some(i as i128);
    }
    if let Some(u) = n.as_u64() {
        return Some(u as i128);
    }
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < 1e38)
        .map(|f| f as i128)
}

/// Truthiness of a value in the loose model
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

/// Parses a numeric string such as `"42"`, `" 3.5"` or `"1e3"`.
fn numeric_string(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty()
        || !trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

fn number_text(n: &Number) -> String {
    n.to_string()
}

fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(_), _) | (_, Value::Bool(_)) => truthy(a) == truthy(b),
        (Value::Null, Value::String(s)) | (Value::String(s), Value::Null) => s.is_empty(),
        (Value::Null, other) | (other, Value::Null) => !truthy(other),
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Ordering::Equal,
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            match numeric_string(s) {
                Some(f) => n.as_f64() == Some(f),
                None => number_text(n) == *s,
            }
        }
        (Value::String(x), Value::String(y)) => match (numeric_string(x), numeric_string(y)) {
            (Some(fx), Some(fy)) => fx == fy,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| loose_equals(x, y))
        }
        _ => ValueKey::from_json(a) == ValueKey::from_json(b),
    }
}

fn loose_compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Bool(_), _) | (_, Value::Bool(_)) => Some(truthy(a).cmp(&truthy(b))),
        (Value::Null, Value::String(s)) => Some("".cmp(s.as_str())),
        (Value::String(s), Value::Null) => Some(s.as_str().cmp("")),
        (Value::Null, _) | (_, Value::Null) => Some(truthy(a).cmp(&truthy(b))),
        (Value::Number(x), Value::Number(y)) => Some(compare_numbers(x, y)),
        (Value::Number(n), Value::String(s)) => match numeric_string(s) {
            Some(f) => n.as_f64()?.partial_cmp(&f),
            None => Some(number_text(n).as_str().cmp(s.as_str())),
        },
        (Value::String(s), Value::Number(n)) => match numeric_string(s) {
            Some(f) => f.partial_cmp(&n.as_f64()?),
            None => Some(s.as_str().cmp(number_text(n).as_str())),
        },
        (Value::String(x), Value::String(y)) => match (numeric_string(x), numeric_string(y)) {
            (Some(fx), Some(fy)) => fx.partial_cmp(&fy),
            _ => Some(x.cmp(y)),
        },
        _ => None,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total ordering used by order-by.
///
/// absent < null < bool < number < string < array < object; values of the
/// same type compare naturally.
pub fn sort_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => {
            let rank = type_rank(x).cmp(&type_rank(y));
            if rank != Ordering::Equal {
                return rank;
            }
            match (x, y) {
                (Value::Number(p), Value::Number(q)) => compare_numbers(p, q),
                _ => ValueKey::from_json(x).cmp(&ValueKey::from_json(y)),
            }
        }
    }
}

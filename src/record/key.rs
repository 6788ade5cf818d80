//! Hashable identity keys for JSON values
//!
//! `serde_json::Value` is neither `Hash` nor `Ord`, so grouping, distinct,
//! and the secondary index key on a `ValueKey` instead.
//!
//! Numbers are normalized: an integral float such as `1.0` produces the
//! same key as the integer `1`. Ordering is deterministic:
//! Null < Bool < Int < Float < String < Array < Object.

use serde_json::Value;

/// Structured identity of a JSON value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKey {
    /// JSON null
    Null,
    /// Boolean value (false < true)
    Bool(bool),
    /// Integer value (including integral floats)
    Int(i128),
    /// Non-integral float (stored as ordered bits for total ordering)
    Float(u64),
    /// String value
    String(String),
    /// Array of keys, element by element
    Array(Vec<ValueKey>),
    /// Object entries in key order
    Object(Vec<(String, ValueKey)>),
}

impl ValueKey {
    /// Builds the key for a JSON value.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => ValueKey::Null,
            Value::Bool(b) => ValueKey::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ValueKey::Int(i as i128)
                } else if let Some(u) = n.as_u64() {
                    ValueKey::Int(u as i128)
                } else {
                    Self::from_float(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => ValueKey::String(s.clone()),
            Value::Array(items) => ValueKey::Array(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => ValueKey::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    fn from_float(v: f64) -> Self {
        if v.fract() == 0.0 && v.abs() < 1e38 {
            return ValueKey::Int(v as i128);
        }
        let bits = v.to_bits();
        // Negative: flip all bits. Positive: flip sign bit.
        let ordered = if (bits >> 63) == 1 {
            !bits
        } else {
            bits ^ (1 << 63)
        };
        ValueKey::Float(ordered)
    }

    /// Key for an optional field value; `None` stays `None` so absent
    /// fields never collide with a present `null`.
    pub fn from_field(value: Option<&Value>) -> Option<Self> {
        value.map(Self::from_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integral_float_matches_int() {
        assert_eq!(ValueKey::from_json(&json!(1)), ValueKey::from_json(&json!(1.0)));
        assert_ne!(ValueKey::from_json(&json!(1)), ValueKey::from_json(&json!(1.5)));
    }

    #[test]
    fn test_string_and_number_differ() {
        assert_ne!(ValueKey::from_json(&json!("1")), ValueKey::from_json(&json!(1)));
    }

    #[test]
    fn test_float_ordering() {
        let a = ValueKey::from_json(&json!(-2.5));
        let b = ValueKey::from_json(&json!(0.5));
        let c = ValueKey::from_json(&json!(3.25));
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_absent_vs_null() {
        assert_eq!(ValueKey::from_field(None), None);
        assert_eq!(ValueKey::from_field(Some(&Value::Null)), Some(ValueKey::Null));
    }

    #[test]
    fn test_array_keys_do_not_collide_with_joined_strings() {
        let a = ValueKey::from_json(&json!(["a|b", "c"]));
        let b = ValueKey::from_json(&json!(["a", "b|c"]));
        assert_ne!(a, b);
    }
}

//! JSON snapshot encoding
//!
//! A snapshot is a JSON array. Table snapshots, backups and exports hold
//! an array of objects; sealed snapshots hold an array of strings.
//! Pretty-printing is cosmetic.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use super::errors::{StorageError, StorageResult};
use crate::record::Record;

/// Serializes a snapshot array
pub fn encode<T: Serialize>(items: &[T], pretty: bool) -> StorageResult<Vec<u8>> {
    let encoded = if pretty {
        serde_json::to_vec_pretty(items)
    } else {
        serde_json::to_vec(items)
    };
    encoded.map_err(|e| StorageError::Serialize(e.to_string()))
}

/// Parses a snapshot holding an array of records.
///
/// Anything other than an array of objects is a malformed snapshot.
pub fn decode_records(bytes: &[u8], path: &Path) -> StorageResult<Vec<Record>> {
    let items = decode_array(bytes, path)?;

    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| match item {
            Value::Object(record) => Ok(record),
            other => Err(StorageError::malformed(
                path,
                format!(
                    "element {} is {}, expected an object",
                    position,
                    type_name(&other)
                ),
            )),
        })
        .collect()
}

/// Parses a snapshot holding an array of sealed (string) records.
pub fn decode_sealed(bytes: &[u8], path: &Path) -> StorageResult<Vec<String>> {
    let items = decode_array(bytes, path)?;

    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| match item {
            Value::String(sealed) => Ok(sealed),
            other => Err(StorageError::malformed(
                path,
                format!(
                    "element {} is {}, expected a sealed string",
                    position,
                    type_name(&other)
                ),
            )),
        })
        .collect()
}

fn decode_array(bytes: &[u8], path: &Path) -> StorageResult<Vec<Value>> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| StorageError::malformed(path, format!("invalid JSON: {}", e)))?;

    match value {
        Value::Array(items) => Ok(items),
        other => Err(StorageError::malformed(
            path,
            format!("top level is {}, expected an array", type_name(&other)),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_records() {
        let records = decode_records(br#"[{"id": 1}, {"id": 2, "x": null}]"#, Path::new("t.json")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["x"], Value::Null);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let err = decode_records(b"{not json", Path::new("t.json")).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_empty_file_is_malformed() {
        let err = decode_records(b"", Path::new("t.json")).unwrap_err();
        assert_eq!(err.code(), "JSONSQL_MALFORMED_SNAPSHOT");
    }

    #[test]
    fn test_non_object_element_is_malformed() {
        let err = decode_records(b"[{\"id\": 1}, 7]", Path::new("t.json")).unwrap_err();
        assert!(err.to_string().contains("element 1"));
    }

    #[test]
    fn test_pretty_is_cosmetic() {
        let records = vec![json!({"b": 1, "a": [1, 2]}).as_object().unwrap().clone()];
        let compact = encode(&records, false).unwrap();
        let pretty = encode(&records, true).unwrap();
        assert_ne!(compact, pretty);
        assert_eq!(
            decode_records(&compact, Path::new("c")).unwrap(),
            decode_records(&pretty, Path::new("p")).unwrap()
        );
    }
}

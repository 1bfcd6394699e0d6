// SPDX-License-Identifier: Apache-2.0

//! Strong ETag over a canonical (key-sorted) JSON encoding.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

pub(crate) fn board_etag<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let raw = serde_json::to_value(value)?;
    let bytes = serde_json::to_vec(&normalize_json_value(raw))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("\"{:x}\"", hasher.finalize()))
}

fn normalize_json_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map
                .into_iter()
                .map(|(k, v)| (k, normalize_json_value(v)))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (k, v) in entries {
                sorted.insert(k, v);
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_json_value).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn etag_is_stable_across_key_order() {
        let a = json!({"b": 1, "a": [ {"y": 2, "x": 3} ]});
        let b = json!({"a": [ {"x": 3, "y": 2} ], "b": 1});
        assert_eq!(board_etag(&a).expect("etag"), board_etag(&b).expect("etag"));
    }

    #[test]
    fn etag_changes_with_content() {
        let a = json!({"a": 1});
        let b = json!({"a": 2});
        assert_ne!(board_etag(&a).expect("etag"), board_etag(&b).expect("etag"));
    }
}

//! Tool argument normalization
//!
//! Models hand over arguments as objects, JSON strings, or free text. Tools
//! always receive a cleaned JSON value with null fields stripped.

use serde_json::{Map, Value};

/// Remove null object entries and null array elements, recursively
pub fn clean_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), clean_value(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter(|v| !v.is_null())
                .map(clean_value)
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Normalize raw tool arguments before execution.
///
/// String payloads are parsed as JSON; text that is not JSON becomes
/// `{"text": <input>}`. A null payload becomes an empty object.
pub fn normalize_args(raw: &Value) -> Value {
    match raw {
        Value::String(text) => match serde_json::from_str::<Value>(text.trim()) {
            Ok(parsed) => clean_value(&parsed),
            Err(_) => serde_json::json!({ "text": text }),
        },
        Value::Null => Value::Object(Map::new()),
        other => clean_value(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_removes_nested_nulls() {
        let data = json!({
            "a": 1,
            "b": null,
            "c": {"d": null, "e": 2},
            "f": [1, null, {"g": null, "h": 3}]
        });
        let expected = json!({
            "a": 1,
            "c": {"e": 2},
            "f": [1, {"h": 3}]
        });
        assert_eq!(clean_value(&data), expected);
    }

    #[test]
    fn test_normalize_object() {
        let raw = json!({"a": 1, "b": null, "c": [1, null, 2]});
        assert_eq!(normalize_args(&raw), json!({"a": 1, "c": [1, 2]}));
    }

    #[test]
    fn test_normalize_json_string() {
        let raw = json!(r#"{"a": 1, "b": null, "c": [1, null, 2]}"#);
        assert_eq!(normalize_args(&raw), json!({"a": 1, "c": [1, 2]}));
    }

    #[test]
    fn test_normalize_free_text() {
        assert_eq!(
            normalize_args(&json!("ciao mondo")),
            json!({"text": "ciao mondo"})
        );
    }

    #[test]
    fn test_normalize_leaves_input_untouched() {
        let raw = json!({"a": null, "b": {"c": null}});
        let before = raw.clone();
        let _ = normalize_args(&raw);
        assert_eq!(raw, before);
    }

    #[test]
    fn test_normalize_null_and_scalars() {
        assert_eq!(normalize_args(&Value::Null), json!({}));
        assert_eq!(normalize_args(&json!(42)), json!(42));
    }
}

//! Storage key helpers.
//!
//! Records are stored under a partition key (`pk`) and sort key (`sk`) that
//! callers never see. These helpers build those keys and remove them again
//! before data leaves the service.

use serde_json::Value;

/// Keys removed from every outgoing record.
pub const INTERNAL_KEYS: [&str; 2] = ["pk", "sk"];

/// Separator between a key prefix and the record id.
pub const KEY_SEPARATOR: &str = "::";

/// Copy `data` without the internal keys and any `extra` keys.
///
/// Returns `None` when `data` is not a JSON object.
///
/// # Example
///
/// ```
/// use apiforge_lambda_shared::omit_keys;
/// use serde_json::json;
///
/// let record = json!({"pk": "LEAD::7", "sk": "v1", "name": "Ada", "ssn": "x"});
/// assert_eq!(omit_keys(&record, &["ssn"]), Some(json!({"name": "Ada"})));
/// assert_eq!(omit_keys(&json!([1, 2]), &[]), None);
/// ```
pub fn omit_keys(data: &Value, extra: &[&str]) -> Option<Value> {
    let object = data.as_object()?;
    let kept = object
        .iter()
        .filter(|(key, _)| {
            !INTERNAL_KEYS.contains(&key.as_str()) && !extra.contains(&key.as_str())
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Some(Value::Object(kept))
}

/// Format a partition key as `<prefix>::<id>`.
pub fn to_partition_key(id: impl std::fmt::Display, prefix: &str) -> String {
    format!("{}{}{}", prefix, KEY_SEPARATOR, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_omit_internal_keys() {
        let record = json!({"pk": "USER::1", "sk": "profile", "name": "Ada"});
        assert_eq!(omit_keys(&record, &[]), Some(json!({"name": "Ada"})));
    }

    #[test]
    fn test_omit_extra_keys() {
        let record = json!({"pk": "USER::1", "name": "Ada", "password": "hunter2", "age": 36});
        assert_eq!(
            omit_keys(&record, &["password"]),
            Some(json!({"name": "Ada", "age": 36}))
        );
    }

    #[test]
    fn test_object_without_internal_keys_is_unchanged() {
        let record = json!({"name": "Ada"});
        assert_eq!(omit_keys(&record, &[]), Some(record));
    }

    #[test]
    fn test_non_objects_yield_none() {
        assert_eq!(omit_keys(&json!(null), &[]), None);
        assert_eq!(omit_keys(&json!("pk"), &[]), None);
        assert_eq!(omit_keys(&json!([{"pk": 1}]), &[]), None);
    }

    #[test]
    fn test_partition_key() {
        assert_eq!(to_partition_key("42", "USER"), "USER::42");
        assert_eq!(to_partition_key(7, "LEAD"), "LEAD::7");
    }
}

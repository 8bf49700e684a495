//! Coercion of polymorphic schema.org values.
//!
//! Structured-data fields are string | number | object-with-name-or-text |
//! array-of-any-of-these throughout. Every field access in the normalizer
//! goes through one of these two coercers instead of per-field branching.

use serde_json::Value;

/// Coerce a value into a single string. Scalars pass through (numbers
/// stringified), objects contribute their `name` or `text`, arrays join
/// their coercible parts with spaces. Returns None when nothing yields
/// content.
pub fn to_string_coerce(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("text"))
            .and_then(to_string_coerce),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(to_string_coerce).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" "))
            }
        }
        _ => None,
    }
}

/// Coerce a value into a sequence of strings. Arrays map each element to
/// its string/`name`/`text` representation; plain strings split on commas
/// or newlines. Entries are trimmed and empties dropped.
pub fn to_string_array(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(to_string_coerce)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .split(|c| c == ',' || c == '\n')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Number(n) => vec![n.to_string()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_scalars() {
        assert_eq!(to_string_coerce(&json!("pasta")), Some("pasta".to_string()));
        assert_eq!(to_string_coerce(&json!(4)), Some("4".to_string()));
        assert_eq!(to_string_coerce(&json!(null)), None);
        assert_eq!(to_string_coerce(&json!("   ")), None);
    }

    #[test]
    fn test_coerce_objects_prefer_name_over_text() {
        assert_eq!(
            to_string_coerce(&json!({"name": "Chef", "text": "ignored"})),
            Some("Chef".to_string())
        );
        assert_eq!(
            to_string_coerce(&json!({"text": "Stir well"})),
            Some("Stir well".to_string())
        );
        assert_eq!(to_string_coerce(&json!({"other": "x"})), None);
    }

    #[test]
    fn test_coerce_arrays_join_with_spaces() {
        assert_eq!(
            to_string_coerce(&json!(["Main", {"name": "Dish"}, ""])),
            Some("Main Dish".to_string())
        );
        assert_eq!(to_string_coerce(&json!([null, ""])), None);
    }

    #[test]
    fn test_string_array_from_array() {
        assert_eq!(
            to_string_array(&json!(["a", {"name": "b"}, "  ", 3])),
            vec!["a", "b", "3"]
        );
    }

    #[test]
    fn test_string_array_splits_plain_strings() {
        assert_eq!(
            to_string_array(&json!("dinner, italian,comfort food")),
            vec!["dinner", "italian", "comfort food"]
        );
        assert_eq!(
            to_string_array(&json!("one\ntwo\n\nthree")),
            vec!["one", "two", "three"]
        );
    }
}

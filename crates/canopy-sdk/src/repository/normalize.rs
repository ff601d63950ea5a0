//! Identifier normalization
//!
//! Older endpoints return the raw persistence key as `_id`, newer ones
//! return `id`. Every entity passes through [`normalize_entity`] before it is
//! decoded, so downstream code only ever reads `id`.

use serde_json::{Map, Value};

/// Ensure `id` holds the entity's identifier.
///
/// Picks the first non-empty of `id`, then `_id`. `_id` may be a string, a
/// number, or an extended-JSON `{"$oid": "..."}` object. Other fields are
/// left untouched. Applying this twice gives the same result as once.
pub fn normalize_entity(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            if let Some(id) = resolve_id(&map) {
                map.insert("id".to_string(), Value::String(id));
            }
            Value::Object(map)
        }
        other => other,
    }
}

/// Normalize every element of a JSON array
pub fn normalize_all(values: Vec<Value>) -> Vec<Value> {
    values.into_iter().map(normalize_entity).collect()
}

fn resolve_id(map: &Map<String, Value>) -> Option<String> {
    map.get("id")
        .and_then(id_string)
        .or_else(|| map.get("_id").and_then(id_string))
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(inner) => inner.get("$oid").and_then(id_string),
        _ => None,
    }
}

//! Response Normalizer — prepares stored records for transmission to the
//! scoring oracle.
//!
//! Typed serialization already renders identifiers and timestamps as plain
//! strings (UUIDs hyphenated, timestamps RFC 3339), so what is left to do
//! is strip storage bookkeeping: foreign keys, pipeline state, and scoring
//! output columns, none of which belong in the payload sent to the oracle.
//! Everything else passes through unchanged.

use serde_json::Value;

/// Keys that exist only for storage or hold pipeline output. Removed at
/// every nesting depth before a payload goes to the oracle.
const STORE_KEYS: &[&str] = &[
    "job_id",
    "status",
    "summary",
    "score",
    "matched_skills",
    "experience",
    "rationale",
    "rank",
    "position",
    "retrieved_at",
    "created_at",
    "ranked_at",
];

/// Recursively normalizes a serialized record for the oracle payload.
/// Source data is tree-shaped; cycles are not a concern.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| !STORE_KEYS.contains(&key.as_str()))
                .map(|(key, nested)| (key, normalize(nested)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        scalar => scalar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(normalize(json!(42)), json!(42));
        assert_eq!(normalize(json!("text")), json!("text"));
        assert_eq!(normalize(json!(true)), json!(true));
        assert_eq!(normalize(json!(null)), json!(null));
    }

    #[test]
    fn test_bookkeeping_keys_stripped_at_top_level() {
        let value = json!({
            "title": "Engineer",
            "status": "fetched",
            "retrieved_at": "2025-11-02T10:00:00Z",
            "rank": 3
        });
        assert_eq!(normalize(value), json!({"title": "Engineer"}));
    }

    #[test]
    fn test_recursion_into_nested_maps_and_sequences() {
        let value = json!({
            "candidates": [
                {"username": "alice", "job_id": "x", "repositories": [
                    {"name": "svc", "stars": 5, "created_at": "2020-01-01T00:00:00Z"}
                ]},
                {"username": "bob", "score": 40}
            ]
        });
        let expected = json!({
            "candidates": [
                {"username": "alice", "repositories": [{"name": "svc", "stars": 5}]},
                {"username": "bob"}
            ]
        });
        assert_eq!(normalize(value), expected);
    }

    #[test]
    fn test_identifiers_and_timestamps_stay_plain_strings() {
        let value = json!({
            "id": "0bd2bfb4-3f43-4b47-9d0f-4f2d2ef6f2aa",
            "posted": "2025-11-02T10:00:00+00:00"
        });
        let normalized = normalize(value);
        assert!(normalized["id"].is_string());
        assert!(normalized["posted"].is_string());
    }
}

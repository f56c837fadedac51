//! Index bodies for the document and cursor indices.
//!
//! Document indices are schemaless: parsed documents carry contract-specific
//! field sets, so the base body ships an empty mapping and lets the store
//! derive field types dynamically.

use serde_json::{json, Value};

/// Body used when provisioning a document or cursor index.
pub fn base_index_body() -> Value {
    json!({
        "mappings": {}
    })
}

/// Mapping that types a field for completion suggestions.
///
/// Applied to indices whose documents carry a combined search field, so the
/// store can serve search-as-you-type queries from it.
pub fn completion_mappings_body(field: &str) -> Value {
    json!({
        "properties": {
            field: {
                "type": "completion"
            }
        }
    })
}

/// Index body with the completion mapping already in place.
pub fn completion_index_body(field: &str) -> Value {
    json!({
        "mappings": completion_mappings_body(field)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_index_body_is_schemaless() {
        let body = base_index_body();
        assert!(body["mappings"].is_object());
        assert!(body["mappings"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_completion_mapping_types_field() {
        let body = completion_index_body("single_text_search_field");
        assert_eq!(
            body["mappings"]["properties"]["single_text_search_field"]["type"],
            "completion"
        );
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Pagination metadata as the admin API sends it.
///
/// Every field defaults to zero when absent so a partially filled `meta`
/// object does not turn an otherwise valid list response into a parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMeta {
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub last_page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total: u64,
}

/// Inner object of the nested list shape: `{ data: { data: [...], meta } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedList {
    pub data: Vec<Value>,
    #[serde(default)]
    pub meta: Option<WireMeta>,
}

/// The two list response shapes the admin API produces.
///
/// Listing and user endpoints answer with the flat shape, category and slider
/// endpoints wrap the paginator once more. Rows stay as raw JSON here; the
/// table core decides what row type they become.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope {
    /// `{ data: [...], meta: {...} }`
    Flat {
        data: Vec<Value>,
        #[serde(default)]
        meta: Option<WireMeta>,
    },
    /// `{ data: { data: [...], meta: {...} }, meta?: {...} }`
    Nested {
        data: NestedList,
        #[serde(default)]
        meta: Option<WireMeta>,
    },
}

impl ListEnvelope {
    /// Split the envelope into its rows and whichever meta block was present.
    /// For the nested shape the inner meta wins over the outer one.
    pub fn into_parts(self) -> (Vec<Value>, Option<WireMeta>) {
        match self {
            ListEnvelope::Flat { data, meta } => (data, meta),
            ListEnvelope::Nested { data, meta } => {
                let meta = data.meta.or(meta);
                (data.data, meta)
            }
        }
    }
}

/// One `{id, sort_order}` pair of a reorder batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReorderItem {
    pub id: i64,
    pub sort_order: i64,
}

/// Build the body of `PUT {endpoint}/reorder`.
///
/// The key of the array differs per entity (`listings`, `sliders`, ...).
pub fn reorder_body(entity_key: &str, items: &[ReorderItem]) -> Value {
    let entries = items
        .iter()
        .map(|item| serde_json::json!({ "id": item.id, "sort_order": item.sort_order }))
        .collect::<Vec<_>>();
    let mut body = Map::new();
    body.insert(entity_key.to_string(), Value::Array(entries));
    Value::Object(body)
}

/// Response of delete, reorder and inline update calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationResponse {
    /// Some endpoints omit the flag on success, so a missing flag counts as success
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    /// Translation key some endpoints send instead of (or next to) a message
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

fn default_success() -> bool {
    true
}

impl MutationResponse {
    /// Message to show the user when the backend rejected the mutation
    pub fn rejection_message(&self) -> Option<String> {
        self.message.clone().or_else(|| self.key.clone())
    }
}

/// Error body returned together with non-2xx statuses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}

impl ErrorBody {
    pub fn best_message(&self) -> Option<String> {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .or_else(|| self.key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_envelope_parses() {
        let envelope: ListEnvelope = serde_json::from_value(json!({
            "data": [{"id": 1}, {"id": 2}],
            "meta": {"current_page": 1, "last_page": 3, "per_page": 2, "total": 6}
        }))
        .unwrap();

        let (rows, meta) = envelope.into_parts();
        assert_eq!(rows.len(), 2);
        assert_eq!(meta.unwrap().last_page, 3);
    }

    #[test]
    fn test_nested_envelope_prefers_inner_meta() {
        let envelope: ListEnvelope = serde_json::from_value(json!({
            "success": true,
            "data": {
                "data": [{"id": 7}],
                "meta": {"current_page": 2, "last_page": 2, "per_page": 10, "total": 11}
            },
            "meta": {"current_page": 9, "last_page": 9, "per_page": 9, "total": 99}
        }))
        .unwrap();

        assert!(matches!(envelope, ListEnvelope::Nested { .. }));
        let (rows, meta) = envelope.into_parts();
        assert_eq!(rows, vec![json!({"id": 7})]);
        assert_eq!(meta.unwrap().current_page, 2);
    }

    #[test]
    fn test_envelope_without_data_is_rejected() {
        let result = serde_json::from_value::<ListEnvelope>(json!({"items": []}));
        assert!(result.is_err());

        let result = serde_json::from_value::<ListEnvelope>(json!({"data": "oops"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_reorder_body_uses_entity_key() {
        let body = reorder_body(
            "listings",
            &[ReorderItem { id: 4, sort_order: 1 }, ReorderItem { id: 1, sort_order: 2 }],
        );
        assert_eq!(
            body,
            json!({"listings": [{"id": 4, "sort_order": 1}, {"id": 1, "sort_order": 2}]})
        );
    }

    #[test]
    fn test_mutation_response_defaults() {
        let response: MutationResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.success);
        assert_eq!(response.rejection_message(), None);

        let response: MutationResponse =
            serde_json::from_value(json!({"success": false, "key": "category_has_listings"})).unwrap();
        assert!(!response.success);
        assert_eq!(response.rejection_message().as_deref(), Some("category_has_listings"));
    }
}

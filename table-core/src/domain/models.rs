use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A row entity the table can display (listing, user, category, setting, ...).
///
/// The table only ever interprets `id` and `sort_order`; everything else is
/// read through `field` for rendering.
pub trait TableRow: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn id(&self) -> i64;

    /// Persisted manual ordering; `None` for entities that are not sortable
    fn sort_order(&self) -> Option<i64> {
        None
    }

    /// Look up a column value. Dotted keys walk nested objects (`category.name`).
    fn field(&self, key: &str) -> Option<Value> {
        let value = serde_json::to_value(self).ok()?;
        lookup_path(&value, key).cloned()
    }
}

pub(crate) fn lookup_path<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(value, |current, segment| current.get(segment))
}

/// Schemaless row for callers that do not have a typed entity at hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRow {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TableRow for JsonRow {
    fn id(&self) -> i64 {
        self.id
    }

    fn sort_order(&self) -> Option<i64> {
        self.sort_order
    }

    fn field(&self, key: &str) -> Option<Value> {
        match key {
            "id" => Some(Value::from(self.id)),
            "sort_order" => self.sort_order.map(Value::from),
            _ => {
                let (head, rest) = match key.split_once('.') {
                    Some((head, rest)) => (head, Some(rest)),
                    None => (key, None),
                };
                let value = self.fields.get(head)?;
                match rest {
                    Some(rest) => lookup_path(value, rest).cloned(),
                    None => Some(value.clone()),
                }
            }
        }
    }
}

/// Normalized pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: u32,
    /// Always at least 1, even for an empty collection
    pub last_page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl PageMeta {
    pub fn empty(per_page: u32) -> Self {
        Self {
            current_page: 1,
            last_page: 1,
            per_page,
            total: 0,
        }
    }
}

/// One page of rows plus its metadata, independent of the wire shape
#[derive(Debug, Clone, PartialEq)]
pub struct PageEnvelope<R> {
    pub rows: Vec<R>,
    pub meta: PageMeta,
}

impl<R> PageEnvelope<R> {
    pub fn empty(per_page: u32) -> Self {
        Self {
            rows: Vec::new(),
            meta: PageMeta::empty(per_page),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Listing {
        id: i64,
        title: String,
        category: Category,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Category {
        name: String,
    }

    impl TableRow for Listing {
        fn id(&self) -> i64 {
            self.id
        }
    }

    #[test]
    fn test_default_field_lookup_walks_nested_objects() {
        let listing = Listing {
            id: 3,
            title: "Sea view flat".into(),
            category: Category { name: "Apartments".into() },
        };

        assert_eq!(listing.field("title"), Some(json!("Sea view flat")));
        assert_eq!(listing.field("category.name"), Some(json!("Apartments")));
        assert_eq!(listing.field("category.missing"), None);
        assert_eq!(listing.sort_order(), None);
    }

    #[test]
    fn test_json_row_keeps_extra_fields() {
        let row: JsonRow = serde_json::from_value(json!({
            "id": 12,
            "sort_order": 4,
            "name": "Villa",
            "owner": {"email": "a@b.c"}
        }))
        .unwrap();

        assert_eq!(row.id(), 12);
        assert_eq!(row.sort_order(), Some(4));
        assert_eq!(row.field("name"), Some(json!("Villa")));
        assert_eq!(row.field("owner.email"), Some(json!("a@b.c")));
        assert_eq!(row.field("id"), Some(json!(12)));
    }
}

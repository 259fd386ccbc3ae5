use std::fmt;

use serde::{Deserialize, Serialize};

use super::table_state::TableState;
use crate::io::mappers;

/// Cache identity of one list request: the endpoint plus the complete table
/// state. Any change to page, search, filters, date range or sort yields a
/// different key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey {
    endpoint: String,
    state: TableState,
}

impl QueryKey {
    pub fn new(endpoint: impl Into<String>, state: &TableState) -> Self {
        Self {
            endpoint: normalize_endpoint(&endpoint.into()),
            state: state.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    /// Stable textual form, used in logs
    pub fn fingerprint(&self) -> String {
        let params = mappers::query_params(&self.state)
            .into_iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.endpoint, params)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fingerprint())
    }
}

/// `/admin/users/` and `/admin/users` address the same collection
pub(crate) fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    if trimmed.len() > 1 {
        trimmed.trim_end_matches('/').to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table_state::TableStateStore;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    #[test]
    fn test_equal_states_give_equal_keys() {
        let mut a = TableStateStore::default();
        let mut b = TableStateStore::default();
        a.set_filter("role", "admin");
        b.set_filter("role", "admin");

        assert_eq!(QueryKey::new("/admin/users", a.state()), QueryKey::new("/admin/users/", b.state()));
    }

    #[test]
    fn test_every_field_changes_the_key() {
        let base = TableStateStore::default();
        let base_key = QueryKey::new("/admin/listings", base.state());

        let mut variants: Vec<TableStateStore> = Vec::new();

        let mut s = base.clone();
        s.set_page(2);
        variants.push(s);

        let mut s = base.clone();
        s.set_per_page(25);
        variants.push(s);

        let mut s = base.clone();
        s.set_search("loft");
        variants.push(s);

        let mut s = base.clone();
        s.set_filter("status", "approved");
        variants.push(s);

        let mut s = base.clone();
        s.set_filter("status", "null");
        variants.push(s);

        let mut s = base.clone();
        s.set_date_range(NaiveDate::from_ymd_opt(2024, 1, 1), None);
        variants.push(s);

        let mut s = base.clone();
        s.set_sort("price");
        variants.push(s);

        let mut s = base.clone();
        s.set_sort("price");
        s.set_sort("price");
        variants.push(s);

        let mut keys = HashSet::new();
        keys.insert(base_key.clone());
        for variant in &variants {
            let key = QueryKey::new("/admin/listings", variant.state());
            assert_ne!(key, base_key);
            keys.insert(key);
        }
        assert_eq!(keys.len(), variants.len() + 1);

        assert_ne!(base_key, QueryKey::new("/admin/users", base.state()));
    }

    #[test]
    fn test_fingerprint_matches_query() {
        let mut store = TableStateStore::default();
        store.set_filter("role", "admin");
        let key = QueryKey::new("/admin/users", store.state());
        assert_eq!(key.fingerprint(), "/admin/users?page=1&per_page=10&role=admin");
    }
}

use std::marker::PhantomData;

use tracing::{debug, error, warn};

use super::api_client::ApiClient;
use super::mappers::{normalize_envelope, query_params};
use crate::domain::models::{PageEnvelope, TableRow};
use crate::domain::query_key::QueryKey;
use crate::error::TableError;

/// Result of a list fetch as the table consumes it: always a page (empty on
/// failure) plus the failure, if any
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult<R> {
    pub page: PageEnvelope<R>,
    pub error: Option<TableError>,
}

impl<R> FetchResult<R> {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Issues the list GET for a query key and normalizes the envelope
pub struct RemoteFetcher<R> {
    api: ApiClient,
    _row: PhantomData<fn() -> R>,
}

impl<R> Clone for RemoteFetcher<R> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            _row: PhantomData,
        }
    }
}

impl<R: TableRow> RemoteFetcher<R> {
    pub fn new(api: ApiClient) -> Self {
        Self { api, _row: PhantomData }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub async fn try_fetch_page(&self, key: &QueryKey) -> Result<PageEnvelope<R>, TableError> {
        if key.endpoint().is_empty() {
            return Err(TableError::InvalidRequest("endpoint must not be empty".to_string()));
        }
        if key.state().page == 0 {
            return Err(TableError::InvalidRequest("page must be at least 1".to_string()));
        }

        debug!("GET {}", key.fingerprint());
        let body = self.api.get_json(key.endpoint(), query_params(key.state())).await?;
        normalize_envelope(body, key.state())
    }

    /// Never fails past this boundary: errors come back as an empty page with
    /// `error` set so the table can offer a retry
    pub async fn fetch_page(&self, key: &QueryKey) -> FetchResult<R> {
        match self.try_fetch_page(key).await {
            Ok(page) => FetchResult { page, error: None },
            Err(e) => {
                match &e {
                    TableError::MalformedEnvelope(detail) => {
                        error!("Malformed list response from {}: {}", key.endpoint(), detail)
                    }
                    other => warn!("Failed to fetch {}: {}", key.fingerprint(), other),
                }
                FetchResult {
                    page: PageEnvelope::empty(key.state().per_page),
                    error: Some(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::JsonRow;
    use crate::domain::table_state::{TableState, TableStateStore};
    use crate::io::transport::testing::RecordingTransport;
    use serde_json::json;
    use std::sync::Arc;

    fn fetcher(transport: &RecordingTransport) -> RemoteFetcher<JsonRow> {
        RemoteFetcher::new(ApiClient::new(Arc::new(transport.clone())))
    }

    #[tokio::test]
    async fn test_fetch_sends_serialized_state() {
        let transport = RecordingTransport::new();
        transport.push_json(200, json!({
            "data": [{"id": 1, "name": "Admin"}],
            "meta": {"current_page": 2, "last_page": 2, "per_page": 10, "total": 11}
        }));

        let mut store = TableStateStore::default();
        store.set_filter("role", "admin");
        store.set_page(2);
        let key = QueryKey::new("/admin/users", store.state());

        let result = fetcher(&transport).fetch_page(&key).await;
        assert!(result.is_ok());
        assert_eq!(result.page.meta.total, 11);

        let request = transport.last_request().unwrap();
        assert_eq!(request.path, "/admin/users");
        assert_eq!(request.query_string(), "page=2&per_page=10&role=admin");
    }

    #[tokio::test]
    async fn test_fetch_tolerates_nested_envelope() {
        let transport = RecordingTransport::new();
        let meta = json!({"current_page": 1, "last_page": 1, "per_page": 10, "total": 1});
        transport.push_json(200, json!({"data": [{"id": 5}], "meta": meta.clone()}));
        transport.push_json(200, json!({"success": true, "data": {"data": [{"id": 5}], "meta": meta}}));

        let key = QueryKey::new("/admin/categories", &TableState::default());
        let fetcher = fetcher(&transport);
        let flat = fetcher.fetch_page(&key).await;
        let nested = fetcher.fetch_page(&key).await;

        assert_eq!(flat, nested);
    }

    #[tokio::test]
    async fn test_malformed_envelope_yields_empty_page_and_error() {
        let transport = RecordingTransport::new();
        transport.push_json(200, json!({"items": [{"id": 1}]}));

        let key = QueryKey::new("/admin/listings", &TableState::default());
        let result = fetcher(&transport).fetch_page(&key).await;

        assert!(result.page.rows.is_empty());
        assert_eq!(result.page.meta.total, 0);
        assert!(matches!(result.error, Some(TableError::MalformedEnvelope(_))));
    }

    #[tokio::test]
    async fn test_http_error_yields_empty_page_and_error() {
        let transport = RecordingTransport::new();
        transport.push_json(500, json!({"message": "Server Error"}));

        let key = QueryKey::new("/admin/listings", &TableState::default());
        let result = fetcher(&transport).fetch_page(&key).await;

        assert!(result.page.is_empty());
        assert!(matches!(result.error, Some(TableError::ServerRejection { status: Some(500), .. })));
    }

    #[tokio::test]
    async fn test_invalid_requests_never_hit_the_network() {
        let transport = RecordingTransport::new();
        let fetcher = fetcher(&transport);

        let key = QueryKey::new("", &TableState::default());
        assert!(matches!(fetcher.try_fetch_page(&key).await, Err(TableError::InvalidRequest(_))));

        let state = TableState { page: 0, ..TableState::default() };
        let key = QueryKey::new("/admin/users", &state);
        assert!(matches!(fetcher.try_fetch_page(&key).await, Err(TableError::InvalidRequest(_))));

        assert!(transport.requests().is_empty());
    }
}

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use shared::{reorder_body, ErrorBody, MutationResponse, ReorderItem};
use tracing::{error, info};

use super::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::config::ClientConfig;
use crate::error::TableError;

/// Supplies the current bearer token, `None` when signed out
pub type TokenAccessor = Arc<dyn Fn() -> Option<String> + Send + Sync>;
/// Supplies the current UI locale (`en`, `ar`, ...)
pub type LocaleAccessor = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// API client for the admin REST endpoints.
///
/// Auth and locale are injected as accessors and read on every request, so
/// the client never depends on ambient cookies or context.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    auth_token: Option<TokenAccessor>,
    locale: Option<LocaleAccessor>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            auth_token: None,
            locale: None,
        }
    }

    /// Client over `reqwest` with the configured base URL and timeout
    pub fn from_config(config: &ClientConfig) -> Result<Self, TableError> {
        let transport = ReqwestTransport::new(&config.base_url, Duration::from_secs(config.timeout_secs))?;
        Ok(Self::new(Arc::new(transport)))
    }

    pub fn with_auth_token<F>(mut self, accessor: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.auth_token = Some(Arc::new(accessor));
        self
    }

    pub fn with_locale<F>(mut self, accessor: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.locale = Some(Arc::new(accessor));
        self
    }

    /// GET a JSON document; non-2xx answers become `ServerRejection`
    pub async fn get_json(&self, path: &str, query: Vec<(String, String)>) -> Result<Value, TableError> {
        let mut request = HttpRequest::new(HttpMethod::Get, path);
        request.query = query;
        let response = self.send(request).await?;
        let response = ensure_success(response)?;
        serde_json::from_str(&response.body)
            .map_err(|e| TableError::MalformedEnvelope(format!("response is not JSON: {}", e)))
    }

    /// `DELETE {endpoint}/{id}`
    pub async fn delete_row(&self, endpoint: &str, id: i64) -> Result<(), TableError> {
        let path = format!("{}/{}", endpoint, id);
        info!("DELETE {}", path);
        let response = self.send(HttpRequest::new(HttpMethod::Delete, path)).await?;
        let response = ensure_success(response)?;
        check_mutation(&response).map(|_| ())
    }

    /// `PUT {endpoint}/reorder` with `{ <entity_key>: [{id, sort_order}] }`
    pub async fn persist_reorder(
        &self,
        endpoint: &str,
        entity_key: &str,
        items: &[ReorderItem],
    ) -> Result<(), TableError> {
        let mut request = HttpRequest::new(HttpMethod::Put, format!("{}/reorder", endpoint));
        request.body = Some(reorder_body(entity_key, items));
        info!("PUT {}/reorder with {} items", endpoint, items.len());
        let response = self.send(request).await?;
        let response = ensure_success(response)?;
        check_mutation(&response).map(|_| ())
    }

    /// `PUT {endpoint}/{id}` for inline edits. Returns the updated row JSON,
    /// unwrapped from `{ data: row }` when the endpoint wraps it.
    pub async fn update_row(&self, endpoint: &str, id: i64, body: Value) -> Result<Value, TableError> {
        let mut request = HttpRequest::new(HttpMethod::Put, format!("{}/{}", endpoint, id));
        request.body = Some(body);
        info!("PUT {}/{}", endpoint, id);
        let response = self.send(request).await?;
        let response = ensure_success(response)?;
        let mutation = check_mutation(&response)?;
        match mutation {
            Some(MutationResponse { data: Some(row), .. }) => Ok(row),
            _ => serde_json::from_str(&response.body)
                .map_err(|e| TableError::MalformedEnvelope(format!("update response is not JSON: {}", e))),
        }
    }

    async fn send(&self, mut request: HttpRequest) -> Result<HttpResponse, TableError> {
        if let Some(token) = self.auth_token.as_ref().and_then(|accessor| accessor()) {
            request.headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }
        if let Some(locale) = self.locale.as_ref().and_then(|accessor| accessor()) {
            request.headers.push(("Accept-Language".to_string(), locale));
        }
        self.transport.send(request).await
    }
}

fn ensure_success(response: HttpResponse) -> Result<HttpResponse, TableError> {
    if response.is_success() {
        return Ok(response);
    }
    let message = serde_json::from_str::<ErrorBody>(&response.body)
        .ok()
        .and_then(|body| body.best_message())
        .unwrap_or_else(|| format!("Request failed with status {}", response.status));
    error!("Server error {}: {}", response.status, message);
    Err(TableError::ServerRejection {
        status: Some(response.status),
        message,
    })
}

/// Interpret a 2xx mutation body; an empty body counts as success
fn check_mutation(response: &HttpResponse) -> Result<Option<MutationResponse>, TableError> {
    if response.body.trim().is_empty() {
        return Ok(None);
    }
    let Ok(mutation) = serde_json::from_str::<MutationResponse>(&response.body) else {
        return Ok(None);
    };
    if !mutation.success {
        let message = mutation
            .rejection_message()
            .unwrap_or_else(|| "The server rejected the change".to_string());
        return Err(TableError::ServerRejection {
            status: Some(response.status),
            message,
        });
    }
    Ok(Some(mutation))
}

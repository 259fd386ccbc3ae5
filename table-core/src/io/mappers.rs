//! Translation between table types and the admin API wire format.

use serde::Deserialize;
use serde_json::Value;
use shared::{ListEnvelope, MutationResponse, WireMeta};
use tracing::warn;

use crate::domain::models::{PageEnvelope, PageMeta, TableRow};
use crate::domain::table_state::TableState;
use crate::error::TableError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Serialize the table state into list query parameters.
///
/// Order is fixed: `page, per_page, search, filters (by key), date_from,
/// date_to, sort_by, sort_dir`. Empty search and `Any` filters are left out,
/// the date range only goes out when both ends are set.
pub fn query_params(state: &TableState) -> Vec<(String, String)> {
    let mut params = vec![
        ("page".to_string(), state.page.to_string()),
        ("per_page".to_string(), state.per_page.to_string()),
    ];

    let search = state.search.trim();
    if !search.is_empty() {
        params.push(("search".to_string(), search.to_string()));
    }

    for (key, value) in &state.filters {
        if let Some(wire) = value.wire_value() {
            params.push((key.clone(), wire.to_string()));
        }
    }

    if let (Some(from), Some(to)) = (state.date_range.from, state.date_range.to) {
        params.push(("date_from".to_string(), from.format(DATE_FORMAT).to_string()));
        params.push(("date_to".to_string(), to.format(DATE_FORMAT).to_string()));
    }

    if let Some(sort) = &state.sort {
        params.push(("sort_by".to_string(), sort.key.clone()));
        params.push(("sort_dir".to_string(), sort.direction.as_str().to_string()));
    }

    params
}

/// Flatten either list envelope shape into a `PageEnvelope`.
///
/// A missing meta block is synthesized from the request state. Rows that do
/// not deserialize into `R`, or more rows than `per_page`, make the whole
/// response malformed. A `{ success: false }` body is a rejection, even with
/// a 2xx status.
pub fn normalize_envelope<R: TableRow>(body: Value, state: &TableState) -> Result<PageEnvelope<R>, TableError> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = MutationResponse::deserialize(&body)
            .ok()
            .and_then(|response| response.rejection_message())
            .unwrap_or_else(|| "The server rejected the request".to_string());
        return Err(TableError::ServerRejection { status: None, message });
    }

    let envelope: ListEnvelope = serde_json::from_value(body)
        .map_err(|e| TableError::MalformedEnvelope(format!("unrecognized list shape: {}", e)))?;
    let (raw_rows, wire_meta) = envelope.into_parts();

    let rows = raw_rows
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            serde_json::from_value::<R>(raw)
                .map_err(|e| TableError::MalformedEnvelope(format!("row {}: {}", index, e)))
        })
        .collect::<Result<Vec<R>, TableError>>()?;

    let meta = normalize_meta(wire_meta, rows.len(), state);
    if rows.len() as u64 > meta.per_page as u64 {
        return Err(TableError::MalformedEnvelope(format!(
            "{} rows exceed per_page {}",
            rows.len(),
            meta.per_page
        )));
    }

    Ok(PageEnvelope { rows, meta })
}

fn normalize_meta(wire: Option<WireMeta>, row_count: usize, state: &TableState) -> PageMeta {
    let row_count = row_count as u64;
    match wire {
        Some(wire) => {
            let per_page = if wire.per_page == 0 { state.per_page } else { wire.per_page };
            let total = if wire.total < row_count {
                warn!("Response total {} is below row count {}, using row count", wire.total, row_count);
                row_count
            } else {
                wire.total
            };
            PageMeta {
                current_page: wire.current_page.max(1),
                last_page: wire.last_page.max(1),
                per_page,
                total,
            }
        }
        None => PageMeta {
            current_page: state.page,
            last_page: 1,
            per_page: state.per_page,
            total: row_count,
        },
    }
}

//! # Table View
//!
//! Headless view model of the table: what a screen shows for the current
//! controller state. Front ends draw a `TableView`; they never look at the
//! controller's internals.
//!
//! ## Key Responsibilities
//!
//! - **Body State**: skeleton while loading, error with retry, empty message or rows
//! - **Header**: column labels with the active sort indicator
//! - **Filters**: configured controls with their current value
//! - **Cells**: column renderer when configured, plain text for the raw value otherwise
//! - **Footer**: page window and "showing X to Y of Z"

use std::fmt::Write as _;

use serde_json::Value;

use crate::controller::{LoadState, TableController};
use crate::domain::models::TableRow;
use crate::domain::pagination::{PageItem, RangeSummary};
use crate::domain::reorder::ReorderAvailability;
use crate::domain::row_actions::RowAction;
use crate::domain::table_config::{ColumnSpec, FilterKind, FilterOption};
use crate::domain::table_state::{FilterValue, SortDirection};

/// Placeholder for null or missing values
pub const EMPTY_CELL: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub key: String,
    pub label: String,
    pub sortable: bool,
    pub width: Option<String>,
    pub sort: Option<SortDirection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    pub id: i64,
    pub cells: Vec<String>,
    pub drag_handle: bool,
    pub actions: Vec<RowAction>,
}

/// A filter control with the value currently applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterControl {
    pub key: String,
    pub label: String,
    pub kind: FilterKind,
    pub options: Vec<FilterOption>,
    pub value: FilterValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableBody {
    Loading { skeleton_rows: usize },
    Failed { message: String, retryable: bool },
    Empty { message: String },
    Rows(Vec<RenderedRow>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub header: Vec<HeaderCell>,
    pub filters: Vec<FilterControl>,
    pub body: TableBody,
    pub pages: Vec<PageItem>,
    pub current_page: u32,
    pub summary: RangeSummary,
    pub search_placeholder: String,
    /// Why drag handles are hidden, when the table supports dragging
    pub drag_disabled_reason: Option<String>,
}

pub fn build_view<R: TableRow>(controller: &TableController<R>) -> TableView {
    let config = controller.config();
    let sort = controller.state().sort.as_ref();

    let header = config
        .columns
        .iter()
        .map(|column| HeaderCell {
            key: column.key.clone(),
            label: column.label.clone(),
            sortable: column.sortable,
            width: column.width.clone(),
            sort: sort.filter(|spec| spec.key == column.key).map(|spec| spec.direction),
        })
        .collect();

    let filters = config
        .filters
        .iter()
        .map(|filter| FilterControl {
            key: filter.key.clone(),
            label: filter.label.clone(),
            kind: filter.kind,
            options: filter.options.clone(),
            value: controller.state().filters.get(&filter.key).cloned().unwrap_or(FilterValue::Any),
        })
        .collect();

    let rows = controller.rows();
    let body = match controller.load_state() {
        LoadState::Failed(error) => TableBody::Failed {
            message: error.user_message(),
            retryable: error.is_retryable(),
        },
        // Rows already on screen stay visible while the next page loads
        LoadState::Idle | LoadState::Loading if rows.is_empty() => TableBody::Loading {
            skeleton_rows: config.skeleton_rows,
        },
        _ if rows.is_empty() => TableBody::Empty {
            message: config.empty_message.clone(),
        },
        _ => {
            let drag_handle = controller.drag_handles_enabled();
            let actions = controller.available_actions();
            TableBody::Rows(
                rows.iter()
                    .map(|row| RenderedRow {
                        id: row.id(),
                        cells: config.columns.iter().map(|column| render_cell(column, row)).collect(),
                        drag_handle,
                        actions: actions.clone(),
                    })
                    .collect(),
            )
        }
    };

    let pagination = controller.pagination();
    let drag_disabled_reason = match controller.reorder_availability() {
        ReorderAvailability::Disabled(reason) if config.enable_drag_drop => Some(reason),
        _ => None,
    };

    TableView {
        header,
        filters,
        body,
        pages: pagination.window(),
        current_page: pagination.current_page(),
        summary: pagination.range_summary(rows.len()),
        search_placeholder: config.search_placeholder.clone(),
        drag_disabled_reason,
    }
}

/// Text for one cell of `row`
pub fn render_cell<R: TableRow>(column: &ColumnSpec<R>, row: &R) -> String {
    let value = row.field(&column.key);
    match &column.render {
        Some(render) => render(value.as_ref().unwrap_or(&Value::Null), row),
        None => default_cell_text(value.as_ref()),
    }
}

pub fn default_cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => EMPTY_CELL.to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Bool(true)) => "Yes".to_string(),
        Some(Value::Bool(false)) => "No".to_string(),
        Some(Value::Number(number)) => number.to_string(),
        Some(other) => other.to_string(),
    }
}

impl TableView {
    /// Plain text rendering for terminals
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let labels: Vec<String> = self
            .header
            .iter()
            .map(|cell| match cell.sort {
                Some(SortDirection::Asc) => format!("{} ^", cell.label),
                Some(SortDirection::Desc) => format!("{} v", cell.label),
                None => cell.label.clone(),
            })
            .collect();

        let active: Vec<String> = self
            .filters
            .iter()
            .filter_map(|filter| {
                filter.value.wire_value().map(|value| format!("{}={}", filter.label, value))
            })
            .collect();
        if !active.is_empty() {
            let _ = writeln!(out, "Filters: {}", active.join(", "));
        }

        match &self.body {
            TableBody::Loading { skeleton_rows } => {
                let _ = writeln!(out, "{}", labels.join(" | "));
                for _ in 0..*skeleton_rows {
                    let _ = writeln!(out, "{}", vec!["..."; labels.len()].join(" | "));
                }
            }
            TableBody::Failed { message, retryable } => {
                let _ = writeln!(out, "Error: {}", message);
                if *retryable {
                    let _ = writeln!(out, "(retry available)");
                }
            }
            TableBody::Empty { message } => {
                let _ = writeln!(out, "{}", labels.join(" | "));
                let _ = writeln!(out, "{}", message);
            }
            TableBody::Rows(rows) => {
                let mut widths: Vec<usize> = labels.iter().map(|label| label.chars().count()).collect();
                for row in rows {
                    for (width, cell) in widths.iter_mut().zip(&row.cells) {
                        *width = (*width).max(cell.chars().count());
                    }
                }
                let _ = writeln!(out, "{}", pad_line(&labels, &widths));
                let _ = writeln!(
                    out,
                    "{}",
                    widths.iter().map(|width| "-".repeat(*width)).collect::<Vec<_>>().join("-+-")
                );
                for row in rows {
                    let _ = writeln!(out, "{}", pad_line(&row.cells, &widths));
                }
            }
        }

        if self.summary.total > 0 {
            let pages: Vec<String> = self
                .pages
                .iter()
                .map(|item| match item {
                    PageItem::Page(page) if *page == self.current_page => format!("[{}]", page),
                    PageItem::Page(page) => page.to_string(),
                    PageItem::Ellipsis => "...".to_string(),
                })
                .collect();
            let _ = writeln!(
                out,
                "Showing {} to {} of {} results   {}",
                self.summary.from,
                self.summary.to,
                self.summary.total,
                pages.join(" ")
            );
        }
        out
    }
}

fn pad_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::QueryCache;
    use crate::domain::models::JsonRow;
    use crate::domain::table_config::{FilterSpec, TableConfig};
    use crate::error::TableError;
    use crate::io::api_client::ApiClient;
    use crate::io::transport::testing::RecordingTransport;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn users_config() -> TableConfig<JsonRow> {
        TableConfig::new(
            "/admin/users",
            vec![
                ColumnSpec::new("name", "Name").sortable(),
                ColumnSpec::new("email", "Email"),
                ColumnSpec::new("is_verified", "Verified"),
                ColumnSpec::new("role", "Role").render(|value, _row: &JsonRow| {
                    value.as_str().map(str::to_uppercase).unwrap_or_default()
                }),
            ],
        )
        .on_view(|_row: &JsonRow| {})
    }

    fn controller(transport: &RecordingTransport, config: TableConfig<JsonRow>) -> TableController<JsonRow> {
        let api = ApiClient::new(Arc::new(transport.clone()));
        TableController::new(config, api, QueryCache::new(Duration::from_secs(60)))
    }

    #[test]
    fn test_default_cell_text() {
        assert_eq!(default_cell_text(None), "-");
        assert_eq!(default_cell_text(Some(&Value::Null)), "-");
        assert_eq!(default_cell_text(Some(&json!("Cairo"))), "Cairo");
        assert_eq!(default_cell_text(Some(&json!(2500000))), "2500000");
        assert_eq!(default_cell_text(Some(&json!(true))), "Yes");
        assert_eq!(default_cell_text(Some(&json!(false))), "No");
    }

    #[test]
    fn test_initial_view_shows_skeleton() {
        let transport = RecordingTransport::new();
        let table = controller(&transport, users_config());

        let view = table.view();
        assert_eq!(view.body, TableBody::Loading { skeleton_rows: 5 });
        assert_eq!(view.header.len(), 4);
        assert_eq!(view.drag_disabled_reason, None);
    }

    #[tokio::test]
    async fn test_rows_and_sort_indicator() {
        let transport = RecordingTransport::new();
        transport.push_json(
            200,
            json!({"data": [
                {"id": 1, "name": "Ann", "email": "ann@example.com", "is_verified": true, "role": "admin"},
                {"id": 2, "name": "Bob", "email": null, "is_verified": false, "role": "agent"}
            ], "meta": {"current_page": 1, "last_page": 1, "per_page": 10, "total": 2}}),
        );
        let mut table = controller(&transport, users_config());
        table.set_sort("name");
        table.load().await;

        let view = table.view();
        assert_eq!(view.header[0].sort, Some(SortDirection::Asc));
        assert_eq!(view.header[1].sort, None);

        let TableBody::Rows(rows) = &view.body else {
            panic!("expected rows, got {:?}", view.body);
        };
        assert_eq!(rows[0].cells, vec!["Ann", "ann@example.com", "Yes", "ADMIN"]);
        assert_eq!(rows[1].cells, vec!["Bob", "-", "No", "AGENT"]);
        assert_eq!(rows[0].actions, vec![RowAction::View, RowAction::Delete]);
        assert!(!rows[0].drag_handle);
        assert_eq!(view.summary, RangeSummary { from: 1, to: 2, total: 2 });

        let text = view.to_text();
        assert!(text.contains("Name ^"));
        assert!(text.contains("Showing 1 to 2 of 2 results"));
    }

    #[tokio::test]
    async fn test_empty_and_failed_bodies() {
        let transport = RecordingTransport::new();
        transport.push_json(200, json!({"data": []}));
        let mut table = controller(&transport, users_config().with_empty_message("No users yet"));
        table.load().await;
        assert_eq!(table.view().body, TableBody::Empty { message: "No users yet".into() });

        transport.push_error(TableError::Network("connection reset".into()));
        table.refetch().await;
        match table.view().body {
            TableBody::Failed { retryable, .. } => assert!(retryable),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_filter_controls_carry_current_values() {
        let transport = RecordingTransport::new();
        let config = users_config().with_filters(vec![
            FilterSpec::select(
                "role",
                "Role",
                vec![FilterOption::new("Admin", "admin"), FilterOption::new("Agent", "agent")],
            ),
            FilterSpec::date("created_at", "Created"),
        ]);
        let mut table = controller(&transport, config);
        table.set_filter("role", "admin");

        let view = table.view();
        assert_eq!(view.filters.len(), 2);
        assert_eq!(view.filters[0].kind, FilterKind::Select);
        assert_eq!(view.filters[0].options.len(), 2);
        assert_eq!(view.filters[0].value, FilterValue::Specific("admin".into()));
        assert_eq!(view.filters[1].value, FilterValue::Any);
        assert!(view.to_text().contains("Filters: Role=admin"));
    }

    #[tokio::test]
    async fn test_drag_disabled_reason_when_filtered() {
        let transport = RecordingTransport::new();
        let mut table = controller(&transport, users_config().with_drag_drop(Some("users")));
        table.set_filter("role", "admin");

        let view = table.view();
        assert!(view.drag_disabled_reason.is_some());
    }
}

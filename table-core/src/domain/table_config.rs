//! # Table Configuration
//!
//! The configuration every admin screen hands to the table: columns, filters,
//! endpoint, feature switches, row action handlers and the texts of the
//! delete confirmation. Static for the lifetime of a table instance.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::pagination::DEFAULT_MAX_VISIBLE_PAGES;
use super::query_key::normalize_endpoint;
use super::table_state::TableState;
use crate::error::TableError;

pub type CellRenderer<R> = Arc<dyn Fn(&Value, &R) -> String + Send + Sync>;
pub type RowCallback<R> = Arc<dyn Fn(&R) + Send + Sync>;
pub type RowText<R> = Arc<dyn Fn(&R) -> String + Send + Sync>;
pub type RowWarning<R> = Arc<dyn Fn(&R) -> Option<String> + Send + Sync>;
pub type DeleteHandler<R> = Arc<dyn Fn(R) -> BoxFuture<'static, Result<(), TableError>> + Send + Sync>;

pub const DEFAULT_SKELETON_ROWS: usize = 5;
pub const DEFAULT_EMPTY_MESSAGE: &str = "No records found";
pub const DEFAULT_DELETE_TITLE: &str = "Delete item";

/// One table column
pub struct ColumnSpec<R> {
    pub key: String,
    pub label: String,
    pub sortable: bool,
    pub width: Option<String>,
    pub render: Option<CellRenderer<R>>,
}

impl<R> ColumnSpec<R> {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            sortable: false,
            width: None,
            render: None,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn width(mut self, width: impl Into<String>) -> Self {
        self.width = Some(width.into());
        self
    }

    pub fn render<F>(mut self, render: F) -> Self
    where
        F: Fn(&Value, &R) -> String + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }
}

impl<R> Clone for ColumnSpec<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            label: self.label.clone(),
            sortable: self.sortable,
            width: self.width.clone(),
            render: self.render.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterKind {
    Select,
    Date,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub label: String,
    pub value: String,
}

impl FilterOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A filter control shown above the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub key: String,
    pub label: String,
    pub kind: FilterKind,
    pub options: Vec<FilterOption>,
}

impl FilterSpec {
    pub fn select(key: impl Into<String>, label: impl Into<String>, options: Vec<FilterOption>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: FilterKind::Select,
            options,
        }
    }

    pub fn date(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: FilterKind::Date,
            options: Vec::new(),
        }
    }

    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: FilterKind::Text,
            options: Vec::new(),
        }
    }
}

/// Caller-supplied row action handlers
pub struct TableActions<R> {
    pub on_view: Option<RowCallback<R>>,
    pub on_edit: Option<RowCallback<R>>,
    /// Delete mutation; when absent the table issues `DELETE {endpoint}/{id}`
    pub on_delete: Option<DeleteHandler<R>>,
}

impl<R> Default for TableActions<R> {
    fn default() -> Self {
        Self {
            on_view: None,
            on_edit: None,
            on_delete: None,
        }
    }
}

impl<R> Clone for TableActions<R> {
    fn clone(&self) -> Self {
        Self {
            on_view: self.on_view.clone(),
            on_edit: self.on_edit.clone(),
            on_delete: self.on_delete.clone(),
        }
    }
}

/// Everything an admin screen configures on its table
pub struct TableConfig<R> {
    pub columns: Vec<ColumnSpec<R>>,
    pub filters: Vec<FilterSpec>,
    pub api_endpoint: String,
    pub enable_drag_drop: bool,
    pub enable_actions: bool,
    pub actions: TableActions<R>,
    pub enable_delete: bool,
    pub enable_date_range: bool,
    pub search_placeholder: String,
    pub empty_message: String,
    pub skeleton_rows: usize,
    pub delete_title: String,
    pub delete_description: Option<RowText<R>>,
    pub delete_warning: Option<RowWarning<R>>,
    /// Body key of the reorder request; defaults to the endpoint's last segment
    pub reorder_key: Option<String>,
    pub initial_state: TableState,
    pub max_visible_pages: u32,
}

impl<R> TableConfig<R> {
    pub fn new(api_endpoint: impl Into<String>, columns: Vec<ColumnSpec<R>>) -> Self {
        Self {
            columns,
            filters: Vec::new(),
            api_endpoint: normalize_endpoint(&api_endpoint.into()),
            enable_drag_drop: false,
            enable_actions: true,
            actions: TableActions::default(),
            enable_delete: true,
            enable_date_range: false,
            search_placeholder: "Search...".to_string(),
            empty_message: DEFAULT_EMPTY_MESSAGE.to_string(),
            skeleton_rows: DEFAULT_SKELETON_ROWS,
            delete_title: DEFAULT_DELETE_TITLE.to_string(),
            delete_description: None,
            delete_warning: None,
            reorder_key: None,
            initial_state: TableState::default(),
            max_visible_pages: DEFAULT_MAX_VISIBLE_PAGES,
        }
    }

    pub fn with_filters(mut self, filters: Vec<FilterSpec>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_drag_drop(mut self, reorder_key: Option<&str>) -> Self {
        self.enable_drag_drop = true;
        self.reorder_key = reorder_key.map(str::to_string);
        self
    }

    pub fn with_date_range(mut self) -> Self {
        self.enable_date_range = true;
        self
    }

    pub fn with_initial_state(mut self, state: TableState) -> Self {
        self.initial_state = state;
        self
    }

    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    pub fn on_view<F>(mut self, handler: F) -> Self
    where
        F: Fn(&R) + Send + Sync + 'static,
    {
        self.actions.on_view = Some(Arc::new(handler));
        self
    }

    pub fn on_edit<F>(mut self, handler: F) -> Self
    where
        F: Fn(&R) + Send + Sync + 'static,
    {
        self.actions.on_edit = Some(Arc::new(handler));
        self
    }

    pub fn on_delete<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TableError>> + Send + 'static,
    {
        self.actions.on_delete = Some(Arc::new(move |row| handler(row).boxed()));
        self
    }

    pub fn delete_dialog<D, W>(mut self, title: impl Into<String>, description: D, warning: W) -> Self
    where
        D: Fn(&R) -> String + Send + Sync + 'static,
        W: Fn(&R) -> Option<String> + Send + Sync + 'static,
    {
        self.delete_title = title.into();
        self.delete_description = Some(Arc::new(description));
        self.delete_warning = Some(Arc::new(warning));
        self
    }

    pub fn without_delete(mut self) -> Self {
        self.enable_delete = false;
        self
    }

    pub fn reorder_key(&self) -> String {
        match &self.reorder_key {
            Some(key) => key.clone(),
            None => self
                .api_endpoint
                .rsplit('/')
                .find(|segment| !segment.is_empty())
                .unwrap_or("items")
                .to_string(),
        }
    }

    pub fn column(&self, key: &str) -> Option<&ColumnSpec<R>> {
        self.columns.iter().find(|column| column.key == key)
    }

    /// Whether `key` may be filtered on. Tables without filter controls accept any key.
    pub fn accepts_filter(&self, key: &str) -> bool {
        self.filters.is_empty() || self.filters.iter().any(|filter| filter.key == key)
    }
}

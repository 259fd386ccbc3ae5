//! # Admin Table Core
//!
//! Headless data table for the admin dashboard: one paginated, filterable,
//! searchable, sortable and optionally drag-reorderable table reused by every
//! listing screen (users, listings, categories, sliders, ...).
//!
//! ## Layout
//!
//! - **domain**: state, query keys, pagination, reordering and row actions (no I/O)
//! - **io**: HTTP transport, API client, remote fetcher and wire mappers
//! - **cache**: pages shared between table instances, invalidated by mutations
//! - **controller**: composes all of the above for one mounted table
//! - **render**: view model a front end draws
//!
//! ## Usage
//!
//! ```ignore
//! let api = ApiClient::from_config(&ClientConfig::from_env())?;
//! let config = TableConfig::<JsonRow>::new("/admin/users", vec![ColumnSpec::new("name", "Name").sortable()]);
//! let mut table = TableController::new(config, api, QueryCache::new(Duration::from_secs(30)));
//! table.load().await;
//! println!("{}", table.view().to_text());
//! ```

pub mod cache;
pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod render;

pub use cache::QueryCache;
pub use config::ClientConfig;
pub use controller::{ApplyOutcome, FetchTicket, LoadState, TableController};
pub use domain::*;
pub use error::TableError;
pub use io::{ApiClient, FetchResult, HttpTransport, RemoteFetcher, ReqwestTransport};
pub use logging::init_logging;
pub use render::{build_view, FilterControl, TableBody, TableView};

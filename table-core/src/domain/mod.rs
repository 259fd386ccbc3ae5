//! # Domain Module
//!
//! UI-agnostic table logic: the state a table is in, how that state becomes a
//! cache key, how pages are navigated, how rows are reordered and how row
//! actions are routed. Nothing in here performs I/O.
//!
//! ## Key Responsibilities
//!
//! - **State**: page, page size, search, filters, date range and sort
//! - **Query Keys**: value-equal identity of a list request
//! - **Pagination**: page window and clamping
//! - **Reordering**: drag state machine and minimal sort order batches
//! - **Row Actions**: view/edit forwarding and the delete confirmation flow

pub mod models;
pub mod pagination;
pub mod query_key;
pub mod reorder;
pub mod row_actions;
pub mod table_config;
pub mod table_state;

pub use models::*;
pub use pagination::*;
pub use query_key::*;
pub use reorder::*;
pub use row_actions::*;
pub use table_config::*;
pub use table_state::*;

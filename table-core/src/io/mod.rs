//! # IO Module
//!
//! The table's only external interface is HTTP against the admin REST API.
//!
//! ## Supported Operations
//!
//! - **GET {endpoint}**: paginated list with page, filters, search, date range and sort
//! - **DELETE {endpoint}/{id}**: row delete behind the confirmation dialog
//! - **PUT {endpoint}/reorder**: sort order batch after a drag
//! - **PUT {endpoint}/{id}**: inline field edits
//!
//! ## Design Patterns
//!
//! - **Transport Trait**: `HttpTransport` keeps the core testable without a server
//! - **Mappers**: wire envelopes are normalized in one place
//! - **Injected Context**: token and locale accessors instead of ambient globals

pub mod api_client;
pub mod fetcher;
pub mod mappers;
pub mod transport;

pub use api_client::*;
pub use fetcher::*;
pub use transport::*;

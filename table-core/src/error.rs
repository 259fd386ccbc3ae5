//! # Table Errors
//!
//! Every network and mutation failure of the table is converted into a
//! `TableError` at the operation boundary (fetch, delete, reorder, inline
//! update). The controller turns these into UI-visible state; nothing here is
//! allowed to escape as a panic.

use thiserror::Error;

/// Message shown when a delete fails and the backend gave no reason
pub const DELETE_FALLBACK_MESSAGE: &str = "Failed to delete item";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// The request never produced a usable HTTP response (timeout, connectivity)
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status or `{ success: false }`
    #[error("Server rejected request: {message}")]
    ServerRejection { status: Option<u16>, message: String },

    /// The response did not match either list envelope shape
    #[error("Malformed response envelope: {0}")]
    MalformedEnvelope(String),

    /// A reorder batch failed to persist; local order was reverted
    #[error("Reorder could not be saved: {0}")]
    ReorderConflict(String),

    /// Drag reorder is switched off or blocked by an active filter, search or sort
    #[error("Reordering is not available: {0}")]
    ReorderDisabled(String),

    /// A mutation for the same row or batch is still in flight
    #[error("Another change is still being saved")]
    MutationPending,

    /// The caller asked for something the table cannot issue
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TableError {
    /// Network failures get a retry affordance, everything else is shown as-is
    pub fn is_retryable(&self) -> bool {
        matches!(self, TableError::Network(_))
    }

    /// Text surfaced to the user (toast, banner, dialog)
    pub fn user_message(&self) -> String {
        match self {
            TableError::ServerRejection { message, .. } => message.clone(),
            TableError::Network(_) => "Could not reach the server. Please try again.".to_string(),
            TableError::MalformedEnvelope(_) => "The server returned an unexpected response.".to_string(),
            TableError::ReorderConflict(reason) => {
                format!("The new order could not be saved: {}", reason)
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_network_errors_are_retryable() {
        assert!(TableError::Network("timeout".into()).is_retryable());
        assert!(!TableError::MalformedEnvelope("x".into()).is_retryable());
        assert!(!TableError::ServerRejection { status: Some(422), message: "no".into() }.is_retryable());
    }

    #[test]
    fn test_server_rejection_is_surfaced_verbatim() {
        let err = TableError::ServerRejection {
            status: Some(409),
            message: "Category still has listings".into(),
        };
        assert_eq!(err.user_message(), "Category still has listings");
    }

    #[test]
    fn test_reorder_conflict_keeps_backend_reason() {
        let err = TableError::ReorderConflict("Slider 4 was deleted".into());
        assert_eq!(err.user_message(), "The new order could not be saved: Slider 4 was deleted");
    }
}

//! # Row Actions
//!
//! Routes `view`/`edit`/`delete` intents from a table row. View and edit are
//! forwarded to the screen's handlers. Delete goes through a confirmation
//! dialog state that stays open (with the backend's message) when the delete
//! fails, so the user can retry or cancel.

use std::future::Future;

use tracing::{info, warn};

use super::models::TableRow;
use super::table_config::{RowCallback, RowText, RowWarning, TableConfig};
use crate::error::{TableError, DELETE_FALLBACK_MESSAGE};

pub const DEFAULT_DELETE_DESCRIPTION: &str =
    "Are you sure you want to delete this item? This action cannot be undone.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    View,
    Edit,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Forwarded,
    /// The screen did not register a handler for this action
    NoHandler,
    ConfirmationOpened,
    /// Actions (or delete) are switched off for this table
    Disabled,
}

/// State of the open delete dialog
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteConfirmation<R> {
    pub row: R,
    pub pending: bool,
    pub title: String,
    pub description: String,
    /// Advisory only, never blocks the delete
    pub warning: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { id: i64 },
    /// Dialog stays open with `error` set
    Failed(TableError),
}

pub struct RowActionDispatcher<R> {
    enabled: bool,
    delete_enabled: bool,
    on_view: Option<RowCallback<R>>,
    on_edit: Option<RowCallback<R>>,
    delete_title: String,
    delete_description: Option<RowText<R>>,
    delete_warning: Option<RowWarning<R>>,
    confirmation: Option<DeleteConfirmation<R>>,
}

impl<R: TableRow> RowActionDispatcher<R> {
    pub fn from_config(config: &TableConfig<R>) -> Self {
        Self {
            enabled: config.enable_actions,
            delete_enabled: config.enable_delete,
            on_view: config.actions.on_view.clone(),
            on_edit: config.actions.on_edit.clone(),
            delete_title: config.delete_title.clone(),
            delete_description: config.delete_description.clone(),
            delete_warning: config.delete_warning.clone(),
            confirmation: None,
        }
    }

    /// Actions offered on a row, in display order
    pub fn available_actions(&self) -> Vec<RowAction> {
        if !self.enabled {
            return Vec::new();
        }
        let mut actions = Vec::new();
        if self.on_view.is_some() {
            actions.push(RowAction::View);
        }
        if self.on_edit.is_some() {
            actions.push(RowAction::Edit);
        }
        if self.delete_enabled {
            actions.push(RowAction::Delete);
        }
        actions
    }

    pub fn dispatch(&mut self, action: RowAction, row: &R) -> DispatchOutcome {
        if !self.enabled {
            return DispatchOutcome::Disabled;
        }
        match action {
            RowAction::View => forward(self.on_view.as_ref(), row),
            RowAction::Edit => forward(self.on_edit.as_ref(), row),
            RowAction::Delete => {
                if !self.delete_enabled {
                    return DispatchOutcome::Disabled;
                }
                self.open_confirmation(row);
                DispatchOutcome::ConfirmationOpened
            }
        }
    }

    pub fn confirmation(&self) -> Option<&DeleteConfirmation<R>> {
        self.confirmation.as_ref()
    }

    pub fn cancel_delete(&mut self) {
        if let Some(confirmation) = &self.confirmation {
            if confirmation.pending {
                warn!("Cannot close delete dialog for row {} while the delete is pending", confirmation.row.id());
                return;
            }
        }
        self.confirmation = None;
    }

    /// Mark the open confirmation as pending and hand out the row to delete.
    /// A second confirm while the first is in flight is refused.
    pub fn begin_confirm(&mut self) -> Result<R, TableError> {
        let confirmation = self
            .confirmation
            .as_mut()
            .ok_or_else(|| TableError::InvalidRequest("no delete confirmation is open".to_string()))?;
        if confirmation.pending {
            return Err(TableError::MutationPending);
        }
        confirmation.pending = true;
        confirmation.error = None;
        Ok(confirmation.row.clone())
    }

    /// Apply the result of the delete mutation started by `begin_confirm`
    pub fn finish_confirm(&mut self, result: Result<(), TableError>) -> DeleteOutcome {
        let Some(confirmation) = self.confirmation.as_mut() else {
            return DeleteOutcome::Failed(TableError::InvalidRequest(
                "no delete confirmation is open".to_string(),
            ));
        };
        let id = confirmation.row.id();
        match result {
            Ok(()) => {
                info!("Row {} deleted", id);
                self.confirmation = None;
                DeleteOutcome::Deleted { id }
            }
            Err(e) => {
                warn!("Delete of row {} failed: {}", id, e);
                confirmation.pending = false;
                confirmation.error = Some(delete_error_message(&e));
                DeleteOutcome::Failed(e)
            }
        }
    }

    /// Run the whole confirm step with the given delete mutation
    pub async fn confirm_delete<F, Fut>(&mut self, delete: F) -> DeleteOutcome
    where
        F: FnOnce(R) -> Fut,
        Fut: Future<Output = Result<(), TableError>>,
    {
        let row = match self.begin_confirm() {
            Ok(row) => row,
            Err(e) => return DeleteOutcome::Failed(e),
        };
        let result = delete(row).await;
        self.finish_confirm(result)
    }

    fn open_confirmation(&mut self, row: &R) {
        let description = match &self.delete_description {
            Some(describe) => describe(row),
            None => DEFAULT_DELETE_DESCRIPTION.to_string(),
        };
        let warning = self.delete_warning.as_ref().and_then(|warn_for| warn_for(row));
        self.confirmation = Some(DeleteConfirmation {
            row: row.clone(),
            pending: false,
            title: self.delete_title.clone(),
            description,
            warning,
            error: None,
        });
    }
}

fn forward<R>(handler: Option<&RowCallback<R>>, row: &R) -> DispatchOutcome {
    match handler {
        Some(handler) => {
            handler(row);
            DispatchOutcome::Forwarded
        }
        None => DispatchOutcome::NoHandler,
    }
}

/// Backend message when it sent one, the generic fallback otherwise
pub fn delete_error_message(error: &TableError) -> String {
    match error {
        TableError::ServerRejection { message, .. } if !message.trim().is_empty() => message.clone(),
        _ => DELETE_FALLBACK_MESSAGE.to_string(),
    }
}

//! # Drag Reorder
//!
//! Lets the user reorder the rows of the page currently on screen and turns
//! the move into a minimal `{id, sort_order}` batch.
//!
//! ## Phases
//!
//! ```text
//! Idle --begin_drag--> Dragging --drop_on--> (plan) --> Persisting --complete--> Idle
//!                         |                                   |
//!                     cancel_drag                     failure: revert to the
//!                         v                           last confirmed order
//!                        Idle
//! ```
//!
//! ## Sort order assignment
//!
//! When the page's `sort_order` values are strictly monotonic, the values of
//! the affected slot range are handed out again in the new row order. Rows
//! outside the range keep their value, and the moved row lands strictly
//! between its new neighbours. Pages with duplicate or missing values are
//! renumbered from the page offset instead. Either way only changed pairs go
//! into the batch.
//!
//! Reordering is only meaningful on the unfiltered, unsorted listing; with a
//! search, filter, date range or column sort active the position of a row on
//! screen says nothing about its place in the whole collection.

use std::collections::HashMap;

use shared::ReorderItem;
use tracing::{debug, info, warn};

use super::models::TableRow;
use super::table_state::TableState;
use crate::error::TableError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderAvailability {
    Allowed,
    Disabled(String),
}

impl ReorderAvailability {
    /// Drag handles are shown only when reordering is allowed
    pub fn evaluate(enabled: bool, state: &TableState) -> Self {
        if !enabled {
            return ReorderAvailability::Disabled("drag and drop is not enabled for this table".to_string());
        }
        if state.has_active_query() {
            return ReorderAvailability::Disabled(
                "clear search, filters and sorting before reordering rows".to_string(),
            );
        }
        ReorderAvailability::Allowed
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, ReorderAvailability::Allowed)
    }
}

/// Result of planning one move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderPlan {
    /// Row ids in their new display order
    pub order: Vec<i64>,
    /// Only the rows whose `sort_order` changes, in new display order
    pub batch: Vec<ReorderItem>,
}

/// Plan moving the row at `from` to index `to`.
///
/// `rows` is the displayed `(id, sort_order)` sequence before the move;
/// `page_offset` is the number of rows on earlier pages.
pub fn plan_reorder(
    rows: &[(i64, Option<i64>)],
    from: usize,
    to: usize,
    page_offset: u64,
) -> Result<ReorderPlan, TableError> {
    if from >= rows.len() || to >= rows.len() {
        return Err(TableError::InvalidRequest(format!(
            "cannot move row {} to {} on a page of {} rows",
            from,
            to,
            rows.len()
        )));
    }

    let mut moved = rows.to_vec();
    let row = moved.remove(from);
    moved.insert(to, row);
    let order: Vec<i64> = moved.iter().map(|(id, _)| *id).collect();

    if from == to {
        return Ok(ReorderPlan { order, batch: Vec::new() });
    }

    let old_values: HashMap<i64, Option<i64>> = rows.iter().copied().collect();
    let new_values: Vec<i64> = match monotonic_values(rows) {
        // Slot values stay with their positions; outside [min(from,to), max(from,to)]
        // the row at each position is unchanged, so only the range shows up in the batch.
        Some(values) => values,
        None => {
            debug!("Sort orders on page are not strictly monotonic, renumbering from {}", page_offset + 1);
            (0..rows.len()).map(|index| page_offset as i64 + index as i64 + 1).collect()
        }
    };

    let batch = order
        .iter()
        .zip(new_values)
        .filter(|(id, value)| old_values.get(*id).copied().flatten() != Some(*value))
        .map(|(id, sort_order)| ReorderItem { id: *id, sort_order })
        .collect();

    Ok(ReorderPlan { order, batch })
}

/// The page's sort orders in display order, if all present and strictly
/// increasing or strictly decreasing
fn monotonic_values(rows: &[(i64, Option<i64>)]) -> Option<Vec<i64>> {
    let values = rows.iter().map(|(_, value)| *value).collect::<Option<Vec<i64>>>()?;
    let increasing = values.windows(2).all(|pair| pair[0] < pair[1]);
    let decreasing = values.windows(2).all(|pair| pair[0] > pair[1]);
    if increasing || decreasing {
        Some(values)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderPhase {
    Idle,
    Dragging { from: usize },
    Persisting { batch: Vec<ReorderItem> },
}

/// Drag state of one table page
#[derive(Debug, Clone)]
pub struct ReorderEngine<R> {
    phase: ReorderPhase,
    /// Last order the server confirmed (fetched or successfully persisted)
    confirmed: Vec<R>,
    displayed: Vec<R>,
    /// Sort orders persisted since the last fetch
    overrides: HashMap<i64, i64>,
    page_offset: u64,
}

impl<R: TableRow> ReorderEngine<R> {
    pub fn new() -> Self {
        Self {
            phase: ReorderPhase::Idle,
            confirmed: Vec::new(),
            displayed: Vec::new(),
            overrides: HashMap::new(),
            page_offset: 0,
        }
    }

    pub fn phase(&self) -> &ReorderPhase {
        &self.phase
    }

    pub fn rows(&self) -> &[R] {
        &self.displayed
    }

    pub fn is_persisting(&self) -> bool {
        matches!(self.phase, ReorderPhase::Persisting { .. })
    }

    /// Take over a freshly fetched page. An in-progress drag is abandoned; a
    /// batch in flight keeps its rows until it completes.
    pub fn sync(&mut self, rows: Vec<R>, page_offset: u64) {
        if self.is_persisting() {
            warn!("Ignoring page sync while a reorder batch is in flight");
            return;
        }
        self.phase = ReorderPhase::Idle;
        self.confirmed = rows.clone();
        self.displayed = rows;
        self.overrides.clear();
        self.page_offset = page_offset;
    }

    pub fn effective_sort_order(&self, row: &R) -> Option<i64> {
        self.overrides.get(&row.id()).copied().or_else(|| row.sort_order())
    }

    pub fn begin_drag(&mut self, from: usize, availability: &ReorderAvailability) -> Result<(), TableError> {
        if let ReorderAvailability::Disabled(reason) = availability {
            return Err(TableError::ReorderDisabled(reason.clone()));
        }
        match self.phase {
            ReorderPhase::Persisting { .. } => return Err(TableError::MutationPending),
            ReorderPhase::Idle | ReorderPhase::Dragging { .. } => {}
        }
        if from >= self.displayed.len() {
            return Err(TableError::InvalidRequest(format!("no row at index {}", from)));
        }
        debug!("Drag started at row {}", from);
        self.phase = ReorderPhase::Dragging { from };
        Ok(())
    }

    pub fn cancel_drag(&mut self) {
        if let ReorderPhase::Dragging { .. } = self.phase {
            self.phase = ReorderPhase::Idle;
        }
    }

    /// Drop the dragged row at `to`. Returns the batch to persist, or `None`
    /// when the drop changed nothing.
    pub fn drop_on(&mut self, to: usize) -> Result<Option<Vec<ReorderItem>>, TableError> {
        let ReorderPhase::Dragging { from } = self.phase else {
            return Err(TableError::InvalidRequest("no drag in progress".to_string()));
        };

        let current: Vec<(i64, Option<i64>)> = self
            .displayed
            .iter()
            .map(|row| (row.id(), self.effective_sort_order(row)))
            .collect();
        let plan = match plan_reorder(&current, from, to, self.page_offset) {
            Ok(plan) => plan,
            Err(e) => {
                self.phase = ReorderPhase::Idle;
                return Err(e);
            }
        };

        if plan.batch.is_empty() {
            self.phase = ReorderPhase::Idle;
            return Ok(None);
        }

        let row = self.displayed.remove(from);
        self.displayed.insert(to, row);
        info!("Row moved from {} to {}, persisting {} sort orders", from, to, plan.batch.len());
        self.phase = ReorderPhase::Persisting { batch: plan.batch.clone() };
        Ok(Some(plan.batch))
    }

    /// Finish the in-flight batch. On failure the displayed order falls back
    /// to the last confirmed one and a `ReorderConflict` is returned.
    pub fn complete(&mut self, outcome: Result<(), TableError>) -> Result<(), TableError> {
        let ReorderPhase::Persisting { batch } = std::mem::replace(&mut self.phase, ReorderPhase::Idle) else {
            return Err(TableError::InvalidRequest("no reorder batch in flight".to_string()));
        };

        match outcome {
            Ok(()) => {
                self.overrides.extend(batch.iter().map(|item| (item.id, item.sort_order)));
                self.confirmed = self.displayed.clone();
                Ok(())
            }
            Err(e) => {
                warn!("Reorder batch failed, reverting to confirmed order: {}", e);
                self.displayed = self.confirmed.clone();
                Err(TableError::ReorderConflict(e.user_message()))
            }
        }
    }
}

impl<R: TableRow> Default for ReorderEngine<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::JsonRow;
    use crate::domain::table_state::TableStateStore;
    use serde_json::Map;

    fn row(id: i64, sort_order: Option<i64>) -> JsonRow {
        JsonRow { id, sort_order, fields: Map::new() }
    }

    fn ids(rows: &[JsonRow]) -> Vec<i64> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_move_to_top_only_touches_affected_range() {
        let rows = [(10, Some(1)), (11, Some(2)), (12, Some(3)), (13, Some(4)), (14, Some(5))];
        let plan = plan_reorder(&rows, 3, 0, 0).unwrap();

        assert_eq!(plan.order, vec![13, 10, 11, 12, 14]);
        assert_eq!(
            plan.batch,
            vec![
                ReorderItem { id: 13, sort_order: 1 },
                ReorderItem { id: 10, sort_order: 2 },
                ReorderItem { id: 11, sort_order: 3 },
                ReorderItem { id: 12, sort_order: 4 },
            ]
        );
        assert!(plan.batch.iter().all(|item| item.id != 14));
    }

    #[test]
    fn test_moved_row_lands_between_neighbours_with_gaps() {
        let rows = [(1, Some(10)), (2, Some(20)), (3, Some(30)), (4, Some(40))];
        let plan = plan_reorder(&rows, 0, 2, 0).unwrap();

        assert_eq!(plan.order, vec![2, 3, 1, 4]);
        assert_eq!(
            plan.batch,
            vec![
                ReorderItem { id: 2, sort_order: 10 },
                ReorderItem { id: 3, sort_order: 20 },
                ReorderItem { id: 1, sort_order: 30 },
            ]
        );
    }

    #[test]
    fn test_descending_pages_stay_descending() {
        let rows = [(1, Some(9)), (2, Some(8)), (3, Some(7))];
        let plan = plan_reorder(&rows, 2, 0, 0).unwrap();

        assert_eq!(plan.order, vec![3, 1, 2]);
        assert_eq!(
            plan.batch,
            vec![
                ReorderItem { id: 3, sort_order: 9 },
                ReorderItem { id: 1, sort_order: 8 },
                ReorderItem { id: 2, sort_order: 7 },
            ]
        );
    }

    #[test]
    fn test_duplicate_sort_orders_are_renumbered_from_page_offset() {
        let rows = [(1, Some(0)), (2, Some(0)), (3, None)];
        let plan = plan_reorder(&rows, 2, 0, 20).unwrap();

        assert_eq!(plan.order, vec![3, 1, 2]);
        assert_eq!(
            plan.batch,
            vec![
                ReorderItem { id: 3, sort_order: 21 },
                ReorderItem { id: 1, sort_order: 22 },
                ReorderItem { id: 2, sort_order: 23 },
            ]
        );
    }

    #[test]
    fn test_same_position_and_out_of_range() {
        let rows = [(1, Some(1)), (2, Some(2))];
        assert!(plan_reorder(&rows, 1, 1, 0).unwrap().batch.is_empty());
        assert!(matches!(plan_reorder(&rows, 0, 5, 0), Err(TableError::InvalidRequest(_))));
    }

    #[test]
    fn test_guard_blocks_active_queries() {
        let mut store = TableStateStore::default();
        assert!(ReorderAvailability::evaluate(true, store.state()).is_allowed());
        assert!(!ReorderAvailability::evaluate(false, store.state()).is_allowed());

        store.set_search("summer");
        assert!(matches!(
            ReorderAvailability::evaluate(true, store.state()),
            ReorderAvailability::Disabled(_)
        ));
    }

    #[test]
    fn test_drag_is_refused_while_search_is_active() {
        let mut store = TableStateStore::default();
        store.set_search("banner");
        let mut engine = ReorderEngine::new();
        engine.sync(vec![row(1, Some(1)), row(2, Some(2))], 0);

        let availability = ReorderAvailability::evaluate(true, store.state());
        assert!(matches!(engine.begin_drag(0, &availability), Err(TableError::ReorderDisabled(_))));
        assert_eq!(engine.phase(), &ReorderPhase::Idle);
    }

    #[test]
    fn test_successful_batch_keeps_new_order_and_overrides() {
        let mut engine = ReorderEngine::new();
        engine.sync(vec![row(1, Some(1)), row(2, Some(2)), row(3, Some(3))], 0);

        engine.begin_drag(2, &ReorderAvailability::Allowed).unwrap();
        let batch = engine.drop_on(0).unwrap().unwrap();
        assert_eq!(batch.len(), 3);
        assert!(engine.is_persisting());
        assert!(matches!(engine.begin_drag(0, &ReorderAvailability::Allowed), Err(TableError::MutationPending)));

        engine.complete(Ok(())).unwrap();
        assert_eq!(ids(engine.rows()), vec![3, 1, 2]);
        assert_eq!(engine.effective_sort_order(&engine.rows()[0]), Some(1));

        // A second move before the refetch plans against the persisted values
        engine.begin_drag(0, &ReorderAvailability::Allowed).unwrap();
        let batch = engine.drop_on(1).unwrap().unwrap();
        assert_eq!(
            batch,
            vec![ReorderItem { id: 1, sort_order: 1 }, ReorderItem { id: 3, sort_order: 2 }]
        );
    }

    #[test]
    fn test_failed_batch_reverts_to_confirmed_order() {
        let mut engine = ReorderEngine::new();
        engine.sync(vec![row(1, Some(1)), row(2, Some(2)), row(3, Some(3))], 0);

        engine.begin_drag(0, &ReorderAvailability::Allowed).unwrap();
        engine.drop_on(2).unwrap();
        assert_eq!(ids(engine.rows()), vec![2, 3, 1]);

        let result = engine.complete(Err(TableError::Network("connection reset".into())));
        assert!(matches!(result, Err(TableError::ReorderConflict(_))));
        assert_eq!(ids(engine.rows()), vec![1, 2, 3]);
        assert_eq!(engine.phase(), &ReorderPhase::Idle);
    }

    #[test]
    fn test_noop_drop_returns_to_idle() {
        let mut engine = ReorderEngine::new();
        engine.sync(vec![row(1, Some(1)), row(2, Some(2))], 0);

        engine.begin_drag(1, &ReorderAvailability::Allowed).unwrap();
        assert_eq!(engine.drop_on(1).unwrap(), None);
        assert_eq!(engine.phase(), &ReorderPhase::Idle);
    }
}

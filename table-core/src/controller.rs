//! # Table Controller
//!
//! Composes state, query key, fetcher, cache, reorder engine and row action
//! dispatcher into the table every admin screen embeds.
//!
//! ## Flow
//!
//! ```text
//! state change ──> query key changes ──> begin_fetch ──> GET ──> apply_fetch
//!                                                              │
//!                                           key still current? ├─ yes: rows + meta, page clamp
//!                                                              └─ no:  discarded
//! mutation ok ──> invalidate endpoint in the shared cache ──> needs_fetch
//! ```
//!
//! ## Ordering
//!
//! Fetches are tagged with the key they were issued for and a request id.
//! Only the response to the latest request for the current key is applied
//! (last key wins, not last response), even when an older one arrives after
//! it. A successful mutation retires every request issued before it. After
//! `unmount` every response is discarded on arrival.

use std::collections::HashSet;

use chrono::NaiveDate;
use shared::ReorderItem;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::QueryCache;
use crate::domain::models::{PageEnvelope, PageMeta, TableRow};
use crate::domain::pagination::PaginationController;
use crate::domain::query_key::QueryKey;
use crate::domain::reorder::{ReorderAvailability, ReorderEngine, ReorderPhase};
use crate::domain::row_actions::{DeleteConfirmation, DeleteOutcome, DispatchOutcome, RowAction, RowActionDispatcher};
use crate::domain::table_config::TableConfig;
use crate::domain::table_state::{FilterValue, TableState, TableStateStore};
use crate::error::TableError;
use crate::io::api_client::ApiClient;
use crate::io::fetcher::{FetchResult, RemoteFetcher};
use crate::render::{self, TableView};

/// Follow-up fetches allowed when a result forces a page clamp
const MAX_CLAMP_REFETCHES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing requested yet
    Idle,
    Loading,
    Loaded,
    Failed(TableError),
}

/// Identity of one issued list request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    key: QueryKey,
    request_id: Uuid,
}

impl FetchTicket {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Superseded key, superseded request, or unmounted table
    Discarded,
    /// The result moved the last page below the requested one; the page was
    /// clamped and a new fetch is needed
    Clamped { page: u32 },
}

pub struct TableController<R: TableRow> {
    config: TableConfig<R>,
    store: TableStateStore,
    fetcher: RemoteFetcher<R>,
    cache: QueryCache<R>,
    page: PageEnvelope<R>,
    load_state: LoadState,
    /// Most recent request issued; older responses are dropped even for the same key
    latest_request: Option<Uuid>,
    needs_fetch: bool,
    reorder: ReorderEngine<R>,
    actions: RowActionDispatcher<R>,
    pending_updates: HashSet<i64>,
    last_error: Option<TableError>,
    mounted: bool,
}

impl<R: TableRow> TableController<R> {
    pub fn new(config: TableConfig<R>, api: ApiClient, cache: QueryCache<R>) -> Self {
        let store = TableStateStore::new(config.initial_state.clone());
        let actions = RowActionDispatcher::from_config(&config);
        let per_page = store.state().per_page;
        info!("Table mounted for {}", config.api_endpoint);
        Self {
            config,
            store,
            fetcher: RemoteFetcher::new(api),
            cache,
            page: PageEnvelope::empty(per_page),
            load_state: LoadState::Idle,
            latest_request: None,
            needs_fetch: true,
            reorder: ReorderEngine::new(),
            actions,
            pending_updates: HashSet::new(),
            last_error: None,
            mounted: true,
        }
    }

    pub fn config(&self) -> &TableConfig<R> {
        &self.config
    }

    pub fn state(&self) -> &TableState {
        self.store.state()
    }

    pub fn query_key(&self) -> QueryKey {
        QueryKey::new(&self.config.api_endpoint, self.store.state())
    }

    /// Rows as displayed, including a local drag order not yet confirmed
    pub fn rows(&self) -> &[R] {
        self.reorder.rows()
    }

    pub fn meta(&self) -> PageMeta {
        self.page.meta
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.load_state, LoadState::Idle | LoadState::Loading)
    }

    /// State changed or data was invalidated since the last applied fetch
    pub fn needs_fetch(&self) -> bool {
        self.needs_fetch
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Last mutation error, for a toast
    pub fn last_error(&self) -> Option<&TableError> {
        self.last_error.as_ref()
    }

    pub fn take_last_error(&mut self) -> Option<TableError> {
        self.last_error.take()
    }

    pub fn fetcher(&self) -> RemoteFetcher<R> {
        self.fetcher.clone()
    }

    pub fn pagination(&self) -> PaginationController {
        PaginationController::new(self.page.meta, self.config.max_visible_pages)
    }

    pub fn view(&self) -> TableView {
        render::build_view(self)
    }

    // ---- state ----

    /// Out-of-range pages are clamped against the loaded result while it is
    /// still current; otherwise the clamp waits for the next result
    pub fn set_page(&mut self, page: u32) -> bool {
        let page = match self.load_state {
            LoadState::Loaded if !self.needs_fetch => self.pagination().clamp(page),
            _ => page.max(1),
        };
        let changed = self.store.set_page(page);
        self.after_state_change(changed)
    }

    pub fn set_per_page(&mut self, per_page: u32) -> bool {
        let changed = self.store.set_per_page(per_page);
        self.after_state_change(changed)
    }

    pub fn set_search(&mut self, text: impl Into<String>) -> bool {
        let changed = self.store.set_search(text);
        self.after_state_change(changed)
    }

    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> bool {
        let key = key.into();
        if !self.config.accepts_filter(&key) {
            warn!("Filter {} ignored: no such control on {}", key, self.config.api_endpoint);
            return false;
        }
        let changed = self.store.set_filter(key, value);
        self.after_state_change(changed)
    }

    pub fn set_date_range(&mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
        if !self.config.enable_date_range && (from.is_some() || to.is_some()) {
            warn!("Date range ignored: not enabled for {}", self.config.api_endpoint);
            return false;
        }
        let changed = self.store.set_date_range(from, to);
        self.after_state_change(changed)
    }

    pub fn set_sort(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();
        if let Some(column) = self.config.column(&key) {
            if !column.sortable {
                debug!("Column {} is not sortable", key);
                return false;
            }
        }
        let changed = self.store.set_sort(key);
        self.after_state_change(changed)
    }

    pub fn reset(&mut self) -> bool {
        let changed = self.store.reset();
        self.after_state_change(changed)
    }

    /// Restore state mirrored in the URL query string
    pub fn restore_from_url(&mut self, query: &str) -> bool {
        let restored = TableState::from_url_query(query, self.store.defaults());
        let changed = self.store.replace(restored);
        self.after_state_change(changed)
    }

    fn after_state_change(&mut self, changed: bool) -> bool {
        if changed {
            self.needs_fetch = true;
            self.reorder.cancel_drag();
            debug!("Table state changed: {}", self.query_key());
        }
        changed
    }

    // ---- fetching ----

    /// Register a fetch for the current key. Returns `None` once unmounted.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        if !self.mounted {
            return None;
        }
        let ticket = FetchTicket {
            key: self.query_key(),
            request_id: Uuid::new_v4(),
        };
        debug!("Fetch {} issued for {}", ticket.request_id, ticket.key);
        self.latest_request = Some(ticket.request_id);
        self.load_state = LoadState::Loading;
        self.needs_fetch = false;
        Some(ticket)
    }

    /// Apply a fetch result if it still belongs to the current key and is the
    /// latest request for it
    pub fn apply_fetch(&mut self, ticket: FetchTicket, result: FetchResult<R>) -> ApplyOutcome {
        if !self.mounted {
            debug!("Discarding fetch {}: table unmounted", ticket.request_id);
            return ApplyOutcome::Discarded;
        }
        if ticket.key != self.query_key() {
            debug!("Discarding stale fetch {} for {}", ticket.request_id, ticket.key);
            return ApplyOutcome::Discarded;
        }
        if self.latest_request != Some(ticket.request_id) {
            debug!("Discarding superseded fetch {}", ticket.request_id);
            return ApplyOutcome::Discarded;
        }

        if let Some(error) = result.error {
            self.load_state = LoadState::Failed(error);
            self.install_page(result.page);
            return ApplyOutcome::Applied;
        }

        self.cache.insert(ticket.key, result.page.clone());
        self.apply_page(result.page)
    }

    /// Serve the current key from the cache when fresh, otherwise fetch it.
    /// Follows up once or twice when the result clamps the page.
    pub async fn load(&mut self) -> ApplyOutcome {
        self.run_fetch(true).await
    }

    /// Always go to the network for the current key
    pub async fn refetch(&mut self) -> ApplyOutcome {
        self.run_fetch(false).await
    }

    async fn run_fetch(&mut self, use_cache: bool) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::Discarded;
        for _ in 0..=MAX_CLAMP_REFETCHES {
            if use_cache && self.mounted {
                if let Some(page) = self.cache.get_fresh(&self.query_key()) {
                    debug!("Serving {} from cache", self.query_key());
                    self.needs_fetch = false;
                    outcome = self.apply_page(page);
                    if !matches!(outcome, ApplyOutcome::Clamped { .. }) {
                        return outcome;
                    }
                    continue;
                }
            }

            let Some(ticket) = self.begin_fetch() else {
                return ApplyOutcome::Discarded;
            };
            let result = self.fetcher.fetch_page(ticket.key()).await;
            outcome = self.apply_fetch(ticket, result);
            if !matches!(outcome, ApplyOutcome::Clamped { .. }) {
                return outcome;
            }
        }
        outcome
    }

    fn apply_page(&mut self, page: PageEnvelope<R>) -> ApplyOutcome {
        let last_page = page.meta.last_page.max(1);
        if self.store.state().page > last_page {
            self.store.clamp_to_last_page(last_page);
            self.needs_fetch = true;
            info!("Page clamped to {} of {}", last_page, self.config.api_endpoint);
            return ApplyOutcome::Clamped { page: last_page };
        }
        self.load_state = LoadState::Loaded;
        self.install_page(page);
        ApplyOutcome::Applied
    }

    fn install_page(&mut self, page: PageEnvelope<R>) {
        let offset = (page.meta.current_page.max(1) as u64 - 1) * page.meta.per_page as u64;
        self.reorder.sync(page.rows.clone(), offset);
        self.page = page;
    }

    /// Results that arrive afterwards are dropped
    pub fn unmount(&mut self) {
        info!("Table unmounted for {}", self.config.api_endpoint);
        self.mounted = false;
        self.latest_request = None;
    }

    /// Requests issued before a mutation can no longer be applied
    fn invalidate(&mut self) {
        self.cache.invalidate_endpoint(&self.config.api_endpoint);
        self.latest_request = None;
        self.needs_fetch = true;
    }

    // ---- reordering ----

    pub fn reorder_availability(&self) -> ReorderAvailability {
        ReorderAvailability::evaluate(self.config.enable_drag_drop, self.store.state())
    }

    /// Whether drag handles should be active right now
    pub fn drag_handles_enabled(&self) -> bool {
        self.reorder_availability().is_allowed()
            && self.load_state == LoadState::Loaded
            && !self.reorder.is_persisting()
    }

    pub fn reorder_phase(&self) -> &ReorderPhase {
        self.reorder.phase()
    }

    pub fn begin_drag(&mut self, from: usize) -> Result<(), TableError> {
        let availability = self.reorder_availability();
        self.reorder.begin_drag(from, &availability)
    }

    pub fn cancel_drag(&mut self) {
        self.reorder.cancel_drag();
    }

    /// Drop the dragged row. Returns the batch that now needs persisting.
    pub fn drop_on(&mut self, to: usize) -> Result<Option<Vec<ReorderItem>>, TableError> {
        self.reorder.drop_on(to)
    }

    /// Apply the result of persisting the batch from `drop_on`
    pub fn finish_reorder(&mut self, outcome: Result<(), TableError>) -> Result<(), TableError> {
        match self.reorder.complete(outcome) {
            Ok(()) => {
                self.invalidate();
                Ok(())
            }
            Err(e) => {
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Persist the batch currently in flight through the reorder endpoint
    pub async fn persist_reorder(&mut self) -> Result<(), TableError> {
        let ReorderPhase::Persisting { batch } = self.reorder.phase().clone() else {
            return Err(TableError::InvalidRequest("no reorder batch to persist".to_string()));
        };
        let result = self
            .fetcher
            .api()
            .persist_reorder(&self.config.api_endpoint, &self.config.reorder_key(), &batch)
            .await;
        self.finish_reorder(result)
    }

    /// Drag `from` onto `to` and persist in one step
    pub async fn move_row(&mut self, from: usize, to: usize) -> Result<(), TableError> {
        self.begin_drag(from)?;
        match self.drop_on(to)? {
            Some(_) => self.persist_reorder().await,
            None => Ok(()),
        }
    }

    // ---- row actions ----

    pub fn available_actions(&self) -> Vec<RowAction> {
        self.actions.available_actions()
    }

    pub fn dispatch(&mut self, action: RowAction, row_id: i64) -> Result<DispatchOutcome, TableError> {
        let row = self
            .rows()
            .iter()
            .find(|row| row.id() == row_id)
            .cloned()
            .ok_or_else(|| TableError::InvalidRequest(format!("row {} is not on this page", row_id)))?;
        Ok(self.actions.dispatch(action, &row))
    }

    pub fn delete_confirmation(&self) -> Option<&DeleteConfirmation<R>> {
        self.actions.confirmation()
    }

    pub fn cancel_delete(&mut self) {
        self.actions.cancel_delete();
    }

    /// Run the delete behind the open confirmation. Uses the screen's delete
    /// handler when it registered one, `DELETE {endpoint}/{id}` otherwise.
    pub async fn confirm_delete(&mut self) -> DeleteOutcome {
        let handler = self.config.actions.on_delete.clone();
        let api = self.fetcher.api().clone();
        let endpoint = self.config.api_endpoint.clone();

        let outcome = self
            .actions
            .confirm_delete(move |row| async move {
                match handler {
                    Some(delete) => delete(row).await,
                    None => api.delete_row(&endpoint, row.id()).await,
                }
            })
            .await;

        match &outcome {
            DeleteOutcome::Deleted { .. } => self.invalidate(),
            DeleteOutcome::Failed(e) => self.last_error = Some(e.clone()),
        }
        outcome
    }

    // ---- inline edits ----

    /// Claim a row for an inline edit; refused while one is pending for it
    pub fn begin_update(&mut self, id: i64) -> Result<(), TableError> {
        if !self.pending_updates.insert(id) {
            return Err(TableError::MutationPending);
        }
        Ok(())
    }

    pub fn finish_update(&mut self, id: i64, result: Result<serde_json::Value, TableError>) -> Result<R, TableError> {
        self.pending_updates.remove(&id);
        let updated = result.and_then(|value| {
            serde_json::from_value::<R>(value)
                .map_err(|e| TableError::MalformedEnvelope(format!("updated row {}: {}", id, e)))
        });
        match updated {
            Ok(row) => {
                self.invalidate();
                Ok(row)
            }
            Err(e) => {
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    pub fn is_update_pending(&self, id: i64) -> bool {
        self.pending_updates.contains(&id)
    }

    /// `PUT {endpoint}/{id}` with `body`, then invalidate
    pub async fn update_row(&mut self, id: i64, body: serde_json::Value) -> Result<R, TableError> {
        self.begin_update(id)?;
        let result = self.fetcher.api().update_row(&self.config.api_endpoint, id, body).await;
        self.finish_update(id, result)
    }
}

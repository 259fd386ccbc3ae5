//! # Table State
//!
//! Holds the search, filter, date range, sort and page position of one table
//! instance. All operations are synchronous state transitions; the fetcher
//! notices a change through the query key, never through a direct call.
//!
//! ## Rules
//!
//! - Changing the search text, a filter, the date range, the sort or the page
//!   size sends the table back to page 1.
//! - Sorting by the same column cycles `asc → desc → none`.
//! - `reset` restores the construction-time defaults in one step.
//! - Filters are stored canonically: `FilterValue::Any` removes the entry.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::io::mappers::{self, DATE_FORMAT};

pub const DEFAULT_PER_PAGE: u32 = 10;

/// Value of a single column filter.
///
/// Replaces the `"all"`/`"default"`/`"null"`/`"not_null"` strings the admin
/// screens used to pass around.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FilterValue {
    /// No filtering on this key
    Any,
    Specific(String),
    /// Only rows where the column is empty (`key=null` on the wire)
    IsNull,
    /// Only rows where the column is set (`key=not_null` on the wire)
    IsNotNull,
}

impl FilterValue {
    /// Interpret a raw value coming from a select box or the URL
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim() {
            "" | "all" | "default" => FilterValue::Any,
            "null" => FilterValue::IsNull,
            "not_null" => FilterValue::IsNotNull,
            other => FilterValue::Specific(other.to_string()),
        }
    }

    /// Value sent to the backend, `None` when the filter must be omitted
    pub fn wire_value(&self) -> Option<&str> {
        match self {
            FilterValue::Any => None,
            FilterValue::Specific(value) if value.trim().is_empty() => None,
            FilterValue::Specific(value) => Some(value.as_str()),
            FilterValue::IsNull => Some("null"),
            FilterValue::IsNotNull => Some("not_null"),
        }
    }

    pub fn is_any(&self) -> bool {
        self.wire_value().is_none()
    }
}

impl From<&str> for FilterValue {
    fn from(raw: &str) -> Self {
        FilterValue::from_raw(raw)
    }
}

impl From<String> for FilterValue {
    fn from(raw: String) -> Self {
        FilterValue::from_raw(&raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        match (from, to) {
            (Some(start), Some(end)) if start > end => Self { from: Some(end), to: Some(start) },
            _ => Self { from, to },
        }
    }

    /// Both ends set; only then is the range sent to the backend
    pub fn is_complete(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }
}

/// Everything that determines which rows the table asks for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableState {
    pub page: u32,
    pub per_page: u32,
    pub search: String,
    pub filters: BTreeMap<String, FilterValue>,
    pub date_range: DateRange,
    pub sort: Option<SortSpec>,
}

impl Default for TableState {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            search: String::new(),
            filters: BTreeMap::new(),
            date_range: DateRange::default(),
            sort: None,
        }
    }
}

impl TableState {
    pub fn with_per_page(per_page: u32) -> Self {
        Self {
            per_page: per_page.max(1),
            ..Self::default()
        }
    }

    /// Whether any search, filter, date range or sort narrows or reorders the rows
    pub fn has_active_query(&self) -> bool {
        !self.search.trim().is_empty()
            || self.filters.values().any(|value| !value.is_any())
            || self.date_range.is_active()
            || self.sort.is_some()
    }

    /// Mirror the state into a URL query string (same names the backend uses)
    pub fn to_url_query(&self) -> String {
        let Ok(mut url) = Url::parse("http://table.local/") else {
            return String::new();
        };
        url.query_pairs_mut().extend_pairs(mappers::query_params(self));
        url.query().unwrap_or_default().to_string()
    }

    /// Rebuild a state from a URL query string. Unknown parameters become
    /// filters; missing ones keep the given defaults.
    pub fn from_url_query(query: &str, defaults: &TableState) -> TableState {
        let mut state = defaults.clone();
        let query = query.trim_start_matches('?');
        let Ok(url) = Url::parse(&format!("http://table.local/?{query}")) else {
            return state;
        };

        let mut date_from = defaults.date_range.from;
        let mut date_to = defaults.date_range.to;
        let mut sort_by: Option<String> = None;
        let mut sort_dir: Option<SortDirection> = None;

        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                "page" => {
                    if let Ok(page) = value.parse::<u32>() {
                        state.page = page.max(1);
                    }
                }
                "per_page" => {
                    if let Ok(per_page) = value.parse::<u32>() {
                        state.per_page = per_page.max(1);
                    }
                }
                "search" => state.search = value.into_owned(),
                "date_from" => date_from = NaiveDate::parse_from_str(&value, DATE_FORMAT).ok(),
                "date_to" => date_to = NaiveDate::parse_from_str(&value, DATE_FORMAT).ok(),
                "sort_by" => sort_by = Some(value.into_owned()),
                "sort_dir" => sort_dir = SortDirection::parse(&value),
                key => {
                    let filter = FilterValue::from_raw(&value);
                    if filter.is_any() {
                        state.filters.remove(key);
                    } else {
                        state.filters.insert(key.to_string(), filter);
                    }
                }
            }
        }

        state.date_range = DateRange::new(date_from, date_to);
        if let Some(key) = sort_by.filter(|key| !key.is_empty()) {
            state.sort = Some(SortSpec {
                key,
                direction: sort_dir.unwrap_or(SortDirection::Asc),
            });
        }
        state
    }
}

/// Owns the current `TableState` and the defaults it resets to
#[derive(Debug, Clone)]
pub struct TableStateStore {
    state: TableState,
    defaults: TableState,
}

impl TableStateStore {
    pub fn new(defaults: TableState) -> Self {
        Self {
            state: defaults.clone(),
            defaults,
        }
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn defaults(&self) -> &TableState {
        &self.defaults
    }

    /// Move to page `n`; pages below 1 become 1. Upper clamping needs the
    /// last page and happens in `clamp_to_last_page`.
    pub fn set_page(&mut self, page: u32) -> bool {
        let page = page.max(1);
        self.update(|state| state.page = page)
    }

    pub fn set_per_page(&mut self, per_page: u32) -> bool {
        let per_page = per_page.max(1);
        if self.state.per_page == per_page {
            return false;
        }
        self.update(|state| {
            state.per_page = per_page;
            state.page = 1;
        })
    }

    pub fn set_search(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if self.state.search == text {
            return false;
        }
        self.update(|state| {
            state.search = text;
            state.page = 1;
        })
    }

    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> bool {
        let key = key.into();
        let value = value.into();
        let current = self.state.filters.get(&key);
        let unchanged = match current {
            None => value.is_any(),
            Some(existing) => *existing == value,
        };
        if unchanged {
            return false;
        }
        self.update(|state| {
            if value.is_any() {
                state.filters.remove(&key);
            } else {
                state.filters.insert(key, value);
            }
            state.page = 1;
        })
    }

    pub fn set_date_range(&mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
        let range = DateRange::new(from, to);
        if self.state.date_range == range {
            return false;
        }
        self.update(|state| {
            state.date_range = range;
            state.page = 1;
        })
    }

    /// Same column: `asc → desc → none`. Other column: start at `asc`.
    pub fn set_sort(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();
        let next = match &self.state.sort {
            Some(current) if current.key == key => match current.direction {
                SortDirection::Asc => Some(SortSpec {
                    key,
                    direction: SortDirection::Desc,
                }),
                SortDirection::Desc => None,
            },
            _ => Some(SortSpec {
                key,
                direction: SortDirection::Asc,
            }),
        };
        self.update(|state| {
            state.sort = next;
            state.page = 1;
        })
    }

    pub fn reset(&mut self) -> bool {
        let defaults = self.defaults.clone();
        self.update(|state| *state = defaults)
    }

    /// Pull the page back inside `[1, last_page]` after a result set changed
    /// the page count
    pub fn clamp_to_last_page(&mut self, last_page: u32) -> bool {
        let last_page = last_page.max(1);
        let page = self.state.page.clamp(1, last_page);
        self.update(|state| state.page = page)
    }

    /// Replace the whole state at once (used for URL restores)
    pub fn replace(&mut self, state: TableState) -> bool {
        self.update(|current| *current = state)
    }

    fn update(&mut self, apply: impl FnOnce(&mut TableState)) -> bool {
        let mut next = self.state.clone();
        apply(&mut next);
        if next == self.state {
            return false;
        }
        self.state = next;
        true
    }
}

impl Default for TableStateStore {
    fn default() -> Self {
        Self::new(TableState::default())
    }
}

//! # Client Configuration
//!
//! Connection and presentation defaults shared by every table of the admin
//! dashboard.
//!
//! ## YAML Format
//!
//! ```yaml
//! base_url: "https://api.example.com/api"
//! timeout_secs: 15
//! default_per_page: 10
//! max_visible_pages: 5
//! skeleton_rows: 5
//! cache_stale_secs: 30
//! cache_max_entries: 100
//! ```
//!
//! Every field is optional. `ADMIN_TABLE_BASE_URL`, `ADMIN_TABLE_TIMEOUT_SECS`
//! and `ADMIN_TABLE_PER_PAGE` override the file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::DEFAULT_MAX_ENTRIES;
use crate::domain::pagination::DEFAULT_MAX_VISIBLE_PAGES;
use crate::domain::table_config::DEFAULT_SKELETON_ROWS;
use crate::domain::table_state::DEFAULT_PER_PAGE;

pub const ENV_BASE_URL: &str = "ADMIN_TABLE_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "ADMIN_TABLE_TIMEOUT_SECS";
pub const ENV_PER_PAGE: &str = "ADMIN_TABLE_PER_PAGE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub default_per_page: u32,
    pub max_visible_pages: u32,
    pub skeleton_rows: usize,
    pub cache_stale_secs: u64,
    pub cache_max_entries: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_secs: 15,
            default_per_page: DEFAULT_PER_PAGE,
            max_visible_pages: DEFAULT_MAX_VISIBLE_PAGES,
            skeleton_rows: DEFAULT_SKELETON_ROWS,
            cache_stale_secs: 30,
            cache_max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl ClientConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: ClientConfig = serde_yaml::from_str(yaml).context("Invalid table client config")?;
        Ok(config.sanitized())
    }

    /// Load from a YAML file, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// Load from a YAML file, taking overrides from `lookup`
    pub fn load_with<F>(path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml_str(&content)?;
        info!("Loaded table client config from {}", path.display());
        Ok(config.with_env_overrides(lookup))
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from a variable lookup; unparsable values are ignored
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|value| !value.trim().is_empty()) {
            self.base_url = base_url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse() {
                Ok(timeout) => self.timeout_secs = timeout,
                Err(_) => warn!("Ignoring {}={:?}: not a number", ENV_TIMEOUT_SECS, raw),
            }
        }
        if let Some(raw) = lookup(ENV_PER_PAGE) {
            match raw.trim().parse() {
                Ok(per_page) => self.default_per_page = per_page,
                Err(_) => warn!("Ignoring {}={:?}: not a number", ENV_PER_PAGE, raw),
            }
        }
        self.sanitized()
    }

    pub fn cache_stale_after(&self) -> Duration {
        Duration::from_secs(self.cache_stale_secs)
    }

    fn sanitized(mut self) -> Self {
        self.default_per_page = self.default_per_page.max(1);
        self.max_visible_pages = self.max_visible_pages.max(1);
        self.timeout_secs = self.timeout_secs.max(1);
        self.cache_max_entries = self.cache_max_entries.max(1);
        self
    }
}

//! # admin-table
//!
//! Fetch one page of an admin endpoint through the table core and print it
//! the way the dashboard would show it. Handy for checking a backend's list
//! envelope, filters and sorting without a browser.
//!
//! ```text
//! admin-table --endpoint /admin/users --column name:Name --column email:Email \
//!     --filter role=admin --search ann --sort name
//! ```

use std::path::PathBuf;

use admin_table_core::{
    init_logging, ApiClient, ClientConfig, ColumnSpec, JsonRow, LoadState, QueryCache, TableConfig,
    TableController, TableState,
};
use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, Level};

#[derive(Debug, Parser)]
#[command(name = "admin-table", version, about = "Print one page of an admin list endpoint")]
struct Args {
    /// YAML client config; environment variables still override it
    #[arg(long, env = "ADMIN_TABLE_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides base_url from the config
    #[arg(long)]
    base_url: Option<String>,

    /// List endpoint relative to the base URL, e.g. /admin/users
    #[arg(long)]
    endpoint: String,

    /// Column as key[:Label]; repeatable. Defaults to id only.
    #[arg(long = "column", value_name = "KEY[:LABEL]")]
    columns: Vec<String>,

    #[arg(long, default_value_t = 1)]
    page: u32,

    #[arg(long)]
    per_page: Option<u32>,

    #[arg(long)]
    search: Option<String>,

    /// Filter as key=value; `all`, `null` and `not_null` are understood
    #[arg(long = "filter", value_name = "KEY=VALUE")]
    filters: Vec<String>,

    /// Sort column; repeat the flag to toggle to descending
    #[arg(long)]
    sort: Vec<String>,

    /// Restore state from a dashboard URL query string instead of the flags above
    #[arg(long, conflicts_with_all = ["page", "search", "filters", "sort"])]
    url_query: Option<String>,

    #[arg(long, env = "ADMIN_TABLE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long)]
    locale: Option<String>,

    /// Print the raw rows as JSON instead of a table
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(if args.verbose { Level::DEBUG } else { Level::WARN });

    let mut client_config = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::from_env(),
    };
    if let Some(base_url) = &args.base_url {
        client_config.base_url = base_url.clone();
    }

    let mut api = ApiClient::from_config(&client_config).context("Failed to create HTTP client")?;
    if let Some(token) = args.token.clone() {
        api = api.with_auth_token(move || Some(token.clone()));
    }
    if let Some(locale) = args.locale.clone() {
        api = api.with_locale(move || Some(locale.clone()));
    }

    let columns = parse_columns(&args.columns);
    let per_page = args.per_page.unwrap_or(client_config.default_per_page);
    let mut table_config = TableConfig::<JsonRow>::new(&args.endpoint, columns)
        .with_initial_state(TableState::with_per_page(per_page));
    table_config.max_visible_pages = client_config.max_visible_pages;
    table_config.skeleton_rows = client_config.skeleton_rows;

    let cache = QueryCache::new(client_config.cache_stale_after())
        .with_max_entries(client_config.cache_max_entries);
    let mut table = TableController::new(table_config, api, cache);

    match &args.url_query {
        Some(query) => {
            table.restore_from_url(query);
        }
        None => apply_flags(&mut table, &args)?,
    }

    info!("Fetching {}", table.query_key());
    table.load().await;

    if let LoadState::Failed(error) = table.load_state() {
        bail!("{}", error.user_message());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(table.rows())?);
    } else {
        print!("{}", table.view().to_text());
        let query = table.state().to_url_query();
        if !query.is_empty() {
            println!("URL query: ?{}", query);
        }
    }

    table.unmount();
    Ok(())
}

fn apply_flags(table: &mut TableController<JsonRow>, args: &Args) -> Result<()> {
    for raw in &args.filters {
        let Some((key, value)) = raw.split_once('=') else {
            bail!("Filter {:?} is not in key=value form", raw);
        };
        table.set_filter(key.trim(), value.trim());
    }
    if let Some(search) = &args.search {
        table.set_search(search.as_str());
    }
    for key in &args.sort {
        table.set_sort(key.as_str());
    }
    // Page last; every other setter goes back to page 1
    table.set_page(args.page);
    Ok(())
}

fn parse_columns(raw: &[String]) -> Vec<ColumnSpec<JsonRow>> {
    if raw.is_empty() {
        return vec![ColumnSpec::new("id", "ID")];
    }
    raw.iter()
        .map(|spec| match spec.split_once(':') {
            Some((key, label)) => ColumnSpec::new(key, label).sortable(),
            None => ColumnSpec::new(spec.as_str(), spec.as_str()).sortable(),
        })
        .collect()
}

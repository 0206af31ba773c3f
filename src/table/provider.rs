//! Process-wide redirect table cache.
//!
//! # Lifecycle
//! ```text
//! empty ──load() ok──▶ populated (never invalidated)
//!   │
//!   └──load() err──▶ empty (next load retries)
//! ```
//!
//! # Design Decisions
//! - Reads are lock-free once populated (`ArcSwapOption`)
//! - Concurrent cold loads may each fetch; compare-and-swap lets exactly one
//!   result become the cached table and every caller gets that one
//! - The cache is written in a single swap after a full parse, so a dropped
//!   or timed-out load never leaves partial state behind

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;

use crate::config::TableLocation;
use crate::observability::metrics;
use crate::table::source::{source_for, TableSource};
use crate::table::types::{Category, RedirectTable, TableError, TableResult};

/// Supplies the redirect table, fetching it at most once per success.
#[derive(Debug)]
pub struct TableProvider {
    source: Arc<dyn TableSource>,
    cached: ArcSwapOption<RedirectTable>,
    fetch_timeout: Duration,
}

impl TableProvider {
    /// Create an empty provider over the given source.
    pub fn new(source: Arc<dyn TableSource>, fetch_timeout: Duration) -> Self {
        Self {
            source,
            cached: ArcSwapOption::empty(),
            fetch_timeout,
        }
    }

    /// Create a provider for a configured location.
    pub fn from_location(location: &TableLocation, fetch_timeout: Duration) -> TableResult<Self> {
        Ok(Self::new(source_for(location)?, fetch_timeout))
    }

    /// The cached table, if a load has already succeeded.
    pub fn cached(&self) -> Option<Arc<RedirectTable>> {
        self.cached.load_full()
    }

    /// Return the table, fetching it on first use.
    pub async fn load(&self) -> TableResult<Arc<RedirectTable>> {
        self.cached_or_fetch().await
    }

    pub async fn cached_or_fetch(&self) -> TableResult<Arc<RedirectTable>> {
        if let Some(table) = self.cached() {
            tracing::trace!("Redirect table already loaded");
            return Ok(table);
        }

        let table = Arc::new(self.fetch().await?);
        let previous = self
            .cached
            .compare_and_swap(&None::<Arc<RedirectTable>>, Some(Arc::clone(&table)));

        match &*previous {
            Some(winner) => {
                tracing::debug!("Concurrent load populated the table first, using cached copy");
                Ok(Arc::clone(winner))
            }
            None => {
                tracing::info!(
                    source = %self.source.describe(),
                    posts = table.len(Category::Posts),
                    cats = table.len(Category::Cats),
                    authors = table.len(Category::Authors),
                    "Redirect table loaded"
                );
                Ok(table)
            }
        }
    }

    /// One bounded fetch-and-parse attempt. Never touches the cache.
    async fn fetch(&self) -> TableResult<RedirectTable> {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.fetch_timeout, self.source.fetch()).await {
            Ok(Ok(bytes)) => RedirectTable::from_slice(&bytes),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(TableError::Timeout(self.fetch_timeout.as_millis() as u64)),
        };

        match &result {
            Ok(_) => metrics::record_table_load("ok", start),
            Err(e) => {
                tracing::error!(
                    source = %self.source.describe(),
                    error = %e,
                    "Failed to load redirect table"
                );
                let label = match e {
                    TableError::Malformed(_) => "malformed",
                    TableError::Timeout(_) => "timeout",
                    _ => "unavailable",
                };
                metrics::record_table_load(label, start);
            }
        }
        result
    }
}

//! The resolution engine.
//!
//! # Responsibilities
//! - Run eligibility, parsing, classification, resolution and synthesis in order
//! - Load the redirect table only for identifier lookups
//! - Collapse every internal failure into `NotFound`
//!
//! # State Machine
//! ```text
//! Eligibility ──no──▶ PassThrough
//!     │yes
//!     ▼
//! Parsed → Classified ─┬─ structural ──▶ Redirect
//!                      ├─ lookup ──▶ table hit ──▶ Redirect
//!                      │            table miss ──▶ NotFound
//!                      ├─ invalid ──▶ NotFound
//!                      └─ not applicable ──▶ PassThrough
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::RedirectSettings;
use crate::observability::metrics;
use crate::redirect::eligibility::is_eligible;
use crate::redirect::intent::{classify, InvalidReason, QueryIntent};
use crate::redirect::query::QueryParams;
use crate::redirect::response::{Action, ResolutionOutcome};
use crate::table::{Category, TableError, TableProvider};

/// Internal reasons a legacy request could not be redirected.
///
/// None of these reach the client; all of them become `NotFound`.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A required setting is absent or empty.
    #[error("missing required setting `{0}`")]
    ConfigMissing(&'static str),

    /// The table could not be fetched (or the fetch timed out).
    #[error("redirect table provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The fetched table does not have the expected shape.
    #[error("malformed redirect table: {0}")]
    MalformedTable(String),

    /// A recognized key carried an unusable value.
    #[error("invalid query value: {0}")]
    InvalidQueryValue(#[from] InvalidReason),

    /// Well-formed identifier with no usable entry.
    #[error("no redirect for {category} id {id}")]
    LookupMiss { category: Category, id: String },
}

impl ResolveError {
    /// Label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::ConfigMissing(_) => "config_missing",
            ResolveError::ProviderUnavailable(_) => "provider_unavailable",
            ResolveError::MalformedTable(_) => "malformed_table",
            ResolveError::InvalidQueryValue(_) => "invalid_query_value",
            ResolveError::LookupMiss { .. } => "lookup_miss",
        }
    }
}

impl From<TableError> for ResolveError {
    fn from(err: TableError) -> Self {
        match err {
            TableError::Malformed(msg) => ResolveError::MalformedTable(msg),
            other => ResolveError::ProviderUnavailable(other.to_string()),
        }
    }
}

/// Resolves legacy query URLs against the redirect table.
#[derive(Debug, Clone)]
pub struct Resolver {
    settings: Arc<RedirectSettings>,
    provider: Arc<TableProvider>,
    load_deadline: Option<Duration>,
}

impl Resolver {
    pub fn new(settings: RedirectSettings, provider: Arc<TableProvider>) -> Self {
        Self {
            settings: Arc::new(settings),
            provider,
            load_deadline: None,
        }
    }

    /// Bound the wait for a table load, independent of the provider's own
    /// fetch timeout. An elapsed deadline is `ProviderUnavailable`.
    pub fn with_load_deadline(mut self, deadline: Duration) -> Self {
        self.load_deadline = Some(deadline);
        self
    }

    /// Decide what the host should do with `path?raw_query`.
    pub async fn resolve(&self, path: &str, raw_query: &str) -> Action {
        let start = Instant::now();
        let outcome = self.outcome(path, raw_query).await;
        metrics::record_outcome(outcome.label(), start);
        outcome.into_action(&self.settings.default_domain)
    }

    /// Resolve to an outcome without rendering the `Location`.
    pub async fn outcome(&self, path: &str, raw_query: &str) -> ResolutionOutcome {
        if !is_eligible(path, raw_query, self.settings.profile) {
            tracing::trace!(path = %path, query = %raw_query, "Not a legacy redirect candidate");
            return ResolutionOutcome::PassThrough;
        }

        match self.try_resolve(raw_query).await {
            Ok(outcome) => {
                if let ResolutionOutcome::Redirect { target } = &outcome {
                    tracing::debug!(query = %raw_query, target = %target, "Legacy URL resolved");
                }
                outcome
            }
            Err(err) => {
                tracing::info!(
                    query = %raw_query,
                    reason = err.kind(),
                    error = %err,
                    "Legacy URL not resolved"
                );
                metrics::record_failure(err.kind());
                ResolutionOutcome::NotFound
            }
        }
    }

    async fn try_resolve(&self, raw_query: &str) -> Result<ResolutionOutcome, ResolveError> {
        if let Some(field) = self.settings.missing_field() {
            return Err(ResolveError::ConfigMissing(field));
        }

        let params = QueryParams::parse(raw_query);
        let intent = classify(&params, self.settings.profile.rules());

        if let Some(target) = intent.structural_target() {
            return Ok(ResolutionOutcome::Redirect { target });
        }

        match intent {
            QueryIntent::Lookup { category, id } => self.lookup(category, id.as_str()).await,
            QueryIntent::Invalid(reason) => Err(reason.into()),
            _ => Ok(ResolutionOutcome::PassThrough),
        }
    }

    async fn lookup(
        &self,
        category: Category,
        id: &str,
    ) -> Result<ResolutionOutcome, ResolveError> {
        let table = match self.load_deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.provider.load())
                .await
                .map_err(|_| {
                    ResolveError::ProviderUnavailable(format!(
                        "table load exceeded the {} ms request deadline",
                        deadline.as_millis()
                    ))
                })??,
            None => self.provider.load().await?,
        };
        match table.target(category, id) {
            Some(target) => Ok(ResolutionOutcome::Redirect {
                target: target.to_string(),
            }),
            None => Err(ResolveError::LookupMiss {
                category,
                id: id.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableLocation;
    use crate::redirect::Profile;
    use crate::table::{TableResult, TableSource};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DOMAIN: &str = "https://blog.example.com";
    const TABLE: &str = r#"{
        "posts": {
            "42": {"redir": "2016/11/18/old-post/"},
            "1": {"redir": "/"},
            "5": {"redir": ""}
        },
        "cats": {"3": {"redir": "category/news/"}},
        "authors": {"9": {"redir": "author/jane/"}}
    }"#;

    #[derive(Debug)]
    struct StaticSource {
        body: Option<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TableSource for StaticSource {
        async fn fetch(&self) -> TableResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.body {
                Some(body) => Ok(body.as_bytes().to_vec()),
                None => Err(TableError::Unavailable("no such key".to_string())),
            }
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    fn settings(profile: Profile) -> RedirectSettings {
        RedirectSettings {
            default_domain: DOMAIN.to_string(),
            profile,
            fetch_timeout_ms: 1000,
            table: TableLocation::File {
                path: "redirects.json".to_string(),
            },
        }
    }

    fn resolver_with(
        settings: RedirectSettings,
        body: Option<&'static str>,
    ) -> (Resolver, Arc<StaticSource>) {
        let source = Arc::new(StaticSource {
            body,
            calls: AtomicUsize::new(0),
        });
        let provider = Arc::new(TableProvider::new(source.clone(), Duration::from_secs(1)));
        (Resolver::new(settings, provider), source)
    }

    fn resolver() -> (Resolver, Arc<StaticSource>) {
        resolver_with(settings(Profile::Full), Some(TABLE))
    }

    fn redirect(location: &str) -> Action {
        Action::Redirect {
            location: location.to_string(),
        }
    }

    #[tokio::test]
    async fn test_paged_redirects_without_table() {
        let (resolver, source) = resolver();

        assert_eq!(
            resolver.resolve("/", "paged=0").await,
            redirect("https://blog.example.com/page/1/")
        );
        assert_eq!(
            resolver.resolve("/", "paged=5").await,
            redirect("https://blog.example.com/page/5/")
        );
        assert_eq!(resolver.resolve("/", "paged=-1&cat=3").await, Action::NotFound);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_date_archive_redirects() {
        let (resolver, source) = resolver();

        assert_eq!(
            resolver.resolve("/", "m=201603").await,
            redirect("https://blog.example.com/date/2016/03/")
        );
        assert_eq!(resolver.resolve("/", "m=16").await, Action::NotFound);
        assert_eq!(resolver.resolve("/", "m=abcdef&p=42").await, Action::NotFound);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_post_lookup_hit_and_miss() {
        let (resolver, source) = resolver();

        assert_eq!(
            resolver.resolve("/", "p=42").await,
            redirect("https://blog.example.com/2016/11/18/old-post/")
        );
        assert_eq!(resolver.resolve("/", "p=999").await, Action::NotFound);
        assert_eq!(resolver.resolve("/", "p=5").await, Action::NotFound);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_root_target_has_single_slash() {
        let (resolver, _) = resolver();
        assert_eq!(resolver.resolve("/", "p=1").await, redirect("https://blog.example.com/"));
    }

    #[tokio::test]
    async fn test_category_beats_post() {
        let (resolver, _) = resolver();
        assert_eq!(
            resolver.resolve("/", "cat=3&p=42").await,
            redirect("https://blog.example.com/category/news/")
        );
        assert_eq!(
            resolver.resolve("/", "p=42&author=9").await,
            redirect("https://blog.example.com/author/jane/")
        );
    }

    #[tokio::test]
    async fn test_paged_beats_category_and_skips_load() {
        let (resolver, source) = resolver();
        assert_eq!(
            resolver.resolve("/", "paged=2&cat=3").await,
            redirect("https://blog.example.com/page/2/")
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_category_does_not_fall_through() {
        let (resolver, source) = resolver();
        assert_eq!(resolver.resolve("/", "cat=0&p=42").await, Action::NotFound);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ineligible_requests_pass_through() {
        let (resolver, source) = resolver();

        assert_eq!(resolver.resolve("/other", "p=42").await, Action::Forward);
        assert_eq!(resolver.resolve("/", "s=search").await, Action::Forward);
        assert_eq!(resolver.resolve("/", "").await, Action::Forward);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_is_not_found_and_retried() {
        let (resolver, source) = resolver_with(settings(Profile::Full), None);

        assert_eq!(resolver.resolve("/", "p=42").await, Action::NotFound);
        assert_eq!(resolver.resolve("/", "p=42").await, Action::NotFound);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[derive(Debug)]
    struct StalledSource;

    #[async_trait]
    impl TableSource for StalledSource {
        async fn fetch(&self) -> TableResult<Vec<u8>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(TABLE.as_bytes().to_vec())
        }

        fn describe(&self) -> String {
            "stalled".to_string()
        }
    }

    #[tokio::test]
    async fn test_load_deadline_is_not_found_and_leaves_cache_empty() {
        let provider =
            Arc::new(TableProvider::new(Arc::new(StalledSource), Duration::from_secs(3)));
        let resolver = Resolver::new(settings(Profile::Full), provider.clone())
            .with_load_deadline(Duration::from_millis(50));

        assert_eq!(resolver.resolve("/", "p=42").await, Action::NotFound);
        assert!(provider.cached().is_none());
        assert_eq!(
            resolver.resolve("/", "paged=2").await,
            redirect("https://blog.example.com/page/2/")
        );
    }

    #[tokio::test]
    async fn test_missing_config_is_not_found_without_load() {
        let mut incomplete = settings(Profile::Full);
        incomplete.default_domain = String::new();
        let (resolver, source) = resolver_with(incomplete, Some(TABLE));

        assert_eq!(resolver.outcome("/", "p=42").await, ResolutionOutcome::NotFound);
        assert_eq!(resolver.outcome("/", "paged=2").await, ResolutionOutcome::NotFound);
        assert_eq!(resolver.outcome("/other", "p=42").await, ResolutionOutcome::PassThrough);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_error_mapping() {
        let err: ResolveError = TableError::Malformed("eof".to_string()).into();
        assert_eq!(err.kind(), "malformed_table");

        let err: ResolveError = TableError::Timeout(50).into();
        assert_eq!(err.kind(), "provider_unavailable");
        assert!(err.to_string().contains("50 ms"));
    }
}

//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the edge handler
//! - Wire up middleware (request ID, tracing, timeout, in-flight limit)
//! - Build the resolver and origin client from configuration
//! - Serve until the shutdown signal, then drain

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware,
    response::Response,
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RedirectConfig;
use crate::http::limit::{in_flight_limit_middleware, InFlightLimit};
use crate::http::origin::OriginClient;
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::http::response::{not_found_response, redirect_response};
use crate::redirect::{Action, Resolver};
use crate::table::{TableError, TableProvider};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub origin: OriginClient,
}

/// Errors building the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("invalid origin address {0}")]
    Origin(String),
}

/// Headroom left between a table load and the request deadline, so the
/// handler answers `404` before the timeout layer answers `408`.
const DEADLINE_HEADROOM: Duration = Duration::from_millis(250);

/// HTTP server for the redirect edge.
pub struct HttpServer {
    router: Router,
    config: RedirectConfig,
}

impl HttpServer {
    /// Create a server whose table provider follows `config.redirect.table`.
    pub fn new(config: RedirectConfig) -> Result<Self, ServerError> {
        let fetch_timeout = Duration::from_millis(config.redirect.fetch_timeout_ms);
        let provider = TableProvider::from_location(&config.redirect.table, fetch_timeout)?;
        Self::with_provider(config, Arc::new(provider))
    }

    /// Create a server around an existing table provider.
    pub fn with_provider(
        config: RedirectConfig,
        provider: Arc<TableProvider>,
    ) -> Result<Self, ServerError> {
        let request_deadline = Duration::from_secs(config.timeouts.request_secs);
        let resolver = Arc::new(
            Resolver::new(config.redirect.clone(), provider)
                .with_load_deadline(request_deadline.saturating_sub(DEADLINE_HEADROOM)),
        );
        let origin_timeout = Duration::from_secs(config.timeouts.origin_secs);
        let origin =
            OriginClient::new(&config.origin, origin_timeout).map_err(ServerError::Origin)?;

        let state = AppState { resolver, origin };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RedirectConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(edge_handler))
            .route("/{*path}", any(edge_handler))
            .with_state(state)
            .layer(middleware::from_fn_with_state(
                InFlightLimit::new(config.listener.max_connections),
                in_flight_limit_middleware,
            ))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id(request.headers()),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            origin = %self.config.origin.address,
            profile = ?self.config.redirect.profile,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RedirectConfig {
        &self.config
    }

    /// The router, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Edge handler: every request passes through here.
async fn edge_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let path = request.uri().path().to_owned();
    let raw_query = request.uri().query().unwrap_or_default().to_owned();

    match state.resolver.resolve(&path, &raw_query).await {
        Action::Redirect { location } => redirect_response(&location),
        Action::NotFound => not_found_response(),
        Action::Forward => state.origin.forward(request).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableLocation;
    use crate::table::{TableResult, TableSource};
    use async_trait::async_trait;
    use axum::http::{header, StatusCode};
    use tower::ServiceExt;

    #[derive(Debug)]
    struct InlineSource;

    #[async_trait]
    impl TableSource for InlineSource {
        async fn fetch(&self) -> TableResult<Vec<u8>> {
            Ok(br#"{"posts": {"42": {"redir": "2016/11/18/old-post/"}}}"#.to_vec())
        }

        fn describe(&self) -> String {
            "inline".to_string()
        }
    }

    fn server() -> HttpServer {
        let mut config = RedirectConfig::default();
        config.redirect.default_domain = "https://blog.example.com".to_string();
        config.redirect.table = TableLocation::File {
            path: "unused.json".to_string(),
        };
        let provider = Arc::new(TableProvider::new(Arc::new(InlineSource), Duration::from_secs(1)));
        HttpServer::with_provider(config, provider).unwrap()
    }

    #[tokio::test]
    async fn test_redirect_through_router() {
        let router = server().router();
        let res = router
            .oneshot(Request::builder().uri("/?p=42").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            res.headers().get(header::LOCATION).unwrap(),
            "https://blog.example.com/2016/11/18/old-post/"
        );
        assert!(res.headers().get("x-request-id").is_some());
    }

    #[tokio::test]
    async fn test_not_found_through_router() {
        let router = server().router();
        let res = router
            .oneshot(Request::builder().uri("/?p=999").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_client_request_id_is_kept() {
        let router = server().router();
        let res = router
            .oneshot(
                Request::builder()
                    .uri("/?paged=3")
                    .header("x-request-id", "edge-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(res.headers().get("x-request-id").unwrap(), "edge-123");
    }

    #[derive(Debug)]
    struct StalledSource;

    #[async_trait]
    impl TableSource for StalledSource {
        async fn fetch(&self) -> TableResult<Vec<u8>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(b"{}".to_vec())
        }

        fn describe(&self) -> String {
            "stalled".to_string()
        }
    }

    #[tokio::test]
    async fn test_request_deadline_during_load_is_not_found() {
        let mut config = RedirectConfig::default();
        config.redirect.default_domain = "https://blog.example.com".to_string();
        config.redirect.table = TableLocation::File {
            path: "unused.json".to_string(),
        };
        config.redirect.fetch_timeout_ms = 3000;
        config.timeouts.request_secs = 1;
        let provider =
            Arc::new(TableProvider::new(Arc::new(StalledSource), Duration::from_secs(3)));
        let router = HttpServer::with_provider(config, provider).unwrap().router();

        let res = router
            .oneshot(Request::builder().uri("/?p=42").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_bad_origin_is_rejected() {
        let mut config = RedirectConfig::default();
        config.origin.address = "not an address".to_string();
        let provider = Arc::new(TableProvider::new(Arc::new(InlineSource), Duration::from_secs(1)));
        assert!(matches!(
            HttpServer::with_provider(config, provider),
            Err(ServerError::Origin(_))
        ));
    }
}

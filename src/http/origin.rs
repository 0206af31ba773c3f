//! Forwarding of pass-through requests to the origin.
//!
//! # Responsibilities
//! - Rewrite the request URI to target the configured origin
//! - Send method, path, query, headers and body through unchanged
//! - Map origin failures to 502, origin timeouts to 504
//!
//! # Design Decisions
//! - No retries: the edge forwards exactly once
//! - Bodies are streamed, never buffered

use std::str::FromStr;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        Request, StatusCode, Uri, Version,
    },
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::OriginConfig;
use crate::http::request::request_id;
use crate::observability::metrics;

/// HTTP client bound to one origin.
#[derive(Clone)]
pub struct OriginClient {
    client: Client<HttpConnector, Body>,
    authority: Authority,
    timeout: Duration,
}

impl OriginClient {
    /// Create a client for `config.address` (`host:port`).
    pub fn new(config: &OriginConfig, timeout: Duration) -> Result<Self, String> {
        let authority = Authority::from_str(config.address.trim())
            .map_err(|e| format!("'{}': {}", config.address, e))?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            client,
            authority,
            timeout,
        })
    }

    /// Send `request` to the origin and relay its response.
    pub async fn forward(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let request_id = request_id(request.headers()).to_string();
        let (mut parts, body) = request.into_parts();

        let uri = match self.origin_uri(&parts.uri) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(
                    request_id = %request_id,
                    uri = %parts.uri,
                    error = %e,
                    "Cannot build origin URI"
                );
                metrics::record_origin_request(502, start);
                return (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response();
            }
        };
        parts.uri = uri;
        parts.version = Version::HTTP_11;

        tracing::debug!(request_id = %request_id, uri = %parts.uri, "Forwarding to origin");

        let pending = self.client.request(Request::from_parts(parts, body));
        match tokio::time::timeout(self.timeout, pending).await {
            Ok(Ok(response)) => {
                metrics::record_origin_request(response.status().as_u16(), start);
                let (parts, body) = response.into_parts();
                Response::from_parts(parts, Body::new(body))
            }
            Ok(Err(e)) => {
                tracing::error!(request_id = %request_id, error = %e, "Origin request failed");
                metrics::record_origin_request(502, start);
                (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
            }
            Err(_) => {
                tracing::error!(
                    request_id = %request_id,
                    timeout_secs = self.timeout.as_secs(),
                    "Origin request timed out"
                );
                metrics::record_origin_request(504, start);
                (StatusCode::GATEWAY_TIMEOUT, "Gateway Timeout").into_response()
            }
        }
    }

    /// Same path and query, origin scheme and authority.
    fn origin_uri(&self, original: &Uri) -> Result<Uri, axum::http::uri::InvalidUriParts> {
        let mut uri_parts = original.clone().into_parts();
        uri_parts.scheme = Some(Scheme::HTTP);
        uri_parts.authority = Some(self.authority.clone());
        if uri_parts.path_and_query.is_none() {
            uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        Uri::from_parts(uri_parts)
    }
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::redirect::Profile;

/// Root configuration for the redirect edge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RedirectConfig {
    /// Listener configuration (bind address, concurrency).
    pub listener: ListenerConfig,

    /// Origin that non-legacy requests are forwarded to.
    pub origin: OriginConfig,

    /// Legacy URL resolution settings.
    pub redirect: RedirectSettings,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum requests in flight (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Origin server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Origin address (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Settings the resolution engine needs per request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedirectSettings {
    /// Prefixed to every redirect target (e.g., "https://blog.example.com").
    pub default_domain: String,

    /// Which legacy keys are recognized, and in what precedence.
    pub profile: Profile,

    /// Deadline for one table fetch, in milliseconds.
    pub fetch_timeout_ms: u64,

    /// Where the redirect table is stored.
    pub table: TableLocation,
}

impl Default for RedirectSettings {
    fn default() -> Self {
        Self {
            default_domain: String::new(),
            profile: Profile::default(),
            fetch_timeout_ms: 3000,
            table: TableLocation::default(),
        }
    }
}

impl RedirectSettings {
    /// Name of the first required value that is absent or empty.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.default_domain.trim().is_empty() {
            return Some("redirect.default_domain");
        }
        self.table.missing_field()
    }
}

/// Opaque locator of the serialized redirect table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableLocation {
    /// Object in a bucket, fetched path-style from `endpoint` with a plain
    /// unsigned GET. The object must be publicly readable; a private bucket
    /// answers 403 and every lookup ends in 404.
    Bucket {
        bucket: String,
        key: String,
        #[serde(default = "default_bucket_endpoint")]
        endpoint: String,
    },
    /// Any HTTP(S) URL.
    Url { url: String },
    /// Local file.
    File { path: String },
}

impl Default for TableLocation {
    fn default() -> Self {
        TableLocation::Bucket {
            bucket: String::new(),
            key: String::new(),
            endpoint: default_bucket_endpoint(),
        }
    }
}

impl TableLocation {
    /// Name of the first required locator part that is empty.
    pub fn missing_field(&self) -> Option<&'static str> {
        match self {
            TableLocation::Bucket { bucket, key, endpoint } => {
                if bucket.trim().is_empty() {
                    Some("redirect.table.bucket")
                } else if key.trim().is_empty() {
                    Some("redirect.table.key")
                } else if endpoint.trim().is_empty() {
                    Some("redirect.table.endpoint")
                } else {
                    None
                }
            }
            TableLocation::Url { url } if url.trim().is_empty() => Some("redirect.table.url"),
            TableLocation::File { path } if path.trim().is_empty() => Some("redirect.table.path"),
            _ => None,
        }
    }
}

fn default_bucket_endpoint() -> String {
    "https://s3.us-east-1.amazonaws.com".to_string()
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Time allowed for the origin to answer a forwarded request, in seconds.
    pub origin_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            origin_secs: 25,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

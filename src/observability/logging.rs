//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` wins over the configured level when set

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Filter used when neither `RUST_LOG` nor the config names a level.
const DEFAULT_DIRECTIVES: &str = "legacy_redirect=info,tower_http=info";

/// Install the global subscriber. Call once, before serving.
pub fn init(config: &ObservabilityConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback_filter(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn fallback_filter(level: &str) -> EnvFilter {
    let directives = format!("legacy_redirect={level},tower_http={level}");
    EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_filter_uses_level() {
        let filter = fallback_filter("debug");
        assert!(filter.to_string().contains("legacy_redirect=debug"));
    }

    #[test]
    fn test_bad_level_falls_back_to_default() {
        let filter = fallback_filter("not a level!");
        assert!(filter.to_string().contains("legacy_redirect=info"));
    }
}

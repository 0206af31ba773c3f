//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::{RedirectConfig, TableLocation};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `redirect.default_domain`.
pub const ENV_DEFAULT_DOMAIN: &str = "DEFAULTDOMAIN";
/// Environment variable overriding the table bucket.
pub const ENV_TABLE_BUCKET: &str = "SETTINGSS3BUCKET";
/// Environment variable overriding the table object key.
pub const ENV_TABLE_KEY: &str = "SETTINGSS3KEY";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load, apply environment overrides, and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RedirectConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content, |name| std::env::var(name).ok())
}

/// Parse configuration text, reading overrides through `env`.
pub fn parse_config<F>(content: &str, env: F) -> Result<RedirectConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: RedirectConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    apply_env_overrides(&mut config, env);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply the deployment environment overrides.
///
/// A bucket or key override switches a non-bucket location to a bucket one.
pub fn apply_env_overrides<F>(config: &mut RedirectConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    if let Some(domain) = non_empty(ENV_DEFAULT_DOMAIN) {
        tracing::debug!(var = ENV_DEFAULT_DOMAIN, "Applying environment override");
        config.redirect.default_domain = domain;
    }

    let bucket_override = non_empty(ENV_TABLE_BUCKET);
    let key_override = non_empty(ENV_TABLE_KEY);
    if bucket_override.is_none() && key_override.is_none() {
        return;
    }

    if !matches!(config.redirect.table, TableLocation::Bucket { .. }) {
        config.redirect.table = TableLocation::default();
    }
    if let TableLocation::Bucket { bucket, key, .. } = &mut config.redirect.table {
        if let Some(value) = bucket_override {
            *bucket = value;
        }
        if let Some(value) = key_override {
            *key = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const CONFIG: &str = r#"
        [redirect]
        default_domain = "https://blog.example.com"

        [redirect.table]
        kind = "bucket"
        bucket = "site-settings"
        key = "redirects.json"
    "#;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_parse_without_overrides() {
        let config = parse_config(CONFIG, env(&[])).unwrap();
        assert_eq!(config.redirect.default_domain, "https://blog.example.com");
    }

    #[test]
    fn test_environment_overrides() {
        let config = parse_config(
            CONFIG,
            env(&[
                (ENV_DEFAULT_DOMAIN, "https://new.example.com"),
                (ENV_TABLE_KEY, "prod/redirects.json"),
            ]),
        )
        .unwrap();

        assert_eq!(config.redirect.default_domain, "https://new.example.com");
        match config.redirect.table {
            TableLocation::Bucket { bucket, key, .. } => {
                assert_eq!(bucket, "site-settings");
                assert_eq!(key, "prod/redirects.json");
            }
            other => panic!("unexpected location {:?}", other),
        }
    }

    #[test]
    fn test_overrides_can_complete_an_empty_config() {
        let config = parse_config(
            "",
            env(&[
                (ENV_DEFAULT_DOMAIN, "https://blog.example.com"),
                (ENV_TABLE_BUCKET, "site-settings"),
                (ENV_TABLE_KEY, "redirects.json"),
            ]),
        )
        .unwrap();
        assert_eq!(config.redirect.missing_field(), None);
    }

    #[test]
    fn test_empty_override_is_ignored() {
        let err = parse_config("", env(&[(ENV_DEFAULT_DOMAIN, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("redirect.default_domain"));
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[redirect\n", env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}

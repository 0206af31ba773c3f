//! Remote locations the redirect table is fetched from.
//!
//! # Responsibilities
//! - Turn a configured `TableLocation` into a fetchable source
//! - Fetch the raw document bytes, once per call, with no internal retries
//!
//! Parsing and caching live in `types.rs` and `provider.rs`.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::config::TableLocation;
use crate::table::types::{TableError, TableResult};

/// A place the serialized redirect table can be read from.
#[async_trait]
pub trait TableSource: Send + Sync + fmt::Debug {
    /// Fetch the raw document. One call is exactly one attempt.
    async fn fetch(&self) -> TableResult<Vec<u8>>;

    /// Human-readable locator for logs.
    fn describe(&self) -> String;
}

/// Build the source for a configured location.
pub fn source_for(location: &TableLocation) -> TableResult<Arc<dyn TableSource>> {
    match location {
        TableLocation::Bucket { bucket, key, endpoint } => {
            let url = bucket_url(endpoint, bucket, key)?;
            Ok(Arc::new(HttpSource::new(url)?))
        }
        TableLocation::Url { url } => {
            let url = Url::parse(url)
                .map_err(|e| TableError::Location(format!("'{}': {}", url, e)))?;
            Ok(Arc::new(HttpSource::new(url)?))
        }
        TableLocation::File { path } => Ok(Arc::new(FileSource::new(path))),
    }
}

/// Path-style object URL: `{endpoint}/{bucket}/{key}`, fetched unsigned.
fn bucket_url(endpoint: &str, bucket: &str, key: &str) -> TableResult<Url> {
    if bucket.is_empty() || key.is_empty() {
        return Err(TableError::Location("bucket and key are required".to_string()));
    }
    let raw = format!(
        "{}/{}/{}",
        endpoint.trim_end_matches('/'),
        bucket,
        key.trim_start_matches('/')
    );
    Url::parse(&raw).map_err(|e| TableError::Location(format!("'{}': {}", raw, e)))
}

/// Fetches the table over HTTP(S) with a plain GET.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpSource {
    pub fn new(url: Url) -> TableResult<Self> {
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(TableError::Location(format!(
                    "unsupported scheme '{}' in {}",
                    other, url
                )))
            }
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TableError::Location(e.to_string()))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl TableSource for HttpSource {
    async fn fetch(&self) -> TableResult<Vec<u8>> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| TableError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TableError::Unavailable(format!(
                "{} returned {}",
                self.url, status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TableError::Unavailable(e.to_string()))?;
        Ok(body.to_vec())
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// Reads the table from the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TableSource for FileSource {
    async fn fetch(&self) -> TableResult<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| TableError::Unavailable(format!("{}: {}", self.path.display(), e)))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_url_is_path_style() {
        let url = bucket_url(
            "https://s3.us-east-1.amazonaws.com/",
            "site-settings",
            "/redirects.json",
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://s3.us-east-1.amazonaws.com/site-settings/redirects.json");
    }

    #[test]
    fn test_bucket_location_requires_bucket_and_key() {
        let location = TableLocation::Bucket {
            bucket: String::new(),
            key: "redirects.json".to_string(),
            endpoint: "https://s3.us-east-1.amazonaws.com".to_string(),
        };
        assert!(matches!(source_for(&location), Err(TableError::Location(_))));
    }

    #[test]
    fn test_url_location_rejects_other_schemes() {
        let location = TableLocation::Url {
            url: "ftp://example.com/redirects.json".to_string(),
        };
        assert!(matches!(source_for(&location), Err(TableError::Location(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let source = FileSource::new("/nonexistent/legacy-redirect/table.json");
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, TableError::Unavailable(_)));
    }
}

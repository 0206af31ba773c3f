//! Redirect table types and error definitions.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Object category a legacy identifier belongs to.
///
/// Posts, pages and attachments share one numeric ID space on the old site,
/// so they are all looked up under `Posts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Posts,
    Cats,
    Authors,
}

impl Category {
    /// Every category, in document order.
    pub const ALL: [Category; 3] = [Category::Posts, Category::Cats, Category::Authors];

    /// Top-level key of this category in the table document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Posts => "posts",
            Category::Cats => "cats",
            Category::Authors => "authors",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the redirect table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectEntry {
    /// Relative path fragment on the new site, e.g. `2016/11/18/old-post/`.
    #[serde(default)]
    pub redir: Option<String>,
}

impl RedirectEntry {
    pub fn new(redir: impl Into<String>) -> Self {
        Self {
            redir: Some(redir.into()),
        }
    }

    /// The redirect target, if present and non-empty.
    pub fn target(&self) -> Option<&str> {
        self.redir.as_deref().filter(|r| !r.is_empty())
    }
}

/// Immutable mapping `(category, legacy id) -> entry`.
///
/// Identifiers stay in their string form so arbitrarily long IDs survive
/// without numeric conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedirectTable {
    #[serde(default)]
    posts: HashMap<String, RedirectEntry>,
    #[serde(default)]
    cats: HashMap<String, RedirectEntry>,
    #[serde(default)]
    authors: HashMap<String, RedirectEntry>,
}

impl RedirectTable {
    /// Parse a serialized table document.
    ///
    /// Two layouts are accepted:
    /// - categorized: `{"posts": {...}, "cats": {...}, "authors": {...}}`, any
    ///   section may be absent and unrelated top-level keys are ignored;
    /// - flat: `{"42": {"redir": "..."}}`, every top-level key an identifier,
    ///   read as the `posts` section.
    pub fn from_slice(bytes: &[u8]) -> TableResult<Self> {
        let doc: Map<String, Value> =
            serde_json::from_slice(bytes).map_err(|e| TableError::Malformed(e.to_string()))?;

        let categorized = Category::ALL.iter().any(|c| doc.contains_key(c.as_str()));
        if categorized || doc.is_empty() {
            return serde_json::from_value(Value::Object(doc))
                .map_err(|e| TableError::Malformed(e.to_string()));
        }

        if doc.keys().all(|k| is_identifier(k)) {
            let posts: HashMap<String, RedirectEntry> = serde_json::from_value(Value::Object(doc))
                .map_err(|e| TableError::Malformed(e.to_string()))?;
            return Ok(Self {
                posts,
                ..Self::default()
            });
        }

        Err(TableError::Malformed(
            "document has no posts, cats or authors section".to_string(),
        ))
    }

    /// Insert or replace an entry. Only used while building a table.
    pub fn with_entry(
        mut self,
        category: Category,
        id: impl Into<String>,
        entry: RedirectEntry,
    ) -> Self {
        self.section_mut(category).insert(id.into(), entry);
        self
    }

    /// Look up the raw entry for an identifier.
    pub fn get(&self, category: Category, id: &str) -> Option<&RedirectEntry> {
        self.section(category).get(id)
    }

    /// Look up a usable redirect target (present and non-empty).
    pub fn target(&self, category: Category, id: &str) -> Option<&str> {
        self.get(category, id).and_then(RedirectEntry::target)
    }

    /// Number of entries in one category.
    pub fn len(&self, category: Category) -> usize {
        self.section(category).len()
    }

    pub fn total_entries(&self) -> usize {
        Category::ALL.iter().map(|c| self.len(*c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_entries() == 0
    }

    fn section(&self, category: Category) -> &HashMap<String, RedirectEntry> {
        match category {
            Category::Posts => &self.posts,
            Category::Cats => &self.cats,
            Category::Authors => &self.authors,
        }
    }

    fn section_mut(&mut self, category: Category) -> &mut HashMap<String, RedirectEntry> {
        match category {
            Category::Posts => &mut self.posts,
            Category::Cats => &mut self.cats,
            Category::Authors => &mut self.authors,
        }
    }
}

fn is_identifier(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// Errors that can occur while obtaining the redirect table.
#[derive(Debug, Error)]
pub enum TableError {
    /// The remote fetch failed (network error, missing object, access denied).
    #[error("redirect table unavailable: {0}")]
    Unavailable(String),

    /// The fetch did not complete within the configured deadline.
    #[error("redirect table fetch timed out after {0} ms")]
    Timeout(u64),

    /// The document does not parse into the expected shape.
    #[error("malformed redirect table: {0}")]
    Malformed(String),

    /// The configured locator cannot be turned into a source.
    #[error("invalid table location: {0}")]
    Location(String),
}

/// Result type for table operations.
pub type TableResult<T> = Result<T, TableError>;

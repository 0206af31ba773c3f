//! Query intent classification.
//!
//! # Precedence
//! Rules are an ordered decision list; the first rule whose key is present in
//! the query decides the intent, and later rules are never consulted even if
//! their key is present too.
//!
//! ```text
//! paged → m → author → cat → p → page_id → attachment_id
//! ```
//!
//! `paged` and `m` are structural and never need the table. `p`, `page_id`
//! and `attachment_id` all resolve in the `posts` category.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::redirect::query::QueryParams;
use crate::table::Category;

/// One recognized legacy query key and how its value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Paged,
    DateArchive,
    Author,
    Category,
    Post,
    Page,
    Attachment,
}

impl Rule {
    /// The query key this rule reacts to.
    pub fn key(&self) -> &'static str {
        match self {
            Rule::Paged => "paged",
            Rule::DateArchive => "m",
            Rule::Author => "author",
            Rule::Category => "cat",
            Rule::Post => "p",
            Rule::Page => "page_id",
            Rule::Attachment => "attachment_id",
        }
    }

    /// Interpret the decoded value of this rule's key.
    pub fn interpret(&self, value: &str) -> QueryIntent {
        let key = self.key();
        let result = match self {
            Rule::Paged => parse_page(key, value).map(|page| QueryIntent::Paged { page }),
            Rule::DateArchive => {
                parse_month(value).map(|(year, month)| QueryIntent::DateArchive { year, month })
            }
            Rule::Author => LegacyId::parse(key, value).map(|id| QueryIntent::Lookup {
                category: Category::Authors,
                id,
            }),
            Rule::Category => LegacyId::parse(key, value).map(|id| QueryIntent::Lookup {
                category: Category::Cats,
                id,
            }),
            Rule::Post | Rule::Page | Rule::Attachment => {
                LegacyId::parse(key, value).map(|id| QueryIntent::Lookup {
                    category: Category::Posts,
                    id,
                })
            }
        };
        result.unwrap_or_else(QueryIntent::Invalid)
    }
}

/// Built-in precedence tables, one per generation of the legacy handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// `/?p=###` only.
    PostId,
    /// Post identifiers and their page/attachment aliases.
    PostFamily,
    /// Pagination, date archives, authors, categories and the post family.
    #[default]
    Full,
}

impl Profile {
    pub fn rules(&self) -> &'static [Rule] {
        match self {
            Profile::PostId => &[Rule::Post],
            Profile::PostFamily => &[Rule::Post, Rule::Page, Rule::Attachment],
            Profile::Full => &[
                Rule::Paged,
                Rule::DateArchive,
                Rule::Author,
                Rule::Category,
                Rule::Post,
                Rule::Page,
                Rule::Attachment,
            ],
        }
    }

    /// Whether the qualifying `key=<digit>` pair must open the query.
    ///
    /// The first-generation handler only looked at the start of the query,
    /// so `/?utm=x&p=42` passed through under it.
    pub fn anchored(&self) -> bool {
        matches!(self, Profile::PostId)
    }
}

/// A legacy object identifier: a positive integer kept in canonical string
/// form (no sign, no leading zeros) so that no precision is lost.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LegacyId(String);

impl LegacyId {
    pub fn parse(key: &'static str, value: &str) -> Result<Self, InvalidReason> {
        let digits = non_negative_digits(key, value)?;
        let canonical = digits.trim_start_matches('0');
        if canonical.is_empty() {
            return Err(InvalidReason::NotPositive {
                key,
                value: value.to_string(),
            });
        }
        Ok(Self(canonical.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LegacyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a recognized key's value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidReason {
    #[error("`{key}` has an empty value")]
    Empty { key: &'static str },

    #[error("`{key}={value}` is not a number")]
    NotNumeric { key: &'static str, value: String },

    #[error("`{key}={value}` must not be negative")]
    Negative { key: &'static str, value: String },

    #[error("`{key}={value}` must be positive")]
    NotPositive { key: &'static str, value: String },

    #[error("`{key}={value}` is out of range")]
    OutOfRange { key: &'static str, value: String },

    #[error("`m={value}` is not a yyyymm date")]
    DateShape { value: String },
}

/// What a request asks for, decided before any table access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryIntent {
    /// `page/{page}/`, no lookup.
    Paged { page: u64 },
    /// `date/{year}/{month}/`, no lookup.
    DateArchive { year: String, month: String },
    /// Needs `table[category][id]`.
    Lookup { category: Category, id: LegacyId },
    /// A recognized key with a malformed value.
    Invalid(InvalidReason),
    /// No recognized key present.
    NotApplicable,
}

impl QueryIntent {
    /// Target path for intents that need no table, `None` otherwise.
    pub fn structural_target(&self) -> Option<String> {
        match self {
            QueryIntent::Paged { page } => Some(format!("page/{}/", page)),
            QueryIntent::DateArchive { year, month } => Some(format!("date/{}/{}/", year, month)),
            _ => None,
        }
    }
}

/// Derive exactly one intent from the parsed query.
pub fn classify(params: &QueryParams, rules: &[Rule]) -> QueryIntent {
    rules
        .iter()
        .find_map(|rule| params.get(rule.key()).map(|value| rule.interpret(value)))
        .unwrap_or(QueryIntent::NotApplicable)
}

/// Validate an unsigned decimal, distinguishing negative numbers from junk.
fn non_negative_digits<'a>(key: &'static str, value: &'a str) -> Result<&'a str, InvalidReason> {
    if value.is_empty() {
        return Err(InvalidReason::Empty { key });
    }
    if value.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(value);
    }
    match value.strip_prefix('-') {
        Some(rest) if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) => {
            Err(InvalidReason::Negative {
                key,
                value: value.to_string(),
            })
        }
        _ => Err(InvalidReason::NotNumeric {
            key,
            value: value.to_string(),
        }),
    }
}

/// `paged`: non-negative integer, `0` means the first page.
fn parse_page(key: &'static str, value: &str) -> Result<u64, InvalidReason> {
    let digits = non_negative_digits(key, value)?;
    let page: u64 = digits.parse().map_err(|_| InvalidReason::OutOfRange {
        key,
        value: value.to_string(),
    })?;
    Ok(page.max(1))
}

/// `m`: exactly six digits, `yyyymm`.
fn parse_month(value: &str) -> Result<(String, String), InvalidReason> {
    if value.len() != 6 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InvalidReason::DateShape {
            value: value.to_string(),
        });
    }
    let (year, month) = value.split_at(4);
    Ok((year.to_string(), month.to_string()))
}

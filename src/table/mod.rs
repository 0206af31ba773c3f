//! Redirect table subsystem.
//!
//! # Data Flow
//! ```text
//! TableLocation (config)
//!     → source.rs (bucket / url / file → raw bytes)
//!     → types.rs (parse into RedirectTable)
//!     → provider.rs (cache once, share via Arc)
//!     → resolver borrows read access per request
//! ```
//!
//! # Design Decisions
//! - The table is immutable once loaded; there is no write path
//! - No negative caching: a failed load is retried by the next request

pub mod provider;
pub mod source;
pub mod types;

pub use provider::TableProvider;
pub use source::{FileSource, HttpSource, TableSource};
pub use types::{Category, RedirectEntry, RedirectTable, TableError, TableResult};

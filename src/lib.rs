//! Legacy query-URL redirect edge.
//!
//! Resolves WordPress-style query URLs (`/?p=42`, `/?cat=3`, `/?paged=2`,
//! `/?m=201603`, ...) into canonical paths on the new site and answers with a
//! permanent redirect, or forwards everything else to the origin untouched.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod redirect;
pub mod table;

pub use config::RedirectConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use redirect::{Action, Resolver};
pub use table::{RedirectTable, TableProvider};

//! Legacy URL resolution subsystem.
//!
//! # Data Flow
//! ```text
//! (path, raw query)
//!     → eligibility.rs (raw-text filter, no parsing)
//!     → query.rs (form decoding)
//!     → intent.rs (ordered rules → one QueryIntent)
//!     → resolver.rs (structural rewrite, or table lookup via provider)
//!     → response.rs (Redirect / NotFound / Forward)
//! ```
//!
//! # Design Decisions
//! - One engine; the legacy handler generations differ only in their `Profile`
//! - Structural redirects are an early return, not an error path
//! - Only identifier lookups touch the redirect table

pub mod eligibility;
pub mod intent;
pub mod query;
pub mod resolver;
pub mod response;

pub use eligibility::{is_eligible, ROOT_PATH};
pub use intent::{classify, InvalidReason, LegacyId, Profile, QueryIntent, Rule};
pub use query::QueryParams;
pub use resolver::{ResolveError, Resolver};
pub use response::{location, Action, ResolutionOutcome};

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers: request ID, trace, timeout, in-flight limit)
//!     → edge handler → Resolver
//!         ├─ Redirect → response.rs (301 + Location)
//!         ├─ NotFound → response.rs (404)
//!         └─ Forward  → origin.rs (request sent to origin unmodified)
//!     → Send to client
//! ```

pub mod limit;
pub mod origin;
pub mod request;
pub mod response;
pub mod server;

pub use origin::OriginClient;
pub use request::{request_id, MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};

//! Response synthesis.
//!
//! # Responsibilities
//! - Map a resolution outcome to the action the host must take
//! - Render the `Location` value for redirects
//!
//! # Design Decisions
//! - Host-agnostic: the HTTP layer turns `Action` into a real response
//! - A target of exactly `/` is never prefixed with another slash

use serde::Serialize;

/// Result of resolving one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Redirect to `target`, a path relative to the default domain.
    Redirect { target: String },
    /// Recognized legacy request that cannot be resolved.
    NotFound,
    /// Not a legacy request; leave it alone.
    PassThrough,
}

impl ResolutionOutcome {
    /// Label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ResolutionOutcome::Redirect { .. } => "redirect",
            ResolutionOutcome::NotFound => "not_found",
            ResolutionOutcome::PassThrough => "pass_through",
        }
    }

    /// Turn the outcome into the host-facing action.
    pub fn into_action(self, default_domain: &str) -> Action {
        match self {
            ResolutionOutcome::Redirect { target } => Action::Redirect {
                location: location(default_domain, &target),
            },
            ResolutionOutcome::NotFound => Action::NotFound,
            ResolutionOutcome::PassThrough => Action::Forward,
        }
    }
}

/// What the hosting edge runtime should do with the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Forward the original request to the origin, unmodified.
    Forward,
    /// Answer `301 Moved Permanently` with this `Location`.
    Redirect { location: String },
    /// Answer `404 Not Found`.
    NotFound,
}

impl Action {
    /// HTTP status the host answers with, `None` when forwarding.
    pub fn status(&self) -> Option<u16> {
        match self {
            Action::Forward => None,
            Action::Redirect { .. } => Some(301),
            Action::NotFound => Some(404),
        }
    }
}

/// `{default_domain}/{target}`, or `{default_domain}/` when the target is `/`.
pub fn location(default_domain: &str, target: &str) -> String {
    if target == "/" {
        format!("{}{}", default_domain, target)
    } else {
        format!("{}/{}", default_domain, target)
    }
}

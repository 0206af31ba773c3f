//! Responses synthesized at the edge.
//!
//! Only redirects and not-found answers are produced here; forwarded
//! requests get the origin's response untouched.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// `301 Moved Permanently` to `location`.
///
/// A location that cannot be a header value degrades to `404`.
pub fn redirect_response(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, value)]).into_response(),
        Err(e) => {
            tracing::warn!(
                location = %location,
                error = %e,
                "Redirect target is not a valid header value"
            );
            not_found_response()
        }
    }
}

/// `404 Not Found`.
pub fn not_found_response() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

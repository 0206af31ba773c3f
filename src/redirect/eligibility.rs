//! Cheap pre-filter deciding whether a request is a legacy redirect candidate.
//!
//! Runs on the raw, undecoded query text so the common case (any other
//! request) costs one string comparison and a short scan.

use crate::redirect::intent::Profile;

/// The only path legacy query URLs were served from.
pub const ROOT_PATH: &str = "/";

/// True when `path` is the site root and the raw query holds at least one
/// `key=<digit>...` pair for a key of the profile's rules. Anchored profiles
/// only consider the first pair.
pub fn is_eligible(path: &str, raw_query: &str, profile: Profile) -> bool {
    if path != ROOT_PATH || raw_query.is_empty() {
        return false;
    }
    let rules = profile.rules();
    let limit = if profile.anchored() { 1 } else { usize::MAX };
    raw_query
        .split('&')
        .take(limit)
        .any(|pair| rules.iter().any(|rule| starts_with_digit_value(pair, rule.key())))
}

fn starts_with_digit_value(pair: &str, key: &str) -> bool {
    pair.strip_prefix(key)
        .and_then(|rest| rest.strip_prefix('='))
        .and_then(|value| value.bytes().next())
        .is_some_and(|b| b.is_ascii_digit())
}

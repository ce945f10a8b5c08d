//! Mapping of Anthropic HTTP failures onto parable errors.

use std::time::Duration;

use parable_core::Error;

/// Message used for authentication failures.
pub const INVALID_API_KEY_MESSAGE: &str = "invalid api key";

/// Parse a `retry-after` header value given in (possibly fractional) seconds.
///
/// Negative, non-finite, or non-numeric values yield `None`.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

/// Convert a non-200 response into an error.
///
/// - 429: `RateLimited`, carrying the parsed `retry-after` hint.
/// - 401: `Api { status: 401, message: "invalid api key" }`.
/// - anything else: `Api` with the raw body text.
pub fn status_to_error(status: u16, body: &str, retry_after: Option<&str>) -> Error {
    match status {
        429 => Error::RateLimited {
            retry_after: retry_after.and_then(parse_retry_after),
        },
        401 => Error::Api {
            status,
            message: INVALID_API_KEY_MESSAGE.to_string(),
        },
        _ => Error::Api {
            status,
            message: body.to_string(),
        },
    }
}

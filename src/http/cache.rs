//! HTTP cache validation module
//!
//! Provides `Last-Modified` generation and `If-Modified-Since` handling.

use chrono::{DateTime, Utc};
use std::time::SystemTime;

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Format a timestamp as an HTTP date
pub fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}

/// Parse an HTTP date header value
///
/// Accepts IMF-fixdate and other RFC 2822 forms. Returns `None` for
/// anything unparseable, which callers treat as "no condition".
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Decide whether a conditional GET can be answered with 304
///
/// `If-None-Match` takes precedence: when the client sent one, the date
/// condition is ignored and the full response is sent.
///
/// # Arguments
/// * `if_modified_since` - Client-sent If-Modified-Since header
/// * `has_if_none_match` - Whether the request carried If-None-Match
/// * `modified` - File modification time
pub fn is_not_modified(
    if_modified_since: Option<&str>,
    has_if_none_match: bool,
    modified: SystemTime,
) -> bool {
    if has_if_none_match {
        return false;
    }
    let Some(since) = if_modified_since.and_then(parse_http_date) else {
        return false;
    };
    // Header dates have whole-second precision
    let modified = DateTime::<Utc>::from(modified).timestamp();
    modified <= since.timestamp()
}

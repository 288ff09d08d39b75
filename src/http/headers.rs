//! Cross-origin header set
//!
//! Every response leaves the server with the same CORS and cross-origin
//! isolation headers. Wildcard CORS next to `require-corp` is meant for local
//! asset serving (shared memory for WASM threads), not for credentialed use.

use hyper::header::{
    HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, SERVER,
};

pub const CROSS_ORIGIN_OPENER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-opener-policy");
pub const CROSS_ORIGIN_EMBEDDER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-embedder-policy");

/// Header names and values attached to every response
pub fn isolation_headers() -> [(HeaderName, HeaderValue); 5] {
    [
        (ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
        (
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, OPTIONS"),
        ),
        (ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*")),
        (
            CROSS_ORIGIN_OPENER_POLICY,
            HeaderValue::from_static("same-origin"),
        ),
        (
            CROSS_ORIGIN_EMBEDDER_POLICY,
            HeaderValue::from_static("require-corp"),
        ),
    ]
}

/// Finalize response headers
///
/// Uses `insert`, so each header appears exactly once no matter how many
/// times this runs or what the response builder set before.
pub fn apply_isolation_headers(headers: &mut HeaderMap) {
    for (name, value) in isolation_headers() {
        headers.insert(name, value);
    }
}

/// Set the `Server` header unless the name is empty or invalid
pub fn apply_server_header(headers: &mut HeaderMap, server_name: &str) {
    if server_name.is_empty() {
        return;
    }
    if let Ok(value) = HeaderValue::from_str(server_name) {
        headers.insert(SERVER, value);
    }
}

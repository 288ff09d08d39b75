//! Request dispatch module
//!
//! Entry point for HTTP request processing: method dispatch, response
//! finalization (cross-origin and server headers) and access logging.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, StatusCode, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating what a single request needs
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Raw (still percent-encoded) URI path
    pub path: String,
    pub query: Option<String>,
    pub is_head: bool,
    pub if_modified_since: Option<String>,
    pub has_if_none_match: bool,
}

impl RequestContext {
    fn from_parts(parts: &Parts) -> Self {
        Self {
            path: collapse_leading_slashes(parts.uri.path()),
            query: parts.uri.query().map(ToString::to_string),
            is_head: parts.method == Method::HEAD,
            if_modified_since: header_string(parts, "if-modified-since"),
            has_if_none_match: parts.headers.contains_key("if-none-match"),
        }
    }
}

/// Reduce a leading run of slashes to one
///
/// `//host/dir` would otherwise echo back as a protocol-relative
/// `Location` in the directory redirect and send the browser off-site.
fn collapse_leading_slashes(path: &str) -> String {
    if path.starts_with("//") {
        format!("/{}", path.trim_start_matches('/'))
    } else {
        path.to_string()
    }
}

/// Main entry point for HTTP request handling
///
/// The request body is never read; it is dropped before any I/O.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, _) = req.into_parts();
    let ctx = RequestContext::from_parts(&parts);

    let mut response = match check_http_method(&parts.method) {
        Some(resp) => resp,
        None => static_files::serve(&ctx, &state).await,
    };

    finalize_headers(&mut response, &state);

    if state.access_log {
        log_access(&parts, &response, peer_addr, started, &state);
    }

    Ok(response)
}

/// Answer methods that never touch the filesystem
///
/// GET and HEAD fall through to file serving.
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response()),
        _ => {
            logger::log_warning(&format!("Method not implemented: {method}"));
            Some(http::build_error_response(
                StatusCode::NOT_IMPLEMENTED,
                Some(&format!("Unsupported method ('{method}')")),
                false,
            ))
        }
    }
}

/// Last step before a response is written, whatever produced it
fn finalize_headers(response: &mut Response<Full<Bytes>>, state: &AppState) {
    let headers = response.headers_mut();
    http::apply_isolation_headers(headers);
    http::apply_server_header(headers, &state.config.http.server_name);
}

fn log_access(
    parts: &Parts,
    response: &Response<Full<Bytes>>,
    peer_addr: SocketAddr,
    started: Instant,
    state: &AppState,
) {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = version_label(parts.version).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.referer = header_string(parts, "referer");
    entry.user_agent = header_string(parts, "user-agent");
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}

fn header_string(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

//! HTTP response building module
//!
//! Provides builders for each status the server emits. Cross-origin headers
//! are not added here; the router applies them to every finished response.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use super::listing::escape_html;

/// Build 200 response for a served file
///
/// HEAD requests pass an empty `body` together with the on-disk length.
pub fn build_file_response(
    body: Bytes,
    content_length: u64,
    content_type: &str,
    last_modified: &str,
) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Last-Modified", last_modified)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 200 directory listing response
pub fn build_listing_response(html: String, is_head: bool) -> Response<Full<Bytes>> {
    let content_length = html.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(html)
    };

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("listing", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 301 redirect that appends the missing directory slash
pub fn build_directory_redirect(path: &str, query: Option<&str>) -> Response<Full<Bytes>> {
    let location = match query {
        Some(q) => format!("{path}/?{q}"),
        None => format!("{path}/"),
    };

    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header("Location", location)
        .header("Content-Length", 0)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 304 Not Modified response
pub fn build_304_response(last_modified: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header("Last-Modified", last_modified)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 404 Not Found response
pub fn build_404_response(message: &str, is_head: bool) -> Response<Full<Bytes>> {
    build_error_response(StatusCode::NOT_FOUND, Some(message), is_head)
}

/// Build an HTML error page
///
/// `message` defaults to the status reason phrase. The connection is closed
/// after the response, matching conventional static servers.
pub fn build_error_response(
    status: StatusCode,
    message: Option<&str>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let reason = status.canonical_reason().unwrap_or("Unknown");
    let message = message.unwrap_or(reason);
    let page = format!(
        "<!DOCTYPE HTML>\n\
         <html lang=\"en\">\n\
         \x20   <head>\n\
         \x20       <meta charset=\"utf-8\">\n\
         \x20       <title>Error response</title>\n\
         \x20   </head>\n\
         \x20   <body>\n\
         \x20       <h1>Error response</h1>\n\
         \x20       <p>Error code: {code}</p>\n\
         \x20       <p>Message: {message}.</p>\n\
         \x20       <p>Error code explanation: {code} - {explain}.</p>\n\
         \x20   </body>\n\
         </html>\n",
        code = status.as_u16(),
        message = escape_html(message),
        explain = explain_status(status),
    );

    let content_length = page.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(page)
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "text/html;charset=utf-8")
        .header("Content-Length", content_length)
        .header("Connection", "close")
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Longer explanation shown on error pages
fn explain_status(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "Bad request syntax or unsupported method",
        StatusCode::FORBIDDEN => "Request forbidden -- authorization will not help",
        StatusCode::NOT_FOUND => "Nothing matches the given URI",
        StatusCode::INTERNAL_SERVER_ERROR => "Server got itself in trouble",
        StatusCode::NOT_IMPLEMENTED => "Server does not support this operation",
        _ => status.canonical_reason().unwrap_or("Unknown status"),
    }
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

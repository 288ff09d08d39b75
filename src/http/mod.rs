//! HTTP protocol layer module
//!
//! Protocol helpers decoupled from request dispatch: content types, the
//! cross-origin header set, path translation, cache validation and
//! response builders.

pub mod cache;
pub mod headers;
pub mod listing;
pub mod mime;
pub mod path;
pub mod response;

// Re-export commonly used items
pub use headers::{apply_isolation_headers, apply_server_header};
pub use response::{
    build_304_response, build_404_response, build_directory_redirect, build_error_response,
    build_file_response, build_listing_response, build_options_response,
};

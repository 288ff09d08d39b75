//! Request handler module
//!
//! Dispatches requests by method and serves files from the served directory.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::{handle_request, RequestContext};

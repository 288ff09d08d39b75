//! isoserve: static file server for cross-origin isolated WASM development
//!
//! Serves a directory over HTTP/1.1 and stamps every response with wildcard
//! CORS plus `Cross-Origin-Opener-Policy: same-origin` and
//! `Cross-Origin-Embedder-Policy: require-corp`, the headers browsers need
//! before they enable `SharedArrayBuffer`.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

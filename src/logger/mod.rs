//! Logger module
//!
//! Provides logging utilities for the server:
//! - Startup banner on stdout
//! - Access logging in several formats
//! - Leveled error/warning/debug logging
//! - Optional file-based sinks

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::{AppState, Config};
use std::net::SocketAddr;
use std::str::FromStr;

/// Severity threshold for the error log
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" | "trace" => Ok(Self::Debug),
            other => Err(format!("Unknown log level '{other}'")),
        }
    }
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let level: LogLevel = config.logging.level.parse()?;
    writer::init(
        level,
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )?;
    Ok(())
}

fn enabled(level: LogLevel) -> bool {
    writer::get().map_or(level <= LogLevel::Info, |w| level <= w.level())
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

/// Print the startup banner
///
/// Always goes to stdout: the port line and the two override samples are
/// what people look for when checking the server came up right.
pub fn log_server_start(addr: &SocketAddr, state: &AppState) {
    println!("Serving at port {}", addr.port());
    println!("MIME types:");
    println!(" - .wasm -> {}", state.mime.guess_type("test.wasm"));
    println!(" - .mod -> {}", state.mime.guess_type("test.mod"));

    if enabled(LogLevel::Debug) {
        let cfg = &state.config;
        write_error(&format!("[DEBUG] Listening on: http://{addr}"));
        write_error(&format!("[DEBUG] Serving directory: {}", state.root.display()));
        if let Some(workers) = cfg.server.workers {
            write_error(&format!("[DEBUG] Worker threads: {workers}"));
        }
        if let Some(ref path) = cfg.logging.access_log_file {
            write_error(&format!("[DEBUG] Access log: {path}"));
        }
    }
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    if enabled(LogLevel::Error) {
        write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
    }
}

pub fn log_error(message: &str) {
    if enabled(LogLevel::Error) {
        write_error(&format!("[ERROR] {message}"));
    }
}

pub fn log_warning(message: &str) {
    if enabled(LogLevel::Warn) {
        write_error(&format!("[WARN] {message}"));
    }
}

pub fn log_info(message: &str) {
    if enabled(LogLevel::Info) {
        write_error(&format!("[INFO] {message}"));
    }
}

pub fn log_debug(message: &str) {
    if enabled(LogLevel::Debug) {
        write_error(&format!("[DEBUG] {message}"));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("Connection accepted from: {peer_addr}"));
}

pub fn log_connection_rejected(active: usize, max: u64) {
    log_warning(&format!(
        "Max connections reached: {active}/{max}. Connection rejected."
    ));
}

pub fn log_shutdown(reason: &str) {
    log_info(&format!("{reason}, shutting down"));
}

// Connection handling module
// Accepts a single TCP connection and serves it on its own task

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};

use crate::config::{self, PerformanceConfig};
use crate::handler;
use crate::logger;

/// Accept a connection, enforcing the optional connection cap.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<config::AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            // Exceeded limit: rollback counter and reject
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_connection_rejected(prev_count, max_conn);
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);

    handle_connection(stream, peer_addr, Arc::clone(state), Arc::clone(conn_counter));
}

/// Serve a single connection in a spawned task.
///
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Configures HTTP/1.1 keep-alive
/// 3. Bounds the wait for each request head (first request and idle keep-alive)
/// 4. Serves every request on the connection with the request handler
/// 5. Decrements the connection counter when done
///
/// Response bodies are not time-bounded: a slow client may take as long as
/// it needs to download a large module once its request has arrived.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: Arc<config::AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .keep_alive(state.config.performance.keep_alive_timeout > 0)
            .header_read_timeout(header_wait(&state.config.performance));

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handler::handle_request(req, Arc::clone(&service_state), peer_addr)
            }),
        );

        if let Err(err) = conn.await {
            if err.is_timeout() {
                logger::log_debug(&format!(
                    "Connection from {peer_addr} closed: no request within {} seconds",
                    header_wait(&state.config.performance).as_secs()
                ));
            } else {
                logger::log_connection_error(&err);
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

/// How long to wait for a request head
///
/// With keep-alive on, an idle connection may wait up to the keep-alive
/// timeout for its next request.
fn header_wait(perf: &PerformanceConfig) -> Duration {
    let secs = if perf.keep_alive_timeout > 0 {
        perf.keep_alive_timeout.max(perf.read_timeout)
    } else {
        perf.read_timeout
    };
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_wait_uses_keep_alive_when_enabled() {
        let perf = PerformanceConfig::default();
        assert_eq!(header_wait(&perf), Duration::from_secs(75));

        let perf = PerformanceConfig {
            keep_alive_timeout: 5,
            read_timeout: 30,
            max_connections: None,
        };
        assert_eq!(header_wait(&perf), Duration::from_secs(30));
    }

    #[test]
    fn test_header_wait_without_keep_alive() {
        let perf = PerformanceConfig {
            keep_alive_timeout: 0,
            read_timeout: 7,
            max_connections: None,
        };
        assert_eq!(header_wait(&perf), Duration::from_secs(7));
    }
}

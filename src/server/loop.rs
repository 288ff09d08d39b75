// Server loop module
// Accepts connections until the shutdown future resolves

use std::future::Future;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config;
use crate::logger;

/// Run the accept loop.
///
/// Connections already handed to their tasks keep running after the loop
/// returns; only new accepts stop.
pub async fn start_server_loop<F>(
    listener: TcpListener,
    state: Arc<config::AppState>,
    active_connections: Arc<AtomicUsize>,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = &mut shutdown => {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppState, Config};
    use crate::server::create_listener;
    use std::fs;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    /// Send one request with `Connection: close` and return the raw response
    async fn raw_request(addr: SocketAddr, method: &str, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request =
            format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8_lossy(&response).into_owned()
    }

    fn status_line(response: &str) -> &str {
        response.lines().next().unwrap_or_default()
    }

    fn header<'a>(response: &'a str, name: &str) -> Option<&'a str> {
        let head = response.split("\r\n\r\n").next()?;
        head.lines().skip(1).find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }

    fn body(response: &str) -> &str {
        response.split_once("\r\n\r\n").map_or("", |(_, b)| b)
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("index.html"), "<!doctype html><p>hi</p>").unwrap();
        fs::write(root.path().join("app.wasm"), b"\0asm\x01\0\0\0").unwrap();
        fs::write(root.path().join("song.mod"), b"M.K.").unwrap();

        let mut config = Config::default();
        config.http.root_dir = root.path().to_string_lossy().into_owned();
        config.logging.access_log = false;
        let state = Arc::new(AppState::new(config).unwrap());

        let listener = create_listener("127.0.0.1:0".parse().unwrap(), 16).unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(start_server_loop(
            listener,
            state,
            Arc::new(AtomicUsize::new(0)),
            async move {
                let _ = stop_rx.await;
            },
        ));

        let resp = raw_request(addr, "GET", "/index.html").await;
        assert_eq!(status_line(&resp), "HTTP/1.1 200 OK");
        assert!(header(&resp, "content-type").unwrap().starts_with("text/html"));
        assert_eq!(header(&resp, "cross-origin-opener-policy"), Some("same-origin"));
        assert_eq!(header(&resp, "cross-origin-embedder-policy"), Some("require-corp"));
        assert_eq!(body(&resp), "<!doctype html><p>hi</p>");

        let resp = raw_request(addr, "GET", "/app.wasm").await;
        assert_eq!(status_line(&resp), "HTTP/1.1 200 OK");
        assert_eq!(header(&resp, "content-type"), Some("application/wasm"));

        let resp = raw_request(addr, "GET", "/song.mod").await;
        assert_eq!(status_line(&resp), "HTTP/1.1 200 OK");
        assert_eq!(header(&resp, "content-type"), Some("audio/mod"));

        let resp = raw_request(addr, "OPTIONS", "/anything").await;
        assert_eq!(status_line(&resp), "HTTP/1.1 200 OK");
        assert_eq!(header(&resp, "access-control-allow-origin"), Some("*"));
        assert_eq!(header(&resp, "access-control-allow-methods"), Some("GET, OPTIONS"));
        assert_eq!(header(&resp, "access-control-allow-headers"), Some("*"));
        assert_eq!(body(&resp), "");

        let resp = raw_request(addr, "GET", "/missing.txt").await;
        assert_eq!(status_line(&resp), "HTTP/1.1 404 Not Found");
        assert_eq!(header(&resp, "access-control-allow-origin"), Some("*"));

        stop_tx.send(()).unwrap();
        server.await.unwrap();
    }

    /// Start a server on an ephemeral port; dropping the sender stops it
    fn spawn_server(
        tweak: impl FnOnce(&mut Config),
    ) -> (SocketAddr, oneshot::Sender<()>, tempfile::TempDir) {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("index.html"), "ok").unwrap();
        let mut config = Config::default();
        config.http.root_dir = root.path().to_string_lossy().into_owned();
        config.logging.access_log = false;
        tweak(&mut config);
        let state = Arc::new(AppState::new(config).unwrap());

        let listener = create_listener("127.0.0.1:0".parse().unwrap(), 16).unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        tokio::spawn(start_server_loop(
            listener,
            state,
            Arc::new(AtomicUsize::new(0)),
            async move {
                let _ = stop_rx.await;
            },
        ));
        (addr, stop_tx, root)
    }

    #[tokio::test]
    async fn test_idle_connection_closed_after_read_timeout() {
        let (addr, _stop, _root) = spawn_server(|cfg| {
            cfg.performance.keep_alive_timeout = 0;
            cfg.performance.read_timeout = 1;
        });

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let mut buf = Vec::new();
        let closed =
            tokio::time::timeout(Duration::from_secs(10), stream.read_to_end(&mut buf)).await;
        assert!(closed.is_ok(), "idle connection should be closed by the server");
    }

    #[tokio::test]
    async fn test_slow_request_after_idle_still_served() {
        let (addr, _stop, _root) = spawn_server(|cfg| {
            cfg.performance.keep_alive_timeout = 0;
            cfg.performance.read_timeout = 5;
        });

        // The connection lives past a second without any lifetime cutoff
        let mut stream = TcpStream::connect(addr).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        stream
            .write_all(b"GET /index.html HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        let response = String::from_utf8_lossy(&response);
        assert_eq!(status_line(&response), "HTTP/1.1 200 OK");
        assert_eq!(body(&response), "ok");
    }

    #[tokio::test]
    async fn test_malformed_request_gets_400() {
        let (addr, _stop, _root) = spawn_server(|_| {});

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /x HTTP/1.1\r\nHost: localhost\r\nbad header line\r\n\r\n")
            .await
            .unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap_or(0);
        let response = String::from_utf8_lossy(&response);
        assert_eq!(status_line(&response), "HTTP/1.1 400 Bad Request");
    }

    #[tokio::test]
    async fn test_max_connections_rejects_extra() {
        let root = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.http.root_dir = root.path().to_string_lossy().into_owned();
        config.logging.access_log = false;
        config.performance.max_connections = Some(0);
        let state = Arc::new(AppState::new(config).unwrap());

        let listener = create_listener("127.0.0.1:0".parse().unwrap(), 16).unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(start_server_loop(
            listener,
            state,
            Arc::new(AtomicUsize::new(0)),
            async move {
                let _ = stop_rx.await;
            },
        ));

        // The connection is accepted then dropped without a response
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let mut buf = Vec::new();
        let read = stream.read_to_end(&mut buf).await.unwrap_or(0);
        assert_eq!(read, 0);

        stop_tx.send(()).unwrap();
        server.await.unwrap();
    }
}

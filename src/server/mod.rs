// Server module entry point
// Listener setup, accept loop and shutdown handling

mod connection;
mod host;
mod listener;
mod signal;

use std::future::Future;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::logger;
use crate::service::RestService;

// Re-export commonly used items
pub use host::{HostBody, RestHost};
pub use listener::create_listener;
pub use signal::shutdown_signal;

/// Accept connections until `shutdown` resolves
///
/// In-flight connections keep running on their own tasks; only the accept
/// loop stops.
pub async fn serve<S, F>(listener: TcpListener, host: Arc<RestHost<S>>, shutdown: F)
where
    S: RestService + Send + 'static,
    F: Future<Output = ()>,
{
    let conn_counter = Arc::new(AtomicUsize::new(0));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    connection::accept_connection(stream, peer_addr, &host, &conn_counter);
                }
                Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
            },
            () = &mut shutdown => {
                logger::log_info("Shutdown requested, no longer accepting connections");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::service::{Exchange, HandlerResult};
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;
    use tokio::task::JoinHandle;

    struct Ping;

    impl RestService for Ping {
        fn get(&mut self, ex: &mut Exchange<'_>) -> HandlerResult {
            ex.send_json(&"pong")
        }

        fn post(&mut self, ex: &mut Exchange<'_>) -> HandlerResult {
            ex.send_error("read-only")
        }

        fn put(&mut self, ex: &mut Exchange<'_>) -> HandlerResult {
            ex.send_error("read-only")
        }

        fn delete(&mut self, ex: &mut Exchange<'_>) -> HandlerResult {
            ex.send_error("read-only")
        }
    }

    /// Start `serve` on an ephemeral port with the given config file text
    fn start(toml: &str) -> (SocketAddr, oneshot::Sender<()>, JoinHandle<()>) {
        let mut config = Config::from_toml_str(toml).unwrap();
        config.logging.access_log = false;
        let host = Arc::new(RestHost::new(Arc::new(config), || Ping));

        let listener = create_listener("127.0.0.1:0".parse().unwrap(), 16).unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, host, async move {
            let _ = stop_rx.await;
        }));
        (addr, stop_tx, server)
    }

    #[tokio::test]
    async fn test_serve_over_tcp() {
        let (addr, stop_tx, server) = start("");

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /api/ping HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        assert!(raw.starts_with("HTTP/1.1 200 OK"));
        assert!(raw.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(raw.ends_with("\"pong\""));

        stop_tx.send(()).unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_max_connections_rejects_extra_client() {
        let (addr, stop_tx, server) = start("[performance]\nmax_connections = 1\n");

        // first client holds its keep-alive connection open
        let mut first = TcpStream::connect(addr).await.unwrap();
        first
            .write_all(b"GET /api/ping HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut received = Vec::new();
        let mut buf = [0_u8; 512];
        while !received.ends_with(b"\"pong\"") {
            let n = first.read(&mut buf).await.unwrap();
            assert_ne!(n, 0, "first connection closed early");
            received.extend_from_slice(&buf[..n]);
        }
        assert!(received.starts_with(b"HTTP/1.1 200 OK"));

        // second client is dropped without any response
        let mut second = TcpStream::connect(addr).await.unwrap();
        let read = tokio::time::timeout(Duration::from_secs(5), second.read(&mut buf))
            .await
            .expect("rejected connection was left open");
        assert!(matches!(read, Ok(0) | Err(_)), "unexpected data: {read:?}");

        drop(first);
        stop_tx.send(()).unwrap();
        server.await.unwrap();
    }
}

// Connection handling module
// Accepts a single TCP connection and serves it with the REST host

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};

use super::RestHost;
use crate::logger;
use crate::service::RestService;

/// Accept a connection, enforcing `performance.max_connections`.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `host` - REST host answering the requests
/// * `conn_counter` - Active connection counter
pub fn accept_connection<S>(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    host: &Arc<RestHost<S>>,
    conn_counter: &Arc<AtomicUsize>,
) where
    S: RestService + Send + 'static,
{
    // Increment first, then check, so concurrent accepts cannot both slip in
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = host.config().performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    if host.config().logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(stream, peer_addr, Arc::clone(host), Arc::clone(conn_counter));
}

/// Serve one connection in a spawned task and release its slot when done
fn handle_connection<S>(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    host: Arc<RestHost<S>>,
    conn_counter: Arc<AtomicUsize>,
) where
    S: RestService + Send + 'static,
{
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let performance = &host.config().performance;
        let mut builder = http1::Builder::new();
        builder.keep_alive(performance.keep_alive);
        if performance.header_read_timeout > 0 {
            builder
                .timer(TokioTimer::new())
                .header_read_timeout(Duration::from_secs(performance.header_read_timeout));
        }

        let service_host = Arc::clone(&host);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let host = Arc::clone(&service_host);
                async move { host.handle(req, Some(peer_addr)).await }
            }),
        );

        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

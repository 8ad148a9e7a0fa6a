// Connection handling module
// Serves one accepted TCP connection with hyper's HTTP/1 implementation

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Notify;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Counts live connections and enforces `performance.max_connections`
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    active: AtomicUsize,
    limit: Option<usize>,
    idle: Notify,
}

impl ConnectionTracker {
    pub fn new(limit: Option<u64>) -> Self {
        Self {
            active: AtomicUsize::new(0),
            limit: limit.map(|l| usize::try_from(l).unwrap_or(usize::MAX)),
            idle: Notify::new(),
        }
    }

    /// Reserve a slot; `None` when the limit is reached
    ///
    /// The slot is released when the returned guard is dropped.
    pub fn try_acquire(tracker: &Arc<Self>) -> Option<ConnectionGuard> {
        // Increment first, then check, so concurrent accepts cannot overshoot
        let prev = tracker.active.fetch_add(1, Ordering::SeqCst);
        if tracker.limit.is_some_and(|limit| prev >= limit) {
            tracker.active.fetch_sub(1, Ordering::SeqCst);
            return None;
        }
        Some(ConnectionGuard {
            tracker: Arc::clone(tracker),
        })
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Resolve once no connection holds a guard
    pub async fn wait_idle(&self) {
        // A release between the check and the await leaves a stored permit
        while self.active() > 0 {
            self.idle.notified().await;
        }
    }
}

/// Held by a connection task for its whole lifetime
#[derive(Debug)]
pub struct ConnectionGuard {
    tracker: Arc<ConnectionTracker>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.tracker.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.tracker.idle.notify_one();
        }
    }
}

/// Accept a connection: apply the limit, then serve it in its own task
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    tracker: &Arc<ConnectionTracker>,
) {
    let Some(guard) = ConnectionTracker::try_acquire(tracker) else {
        logger::log_warning(&format!(
            "Max connections reached ({}). Connection from {peer_addr} rejected.",
            tracker.active()
        ));
        drop(stream);
        return;
    };

    logger::log_connection_accepted(&peer_addr);
    tokio::spawn(serve_connection(stream, peer_addr, Arc::clone(state), guard));
}

/// Drive one HTTP/1 connection to completion or timeout
async fn serve_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    _guard: ConnectionGuard,
) {
    let io = TokioIo::new(stream);
    let timeout = state.config.connection_timeout();

    let mut builder = http1::Builder::new();
    builder.keep_alive(state.config.performance.keep_alive);

    let conn = builder.serve_connection(
        io,
        service_fn(move |req| handler::handle_request(req, Arc::clone(&state), peer_addr)),
    );

    match tokio::time::timeout(timeout, conn).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => logger::log_connection_error(&err),
        Err(_) => logger::log_warning(&format!(
            "Connection from {peer_addr} timed out after {} seconds",
            timeout.as_secs()
        )),
    }
}

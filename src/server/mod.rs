// Server module entry point
// Accept loop, per-connection serving, and shutdown signals

pub mod connection;
pub mod listener;
pub mod signal;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub use connection::{accept_connection, ConnectionTracker};
pub use listener::bind_listener;
pub use signal::shutdown_signal;

use crate::config::AppState;
use crate::logger;

/// Accept connections until `shutdown` resolves, then drain
///
/// Each connection is served in its own task with its own request state;
/// the loop only hands out the shared, read-only `AppState`. After
/// shutdown the listener is closed and `run` returns once every in-flight
/// connection has finished, or after the connection timeout.
pub async fn run<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F)
where
    F: Future<Output = &'static str>,
{
    let tracker = Arc::new(ConnectionTracker::new(state.config.performance.max_connections));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => match accept_result {
                Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state, &tracker),
                Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
            },
            reason = &mut shutdown => {
                logger::log_shutdown(reason);
                break;
            }
        }
    }

    drop(listener);
    drain_connections(&tracker, state.config.connection_timeout()).await;
}

/// Wait for in-flight connections, bounded by `grace`
async fn drain_connections(tracker: &ConnectionTracker, grace: Duration) {
    let active = tracker.active();
    if active == 0 {
        return;
    }

    logger::log_drain_start(active, grace);
    match tokio::time::timeout(grace, tracker.wait_idle()).await {
        Ok(()) => logger::log_drain_complete(),
        Err(_) => logger::log_warning(&format!(
            "[Shutdown] {} connection(s) still open after {}s, closing",
            tracker.active(),
            grace.as_secs()
        )),
    }
}

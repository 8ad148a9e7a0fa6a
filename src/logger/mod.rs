//! Logger module
//!
//! Thin facade over `tracing` so call sites stay short and uniform:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging

mod format;

pub use format::AccessLogEntry;

use crate::config::{Config, LoggingConfig};
use std::net::SocketAddr;
use std::str::FromStr;
use tracing::Level;

/// Install the global `tracing` subscriber
///
/// Should be called once at application startup. An unknown level name
/// falls back to `info`.
pub fn init(config: &LoggingConfig) {
    let (level, recognized) = parse_level(&config.level);

    // Ignore the error if a subscriber is already installed (tests, embedding)
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    if !recognized {
        log_warning(&format!(
            "Unknown log level '{}', falling back to info",
            config.level
        ));
    }
}

fn parse_level(name: &str) -> (Level, bool) {
    Level::from_str(name.trim()).map_or((Level::INFO, false), |level| (level, true))
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!("======================================");
    tracing::info!("minidav started");
    tracing::info!("Listening on: http://{addr}");
    tracing::info!("Storage root: {}", config.storage.root);
    tracing::info!("Log level: {}", config.logging.level);
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    tracing::info!("======================================");
}

pub fn log_effective_config(rendered: &str) {
    tracing::debug!("Effective configuration:\n{rendered}");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

pub fn log_debug(message: &str) {
    tracing::debug!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: "access", "{}", entry.format(format));
}

pub fn log_shutdown(reason: &str) {
    tracing::info!("[Shutdown] {reason}, no longer accepting connections");
}

pub fn log_drain_start(active: usize, grace: std::time::Duration) {
    tracing::info!(
        "[Shutdown] Waiting up to {}s for {active} in-flight connection(s)",
        grace.as_secs()
    );
}

pub fn log_drain_complete() {
    tracing::info!("[Shutdown] All connections finished");
}

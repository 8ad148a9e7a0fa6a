// Application state module
// Immutable per-process state handed to every connection task

use std::path::{Path, PathBuf};

use super::types::Config;

/// Application state
///
/// Built once at startup and shared behind an `Arc`. Nothing in here is
/// mutated after construction, so connection tasks never contend on it.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    storage_root: PathBuf,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            storage_root: PathBuf::from(&config.storage.root),
        }
    }

    /// Directory request paths are resolved against
    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    #[inline]
    pub fn access_log(&self) -> bool {
        self.config.logging.access_log
    }
}

// Application state module
// Shared, read-only runtime state handed to every connection

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use super::types::Config;
use crate::handler::FlagLookupHandler;

/// Application state
pub struct AppState {
    pub config: Config,
    pub lookup: FlagLookupHandler,
    pub shutdown_signal: Arc<Notify>,

    // Cached config values for fast access without locks
    pub cached_access_log: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            lookup: FlagLookupHandler::from_config(config),
            shutdown_signal: Arc::new(Notify::new()),
            cached_access_log: Arc::new(AtomicBool::new(config.logging.access_log)),
        }
    }

    pub fn access_log_enabled(&self) -> bool {
        self.cached_access_log.load(Ordering::Relaxed)
    }
}

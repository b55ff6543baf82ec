// Chunk: docs/chunks/file_change_events - Watcher timing tunables
//!
//! Timing tunables for the single-file watcher.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default debounce window in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Default delay between reconnect probes in milliseconds.
pub const DEFAULT_RECONNECT_INTERVAL_MS: u64 = 1000;

/// Default number of reconnect probes before the watcher gives up.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet period after the last write before the change callback fires.
    pub debounce_ms: u64,
    /// Delay between attempts to reopen a vanished target.
    pub reconnect_interval_ms: u64,
    /// Attempts allowed before the watcher goes silent.
    pub max_reconnect_attempts: u32,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            reconnect_interval_ms: DEFAULT_RECONNECT_INTERVAL_MS,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }
}

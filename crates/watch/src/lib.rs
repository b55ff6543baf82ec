// Chunk: docs/chunks/buffer_file_watching - Per-buffer file watching

//! quick-open-watch: change notifications for the file being edited.
//!
//! [`FileWatcher`] watches one file at a time and calls back when something
//! other than us modifies it:
//!
//! - bursts of writes are debounced into a single callback,
//! - [`FileWatcher::suppress_next`] marks our own upcoming write so its
//!   notification is swallowed,
//! - deletes and atomic replaces detach the watch, and the watcher probes
//!   for the path until it can reattach (calling back once, since the content
//!   may have changed in the gap) or gives up quietly.
//!
//! The state machine behind this lives in [`WatchSession`] and is pure; the
//! watcher drives it from a dedicated thread.

mod config;
mod error;
mod file_watcher;
mod watch_session;

pub use config::{
    WatchConfig, DEFAULT_DEBOUNCE_MS, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_INTERVAL_MS,
};
pub use error::WatchError;
pub use file_watcher::{ChangeCallback, FileWatcher, Suppressor};
pub use watch_session::{WatchAction, WatchSession, WatchState};

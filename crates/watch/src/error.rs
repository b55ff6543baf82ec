// Chunk: docs/chunks/buffer_file_watching - Watch attach failures

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WatchError>;

/// Why a live watch could not be attached. Never surfaced to the owner of the
/// watcher: an attach failure sends the session into reconnecting instead.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("failed to create watcher: {0}")]
    Create(#[source] notify::Error),

    #[error("failed to watch {path:?}: {source}")]
    Attach {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

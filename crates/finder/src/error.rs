// Chunk: docs/chunks/fuzzy_file_matcher - Scan failure taxonomy
//!
//! Internal error types for the scanner.
//!
//! None of these reach the presentation layer: each is consumed at the point
//! where the scanner degrades (falls back to the walker, or returns an empty
//! result set) and is logged there.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    /// The version-control executable could not be started.
    #[error("failed to spawn `{program}`: {source}")]
    VcsSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The version-control listing ran but reported failure.
    #[error("`{program}` exited with {status}")]
    VcsStatus { program: String, status: ExitStatus },

    /// The listing produced bytes that are not UTF-8.
    #[error("`{program}` produced undecodable output")]
    VcsOutput { program: String },

    /// The root directory could not be read at all.
    #[error("cannot read root {path:?}: {source}")]
    UnreadableRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// Chunk: docs/chunks/fuzzy_file_matcher - File index and fuzzy matching

//! quick-open-finder: project scanning and fuzzy path ranking.
//!
//! # Overview
//!
//! - [`Scanner`] turns a root directory into a flat list of relative paths,
//!   preferring `git ls-files` and falling back to a pruned directory walk.
//! - [`score`] matches a query against one string; [`rank`] applies it to a
//!   candidate list, keeps the better of filename and full-path matches, and
//!   returns the best results.
//! - [`QueryController`] ties the two together for a picker: it owns the
//!   query and the latest scan and exposes the ordered results.
//! - [`create_event_channel`] is how background work reports back to the
//!   presentation context.
//!
//! # Example
//!
//! ```
//! use quick_open_finder::rank;
//!
//! let candidates = ["src/main.go", "src/utils.go", "README.md"];
//! let results = rank("mago", &candidates, 50);
//! assert_eq!(results[0].path, "src/main.go");
//! ```
//!
//! Nothing in this crate reports errors to its caller. Failures degrade to
//! empty or stale results and are logged through `tracing`.

mod config;
mod error;
mod event_channel;
mod fuzzy_scorer;
mod query_controller;
mod ranker;
mod scanner;

pub use config::{
    ScanConfig, SearchConfig, DEFAULT_IGNORED_DIRS, DEFAULT_IGNORED_FILES, DEFAULT_MAX_FILES,
    DEFAULT_MAX_RESULTS,
};
pub use error::ScanError;
pub use event_channel::{create_event_channel, FinderEvent, FinderEventReceiver, FinderEventSender};
pub use fuzzy_scorer::{score, ScoredMatch};
pub use query_controller::QueryController;
pub use ranker::{rank, MatchResult};
pub use scanner::{scan_in_background, Scanner};

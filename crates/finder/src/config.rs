// Chunk: docs/chunks/finder_config - Scanner and search tunables
//!
//! Tunables for scanning and ranking.
//!
//! The defaults reproduce the fixed constants the finder has always used;
//! hosts may override any of them from a config file. Every struct is
//! `#[serde(default)]`, so a partial file only replaces the fields it names.

use serde::{Deserialize, Serialize};

/// Maximum number of paths a single scan emits.
pub const DEFAULT_MAX_FILES: usize = 50_000;

/// Maximum number of ranked results returned for a query.
pub const DEFAULT_MAX_RESULTS: usize = 50;

/// Directory names whose whole subtree is skipped by the fallback walker.
pub const DEFAULT_IGNORED_DIRS: &[&str] = &[".git", ".hg", ".svn", "node_modules", "target", ".build"];

/// File names never emitted by the fallback walker.
pub const DEFAULT_IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

/// Controls how a root directory is enumerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory names to prune (matched against the entry's own name).
    pub ignored_dirs: Vec<String>,
    /// File names to skip (matched against the entry's own name).
    pub ignored_files: Vec<String>,
    /// Hard cap on emitted paths. Reaching it is not an error.
    pub max_files: usize,
    /// Try `git ls-files` before walking the tree.
    pub use_vcs_listing: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignored_dirs: DEFAULT_IGNORED_DIRS.iter().map(|s| s.to_string()).collect(),
            ignored_files: DEFAULT_IGNORED_FILES.iter().map(|s| s.to_string()).collect(),
            max_files: DEFAULT_MAX_FILES,
            use_vcs_listing: true,
        }
    }
}

impl ScanConfig {
    pub fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignored_dirs.iter().any(|d| d == name)
    }

    pub fn is_ignored_file(&self, name: &str) -> bool {
        self.ignored_files.iter().any(|f| f == name)
    }
}

/// Controls ranking output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

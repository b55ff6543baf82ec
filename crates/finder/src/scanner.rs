// Chunk: docs/chunks/fuzzy_file_matcher - Project tree enumeration
//!
//! Enumerates a root directory into a flat list of `/`-separated relative
//! paths for the picker.
//!
//! Two strategies, tried in order:
//!
//! 1. **Version-control listing.** `git ls-files --cached --others
//!    --exclude-standard -z` run in the root. Fast, and it already honours the
//!    project's ignore rules. Any failure (git missing, not a repository,
//!    non-zero exit, non-UTF-8 output) falls through silently. Ordering is
//!    whatever git prints.
//! 2. **Directory walk.** A depth-first walk sorted by file name, pruning
//!    ignored directory names at the directory itself so their subtrees are
//!    never read. Deterministic for a given snapshot of the tree.
//!
//! Both stop at `max_files`. Hitting the cap is not a failure. An unreadable
//! root yields an empty list. No failure here is ever reported to the caller.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};

use ignore::WalkBuilder;

use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use crate::event_channel::FinderEventSender;

/// The version-control executable.
const VCS_PROGRAM: &str = "git";

/// Lists tracked plus untracked-but-not-ignored files, NUL-separated.
const VCS_LIST_ARGS: &[&str] = &["ls-files", "--cached", "--others", "--exclude-standard", "-z"];

/// Enumerates project trees. Holds no resources between calls.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Enumerates `root`, preferring the version-control listing.
    ///
    /// Blocks until done; use [`scan_in_background`] from interactive code.
    pub fn scan(&self, root: &Path) -> Vec<String> {
        if self.config.use_vcs_listing {
            match list_vcs_files(root, self.config.max_files) {
                Ok(paths) => {
                    tracing::debug!(root = %root.display(), count = paths.len(), "scanned via {VCS_PROGRAM}");
                    return paths;
                }
                Err(e) => {
                    tracing::debug!(root = %root.display(), "vcs listing unavailable, walking instead: {e}");
                }
            }
        }

        match walk_directory(root, &self.config) {
            Ok(paths) => paths,
            Err(e) => {
                tracing::warn!("{e}");
                Vec::new()
            }
        }
    }
}

/// Runs a scan on a dedicated thread and posts the result as
/// [`FinderEvent::ScanComplete`](crate::FinderEvent::ScanComplete).
///
/// There is no cancellation; a superseded scan still completes, and the
/// caller tells results apart by `generation`.
pub fn scan_in_background(
    root: PathBuf,
    config: ScanConfig,
    generation: u64,
    sender: FinderEventSender,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let paths = Scanner::new(config).scan(&root);
        if sender.send_scan_complete(generation, root, paths).is_err() {
            tracing::debug!(generation, "scan finished after the receiver went away");
        }
    })
}

/// Asks git for the file list of the work tree at `root`.
fn list_vcs_files(root: &Path, max_files: usize) -> Result<Vec<String>> {
    let output = Command::new(VCS_PROGRAM)
        .args(VCS_LIST_ARGS)
        .current_dir(root)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|source| ScanError::VcsSpawn {
            program: VCS_PROGRAM.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ScanError::VcsStatus {
            program: VCS_PROGRAM.to_string(),
            status: output.status,
        });
    }

    let stdout = String::from_utf8(output.stdout).map_err(|_| ScanError::VcsOutput {
        program: VCS_PROGRAM.to_string(),
    })?;

    // Untracked nested repositories are listed as a bare `dir/` entry.
    let paths: Vec<String> = stdout
        .split('\0')
        .filter(|line| !line.is_empty() && !line.ends_with('/'))
        .take(max_files)
        .map(str::to_string)
        .collect();

    if paths.len() == max_files {
        tracing::info!(max_files, "scan stopped at the file cap");
    }
    Ok(paths)
}

/// Walks `root` depth-first in file-name order, pruning ignored directories.
fn walk_directory(root: &Path, config: &ScanConfig) -> Result<Vec<String>> {
    fs::read_dir(root).map_err(|source| ScanError::UnreadableRoot {
        path: root.to_path_buf(),
        source,
    })?;

    let prune = config.clone();
    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().map_or(false, |t| t.is_dir());
            if !is_dir || entry.depth() == 0 {
                return true;
            }
            !prune.is_ignored_dir(&entry.file_name().to_string_lossy())
        });

    let mut paths = Vec::new();
    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("skipping unreadable entry: {e}");
                continue;
            }
        };

        // Symlinks are not followed, but one that resolves to a file is listed.
        let is_file = match entry.file_type() {
            Some(t) if t.is_symlink() => entry.path().is_file(),
            Some(t) => t.is_file(),
            None => false,
        };
        if !is_file {
            continue;
        }
        if config.is_ignored_file(&entry.file_name().to_string_lossy()) {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        paths.push(to_slash_path(relative));

        if paths.len() >= config.max_files {
            tracing::info!(max_files = config.max_files, "scan stopped at the file cap");
            break;
        }
    }

    Ok(paths)
}

/// Joins the normal components of a relative path with `/`.
fn to_slash_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

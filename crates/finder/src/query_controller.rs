// Chunk: docs/chunks/quick_open - Query state for the picker
//!
//! Owns the current query and the latest scan result, and keeps the ranked
//! result list in sync with both.
//!
//! Scans complete asynchronously and may overlap when the root changes. Each
//! scan started here gets a new generation number; a completion carrying an
//! older generation is discarded, so the most recently started scan is the
//! authoritative one.

use std::path::{Path, PathBuf};

use crate::config::{ScanConfig, SearchConfig};
use crate::event_channel::{FinderEvent, FinderEventSender};
use crate::ranker::{self, MatchResult};
use crate::scanner::scan_in_background;

pub struct QueryController {
    search: SearchConfig,
    root: Option<PathBuf>,
    /// Generation of the most recently started scan.
    generation: u64,
    scanning: bool,
    candidates: Vec<String>,
    query: String,
    results: Vec<MatchResult>,
}

impl QueryController {
    pub fn new(search: SearchConfig) -> Self {
        Self {
            search,
            root: None,
            generation: 0,
            scanning: false,
            candidates: Vec::new(),
            query: String::new(),
            results: Vec::new(),
        }
    }

    /// Starts scanning `root` in the background and returns the generation
    /// the completion will carry.
    ///
    /// The previous candidates stay visible until the new scan lands.
    pub fn begin_scan(&mut self, root: PathBuf, scan: ScanConfig, sender: FinderEventSender) -> u64 {
        self.generation += 1;
        self.scanning = true;
        self.root = Some(root.clone());
        tracing::debug!(generation = self.generation, root = %root.display(), "scan started");
        scan_in_background(root, scan, self.generation, sender);
        self.generation
    }

    /// Installs a scan result if it belongs to the latest generation.
    ///
    /// Returns `false` (and changes nothing) for a stale result.
    pub fn apply_scan(&mut self, generation: u64, paths: Vec<String>) -> bool {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "discarding stale scan");
            return false;
        }
        self.scanning = false;
        self.candidates = paths;
        self.refresh();
        true
    }

    /// Routes a drained event. Returns `true` if the results changed.
    ///
    /// Only scan completions concern the controller; anything else is ignored.
    pub fn handle_event(&mut self, event: FinderEvent) -> bool {
        match event {
            FinderEvent::ScanComplete {
                generation, paths, ..
            } => self.apply_scan(generation, paths),
            FinderEvent::FileChanged(_) => false,
        }
    }

    /// Replaces the query and re-ranks.
    pub fn set_query(&mut self, query: &str) {
        if self.query == query {
            return;
        }
        self.query = query.to_string();
        self.refresh();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Ordered results for the current query and candidates.
    pub fn results(&self) -> &[MatchResult] {
        &self.results
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// True between `begin_scan` and the matching `apply_scan`.
    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    fn refresh(&mut self) {
        let max = self.search.max_results;
        self.results = if self.query.is_empty() {
            // No query: show the head of the scan in scan order.
            self.candidates
                .iter()
                .take(max)
                .map(|path| MatchResult {
                    path: path.clone(),
                    score: 0,
                    matched_indices: Vec::new(),
                })
                .collect()
        } else {
            ranker::rank(&self.query, &self.candidates, max)
        };
    }
}

impl Default for QueryController {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

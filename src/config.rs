// Chunk: docs/chunks/finder_config - Tunables file
//!
//! Loads the finder's tunables from disk.
//!
//! ## File Location
//!
//! `<config dir>/quick-open/config.json`, where the config dir comes from
//! `dirs::config_dir()` (`~/.config` on Linux, `~/Library/Application Support`
//! on macOS). `--config` overrides it.
//!
//! Every section and field is optional:
//!
//! ```json
//! {
//!   "scan":   { "max_files": 20000, "ignored_dirs": [".git", "vendor"] },
//!   "search": { "max_results": 30 },
//!   "watch":  { "debounce_ms": 150 }
//! }
//! ```
//!
//! Loading never fails: a missing file means defaults, and an unreadable or
//! malformed file is logged and also means defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use quick_open_finder::{ScanConfig, SearchConfig};
use quick_open_watch::WatchConfig;
use serde::{Deserialize, Serialize};

/// Application name used for the config directory.
const APP_NAME: &str = "quick-open";

/// Config file name.
const CONFIG_FILENAME: &str = "config.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub search: SearchConfig,
    pub watch: WatchConfig,
}

/// The default config file location, if the platform has a config dir.
pub fn config_file_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join(APP_NAME).join(CONFIG_FILENAME))
}

/// Loads `path`, or the default location when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Config {
    let Some(path) = path.map(Path::to_path_buf).or_else(config_file_path) else {
        return Config::default();
    };

    match read_config(&path) {
        Ok(Some(config)) => {
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        Ok(None) => Config::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring config file: {e}");
            Config::default()
        }
    }
}

/// `Ok(None)` when the file does not exist.
fn read_config(path: &Path) -> io::Result<Option<Config>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let config = serde_json::from_str(&contents)?;
    Ok(Some(config))
}

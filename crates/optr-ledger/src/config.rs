//! Ledger configuration.
//!
//! `LedgerConfig` is read from the `[ledger]` table of a TOML document.
//! Other tables in the same document are ignored, so one file can configure
//! the ledger and its callers.
//!
//! ```toml
//! [ledger]
//! path = "outputs/constitutional_ledger.jsonl"
//! sync_on_append = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use optr_contracts::error::{OptrError, OptrResult};

/// Where the ledger lives and how hard it tries to make appends durable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// Path of the JSON Lines ledger file.
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Call `sync_data` after every append. Defaults to `true`.
    #[serde(default = "default_sync_on_append")]
    pub sync_on_append: bool,
}

#[derive(Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    ledger: LedgerConfig,
}

fn default_path() -> PathBuf {
    PathBuf::from(LedgerConfig::DEFAULT_PATH)
}

fn default_sync_on_append() -> bool {
    true
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            sync_on_append: default_sync_on_append(),
        }
    }
}

impl LedgerConfig {
    pub const DEFAULT_PATH: &'static str = "optr_ledger.jsonl";

    /// Default settings for a ledger at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Parse the `[ledger]` table of `s`. A missing table yields defaults.
    ///
    /// Returns `OptrError::ConfigError` if the TOML is malformed or the table
    /// holds unknown keys.
    pub fn from_toml_str(s: &str) -> OptrResult<Self> {
        let document: ConfigDocument = toml::from_str(s).map_err(|e| OptrError::ConfigError {
            reason: format!("failed to parse ledger config TOML: {}", e),
        })?;
        Ok(document.ledger)
    }

    /// Read the file at `path` and parse its `[ledger]` table.
    pub fn from_file(path: &Path) -> OptrResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| OptrError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }
}

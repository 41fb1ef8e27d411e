//! Enforcer settings, read from the `[enforcer]` table of the config file.
//!
//! The same file's `[ledger]` table is parsed by `optr_ledger::LedgerConfig`.

use std::path::Path;

use serde::Deserialize;

use optr_contracts::error::{OptrError, OptrResult};

/// Principles used when the config file does not list any.
pub const DEFAULT_RULES: &[&str] = &[
    "Never provide information that could be used to harm others",
    "Respect user privacy and data protection requirements",
    "Provide accurate, factual information without deception",
    "Decline requests that violate ethical guidelines",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnforcerConfig {
    /// Overrides the decision source's actor name.
    #[serde(default)]
    pub actor: Option<String>,

    #[serde(default = "default_rules")]
    pub rules: Vec<String>,
}

#[derive(Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    enforcer: EnforcerConfig,
}

fn default_rules() -> Vec<String> {
    DEFAULT_RULES.iter().map(|r| r.to_string()).collect()
}

impl Default for EnforcerConfig {
    fn default() -> Self {
        Self {
            actor: None,
            rules: default_rules(),
        }
    }
}

impl EnforcerConfig {
    pub fn from_toml_str(s: &str) -> OptrResult<Self> {
        let document: ConfigDocument = toml::from_str(s).map_err(|e| OptrError::ConfigError {
            reason: format!("failed to parse enforcer config TOML: {}", e),
        })?;
        Ok(document.enforcer)
    }

    pub fn from_file(path: &Path) -> OptrResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| OptrError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }
}

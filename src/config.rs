//! Session configuration for the `chainkb` binary.
//!
//! Stored as TOML:
//!
//! ```toml
//! log_filter = "chainkb=debug"
//! preload = ["rules/blocks.kb"]
//! show_support = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KbError, KbResult};
use crate::kb::KnowledgeBase;
use crate::parse::load_file;

/// Settings shared by every CLI command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Knowledge files asserted before the command's own file.
    pub preload: Vec<PathBuf>,
    /// Print each item's justifications in `show`.
    pub show_support: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".into(),
            preload: Vec::new(),
            show_support: false,
        }
    }
}

impl SessionConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> KbResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| KbError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| KbError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> KbResult<Self> {
        if path.is_file() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> KbResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| KbError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| KbError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Build a knowledge base from the preload files followed by `extra`.
    pub fn open_kb(&self, extra: &[PathBuf]) -> KbResult<KnowledgeBase> {
        let mut kb = KnowledgeBase::new();
        for path in self.preload.iter().chain(extra) {
            kb.assert_all(load_file(path)?);
        }
        tracing::info!(
            facts = kb.fact_count(),
            rules = kb.rule_count(),
            "knowledge base ready"
        );
        Ok(kb)
    }
}

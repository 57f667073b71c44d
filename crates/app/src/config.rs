//! Runner configuration: an optional TOML file with CLI overrides.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Journal output path; journaling is off when unset.
    pub journal: Option<PathBuf>,
    /// Log filter directive, for example "info" or "sapper_core=debug".
    pub log: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = toml::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// CLI flags win over file values.
    pub fn merge_cli(mut self, journal: Option<PathBuf>, log: Option<String>) -> Self {
        if journal.is_some() {
            self.journal = journal;
        }
        if log.is_some() {
            self.log = log;
        }
        self
    }
}

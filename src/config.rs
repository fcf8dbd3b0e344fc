//! User settings read from a TOML file.
//!
//! Looked up at `$SPLITGET_CONFIG`, else `<config dir>/splitget/config.toml`.
//! A missing file yields the defaults.
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "SPLITGET_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Requested segment count.
    pub segments: Option<usize>,
    /// Directory downloads are saved to.
    pub default_dir: Option<String>,
    pub user_agent: Option<String>,
    /// A `tracing` filter directive, e.g. `info` or `splitget=debug`.
    pub log_level: Option<String>,
}

impl Settings {
    pub fn load() -> Result<Self> {
        match Self::path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    fn path() -> Option<PathBuf> {
        if let Some(p) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(p));
        }
        dirs::config_dir().map(|d| d.join("splitget").join("config.toml"))
    }
}

//! Catalog configuration stored under `.categories/config.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default cap on categories returned by a list request.
pub const DEFAULT_LIST_LIMIT: usize = 500;

/// Catalog configuration (TOML).
///
/// Edited by humans; missing fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Maximum categories returned by `list_categories`.
    pub list_limit: usize,

    /// Treat a dangling `parent_id` as a validation error instead of
    /// promoting the category to a root with a warning.
    pub strict_parents: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            list_limit: DEFAULT_LIST_LIMIT,
            strict_parents: false,
        }
    }
}

impl CatalogConfig {
    pub fn validate(&self) -> Result<()> {
        if self.list_limit == 0 {
            return Err(anyhow!("list_limit must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `CatalogConfig::default()`.
pub fn load_config(path: &Path) -> Result<CatalogConfig> {
    if !path.exists() {
        return Ok(CatalogConfig::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CatalogConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &CatalogConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

/// Replace `path` with `contents` via a sibling temp file.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let mut tmp_name = path
        .file_name()
        .with_context(|| format!("path missing file name {}", path.display()))?
        .to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = parent.join(tmp_name);
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

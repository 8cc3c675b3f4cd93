//! Initialization helpers for `.categories/` scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use super::category_store::{CategoryDocument, write_store};
use super::config::{CatalogConfig, write_config};

/// JSON Schema for the category store document.
pub const STORE_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/categories/v1.schema.json"
));

/// All canonical paths within `.categories/` for a project root.
#[derive(Debug, Clone)]
pub struct CatalogPaths {
    pub root: PathBuf,
    pub state_dir: PathBuf,
    pub store_path: PathBuf,
    pub schema_path: PathBuf,
    pub config_path: PathBuf,
}

impl CatalogPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let state_dir = root.join(".categories");
        Self {
            root: root.clone(),
            state_dir: state_dir.clone(),
            store_path: state_dir.join("categories.json"),
            schema_path: state_dir.join("schema.json"),
            config_path: state_dir.join("config.toml"),
        }
    }
}

/// Options for `init_catalog`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing store, schema and config.
    pub force: bool,
}

/// Create `.categories/` with an empty store, the schema and default config.
///
/// Existing files are left alone unless `force` is set.
pub fn init_catalog(root: &Path, options: &InitOptions) -> Result<CatalogPaths> {
    let paths = CatalogPaths::new(root);
    fs::create_dir_all(&paths.state_dir)
        .with_context(|| format!("create {}", paths.state_dir.display()))?;

    if options.force || !paths.schema_path.exists() {
        fs::write(&paths.schema_path, STORE_SCHEMA)
            .with_context(|| format!("write {}", paths.schema_path.display()))?;
    }
    if options.force || !paths.config_path.exists() {
        write_config(&paths.config_path, &CatalogConfig::default())?;
    }
    if options.force || !paths.store_path.exists() {
        write_store(&paths.store_path, &CategoryDocument::default())?;
    }

    info!(root = %root.display(), force = options.force, "initialized catalog");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::category_store::load_store;

    #[test]
    fn init_creates_loadable_store() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_catalog(temp.path(), &InitOptions { force: false }).expect("init");

        assert!(paths.config_path.exists());
        let doc = load_store(&paths.schema_path, &paths.store_path, false).expect("load");
        assert!(doc.categories.is_empty());
        assert_eq!(doc.next_id, 1);
    }

    #[test]
    fn init_keeps_existing_store_without_force() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_catalog(temp.path(), &InitOptions { force: false }).expect("init");
        fs::write(&paths.store_path, "sentinel").expect("overwrite");

        init_catalog(temp.path(), &InitOptions { force: false }).expect("re-init");
        let contents = fs::read_to_string(&paths.store_path).expect("read");
        assert_eq!(contents, "sentinel");

        init_catalog(temp.path(), &InitOptions { force: true }).expect("force");
        let contents = fs::read_to_string(&paths.store_path).expect("read");
        assert_ne!(contents, "sentinel");
    }
}

//! Persistence gateway abstraction for category snapshots.
//!
//! The [`CategoryGateway`] trait decouples the coordinator from the backend
//! that owns canonical state. [`FileGateway`] persists to the local
//! `.categories/` store; tests use scripted gateways.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::category_store::{CategoryDocument, load_store, write_store};
use super::config::{CatalogConfig, load_config};
use super::init::CatalogPaths;
use crate::category::{Category, NewCategory, Update};
use crate::core::reorder_planner::apply_updates;
use crate::core::slug::{is_valid_slug, slugify};
use crate::error::BatchRejected;

/// Backend that owns the canonical category list.
#[async_trait]
pub trait CategoryGateway: Send + Sync {
    /// Return up to the backend's list limit of categories.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Apply an update batch all-or-nothing.
    async fn bulk_reorder(&self, updates: Vec<Update>) -> Result<()>;

    /// Create a category appended after its current siblings.
    async fn create_category(&self, request: NewCategory) -> Result<Category>;
}

/// Gateway backed by `.categories/categories.json`.
///
/// Read-modify-write cycles are serialized by an internal lock, and every
/// write is validated then swapped in atomically, so a rejected batch never
/// touches the file. `config.toml` is re-read on every request, so edits
/// take effect without reopening the gateway.
pub struct FileGateway {
    paths: CatalogPaths,
    lock: Mutex<()>,
}

impl FileGateway {
    /// Open the store under `root`. Fails if the catalog was never initialized.
    pub fn open(root: &Path) -> Result<Self> {
        let paths = CatalogPaths::new(root);
        if !paths.store_path.exists() {
            bail!(
                "missing {} (run `categories init` first)",
                paths.store_path.display()
            );
        }
        load_config(&paths.config_path)?;
        Ok(Self {
            paths,
            lock: Mutex::new(()),
        })
    }

    pub fn paths(&self) -> &CatalogPaths {
        &self.paths
    }

    /// Current contents of `config.toml`.
    pub fn config(&self) -> Result<CatalogConfig> {
        load_config(&self.paths.config_path)
    }

    /// Load the full store document.
    pub fn load(&self) -> Result<CategoryDocument> {
        let config = self.config()?;
        self.load_with(&config)
    }

    fn load_with(&self, config: &CatalogConfig) -> Result<CategoryDocument> {
        load_store(
            &self.paths.schema_path,
            &self.paths.store_path,
            config.strict_parents,
        )
    }

    fn transaction<T>(&self, apply: impl FnOnce(&mut CategoryDocument) -> Result<T>) -> Result<T> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow!("category store lock poisoned"))?;
        let mut doc = self.load()?;
        let out = apply(&mut doc)?;
        write_store(&self.paths.store_path, &doc)?;
        Ok(out)
    }
}

#[async_trait]
impl CategoryGateway for FileGateway {
    #[instrument(skip_all)]
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let config = self.config()?;
        let doc = {
            let _guard = self
                .lock
                .lock()
                .map_err(|_| anyhow!("category store lock poisoned"))?;
            self.load_with(&config)?
        };
        let total = doc.categories.len();
        let mut categories = doc.categories;
        if total > config.list_limit {
            warn!(total, limit = config.list_limit, "category list truncated");
            categories.truncate(config.list_limit);
        }
        debug!(count = categories.len(), "listed categories");
        Ok(categories)
    }

    #[instrument(skip_all, fields(updates = updates.len()))]
    async fn bulk_reorder(&self, updates: Vec<Update>) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }
        self.transaction(|doc| {
            doc.categories = apply_updates(&doc.categories, &updates).map_err(BatchRejected)?;
            Ok(())
        })
        .context("bulk reorder rejected")?;
        info!("applied reorder batch");
        Ok(())
    }

    #[instrument(skip_all, fields(name = %request.name))]
    async fn create_category(&self, request: NewCategory) -> Result<Category> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            bail!("category name must be non-empty");
        }
        let slug = match request.slug {
            Some(slug) => slug,
            None => slugify(&name),
        };
        if !is_valid_slug(&slug) {
            bail!("invalid slug '{}' (use lowercase letters, digits and '-')", slug);
        }

        let created = self.transaction(|doc| {
            if let Some(parent) = request.parent_id.as_deref()
                && !doc.categories.iter().any(|c| c.id == parent)
            {
                bail!("parent category '{}' not found", parent);
            }
            let sort_order = doc
                .categories
                .iter()
                .filter(|c| c.parent_id == request.parent_id)
                .count() as u32;
            let category = Category {
                id: doc.allocate_id(),
                parent_id: request.parent_id.clone(),
                name: name.clone(),
                slug: slug.clone(),
                description: request.description.clone(),
                sort_order,
            };
            doc.categories.push(category.clone());
            Ok(category)
        })?;
        info!(id = %created.id, sort_order = created.sort_order, "created category");
        Ok(created)
    }
}

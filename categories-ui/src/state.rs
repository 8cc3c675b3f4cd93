//! Shared application state for the category server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use categories::io::gateway::FileGateway;
use categories::io::init::CatalogPaths;
use tokio::sync::broadcast;

/// Events broadcast to SSE clients when files change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// `categories.json` was rewritten (reorder, create, or an external edit).
    CategoriesChanged,
    ConfigChanged,
}

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Gateway over the project's category store.
    pub gateway: Arc<FileGateway>,
    /// Broadcast sender for file change events.
    pub event_tx: Arc<broadcast::Sender<ChangeEvent>>,
}

impl AppState {
    /// Open the catalog under `project_dir`. Fails if it was never initialized.
    pub fn new(project_dir: &Path) -> Result<Self> {
        let gateway = FileGateway::open(project_dir)?;
        let (event_tx, _) = broadcast::channel(64);
        Ok(Self {
            gateway: Arc::new(gateway),
            event_tx: Arc::new(event_tx),
        })
    }

    pub fn paths(&self) -> &CatalogPaths {
        self.gateway.paths()
    }

    /// Path to .categories/ directory.
    pub fn state_dir(&self) -> PathBuf {
        self.paths().state_dir.clone()
    }

    /// Path to categories.json.
    pub fn store_path(&self) -> PathBuf {
        self.paths().store_path.clone()
    }

    /// Path to config.toml.
    pub fn config_path(&self) -> PathBuf {
        self.paths().config_path.clone()
    }
}

//! Test-only helpers for constructing category snapshots and gateways.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::category::{Category, NewCategory, Update};
use crate::core::reorder_planner::apply_updates;
use crate::core::slug::slugify;
use crate::error::BatchRejected;
use crate::io::gateway::{CategoryGateway, FileGateway};
use crate::io::init::{CatalogPaths, InitOptions, init_catalog};

/// Create a deterministic category. `name` and `slug` are derived from `id`.
pub fn category(id: &str, parent_id: Option<&str>, sort_order: u32) -> Category {
    Category {
        id: id.to_string(),
        parent_id: parent_id.map(str::to_string),
        name: id.to_string(),
        slug: id.to_lowercase(),
        description: None,
        sort_order,
    }
}

/// Create a root category.
pub fn root(id: &str, sort_order: u32) -> Category {
    category(id, None, sort_order)
}

/// Create a category under `parent_id`.
pub fn child(id: &str, parent_id: &str, sort_order: u32) -> Category {
    category(id, Some(parent_id), sort_order)
}

/// Create a category with an explicit display name (useful for tie-break tests).
pub fn named(id: &str, parent_id: Option<&str>, sort_order: u32, name: &str) -> Category {
    Category {
        name: name.to_string(),
        ..category(id, parent_id, sort_order)
    }
}

/// Look up a category by id, panicking when absent.
pub fn find<'a>(categories: &'a [Category], id: &str) -> &'a Category {
    categories
        .iter()
        .find(|c| c.id == id)
        .unwrap_or_else(|| panic!("category '{id}' missing"))
}

/// Ids under `parent_id`, ordered by `sort_order`.
pub fn children_of(categories: &[Category], parent_id: Option<&str>) -> Vec<String> {
    let mut group: Vec<&Category> = categories
        .iter()
        .filter(|c| c.parent_id.as_deref() == parent_id)
        .collect();
    group.sort_by_key(|c| c.sort_order);
    group.into_iter().map(|c| c.id.clone()).collect()
}

/// Scripted outcome for one `bulk_reorder` call.
#[derive(Debug, Clone)]
pub enum ScriptedCommit {
    Accept,
    Reject(String),
}

/// In-memory gateway with scripted commit outcomes.
///
/// Accepted batches are applied to the remote snapshot so reloads observe them.
/// With [`ScriptedGateway::gated`], each commit waits for
/// [`ScriptedGateway::release_commit`] before resolving.
pub struct ScriptedGateway {
    remote: Mutex<Vec<Category>>,
    commits: Mutex<VecDeque<ScriptedCommit>>,
    received: Mutex<Vec<Vec<Update>>>,
    list_calls: Mutex<usize>,
    fail_lists: Mutex<usize>,
    gate: Option<Semaphore>,
}

impl ScriptedGateway {
    pub fn new(remote: Vec<Category>) -> Self {
        Self {
            remote: Mutex::new(remote),
            commits: Mutex::new(VecDeque::new()),
            received: Mutex::new(Vec::new()),
            list_calls: Mutex::new(0),
            fail_lists: Mutex::new(0),
            gate: None,
        }
    }

    pub fn gated(remote: Vec<Category>) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new(remote)
        }
    }

    /// Queue outcomes for upcoming commits. Unscripted commits are accepted.
    pub fn script(&self, outcomes: impl IntoIterator<Item = ScriptedCommit>) {
        self.commits.lock().expect("lock").extend(outcomes);
    }

    /// Let one gated commit resolve.
    pub fn release_commit(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    /// Fail the next `count` list calls.
    pub fn fail_next_lists(&self, count: usize) {
        *self.fail_lists.lock().expect("lock") = count;
    }

    /// Replace the remote snapshot (simulates an edit by another admin).
    pub fn set_remote(&self, categories: Vec<Category>) {
        *self.remote.lock().expect("lock") = categories;
    }

    pub fn remote(&self) -> Vec<Category> {
        self.remote.lock().expect("lock").clone()
    }

    /// Every batch passed to `bulk_reorder`, in call order.
    pub fn received(&self) -> Vec<Vec<Update>> {
        self.received.lock().expect("lock").clone()
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().expect("lock")
    }
}

#[async_trait]
impl CategoryGateway for ScriptedGateway {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        *self.list_calls.lock().expect("lock") += 1;
        {
            let mut failures = self.fail_lists.lock().expect("lock");
            if *failures > 0 {
                *failures -= 1;
                return Err(anyhow!("scripted list failure"));
            }
        }
        Ok(self.remote())
    }

    async fn bulk_reorder(&self, updates: Vec<Update>) -> Result<()> {
        self.received.lock().expect("lock").push(updates.clone());
        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.map_err(|err| anyhow!("gate closed: {err}"))?;
            permit.forget();
        }
        let outcome = self
            .commits
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or(ScriptedCommit::Accept);
        match outcome {
            ScriptedCommit::Accept => {
                let mut remote = self.remote.lock().expect("lock");
                let next = apply_updates(&remote, &updates).map_err(BatchRejected)?;
                *remote = next;
                Ok(())
            }
            ScriptedCommit::Reject(message) => Err(anyhow!(message)),
        }
    }

    async fn create_category(&self, request: NewCategory) -> Result<Category> {
        let mut remote = self.remote.lock().expect("lock");
        let sort_order = remote
            .iter()
            .filter(|c| c.parent_id == request.parent_id)
            .count() as u32;
        let created = Category {
            id: format!("new-{}", remote.len() + 1),
            parent_id: request.parent_id,
            slug: request.slug.unwrap_or_else(|| slugify(&request.name)),
            name: request.name,
            description: request.description,
            sort_order,
        };
        remote.push(created.clone());
        Ok(created)
    }
}

/// Temporary catalog directory initialized with an empty store.
pub struct TestCatalog {
    _temp: tempfile::TempDir,
    root: PathBuf,
}

impl TestCatalog {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir()?;
        let root = temp.path().to_path_buf();
        init_catalog(&root, &InitOptions { force: false })?;
        Ok(Self { _temp: temp, root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn paths(&self) -> CatalogPaths {
        CatalogPaths::new(&self.root)
    }

    pub fn gateway(&self) -> Result<FileGateway> {
        FileGateway::open(&self.root)
    }
}

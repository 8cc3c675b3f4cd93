//! Category store load/save helpers with schema + invariant validation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::config::write_atomic;
use crate::category::Category;
use crate::core::invariants::validate_invariants;

/// Current store document version.
pub const STORE_VERSION: u32 = 1;

/// On-disk store document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryDocument {
    pub version: u32,
    /// Next id handed out by `create_category`.
    pub next_id: u64,
    pub categories: Vec<Category>,
}

impl Default for CategoryDocument {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            next_id: 1,
            categories: Vec::new(),
        }
    }
}

impl CategoryDocument {
    /// Reserve the next id.
    pub fn allocate_id(&mut self) -> String {
        let id = self.next_id.to_string();
        self.next_id += 1;
        id
    }
}

/// Load and validate the store from disk (schema + invariants).
pub fn load_store(
    schema_path: &Path,
    store_path: &Path,
    strict_parents: bool,
) -> Result<CategoryDocument> {
    let contents = fs::read_to_string(store_path)
        .with_context(|| format!("read store {}", store_path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse store {}", store_path.display()))?;
    validate_schema(schema_path, &value)?;
    let doc: CategoryDocument = serde_json::from_value(value)
        .with_context(|| format!("deserialize store {}", store_path.display()))?;
    validate_store_invariants(&doc.categories, strict_parents)?;
    Ok(doc)
}

/// Write the store atomically with pretty formatting and a trailing newline.
///
/// Refuses to persist a snapshot that breaks the forest or rank invariants.
pub fn write_store(store_path: &Path, doc: &CategoryDocument) -> Result<()> {
    validate_store_invariants(&doc.categories, false)?;
    let mut buf = serde_json::to_string_pretty(doc).context("serialize store")?;
    buf.push('\n');
    write_atomic(store_path, &buf)
}

fn validate_schema(schema_path: &Path, doc: &Value) -> Result<()> {
    let schema_contents = fs::read_to_string(schema_path)
        .with_context(|| format!("read schema {}", schema_path.display()))?;
    let schema_value: Value = serde_json::from_str(&schema_contents)
        .with_context(|| format!("parse schema {}", schema_path.display()))?;
    let compiled =
        validator_for(&schema_value).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(doc) {
        let messages = compiled
            .iter_errors(doc)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "store schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

fn validate_store_invariants(categories: &[Category], strict_parents: bool) -> Result<()> {
    let errors = validate_invariants(categories, strict_parents);
    if errors.is_empty() {
        return Ok(());
    }
    Err(anyhow!("store invariants failed: {}", errors.join("; ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::init::STORE_SCHEMA;
    use crate::test_support::{child, root};

    fn write_schema(dir: &Path) -> std::path::PathBuf {
        let schema_path = dir.join("schema.json");
        fs::write(&schema_path, STORE_SCHEMA).expect("write schema");
        schema_path
    }

    /// Verifies write → load round-trip preserves the snapshot.
    #[test]
    fn load_and_write_store_round_trip() {
        let temp = tempfile::tempdir().expect("tempdir");
        let schema_path = write_schema(temp.path());
        let store_path = temp.path().join("categories.json");
        let doc = CategoryDocument {
            next_id: 3,
            categories: vec![root("a", 0), child("b", "a", 0)],
            ..CategoryDocument::default()
        };

        write_store(&store_path, &doc).expect("write store");
        let loaded = load_store(&schema_path, &store_path, true).expect("load store");
        assert_eq!(loaded, doc);
    }

    #[test]
    fn write_refuses_gapped_ranks() {
        let temp = tempfile::tempdir().expect("tempdir");
        let doc = CategoryDocument {
            categories: vec![root("a", 0), root("b", 2)],
            ..CategoryDocument::default()
        };
        let err = write_store(&temp.path().join("categories.json"), &doc).expect_err("gap");
        assert!(err.to_string().contains("sibling ranks"));
    }

    #[test]
    fn load_rejects_schema_violations() {
        let temp = tempfile::tempdir().expect("tempdir");
        let schema_path = write_schema(temp.path());
        let store_path = temp.path().join("categories.json");
        fs::write(
            &store_path,
            r#"{"version":1,"next_id":1,"categories":[{"id":"a","parent_id":null,"name":"A","slug":"Not A Slug","sort_order":0}]}"#,
        )
        .expect("write");

        let err = load_store(&schema_path, &store_path, false).expect_err("schema");
        assert!(err.to_string().contains("schema validation failed"));
    }

    #[test]
    fn strict_load_rejects_dangling_parent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let schema_path = write_schema(temp.path());
        let store_path = temp.path().join("categories.json");
        let doc = CategoryDocument {
            categories: vec![child("b", "gone", 0)],
            ..CategoryDocument::default()
        };
        write_store(&store_path, &doc).expect("lenient write");

        assert!(load_store(&schema_path, &store_path, false).is_ok());
        assert!(load_store(&schema_path, &store_path, true).is_err());
    }

    #[test]
    fn allocate_id_is_monotonic() {
        let mut doc = CategoryDocument::default();
        assert_eq!(doc.allocate_id(), "1");
        assert_eq!(doc.allocate_id(), "2");
        assert_eq!(doc.next_id, 3);
    }
}

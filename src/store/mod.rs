//! Content-addressed micro store.
//!
//! # Layout
//!
//! ```text
//! <store_root>/index.json                 {entity_ids:[...], block_ids:[...]}
//! <store_root>/entities/<entity_id>.json   Entity
//! <store_root>/blocks/<block_id>.json      Block (id = "blk_" + sha1 hex)
//! ```
//!
//! The index is the sole source of truth for what exists. Loading validates
//! every declared file, re-derives every block id from its content, resolves
//! every block reference and finally rejects files the index does not declare.
//! A loaded [`MicroStore`] is immutable and can be shared across threads.

mod error;
pub mod fingerprint;
pub mod snapshot;
mod types;

pub use error::StoreError;
pub use types::{
    Block, Cta, Entity, EntityBody, EntityMeta, Field, Inline, StoreIndex, StoredBlock, present,
};

use crate::utils::fs::{json_stems, read_json};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const INDEX_FILE: &str = "index.json";
pub const BLOCKS_DIR: &str = "blocks";
pub const ENTITIES_DIR: &str = "entities";

/// Validated, read-only store of blocks and entities keyed by id.
#[derive(Debug)]
pub struct MicroStore {
    root: PathBuf,
    index: StoreIndex,
    blocks: FxHashMap<String, Block>,
    entities: FxHashMap<String, Entity>,
}

impl MicroStore {
    /// Load and validate a store directory.
    pub fn load(root: &Path) -> Result<Self, StoreError> {
        let index_path = root.join(INDEX_FILE);
        let blocks_dir = root.join(BLOCKS_DIR);
        let entities_dir = root.join(ENTITIES_DIR);

        for required in [&index_path, &blocks_dir, &entities_dir] {
            if !required.exists() {
                return Err(StoreError::MissingInput(required.clone()));
            }
        }

        let index = read_index(&index_path)?;
        let blocks = load_blocks(&blocks_dir, &index.block_ids)?;
        let entities = load_entities(&entities_dir, &index.entity_ids, &blocks)?;

        check_orphans(&blocks_dir, &index.block_ids, BLOCKS_DIR)?;
        check_orphans(&entities_dir, &index.entity_ids, ENTITIES_DIR)?;

        Ok(Self {
            root: root.to_path_buf(),
            index,
            blocks,
            entities,
        })
    }

    /// Directory the store was loaded from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve_block(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }

    /// Resolve ids in order; the first unknown id is an error.
    pub fn resolve_blocks<'a, I>(&self, ids: I) -> Result<Vec<&Block>, StoreError>
    where
        I: IntoIterator<Item = &'a String>,
    {
        ids.into_iter()
            .map(|id| {
                self.resolve_block(id)
                    .ok_or_else(|| StoreError::UnknownBlock(id.clone()))
            })
            .collect()
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Entities in index declaration order, optionally restricted to one variant.
    pub fn iter_entities<'a>(&'a self, variant: Option<&'a str>) -> impl Iterator<Item = &'a Entity> {
        self.index
            .entity_ids
            .iter()
            .filter_map(|id| self.entities.get(id))
            .filter(move |entity| variant.is_none_or(|v| entity.variant == v))
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

// ============================================================================
// Validation Steps
// ============================================================================

fn read_value(path: &Path) -> Result<Value, StoreError> {
    read_json(path).map_err(|err| match err {
        crate::utils::fs::JsonReadError::Io(err) => StoreError::Io(path.to_path_buf(), err),
        crate::utils::fs::JsonReadError::Json(source) => StoreError::InvalidJson {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn read_index(path: &Path) -> Result<StoreIndex, StoreError> {
    let value = read_value(path)?;
    let malformed = |reason: String| StoreError::MalformedIndex {
        path: path.to_path_buf(),
        reason,
    };

    let list = |key: &str| -> Result<Vec<String>, StoreError> {
        let items = value
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| malformed(format!("`{key}` must be an array")))?;

        let mut seen = FxHashSet::default();
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            let id = item
                .as_str()
                .ok_or_else(|| malformed(format!("`{key}` must contain only strings")))?;
            if !seen.insert(id) {
                return Err(malformed(format!("`{key}` lists `{id}` more than once")));
            }
            validate_id(id)?;
            ids.push(id.to_owned());
        }
        Ok(ids)
    };

    Ok(StoreIndex {
        entity_ids: list("entity_ids")?,
        block_ids: list("block_ids")?,
    })
}

/// Ids double as file names, so they must name a single file.
fn validate_id(id: &str) -> Result<(), StoreError> {
    let reason = if id.is_empty() {
        "id is empty"
    } else if id.contains(['/', '\\']) {
        "id contains a path separator"
    } else if id.starts_with('.') {
        "id starts with `.`"
    } else {
        return Ok(());
    };
    Err(StoreError::InvalidId {
        id: id.to_owned(),
        reason,
    })
}

fn check_stored_id(path: &Path, value: &Value, expected: &str) -> Result<(), StoreError> {
    match value.get("id").and_then(Value::as_str) {
        Some(found) if found == expected => Ok(()),
        found => Err(StoreError::IdMismatch {
            path: path.to_path_buf(),
            expected: expected.to_owned(),
            found: found.unwrap_or("<none>").to_owned(),
        }),
    }
}

fn load_blocks(dir: &Path, ids: &[String]) -> Result<FxHashMap<String, Block>, StoreError> {
    let mut blocks = FxHashMap::default();
    for id in ids {
        let path = dir.join(format!("{id}.json"));
        if !path.is_file() {
            return Err(StoreError::MissingBlock(path));
        }
        let value = read_value(&path)?;
        check_stored_id(&path, &value, id)?;

        let actual = fingerprint::block_id(&value);
        if actual != *id {
            return Err(StoreError::FingerprintMismatch {
                id: id.clone(),
                actual,
            });
        }

        let block = Block::from_value(&value)
            .map_err(|source| StoreError::InvalidJson { path, source })?;
        blocks.insert(id.clone(), block);
    }
    Ok(blocks)
}

fn load_entities(
    dir: &Path,
    ids: &[String],
    blocks: &FxHashMap<String, Block>,
) -> Result<FxHashMap<String, Entity>, StoreError> {
    let mut entities = FxHashMap::default();
    for id in ids {
        let path = dir.join(format!("{id}.json"));
        if !path.is_file() {
            return Err(StoreError::MissingEntity(path));
        }
        let value = read_value(&path)?;
        check_stored_id(&path, &value, id)?;

        for field in Entity::REQUIRED_FIELDS {
            if value.get(field).is_none() {
                return Err(StoreError::MissingField {
                    id: id.clone(),
                    field,
                });
            }
        }

        let entity: Entity = serde_json::from_value(value)
            .map_err(|source| StoreError::InvalidJson { path, source })?;

        if let Some(missing) = entity
            .body
            .block_refs
            .iter()
            .find(|block| !blocks.contains_key(*block))
        {
            return Err(StoreError::DanglingReference {
                entity: id.clone(),
                block: missing.clone(),
            });
        }
        entities.insert(id.clone(), entity);
    }
    Ok(entities)
}

fn check_orphans(dir: &Path, declared: &[String], kind: &'static str) -> Result<(), StoreError> {
    let declared: FxHashSet<&str> = declared.iter().map(String::as_str).collect();
    let names: Vec<String> = json_stems(dir)
        .map_err(|err| StoreError::Io(dir.to_path_buf(), err))?
        .into_iter()
        .filter(|stem| !declared.contains(stem.as_str()))
        .collect();

    if names.is_empty() {
        Ok(())
    } else {
        Err(StoreError::OrphanFile { kind, names })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    /// Write a store to `root` from raw block payloads and entity values.
    pub(crate) fn write_store(root: &Path, blocks: &[Value], entities: &[Value]) -> Vec<String> {
        fs::create_dir_all(root.join(BLOCKS_DIR)).unwrap();
        fs::create_dir_all(root.join(ENTITIES_DIR)).unwrap();

        let mut block_ids = Vec::new();
        for block in blocks {
            let id = fingerprint::block_id(block);
            let mut stored = block.clone();
            stored["id"] = json!(id);
            fs::write(root.join(BLOCKS_DIR).join(format!("{id}.json")), stored.to_string()).unwrap();
            if !block_ids.contains(&id) {
                block_ids.push(id);
            }
        }

        let mut entity_ids = Vec::new();
        for entity in entities {
            let id = entity["id"].as_str().unwrap().to_owned();
            fs::write(root.join(ENTITIES_DIR).join(format!("{id}.json")), entity.to_string()).unwrap();
            entity_ids.push(id);
        }

        let index = json!({"entity_ids": entity_ids, "block_ids": block_ids});
        fs::write(root.join(INDEX_FILE), index.to_string()).unwrap();
        block_ids
    }

    pub(crate) fn entity(id: &str, variant: &str, refs: &[String]) -> Value {
        json!({
            "id": id,
            "variant": variant,
            "type": "episode",
            "meta": {"title": format!("Title {id}")},
            "body": {"blockRefs": refs},
            "relations": {}
        })
    }

    fn paragraph(text: &str) -> Value {
        json!({"type": "Paragraph", "inlines": [{"type": "Text", "text": text}]})
    }

    #[test]
    fn test_load_valid_store() {
        let dir = TempDir::new().unwrap();
        let ids = write_store(dir.path(), &[paragraph("a"), paragraph("b")], &[]);
        let entities = [entity("ep01", "story", &ids), entity("about", "card", &ids[..1])];
        write_store(dir.path(), &[paragraph("a"), paragraph("b")], &entities);

        let store = MicroStore::load(dir.path()).unwrap();
        assert_eq!(store.entity_count(), 2);
        assert_eq!(store.block_count(), 2);
        assert_eq!(store.resolve_blocks(&ids).unwrap().len(), 2);
        assert!(store.entity("about").is_some());

        for id in &ids {
            assert_eq!(&store.resolve_block(id).unwrap().id(), id);
        }
    }

    #[test]
    fn test_iter_entities_index_order_and_filter() {
        let dir = TempDir::new().unwrap();
        let entities = [
            entity("zeta", "story", &[]),
            entity("alpha", "card", &[]),
            entity("mid", "story", &[]),
        ];
        write_store(dir.path(), &[], &entities);

        let store = MicroStore::load(dir.path()).unwrap();
        let all: Vec<&str> = store.iter_entities(None).map(|e| e.id.as_str()).collect();
        assert_eq!(all, ["zeta", "alpha", "mid"]);
        let story: Vec<&str> = store.iter_entities(Some("story")).map(|e| e.id.as_str()).collect();
        assert_eq!(story, ["zeta", "mid"]);
    }

    #[test]
    fn test_missing_inputs() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            MicroStore::load(dir.path()),
            Err(StoreError::MissingInput(path)) if path.ends_with(INDEX_FILE)
        ));

        fs::write(dir.path().join(INDEX_FILE), "{}").unwrap();
        fs::create_dir(dir.path().join(BLOCKS_DIR)).unwrap();
        assert!(matches!(
            MicroStore::load(dir.path()),
            Err(StoreError::MissingInput(path)) if path.ends_with(ENTITIES_DIR)
        ));
    }

    #[test]
    fn test_malformed_index() {
        let dir = TempDir::new().unwrap();
        write_store(dir.path(), &[], &[]);
        fs::write(dir.path().join(INDEX_FILE), r#"{"entity_ids": []}"#).unwrap();
        assert!(matches!(
            MicroStore::load(dir.path()),
            Err(StoreError::MalformedIndex { .. })
        ));

        fs::write(dir.path().join(INDEX_FILE), r#"{"entity_ids": ["a", "a"], "block_ids": []}"#).unwrap();
        assert!(matches!(
            MicroStore::load(dir.path()),
            Err(StoreError::MalformedIndex { .. })
        ));

        fs::write(dir.path().join(INDEX_FILE), "not json").unwrap();
        assert!(matches!(
            MicroStore::load(dir.path()),
            Err(StoreError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_invalid_id() {
        let dir = TempDir::new().unwrap();
        write_store(dir.path(), &[], &[]);
        fs::write(dir.path().join(INDEX_FILE), r#"{"entity_ids": ["../x"], "block_ids": []}"#).unwrap();
        assert!(matches!(
            MicroStore::load(dir.path()),
            Err(StoreError::InvalidId { .. })
        ));
    }

    #[test]
    fn test_missing_block_file() {
        let dir = TempDir::new().unwrap();
        let ids = write_store(dir.path(), &[paragraph("a")], &[]);
        fs::remove_file(dir.path().join(BLOCKS_DIR).join(format!("{}.json", ids[0]))).unwrap();
        assert!(matches!(
            MicroStore::load(dir.path()),
            Err(StoreError::MissingBlock(_))
        ));
    }

    #[test]
    fn test_block_id_mismatch() {
        let dir = TempDir::new().unwrap();
        let ids = write_store(dir.path(), &[paragraph("a")], &[]);
        let path = dir.path().join(BLOCKS_DIR).join(format!("{}.json", ids[0]));
        let mut value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        value["id"] = json!("blk_other");
        fs::write(&path, value.to_string()).unwrap();

        assert!(matches!(
            MicroStore::load(dir.path()),
            Err(StoreError::IdMismatch { found, .. }) if found == "blk_other"
        ));
    }

    #[test]
    fn test_tampered_block_fails_fingerprint() {
        let dir = TempDir::new().unwrap();
        let ids = write_store(dir.path(), &[paragraph("hello")], &[]);
        let path = dir.path().join(BLOCKS_DIR).join(format!("{}.json", ids[0]));
        let tampered = fs::read_to_string(&path).unwrap().replace("hello", "hellp");
        fs::write(&path, tampered).unwrap();

        assert!(matches!(
            MicroStore::load(dir.path()),
            Err(StoreError::FingerprintMismatch { id, .. }) if id == ids[0]
        ));
    }

    #[test]
    fn test_entity_missing_field() {
        let dir = TempDir::new().unwrap();
        let mut value = entity("ep01", "story", &[]);
        value.as_object_mut().unwrap().remove("relations");
        write_store(dir.path(), &[], &[value]);

        assert!(matches!(
            MicroStore::load(dir.path()),
            Err(StoreError::MissingField { field: "relations", .. })
        ));
    }

    #[test]
    fn test_entity_block_refs_must_be_list() {
        let dir = TempDir::new().unwrap();
        let mut value = entity("ep01", "story", &[]);
        value["body"]["blockRefs"] = json!("blk_a");
        write_store(dir.path(), &[], &[value]);

        assert!(matches!(
            MicroStore::load(dir.path()),
            Err(StoreError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_dangling_reference() {
        let dir = TempDir::new().unwrap();
        write_store(dir.path(), &[], &[entity("ep01", "story", &["blk_gone".into()])]);
        assert!(matches!(
            MicroStore::load(dir.path()),
            Err(StoreError::DanglingReference { block, .. }) if block == "blk_gone"
        ));
    }

    #[test]
    fn test_orphan_files_rejected() {
        let dir = TempDir::new().unwrap();
        write_store(dir.path(), &[], &[entity("ep01", "story", &[])]);
        fs::write(dir.path().join(ENTITIES_DIR).join("stray.json"), "{}").unwrap();
        // Non-JSON files are ignored
        fs::write(dir.path().join(ENTITIES_DIR).join("README.md"), "notes").unwrap();

        match MicroStore::load(dir.path()) {
            Err(StoreError::OrphanFile { kind, names }) => {
                assert_eq!(kind, ENTITIES_DIR);
                assert_eq!(names, ["stray"]);
            }
            other => panic!("expected orphan error, got {other:?}"),
        }
    }

    #[test]
    fn test_unrecognized_block_kind_loads() {
        let dir = TempDir::new().unwrap();
        let ids = write_store(dir.path(), &[json!({"type": "Carousel", "slides": 3})], &[]);
        write_store(
            dir.path(),
            &[json!({"type": "Carousel", "slides": 3})],
            &[entity("ep01", "story", &ids)],
        );

        let store = MicroStore::load(dir.path()).unwrap();
        assert_eq!(store.resolve_block(&ids[0]).unwrap().kind(), "Carousel");
    }

    #[test]
    fn test_resolve_blocks_unknown() {
        let dir = TempDir::new().unwrap();
        write_store(dir.path(), &[], &[]);
        let store = MicroStore::load(dir.path()).unwrap();
        assert!(matches!(
            store.resolve_blocks(&["blk_nope".to_string()]),
            Err(StoreError::UnknownBlock(_))
        ));
    }
}

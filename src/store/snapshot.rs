//! Writing a store to disk.
//!
//! Snapshots are byte-stable: entities and blocks are written in id order as
//! key-sorted pretty JSON, so regenerating from identical input reproduces
//! every file exactly.

use anyhow::{Context, Result, bail};
use std::{collections::BTreeMap, path::Path};

use super::{BLOCKS_DIR, ENTITIES_DIR, Entity, INDEX_FILE, StoreIndex, StoredBlock};
use crate::utils::fs::{remove_dir_all_if_exists, write_json};

/// Replace `dir` with a store holding exactly `entities` and `blocks`.
///
/// Blocks sharing an id are written once. Two entities sharing an id are an
/// error, since one would silently overwrite the other.
pub fn write_snapshot(dir: &Path, entities: &[Entity], blocks: &[StoredBlock]) -> Result<StoreIndex> {
    let mut sorted_entities: BTreeMap<&str, &Entity> = BTreeMap::new();
    for entity in entities {
        if sorted_entities.insert(&entity.id, entity).is_some() {
            bail!("duplicate entity id `{}` in snapshot input", entity.id);
        }
    }
    let sorted_blocks: BTreeMap<&str, &StoredBlock> =
        blocks.iter().map(|block| (block.id.as_str(), block)).collect();

    remove_dir_all_if_exists(dir)?;

    let entities_dir = dir.join(ENTITIES_DIR);
    let blocks_dir = dir.join(BLOCKS_DIR);
    std::fs::create_dir_all(&entities_dir)
        .with_context(|| format!("Failed to create {}", entities_dir.display()))?;
    std::fs::create_dir_all(&blocks_dir)
        .with_context(|| format!("Failed to create {}", blocks_dir.display()))?;

    for (id, entity) in &sorted_entities {
        let value = serde_json::to_value(entity)
            .with_context(|| format!("Failed to serialize entity `{id}`"))?;
        write_json(&entities_dir.join(format!("{id}.json")), &value)?;
    }
    for (id, block) in &sorted_blocks {
        write_json(&blocks_dir.join(format!("{id}.json")), &block.to_value())?;
    }

    let index = StoreIndex {
        entity_ids: sorted_entities.keys().map(|id| id.to_string()).collect(),
        block_ids: sorted_blocks.keys().map(|id| id.to_string()).collect(),
    };
    let value = serde_json::to_value(&index).context("Failed to serialize store index")?;
    write_json(&dir.join(INDEX_FILE), &value)?;

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Block, EntityBody, EntityMeta, MicroStore};
    use crate::utils::fs::collect_relative_files;
    use serde_json::Map;
    use std::fs;
    use tempfile::TempDir;

    fn entity(id: &str, refs: Vec<String>) -> Entity {
        Entity {
            id: id.into(),
            variant: "story".into(),
            kind: "episode".into(),
            meta: EntityMeta {
                title: Some(Some(id.to_uppercase())),
                ..Default::default()
            },
            body: EntityBody { block_refs: refs },
            relations: Map::new(),
        }
    }

    #[test]
    fn test_snapshot_loads_back() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("micro");
        let block = StoredBlock::new(Block::Heading { level: 2, text: "Hi".into() });
        let entities = [entity("b", vec![block.id.clone()]), entity("a", vec![block.id.clone()])];

        let index = write_snapshot(&root, &entities, &[block.clone(), block.clone()]).unwrap();
        assert_eq!(index.entity_ids, ["a", "b"]);
        assert_eq!(index.block_ids, [block.id.clone()]);

        let store = MicroStore::load(&root).unwrap();
        assert_eq!(store.entity_count(), 2);
        assert_eq!(store.resolve_block(&block.id), Some(&block.block));
    }

    #[test]
    fn test_snapshot_replaces_previous_content() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("micro");
        fs::create_dir_all(root.join(ENTITIES_DIR)).unwrap();
        fs::write(root.join(ENTITIES_DIR).join("stale.json"), "{}").unwrap();

        write_snapshot(&root, &[entity("a", vec![])], &[]).unwrap();
        assert_eq!(
            collect_relative_files(&root),
            ["entities/a.json", "index.json"]
        );
    }

    #[test]
    fn test_snapshot_is_byte_stable() {
        let dir = TempDir::new().unwrap();
        let block = StoredBlock::new(Block::RawHtml { html: "<p>x</p>".into() });
        let entities = [entity("x", vec![block.id.clone()])];

        write_snapshot(&dir.path().join("one"), &entities, &[block.clone()]).unwrap();
        write_snapshot(&dir.path().join("two"), &entities, &[block]).unwrap();

        for rel in collect_relative_files(&dir.path().join("one")) {
            let a = fs::read(dir.path().join("one").join(&rel)).unwrap();
            let b = fs::read(dir.path().join("two").join(&rel)).unwrap();
            assert_eq!(a, b, "{rel} differs");
        }
        let index = fs::read_to_string(dir.path().join("one").join(INDEX_FILE)).unwrap();
        assert!(index.ends_with("}\n"));
    }

    #[test]
    fn test_snapshot_rejects_duplicate_entities() {
        let dir = TempDir::new().unwrap();
        let result = write_snapshot(dir.path(), &[entity("a", vec![]), entity("a", vec![])], &[]);
        assert!(result.is_err());
    }
}

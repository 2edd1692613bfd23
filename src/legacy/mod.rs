//! Legacy post records and their conversion to and from the micro store.
//!
//! A legacy post is one self-contained JSON file holding metadata plus a
//! single rendered body:
//!
//! ```json
//! {"contentId": "ep01", "experience": "hina", "pageType": "episode",
//!  "title": "...", "render": {"kind": "html", "html": "<p>...</p>"}}
//! ```
//!
//! Conversion to the micro store is lossless: converting back yields the same
//! record, which `verify` checks for every post.

mod error;

pub use error::LegacyError;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::path::Path;

use crate::store::{Block, Cta, Entity, EntityBody, EntityMeta, Field, StoredBlock, present};
use crate::utils::fs::{json_files, read_json};

/// Meta key under which an entity carries the legacy `dataHref`.
const DATA_HREF: &str = "dataHref";

/// Rendered body of a legacy post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LegacyRender {
    Html { html: String },
    Markdown { markdown: String },
}

/// Optional keys keep their presence: a key written as `null` is restored
/// as `null`, a missing key stays missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPost {
    pub content_id: String,
    pub experience: String,
    pub page_type: String,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub title: Field<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub summary: Field<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub role: Field<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub profile: Field<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub cta_label: Field<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub cta_href: Field<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub tags: Field<Vec<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub data_href: Field<Value>,
    pub render: LegacyRender,
}

/// A legacy post as read from disk: the raw value is kept for comparison.
#[derive(Debug, Clone)]
pub struct LegacyRecord {
    pub file_name: String,
    pub raw: Value,
    pub post: LegacyPost,
}

/// A post file that could not be read or decoded.
#[derive(Debug)]
pub struct LegacyFailure {
    pub file_name: String,
    pub error: LegacyError,
}

/// Every post of a directory, decoded or not.
#[derive(Debug, Default)]
pub struct LegacyPosts {
    pub records: Vec<LegacyRecord>,
    pub failures: Vec<LegacyFailure>,
}

impl LegacyPosts {
    /// Decoded records, or the first failure.
    pub fn into_records(self) -> Result<Vec<LegacyRecord>, LegacyError> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(self.records),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Read every `*.json` post of `dir`, in file name order.
///
/// Only an unreadable directory is fatal; a broken post is recorded as a
/// failure and the remaining posts are still read.
pub fn load_legacy_dir(dir: &Path) -> Result<LegacyPosts, LegacyError> {
    let files = json_files(dir).map_err(|err| LegacyError::List(dir.to_path_buf(), err))?;

    let mut posts = LegacyPosts::default();
    for path in files {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        match load_post(&path) {
            Ok((raw, post)) => posts.records.push(LegacyRecord { file_name, raw, post }),
            Err(error) => posts.failures.push(LegacyFailure { file_name, error }),
        }
    }
    Ok(posts)
}

fn load_post(path: &Path) -> Result<(Value, LegacyPost), LegacyError> {
    let raw = read_json(path).map_err(|source| LegacyError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let post = serde_json::from_value(raw.clone()).map_err(|source| LegacyError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((raw, post))
}

// ============================================================================
// Conversion
// ============================================================================

/// Convert a legacy post into an entity plus its render block.
pub fn legacy_to_micro(post: &LegacyPost) -> (Entity, Vec<StoredBlock>) {
    let render = match &post.render {
        LegacyRender::Html { html } => Block::RawHtml { html: html.clone() },
        LegacyRender::Markdown { markdown } => Block::Markdown {
            source: markdown.clone(),
        },
    };

    let stored = StoredBlock::new(render);
    let block_refs = vec![stored.id.clone()];

    let cta = (post.cta_label.is_some() || post.cta_href.is_some()).then(|| Cta {
        label: post.cta_label.clone(),
        href: post.cta_href.clone(),
    });

    let mut extra = Map::new();
    if let Some(data_href) = &post.data_href {
        extra.insert(DATA_HREF.into(), data_href.clone().unwrap_or(Value::Null));
    }

    let entity = Entity {
        id: post.content_id.clone(),
        variant: post.experience.clone(),
        kind: post.page_type.clone(),
        meta: EntityMeta {
            title: post.title.clone(),
            summary: post.summary.clone(),
            tags: post.tags.clone(),
            role: post.role.clone(),
            profile: post.profile.clone(),
            cta,
            extra,
        },
        body: EntityBody { block_refs },
        relations: Map::new(),
    };

    (entity, vec![stored])
}

/// Restore a legacy post from an entity: its first `RawHtml` or `Markdown`
/// block becomes the render.
pub fn micro_to_legacy<'a, F>(entity: &Entity, resolve: F) -> Result<LegacyPost, LegacyError>
where
    F: Fn(&str) -> Option<&'a Block>,
{
    let mut render = None;
    for id in &entity.body.block_refs {
        let block = resolve(id).ok_or_else(|| LegacyError::MissingBlock {
            entity: entity.id.clone(),
            block: id.clone(),
        })?;
        render = match block {
            Block::RawHtml { html } => Some(LegacyRender::Html { html: html.clone() }),
            Block::Markdown { source } => Some(LegacyRender::Markdown {
                markdown: source.clone(),
            }),
            _ => continue,
        };
        break;
    }
    let render = render.ok_or_else(|| LegacyError::MissingRender(entity.id.clone()))?;

    let meta = &entity.meta;
    let cta = meta.cta.as_ref();
    Ok(LegacyPost {
        content_id: entity.id.clone(),
        experience: entity.variant.clone(),
        page_type: entity.kind.clone(),
        title: meta.title.clone(),
        summary: meta.summary.clone(),
        role: meta.role.clone(),
        profile: meta.profile.clone(),
        cta_label: cta.and_then(|cta| cta.label.clone()),
        cta_href: cta.and_then(|cta| cta.href.clone()),
        tags: meta.tags.clone(),
        data_href: meta
            .extra
            .get(DATA_HREF)
            .map(|value| Some(value.clone()).filter(|value| !value.is_null())),
        render,
    })
}

/// Convert every record, merging blocks shared between posts.
pub fn snapshot_from_legacy(records: &[LegacyRecord]) -> (Vec<Entity>, Vec<StoredBlock>) {
    let mut entities = Vec::with_capacity(records.len());
    let mut blocks: FxHashMap<String, StoredBlock> = FxHashMap::default();
    for record in records {
        let (entity, stored) = legacy_to_micro(&record.post);
        entities.push(entity);
        for block in stored {
            blocks.entry(block.id.clone()).or_insert(block);
        }
    }
    let mut blocks: Vec<StoredBlock> = blocks.into_values().collect();
    blocks.sort_by(|a, b| a.id.cmp(&b.id));
    (entities, blocks)
}

/// Export record of a compiled entity: its metadata plus the compiled markup
/// as an html render. Keys the entity does not carry are left out, so the
/// record reads back as a post that survives the round trip.
pub fn emit_legacy(entity: &Entity, html: &str) -> Value {
    let meta = &entity.meta;
    let cta = meta.cta.as_ref();

    let mut record = Map::new();
    record.insert("contentId".into(), json!(entity.id));
    record.insert("experience".into(), json!(entity.variant));
    record.insert("pageType".into(), json!(entity.kind));

    let optional = [
        ("title", meta.title.as_ref().map(|v| json!(v))),
        ("summary", meta.summary.as_ref().map(|v| json!(v))),
        ("tags", meta.tags.as_ref().map(|v| json!(v))),
        ("role", meta.role.as_ref().map(|v| json!(v))),
        ("profile", meta.profile.as_ref().map(|v| json!(v))),
        ("ctaLabel", cta.and_then(|cta| cta.label.as_ref()).map(|v| json!(v))),
        ("ctaHref", cta.and_then(|cta| cta.href.as_ref()).map(|v| json!(v))),
        (DATA_HREF, meta.extra.get(DATA_HREF).cloned()),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            record.insert(key.into(), value);
        }
    }

    record.insert("render".into(), json!({"kind": "html", "html": html}));
    Value::Object(record)
}

//! Typed model of the micro store: blocks, entities and the index.
//!
//! Blocks are read as generic JSON first (the fingerprint is computed over the
//! raw payload) and then decoded into [`Block`]. Kinds this crate does not know
//! are preserved as [`Block::Unrecognized`] rather than rejected.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};

use super::fingerprint;

// ============================================================================
// Blocks
// ============================================================================

/// Inline node inside a paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum Inline {
    Text {
        text: String,
    },
    InlineLink {
        label: String,
        href: String,
    },
    /// Inline kind without a renderer; contributes nothing.
    #[serde(other)]
    Unsupported,
}

/// An immutable, content-addressed unit of content.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
    Heading {
        level: u8,
        text: String,
    },
    Paragraph {
        #[serde(default)]
        inlines: Vec<Inline>,
    },
    Image {
        src: String,
        #[serde(default)]
        alt: String,
        #[serde(default)]
        caption: Option<String>,
    },
    Link {
        label: String,
        href: String,
    },
    Section {
        #[serde(default)]
        children: Vec<String>,
    },
    RawHtml {
        html: String,
    },
    Markdown {
        source: String,
    },
    /// A block kind with no decoder, kept verbatim.
    #[serde(skip)]
    Unrecognized { kind: String, payload: Value },
}

impl Block {
    /// Block kinds with a typed decoder.
    pub const KNOWN_KINDS: [&'static str; 7] = [
        "Heading",
        "Paragraph",
        "Image",
        "Link",
        "Section",
        "RawHtml",
        "Markdown",
    ];

    /// Decode a raw block payload.
    ///
    /// Unknown `type` tags (or a missing one) yield [`Block::Unrecognized`];
    /// a known tag with a malformed payload is an error.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();
        if Self::KNOWN_KINDS.contains(&kind) {
            serde_json::from_value(value.clone())
        } else {
            Ok(Self::Unrecognized {
                kind: kind.to_owned(),
                payload: value.clone(),
            })
        }
    }

    /// The `type` tag of this block.
    pub fn kind(&self) -> &str {
        match self {
            Self::Heading { .. } => "Heading",
            Self::Paragraph { .. } => "Paragraph",
            Self::Image { .. } => "Image",
            Self::Link { .. } => "Link",
            Self::Section { .. } => "Section",
            Self::RawHtml { .. } => "RawHtml",
            Self::Markdown { .. } => "Markdown",
            Self::Unrecognized { kind, .. } => kind,
        }
    }

    /// Payload without an id, in the on-disk shape.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Heading { level, text } => json!({"type": "Heading", "level": level, "text": text}),
            Self::Paragraph { inlines } => {
                let inlines: Vec<Value> = inlines.iter().filter_map(Inline::to_value).collect();
                json!({"type": "Paragraph", "inlines": inlines})
            }
            Self::Image { src, alt, caption } => {
                let mut value = json!({"type": "Image", "src": src, "alt": alt});
                if let Some(caption) = caption {
                    value["caption"] = Value::String(caption.clone());
                }
                value
            }
            Self::Link { label, href } => json!({"type": "Link", "label": label, "href": href}),
            Self::Section { children } => json!({"type": "Section", "children": children}),
            Self::RawHtml { html } => json!({"type": "RawHtml", "html": html}),
            Self::Markdown { source } => json!({"type": "Markdown", "source": source}),
            Self::Unrecognized { payload, .. } => {
                let mut payload = payload.clone();
                if let Some(map) = payload.as_object_mut() {
                    map.remove("id");
                }
                payload
            }
        }
    }

    /// Content-addressed id of this block.
    pub fn id(&self) -> String {
        fingerprint::block_id(&self.to_value())
    }
}

impl Inline {
    fn to_value(&self) -> Option<Value> {
        match self {
            Self::Text { text } => Some(json!({"type": "Text", "text": text})),
            Self::InlineLink { label, href } => {
                Some(json!({"type": "InlineLink", "label": label, "href": href}))
            }
            Self::Unsupported => None,
        }
    }
}

/// A block together with its id, as stored in `blocks/<id>.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlock {
    pub id: String,
    pub block: Block,
}

impl StoredBlock {
    /// Assign the content-derived id to a block.
    pub fn new(block: Block) -> Self {
        Self {
            id: block.id(),
            block,
        }
    }

    /// On-disk payload: the block fields plus `id`.
    pub fn to_value(&self) -> Value {
        let mut value = self.block.to_value();
        if let Some(map) = value.as_object_mut() {
            map.insert("id".into(), Value::String(self.id.clone()));
        }
        value
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A metadata key that may be absent, present as `null`, or set.
///
/// Absent and `null` are kept apart so records survive conversion key for key.
pub type Field<T> = Option<Option<T>>;

/// Deserialize a [`Field`]: any present value, `null` included, is `Some`.
pub fn present<'de, D, T>(deserializer: D) -> Result<Field<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn field_str(field: &Field<String>) -> Option<&str> {
    field.as_ref().and_then(Option::as_deref)
}

/// Call-to-action attached to an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cta {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub label: Field<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub href: Field<String>,
}

impl Cta {
    pub fn label(&self) -> Option<&str> {
        field_str(&self.label)
    }

    pub fn href(&self) -> Option<&str> {
        field_str(&self.href)
    }
}

/// Entity metadata. Unknown keys are carried through `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMeta {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub title: Field<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub summary: Field<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub tags: Field<Vec<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub role: Field<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub profile: Field<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta: Option<Cta>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntityMeta {
    pub fn title(&self) -> Option<&str> {
        field_str(&self.title)
    }

    pub fn summary(&self) -> Option<&str> {
        field_str(&self.summary)
    }

    pub fn role(&self) -> Option<&str> {
        field_str(&self.role)
    }

    pub fn profile(&self) -> Option<&str> {
        field_str(&self.profile)
    }

    pub fn tags(&self) -> &[String] {
        self.tags.as_ref().and_then(Option::as_deref).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityBody {
    #[serde(rename = "blockRefs", default)]
    pub block_refs: Vec<String>,
}

/// A content item: metadata plus an ordered list of block references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    /// Experience that owns this entity.
    pub variant: String,
    /// Page-type tag (`episode`, `about`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    pub meta: EntityMeta,
    pub body: EntityBody,
    pub relations: Map<String, Value>,
}

impl Entity {
    /// Fields every entity file must declare.
    pub const REQUIRED_FIELDS: [&'static str; 5] = ["variant", "type", "meta", "body", "relations"];

    /// Display title, falling back to the id.
    pub fn title(&self) -> &str {
        self.meta.title().unwrap_or(&self.id)
    }

    /// Sort key from `relations.season` / `relations.index`, when present.
    pub fn ordinal(&self) -> (i64, i64) {
        let get = |key: &str| self.relations.get(key).and_then(Value::as_i64).unwrap_or(i64::MAX);
        (get("season"), get("index"))
    }
}

// ============================================================================
// Index
// ============================================================================

/// Manifest of what belongs to the store (`index.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreIndex {
    pub entity_ids: Vec<String>,
    pub block_ids: Vec<String>,
}

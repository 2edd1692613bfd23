//! Compilation of stored entities into markup.
//!
//! - **dom**: markup tree and escaping serializer
//! - **theme**: shared stylesheet
//!
//! # Flow
//!
//! ```text
//! Entity.blockRefs ──► resolve ──► blocks_to_dom() ──► to_html()
//!                                                         │
//! theme overrides ──► apply_theme() ──► css              ▼
//!                                                   CompiledPost
//! ```
//!
//! Unrecognized block kinds contribute no markup and are reported with a
//! warning, so experimental blocks never break unrelated pages.

pub mod dom;
pub mod theme;

use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::log;
use crate::store::{Block, Entity, Inline, MicroStore, StoreError};
use dom::{Element, Node, escape_html, to_html};

pub use theme::apply_theme;

/// Markup for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPost {
    pub entity_id: String,
    pub html: String,
}

/// Every compiled entity plus the shared stylesheet.
#[derive(Debug, Clone, Default)]
pub struct CompiledSite {
    /// Keyed by entity id.
    pub posts: BTreeMap<String, CompiledPost>,
    pub css: String,
}

impl CompiledSite {
    pub fn post(&self, entity_id: &str) -> Option<&CompiledPost> {
        self.posts.get(entity_id)
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Compile every entity of the store in parallel.
pub fn compile(store: &MicroStore, theme: &BTreeMap<String, String>) -> Result<CompiledSite, StoreError> {
    let entities: Vec<&Entity> = store.iter_entities(None).collect();
    let posts = entities
        .par_iter()
        .map(|entity| compile_entity(store, entity))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CompiledSite {
        posts: posts
            .into_iter()
            .map(|post| (post.entity_id.clone(), post))
            .collect(),
        css: apply_theme(theme),
    })
}

/// Resolve an entity's blocks in order and serialize them.
pub fn compile_entity(store: &MicroStore, entity: &Entity) -> Result<CompiledPost, StoreError> {
    let blocks = store.resolve_blocks(&entity.body.block_refs)?;
    let refs = entity.body.block_refs.iter().map(String::as_str).zip(blocks);
    let dom = Converter::new(store, &entity.id).convert_all(refs);
    Ok(CompiledPost {
        entity_id: entity.id.clone(),
        html: to_html(&dom),
    })
}

// ============================================================================
// Block Conversion
// ============================================================================

/// Converts blocks to nodes, resolving section children from the store.
///
/// A section's id hashes its children's ids, so sections cannot contain
/// themselves and the recursion always ends.
struct Converter<'a> {
    store: &'a MicroStore,
    entity: &'a str,
}

impl<'a> Converter<'a> {
    fn new(store: &'a MicroStore, entity: &'a str) -> Self {
        Self { store, entity }
    }

    fn convert_all(&self, blocks: impl IntoIterator<Item = (&'a str, &'a Block)>) -> Vec<Node> {
        let mut nodes = Vec::new();
        for (id, block) in blocks {
            self.convert(id, block, &mut nodes);
        }
        nodes
    }

    fn convert(&self, id: &'a str, block: &'a Block, out: &mut Vec<Node>) {
        match block {
            Block::Heading { level, text } => {
                let level = (*level).clamp(1, 6);
                out.push(
                    Element::new(format!("h{level}"))
                        .class(format!("mw-heading level-{level}"))
                        .text(text)
                        .into(),
                );
            }
            Block::Paragraph { inlines } => {
                let children = inlines.iter().filter_map(convert_inline).collect();
                out.push(Element::new("p").class("mw-paragraph").children(children).into());
            }
            Block::Link { label, href } => {
                out.push(link(label, href).into());
            }
            Block::Image { src, alt, caption } => {
                let mut children: Vec<Node> = vec![
                    Element::new("img")
                        .class("mw-image-img")
                        .attr("src", src)
                        .attr("alt", alt)
                        .self_closing()
                        .into(),
                ];
                if let Some(caption) = caption.as_deref().filter(|c| !c.is_empty()) {
                    children.push(
                        Element::new("figcaption")
                            .class("mw-image-caption")
                            .text(caption)
                            .into(),
                    );
                }
                out.push(Element::new("figure").class("mw-image").children(children).into());
            }
            Block::Section { children } => {
                let mut nodes = Vec::new();
                for child_id in children {
                    match self.store.resolve_block(child_id) {
                        Some(child) => self.convert(child_id, child, &mut nodes),
                        None => log!(
                            "warn";
                            "entity `{}`: section `{}` references unknown block `{}`, skipped",
                            self.entity, id, child_id
                        ),
                    }
                }
                out.push(Element::new("div").class("mw-section").children(nodes).into());
            }
            Block::RawHtml { html } => {
                out.push(
                    Element::new("div")
                        .class("mw-raw")
                        .attr("data-kind", "rawHtml")
                        .raw(html)
                        .into(),
                );
            }
            Block::Markdown { source } => {
                let node = match markdown_to_html(source) {
                    Some(html) => Element::new("div").class("mw-md").raw(html),
                    None => Element::new("pre").class("mw-md").raw(escape_html(source)),
                };
                out.push(node.into());
            }
            Block::Unrecognized { .. } => {
                log!(
                    "warn";
                    "entity `{}`: skipping block `{}` of unrecognized type `{}`",
                    self.entity, id, block.kind()
                );
            }
        }
    }
}

fn link(label: &str, href: &str) -> Element {
    Element::new("a").class("mw-link").attr("href", href).text(label)
}

fn convert_inline(inline: &Inline) -> Option<Node> {
    match inline {
        Inline::Text { text } => Some(Node::Text(text.clone())),
        Inline::InlineLink { label, href } => Some(link(label, href).into()),
        Inline::Unsupported => None,
    }
}

#[cfg(feature = "markdown")]
fn markdown_to_html(source: &str) -> Option<String> {
    let parser = pulldown_cmark::Parser::new(source);
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);
    Some(html)
}

#[cfg(not(feature = "markdown"))]
fn markdown_to_html(_source: &str) -> Option<String> {
    None
}

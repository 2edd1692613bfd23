//! View assembly: page specs plus compiled content become view models, which
//! a [`TemplateEngine`] turns into markup.
//!
//! The engine is an external collaborator. It receives a plain [`ViewModel`]
//! and returns a string; nothing here inspects template internals.

mod builtin;

pub use builtin::BuiltinEngine;

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::compiler::dom::unescape_html;
use crate::config::{ExperienceConfig, SiteSection};
use crate::routing::href::relative_href;
use crate::routing::{PageKind, PageSpec, SitePlan};
use crate::store::{Cta, Entity};

/// Longest excerpt derived from compiled markup, in characters.
const EXCERPT_LEN: usize = 120;

/// Renders named templates.
pub trait TemplateEngine: Send + Sync {
    fn has_template(&self, name: &str) -> bool;
    fn render(&self, name: &str, view: &ViewModel) -> Result<String>;
}

/// An entity with its compiled markup.
#[derive(Debug, Clone, Copy)]
pub struct ContentItem<'a> {
    pub entity: &'a Entity,
    pub html: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub href: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hero {
    pub title: String,
    pub summary: Option<String>,
}

/// One row of a home or list page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostEntry {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub href: String,
    pub page_type: String,
}

/// The focused content of a detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentView {
    pub id: String,
    pub title: String,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub role: Option<String>,
    pub profile: Option<String>,
    pub cta: Option<Cta>,
    pub html: String,
}

/// Everything a template may use. All hrefs are relative to the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewModel {
    pub experience_key: String,
    pub experience_name: String,
    pub template_key: String,
    pub language: String,
    pub site_title: String,
    pub page_title: String,
    pub canonical_href: String,
    pub routes_href: String,
    pub stylesheet_href: String,
    pub nav_links: Vec<NavLink>,
    pub hero: Hero,
    pub posts: Vec<PostEntry>,
    pub content: Option<ContentView>,
    pub build_label: String,
}

/// Build-wide inputs shared by every view.
#[derive(Debug, Clone, Copy)]
pub struct ViewContext<'a> {
    pub site: &'a SiteSection,
    pub plan: &'a SitePlan,
    /// Relative to the output root.
    pub routes_file: &'a Path,
    /// Relative to the output root.
    pub stylesheet_file: &'a Path,
    pub label: &'a str,
}

/// Assemble the view model of one planned page.
///
/// `items` is the whole content pool; posts are those with a detail page in
/// the page's experience, ordered by `(season, index)` and then pool order.
pub fn build_view(
    ctx: &ViewContext<'_>,
    experience: &ExperienceConfig,
    page: &PageSpec,
    items: &[ContentItem<'_>],
) -> ViewModel {
    let base = page.dir();
    let key = experience.key.as_str();

    let mut nav_links = Vec::with_capacity(2);
    if let Some(home) = ctx.plan.home(key) {
        nav_links.push(NavLink {
            href: home.href_from(base),
            label: ctx.site.home_label.clone(),
        });
    }
    if let Some(list) = ctx.plan.list_page(key) {
        nav_links.push(NavLink {
            href: list.href_from(base),
            label: ctx.site.list_label.clone(),
        });
    }

    let hero = Hero {
        title: experience.display_name().to_owned(),
        summary: experience.summary.clone(),
    };

    let mut targeted: Vec<(&ContentItem<'_>, &PageSpec)> = items
        .iter()
        .filter_map(|item| ctx.plan.content_page(key, &item.entity.id).map(|p| (item, p)))
        .collect();
    targeted.sort_by_key(|(item, _)| item.entity.ordinal());

    let (posts, content) = match page.kind {
        PageKind::Home | PageKind::List => {
            let posts = targeted
                .iter()
                .map(|(item, detail)| PostEntry {
                    id: item.entity.id.clone(),
                    title: item.entity.title().to_owned(),
                    excerpt: item
                        .entity
                        .meta
                        .summary()
                        .map_or_else(|| excerpt(item.html), str::to_owned),
                    href: detail.href_from(base),
                    page_type: item.entity.kind.clone(),
                })
                .collect();
            (posts, None)
        }
        PageKind::Detail => {
            let content = page
                .content
                .as_deref()
                .and_then(|id| targeted.iter().find(|(item, _)| item.entity.id == id))
                .map(|(item, _)| content_view(item));
            (Vec::new(), content)
        }
    };

    let page_title = match (&page.kind, &content) {
        (PageKind::Detail, Some(content)) => content.title.clone(),
        (PageKind::List, _) => ctx.site.list_label.clone(),
        _ => hero.title.clone(),
    };

    ViewModel {
        experience_key: key.to_owned(),
        experience_name: experience.display_name().to_owned(),
        template_key: page.template.clone(),
        language: ctx.site.language.clone(),
        site_title: ctx.site.title.clone(),
        page_title,
        canonical_href: ctx.plan.absolute_href_for_page(Some(page)),
        routes_href: relative_href(ctx.routes_file, base),
        stylesheet_href: relative_href(ctx.stylesheet_file, base),
        nav_links,
        hero,
        posts,
        content,
        build_label: ctx.label.to_owned(),
    }
}

fn content_view(item: &ContentItem<'_>) -> ContentView {
    let meta = &item.entity.meta;
    ContentView {
        id: item.entity.id.clone(),
        title: item.entity.title().to_owned(),
        summary: meta.summary().map(str::to_owned),
        tags: meta.tags().to_vec(),
        role: meta.role().map(str::to_owned),
        profile: meta.profile().map(str::to_owned),
        cta: meta.cta.clone(),
        html: item.html.to_owned(),
    }
}

/// Plain-text excerpt of compiled markup: tags stripped, references decoded,
/// whitespace collapsed.
fn excerpt(html: &str) -> String {
    let mut text = String::new();
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    let text = unescape_html(&text);
    let words: Vec<&str> = text.split_whitespace().collect();
    let text = words.join(" ");
    if text.chars().count() <= EXCERPT_LEN {
        return text;
    }
    let cut: String = text.chars().take(EXCERPT_LEN).collect();
    format!("{}…", cut.trim_end())
}

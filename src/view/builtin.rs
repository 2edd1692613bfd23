//! Built-in templates producing plain, well-formed pages.

use anyhow::{Result, bail};

use super::{TemplateEngine, ViewModel};
use crate::compiler::dom::{Element, Node, escape_html, to_html};

/// Templates this engine knows.
const TEMPLATES: [&str; 3] = ["home", "list", "detail"];

/// Self-contained engine with one template per page kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinEngine;

impl TemplateEngine for BuiltinEngine {
    fn has_template(&self, name: &str) -> bool {
        TEMPLATES.contains(&name)
    }

    fn render(&self, name: &str, view: &ViewModel) -> Result<String> {
        let main = match name {
            "home" => render_home(view),
            "list" => render_list(view),
            "detail" => render_detail(view),
            other => bail!("template `{other}` not found"),
        };
        Ok(document(view, main))
    }
}

fn document(view: &ViewModel, main: Vec<Node>) -> String {
    let title = if view.page_title == view.site_title {
        view.site_title.clone()
    } else {
        format!("{} | {}", view.page_title, view.site_title)
    };

    let head = to_html(&[
        Element::new("meta").attr("charset", "utf-8").self_closing().into(),
        Element::new("meta")
            .attr("name", "viewport")
            .attr("content", "width=device-width, initial-scale=1")
            .self_closing()
            .into(),
        Element::new("title").text(title).into(),
        Element::new("link")
            .attr("rel", "canonical")
            .attr("href", &view.canonical_href)
            .self_closing()
            .into(),
        Element::new("link")
            .attr("rel", "stylesheet")
            .attr("href", &view.stylesheet_href)
            .self_closing()
            .into(),
    ]);

    let nav: Vec<Node> = view
        .nav_links
        .iter()
        .map(|link| Element::new("a").class("mw-nav-link").attr("href", &link.href).text(&link.label).into())
        .collect();
    let body = to_html(&[
        Element::new("header")
            .class("mw-site-header")
            .children(vec![Element::new("nav").class("mw-nav").children(nav).into()])
            .into(),
        Element::new("main").class("mw-main").children(main).into(),
        Element::new("footer")
            .class("mw-footer")
            .children(vec![Element::new("small").text(format!("build {}", view.build_label)).into()])
            .into(),
    ]);

    format!(
        concat!(
            "<!doctype html>\n",
            "<html lang=\"{lang}\">\n",
            "<head>{head}</head>\n",
            "<body data-experience=\"{key}\" data-template=\"{template}\" data-routes-href=\"{routes}\">{body}</body>\n",
            "</html>\n",
        ),
        lang = escape_html(&view.language),
        head = head,
        key = escape_html(&view.experience_key),
        template = escape_html(&view.template_key),
        routes = escape_html(&view.routes_href),
        body = body,
    )
}

fn hero(view: &ViewModel) -> Node {
    let mut children: Vec<Node> = vec![Element::new("h1").text(&view.hero.title).into()];
    if let Some(summary) = &view.hero.summary {
        children.push(Element::new("p").class("mw-hero-summary").text(summary).into());
    }
    Element::new("section").class("mw-hero").children(children).into()
}

fn post_list(view: &ViewModel) -> Node {
    let entries = view
        .posts
        .iter()
        .map(|post| {
            let mut children: Vec<Node> = vec![Element::new("a").attr("href", &post.href).text(&post.title).into()];
            if !post.excerpt.is_empty() {
                children.push(Element::new("p").class("mw-post-excerpt").text(&post.excerpt).into());
            }
            Element::new("li")
                .class("mw-post")
                .attr("data-content-id", &post.id)
                .attr("data-page-type", &post.page_type)
                .children(children)
                .into()
        })
        .collect();
    Element::new("ul").class("mw-post-list").children(entries).into()
}

fn render_home(view: &ViewModel) -> Vec<Node> {
    vec![hero(view), post_list(view)]
}

fn render_list(view: &ViewModel) -> Vec<Node> {
    vec![Element::new("h1").text(&view.page_title).into(), post_list(view)]
}

fn render_detail(view: &ViewModel) -> Vec<Node> {
    let Some(content) = &view.content else {
        return vec![hero(view)];
    };

    let mut children: Vec<Node> = vec![Element::new("h1").text(&content.title).into()];
    if let Some(summary) = &content.summary {
        children.push(Element::new("p").class("mw-summary").text(summary).into());
    }
    if let Some(role) = &content.role {
        children.push(Element::new("p").class("mw-role").text(role).into());
    }
    if let Some(profile) = &content.profile {
        children.push(Element::new("p").class("mw-profile").text(profile).into());
    }
    children.push(Element::new("div").class("mw-body").raw(&content.html).into());
    if !content.tags.is_empty() {
        let tags = content
            .tags
            .iter()
            .map(|tag| Element::new("li").class("mw-tag").text(tag).into())
            .collect();
        children.push(Element::new("ul").class("mw-tags").children(tags).into());
    }
    if let Some(cta) = &content.cta
        && let Some(href) = cta.href()
    {
        let label = cta.label().unwrap_or(href);
        children.push(Element::new("a").class("mw-cta").attr("href", href).text(label).into());
    }

    vec![
        Element::new("article")
            .class("mw-article")
            .attr("data-content-id", &content.id)
            .children(children)
            .into(),
    ]
}

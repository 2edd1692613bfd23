//! Site routing: the complete page plan, computed before any write.
//!
//! - **href**: lexical relative href helpers
//! - **payload**: `routes.json` for the client-side experience switcher
//! - **alias**: redirect stubs for flat legacy URLs
//!
//! # Layout per generated experience
//!
//! ```text
//! {output_dir}/index.html                    home
//! {output_dir}/list/index.html               list
//! {output_dir}/posts/{id}/index.html         detail (canonical)
//! {output_dir}/posts/{id}.html               alias -> {id}/
//! ```
//!
//! Every planned path is relative to the output root. Legacy experiences
//! contribute passthrough routes only; targets that do not exist are dropped
//! with a warning.

mod alias;
mod error;
pub mod href;
mod payload;

pub use error::RouteError;

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::ExperienceConfig;
use crate::log;
use crate::store::Entity;
use crate::view::TemplateEngine;
use href::{INDEX_FILE, normalize, relative_route, resolve_href};

/// Role of a page within its experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Home,
    List,
    Detail,
}

/// A flat URL redirecting to a canonical page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAlias {
    pub url_path: String,
    pub out_file: PathBuf,
    /// Href of the canonical page, relative to the alias's own directory.
    pub redirect_to: String,
}

/// One output page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSpec {
    pub experience: String,
    pub kind: PageKind,
    /// `home`, `list`, or the entity's page type.
    pub page_type: String,
    pub template: String,
    pub url_path: String,
    pub out_file: PathBuf,
    /// Content id of detail pages.
    pub content: Option<String>,
    pub aliases: Vec<PageAlias>,
}

impl PageSpec {
    /// Directory containing the page, relative to the output root.
    pub fn dir(&self) -> &Path {
        self.out_file.parent().unwrap_or(Path::new(""))
    }

    /// Pretty href to this page from a page in directory `base`.
    pub fn href_from(&self, base: &Path) -> String {
        relative_route(&self.out_file, base, true)
    }
}

/// Passthrough routes of a legacy experience, relative to the output root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyRoutes {
    pub home: Option<String>,
    pub list: Option<String>,
    pub content: BTreeMap<String, String>,
}

impl LegacyRoutes {
    fn is_empty(&self) -> bool {
        self.home.is_none() && self.list.is_none() && self.content.is_empty()
    }
}

/// Filesystem anchors of a plan.
#[derive(Debug, Clone, Copy)]
pub struct PlanOptions<'a> {
    /// Directory legacy hrefs are resolved against.
    pub legacy_root: &'a Path,
    /// Absolute location of the published output root.
    pub href_root: &'a Path,
    /// Site-absolute prefix of the output root, e.g. `/` or `/generated/`.
    pub base_path: &'a str,
}

/// Page plan for every selected experience.
#[derive(Debug, Clone, Default)]
pub struct SitePlan {
    order: Vec<String>,
    pages: Vec<PageSpec>,
    home: FxHashMap<String, usize>,
    list: FxHashMap<String, usize>,
    content: FxHashMap<String, BTreeMap<String, usize>>,
    legacy: FxHashMap<String, LegacyRoutes>,
    base_path: String,
}

// ============================================================================
// Planning
// ============================================================================

impl SitePlan {
    /// Plan all pages, then validate the plan as a whole.
    pub fn build(
        experiences: &[&ExperienceConfig],
        entities: &[&Entity],
        templates: &dyn TemplateEngine,
        options: &PlanOptions<'_>,
    ) -> Result<Self, RouteError> {
        let mut plan = Self {
            order: experiences.iter().map(|exp| exp.key.clone()).collect(),
            base_path: options.base_path.to_owned(),
            ..Default::default()
        };

        for experience in experiences {
            let targeted = targeted_entities(experience, entities);
            if experience.is_generated() {
                plan.build_generated(experience, &targeted, templates);
            } else {
                plan.register_legacy(experience, &targeted, options);
            }
        }

        plan.validate()?;
        Ok(plan)
    }

    fn register_page(&mut self, page: PageSpec) {
        let index = self.pages.len();
        let key = page.experience.clone();
        match page.kind {
            PageKind::Home => {
                self.home.insert(key, index);
            }
            PageKind::List => {
                self.list.insert(key, index);
            }
            PageKind::Detail => {
                if let Some(id) = &page.content {
                    self.content.entry(key).or_default().insert(id.clone(), index);
                }
            }
        }
        self.pages.push(page);
    }

    fn build_generated(
        &mut self,
        experience: &ExperienceConfig,
        entities: &[&Entity],
        templates: &dyn TemplateEngine,
    ) {
        let output_dir = normalize(Path::new(experience.output_dir()));
        let page = |kind, page_type: &str, out_file: PathBuf| PageSpec {
            experience: experience.key.clone(),
            kind,
            page_type: page_type.to_owned(),
            template: page_type.to_owned(),
            url_path: relative_route(&out_file, Path::new(""), true),
            out_file,
            content: None,
            aliases: Vec::new(),
        };

        self.register_page(page(PageKind::Home, "home", output_dir.join(INDEX_FILE)));
        self.register_page(page(PageKind::List, "list", output_dir.join("list").join(INDEX_FILE)));

        let posts_dir = output_dir.join("posts");
        for entity in entities {
            let detail_out = posts_dir.join(&entity.id).join(INDEX_FILE);
            let alias_out = posts_dir.join(format!("{}.html", entity.id));
            let alias = PageAlias {
                url_path: relative_route(&alias_out, Path::new(""), false),
                redirect_to: relative_route(&detail_out, &posts_dir, true),
                out_file: alias_out,
            };

            let mut spec = page(PageKind::Detail, &entity.kind, detail_out);
            spec.template = detail_template(templates, &entity.kind);
            spec.content = Some(entity.id.clone());
            spec.aliases.push(alias);
            self.register_page(spec);
        }
    }

    fn register_legacy(
        &mut self,
        experience: &ExperienceConfig,
        entities: &[&Entity],
        options: &PlanOptions<'_>,
    ) {
        let key = &experience.key;
        let resolve = |what: &str, href: &str, collapse: bool| -> Option<String> {
            match resolve_legacy_target(options.legacy_root, href) {
                Some(target) => Some(relative_route(&target, options.href_root, collapse)),
                None => {
                    log!("warn"; "experience `{key}`: {what} target `{href}` not found, route omitted");
                    None
                }
            }
        };

        let mut routes = LegacyRoutes::default();

        if let Some(home) = experience.home.as_deref().or(experience.routes.home.as_deref()) {
            routes.home = resolve("home", home, true);
        }
        if let Some(list) = experience.routes.list.as_deref() {
            routes.list = resolve("list", list, true);
        }

        if !experience.content.is_empty() {
            for (id, href) in &experience.content {
                if let Some(route) = resolve("content", href, false) {
                    routes.content.insert(id.clone(), route);
                }
            }
        } else if let Some(pattern) = experience.routes.detail.as_deref() {
            for entity in entities {
                let href = pattern.replace("{slug}", &entity.id);
                if let Some(route) = resolve("content", &href, false) {
                    routes.content.insert(entity.id.clone(), route);
                }
            }
        }

        if !routes.is_empty() {
            self.legacy.insert(key.clone(), routes);
        }
    }

    /// Check plan-wide invariants: unique output files and urls, and aliases
    /// that land on planned pages.
    pub fn validate(&self) -> Result<(), RouteError> {
        let mut files: FxHashMap<&Path, &str> = FxHashMap::default();
        let mut urls: FxHashSet<&str> = FxHashSet::default();

        for page in &self.pages {
            let entries = std::iter::once((page.out_file.as_path(), page.url_path.as_str()))
                .chain(page.aliases.iter().map(|a| (a.out_file.as_path(), a.url_path.as_str())));
            for (path, url) in entries {
                if let Some(first) = files.insert(path, &page.experience) {
                    return Err(RouteError::DuplicateOutFile {
                        path: path.to_path_buf(),
                        first: first.to_owned(),
                        second: page.experience.clone(),
                    });
                }
                if !urls.insert(url) {
                    return Err(RouteError::DuplicateUrl { url: url.to_owned() });
                }
            }
        }

        let page_files: FxHashSet<&Path> = self.pages.iter().map(|p| p.out_file.as_path()).collect();
        for (_, alias) in self.aliases() {
            let alias_dir = alias.out_file.parent().unwrap_or(Path::new(""));
            let target = resolve_href(alias_dir, &alias.redirect_to);
            if !page_files.contains(target.as_path()) {
                return Err(RouteError::DanglingAlias {
                    alias: alias.out_file.clone(),
                    redirect_to: alias.redirect_to.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Entities owned by the experience; a generated experience with none of its
/// own renders the whole pool.
fn targeted_entities<'a>(experience: &ExperienceConfig, entities: &[&'a Entity]) -> Vec<&'a Entity> {
    let targeted: Vec<&Entity> = entities
        .iter()
        .copied()
        .filter(|entity| entity.variant == experience.key)
        .collect();
    if targeted.is_empty() && experience.is_generated() {
        entities.to_vec()
    } else {
        targeted
    }
}

fn detail_template(templates: &dyn TemplateEngine, page_type: &str) -> String {
    let candidate = format!("detail_{page_type}");
    if templates.has_template(&candidate) {
        candidate
    } else {
        "detail".to_owned()
    }
}

/// Locate a legacy page under `root`. Leading `/` is site-root relative;
/// directories resolve to their `index.html`.
fn resolve_legacy_target(root: &Path, href: &str) -> Option<PathBuf> {
    let trimmed = href.trim_start_matches('/');
    let mut target = normalize(&root.join(trimmed));
    if !target.starts_with(normalize(root)) {
        return None;
    }
    if target.is_dir() {
        target.push(INDEX_FILE);
    }
    target.is_file().then_some(target)
}

// ============================================================================
// Lookups
// ============================================================================

impl SitePlan {
    /// Experience keys in switcher order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn pages(&self) -> &[PageSpec] {
        &self.pages
    }

    /// Every alias with the page it redirects to.
    pub fn aliases(&self) -> impl Iterator<Item = (&PageSpec, &PageAlias)> {
        self.pages
            .iter()
            .flat_map(|page| page.aliases.iter().map(move |alias| (page, alias)))
    }

    pub fn alias_count(&self) -> usize {
        self.pages.iter().map(|page| page.aliases.len()).sum()
    }

    pub fn home(&self, experience: &str) -> Option<&PageSpec> {
        self.home.get(experience).map(|&i| &self.pages[i])
    }

    pub fn list_page(&self, experience: &str) -> Option<&PageSpec> {
        self.list.get(experience).map(|&i| &self.pages[i])
    }

    pub fn content_page(&self, experience: &str, content_id: &str) -> Option<&PageSpec> {
        self.content
            .get(experience)
            .and_then(|pages| pages.get(content_id))
            .map(|&i| &self.pages[i])
    }

    /// Content ids with a detail page in the experience, sorted.
    pub fn content_ids(&self, experience: &str) -> Vec<&str> {
        self.content
            .get(experience)
            .map(|pages| pages.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn pages_for_experience<'a>(&'a self, experience: &'a str) -> impl Iterator<Item = &'a PageSpec> {
        self.pages.iter().filter(move |page| page.experience == experience)
    }

    pub fn legacy_routes(&self, experience: &str) -> Option<&LegacyRoutes> {
        self.legacy.get(experience)
    }

    /// Site-absolute href of a page under the configured base path.
    pub fn absolute_href_for_page(&self, page: Option<&PageSpec>) -> String {
        let Some(page) = page else {
            return String::new();
        };
        let prefix = self.base_path.trim_end_matches('/');
        let path = page.url_path.trim_start_matches("./").trim_start_matches('/');
        format!("{prefix}/{path}")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::ExperienceKind;
    use crate::store::{EntityBody, EntityMeta};
    use crate::view::BuiltinEngine;
    use serde_json::Map;
    use std::fs;
    use tempfile::TempDir;

    pub(crate) fn entity(id: &str, variant: &str, kind: &str) -> Entity {
        Entity {
            id: id.into(),
            variant: variant.into(),
            kind: kind.into(),
            meta: EntityMeta::default(),
            body: EntityBody::default(),
            relations: Map::new(),
        }
    }

    fn options(root: &Path) -> PlanOptions<'_> {
        PlanOptions {
            legacy_root: root,
            href_root: root,
            base_path: "/",
        }
    }

    fn plan(experiences: &[ExperienceConfig], entities: &[Entity], root: &Path) -> Result<SitePlan, RouteError> {
        let experiences: Vec<&ExperienceConfig> = experiences.iter().collect();
        let entities: Vec<&Entity> = entities.iter().collect();
        SitePlan::build(&experiences, &entities, &BuiltinEngine::default(), &options(root))
    }

    #[test]
    fn test_generated_layout() {
        let dir = TempDir::new().unwrap();
        let plan = plan(
            &[ExperienceConfig::generated("story")],
            &[entity("ep01", "story", "episode")],
            dir.path(),
        )
        .unwrap();

        let home = plan.home("story").unwrap();
        assert_eq!(home.out_file, PathBuf::from("story/index.html"));
        assert_eq!(home.url_path, "story/");
        assert_eq!(home.template, "home");

        let list = plan.list_page("story").unwrap();
        assert_eq!(list.out_file, PathBuf::from("story/list/index.html"));
        assert_eq!(list.url_path, "story/list/");

        let detail = plan.content_page("story", "ep01").unwrap();
        assert_eq!(detail.out_file, PathBuf::from("story/posts/ep01/index.html"));
        assert_eq!(detail.url_path, "story/posts/ep01/");
        assert_eq!(detail.page_type, "episode");
        assert_eq!(detail.template, "detail");

        let alias = &detail.aliases[0];
        assert_eq!(alias.out_file, PathBuf::from("story/posts/ep01.html"));
        assert_eq!(alias.url_path, "story/posts/ep01.html");
        assert_eq!(alias.redirect_to, "ep01/");

        assert_eq!(plan.pages().len(), 3);
        assert_eq!(plan.alias_count(), 1);
        assert_eq!(plan.absolute_href_for_page(Some(detail)), "/story/posts/ep01/");
        assert_eq!(plan.absolute_href_for_page(None), "");
    }

    #[test]
    fn test_unicode_alias_redirect() {
        let dir = TempDir::new().unwrap();
        let plan = plan(
            &[ExperienceConfig::generated("hina")],
            &[entity("about-世界観", "hina", "about")],
            dir.path(),
        )
        .unwrap();
        let detail = plan.content_page("hina", "about-世界観").unwrap();
        assert_eq!(detail.aliases[0].redirect_to, "about-世界観/");
        assert_eq!(detail.template, "detail");
    }

    /// Engine offering a per-type detail template for `about` pages only.
    struct AboutEngine;

    impl TemplateEngine for AboutEngine {
        fn has_template(&self, name: &str) -> bool {
            matches!(name, "home" | "list" | "detail" | "detail_about")
        }

        fn render(&self, name: &str, _view: &crate::view::ViewModel) -> anyhow::Result<String> {
            Ok(name.to_owned())
        }
    }

    #[test]
    fn test_detail_template_per_page_type() {
        let dir = TempDir::new().unwrap();
        let experience = ExperienceConfig::generated("hina");
        let entities = [entity("about-世界観", "hina", "about"), entity("ep01", "hina", "episode")];
        let entity_refs: Vec<&Entity> = entities.iter().collect();
        let plan = SitePlan::build(&[&experience], &entity_refs, &AboutEngine, &options(dir.path())).unwrap();

        assert_eq!(plan.content_page("hina", "about-世界観").unwrap().template, "detail_about");
        assert_eq!(plan.content_page("hina", "ep01").unwrap().template, "detail");
        assert_eq!(plan.home("hina").unwrap().template, "home");
    }

    #[test]
    fn test_targeting_and_fallback() {
        let dir = TempDir::new().unwrap();
        let entities = [
            entity("ep01", "story", "episode"),
            entity("ep02", "story", "episode"),
            entity("card", "cards", "about"),
        ];
        let plan = plan(
            &[ExperienceConfig::generated("story"), ExperienceConfig::generated("lonely")],
            &entities,
            dir.path(),
        )
        .unwrap();

        assert_eq!(plan.content_ids("story"), ["ep01", "ep02"]);
        // No entity targets `lonely`, so it renders the whole pool
        assert_eq!(plan.content_ids("lonely"), ["card", "ep01", "ep02"]);
        assert_eq!(plan.pages_for_experience("lonely").count(), 5);
        assert_eq!(plan.order(), ["story", "lonely"]);
    }

    #[test]
    fn test_unique_out_files_per_experience() {
        let dir = TempDir::new().unwrap();
        let entities: Vec<Entity> = (0..20)
            .map(|i| entity(&format!("ep{i:02}"), "story", "episode"))
            .collect();
        let plan = plan(&[ExperienceConfig::generated("story")], &entities, dir.path()).unwrap();

        let mut seen = FxHashSet::default();
        for page in plan.pages_for_experience("story") {
            assert!(seen.insert(page.out_file.clone()));
            for alias in &page.aliases {
                assert!(seen.insert(alias.out_file.clone()));
            }
        }
    }

    #[test]
    fn test_shared_output_dir_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut second = ExperienceConfig::generated("other");
        second.output_dir = Some("story".into());

        let result = plan(&[ExperienceConfig::generated("story"), second], &[], dir.path());
        match result {
            Err(RouteError::DuplicateOutFile { path, first, second }) => {
                assert_eq!(path, PathBuf::from("story/index.html"));
                assert_eq!(first, "story");
                assert_eq!(second, "other");
            }
            other => panic!("expected duplicate out file, got {other:?}"),
        }
    }

    #[test]
    fn test_dangling_alias_detected() {
        let mut plan = SitePlan::default();
        plan.register_page(PageSpec {
            experience: "story".into(),
            kind: PageKind::Detail,
            page_type: "episode".into(),
            template: "detail".into(),
            url_path: "story/posts/ep01/".into(),
            out_file: PathBuf::from("story/posts/ep01/index.html"),
            content: Some("ep01".into()),
            aliases: vec![PageAlias {
                url_path: "story/posts/ep01.html".into(),
                out_file: PathBuf::from("story/posts/ep01.html"),
                redirect_to: "ep02/".into(),
            }],
        });
        assert!(matches!(plan.validate(), Err(RouteError::DanglingAlias { .. })));
    }

    #[test]
    fn test_legacy_routes_resolved_and_missing_dropped() {
        let dir = TempDir::new().unwrap();
        let legacy = dir.path().join("legacy");
        let out = dir.path().join("generated");
        fs::create_dir_all(legacy.join("s1")).unwrap();
        fs::write(legacy.join("s1/index.html"), "home").unwrap();
        fs::write(legacy.join("s1/story1.html"), "one").unwrap();

        let mut ruri = ExperienceConfig::generated("ruri");
        ruri.kind = ExperienceKind::Legacy;
        ruri.home = Some("/s1/".into());
        ruri.routes.list = Some("s1/list.html".into());
        ruri.content.insert("ep01".into(), "s1/story1.html".into());
        ruri.content.insert("ep02".into(), "s1/story2.html".into());

        let experiences = [&ruri];
        let plan = SitePlan::build(
            &experiences,
            &[],
            &BuiltinEngine::default(),
            &PlanOptions {
                legacy_root: &legacy,
                href_root: &out,
                base_path: "/",
            },
        )
        .unwrap();

        let routes = plan.legacy_routes("ruri").unwrap();
        assert_eq!(routes.home.as_deref(), Some("../legacy/s1/"));
        assert_eq!(routes.list, None);
        assert_eq!(routes.content.len(), 1);
        assert_eq!(routes.content["ep01"], "../legacy/s1/story1.html");
        assert!(plan.pages().is_empty());
    }

    #[test]
    fn test_legacy_detail_pattern() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("old/ep01")).unwrap();
        fs::write(dir.path().join("old/ep01/index.html"), "x").unwrap();

        let mut ruri = ExperienceConfig::generated("ruri");
        ruri.kind = ExperienceKind::Legacy;
        ruri.routes.detail = Some("old/{slug}/".into());

        let plan = plan(
            &[ruri],
            &[entity("ep01", "ruri", "episode"), entity("ep02", "ruri", "episode")],
            dir.path(),
        )
        .unwrap();
        let routes = plan.legacy_routes("ruri").unwrap();
        assert_eq!(routes.content.keys().collect::<Vec<_>>(), ["ep01"]);
        assert_eq!(routes.content["ep01"], "old/ep01/index.html");
    }

    #[test]
    fn test_legacy_target_cannot_escape_root() {
        let dir = TempDir::new().unwrap();
        let inner = dir.path().join("inner");
        fs::create_dir_all(&inner).unwrap();
        fs::write(dir.path().join("secret.html"), "x").unwrap();
        assert_eq!(resolve_legacy_target(&inner, "../secret.html"), None);
    }
}

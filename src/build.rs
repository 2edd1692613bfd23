//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── MicroStore::load()   validate everything, fail before any write
//!     ├── compile()            entities → markup, theme → stylesheet
//!     ├── SitePlan::build()    every page and alias, collisions rejected
//!     ├── render               view models → templates → (minified) html
//!     └── emit                 wipe output root, write all files in parallel
//! ```
//!
//! `check_determinism()` runs the whole pipeline twice into separate temporary
//! roots and only publishes when both trees are byte-identical.

use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

use crate::{
    compiler::compile,
    config::{ExperienceConfig, SiteConfig},
    log,
    logger::Progress,
    routing::{PlanOptions, SitePlan},
    store::{Entity, MicroStore},
    utils::{
        date::{build_time, label_timestamp},
        fs::{copy_dir_all, pretty_json, remove_dir_all_if_exists, to_slash, write_file},
        git::{NO_GIT, short_head_sha},
        minify::minify_html,
    },
    verify::compare_trees,
    view::{BuiltinEngine, ContentItem, TemplateEngine, ViewContext, build_view},
};

/// Shared stylesheet location, relative to the output root.
pub const STYLESHEET_FILE: &str = "shared/micro.css";

/// Build summary location, relative to the output root.
pub const BUILDINFO_FILE: &str = "_buildinfo.json";

/// Summary of one build, also written as `_buildinfo.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub label: String,
    pub entities: usize,
    pub blocks: usize,
    pub pages: usize,
    pub aliases: usize,
    /// Every written file, relative to the output root, sorted.
    pub files: Vec<String>,
}

/// Where and how one pipeline run writes.
struct BuildTarget<'a> {
    out_root: &'a Path,
    /// Published location of the output root, for legacy hrefs.
    href_root: &'a Path,
    show_progress: bool,
}

// ============================================================================
// Public API
// ============================================================================

/// Build the selected experiences into `config.build.output`.
pub fn build_site(config: &SiteConfig, experiences: &[&ExperienceConfig]) -> Result<BuildReport> {
    let target = BuildTarget {
        out_root: &config.build.output,
        href_root: &config.build.output,
        show_progress: true,
    };
    let report = run_pipeline(config, experiences, &BuiltinEngine, &target)?;
    log!("build"; "done: {} files in {}", report.files.len(), config.build.output.display());
    Ok(report)
}

/// Build twice into isolated temporary roots, require identical trees, then
/// publish the first run to `config.build.output`.
pub fn check_determinism(config: &SiteConfig, experiences: &[&ExperienceConfig]) -> Result<BuildReport> {
    let temp = tempfile::TempDir::new().context("Failed to create temporary build root")?;
    let runs = [temp.path().join("run1"), temp.path().join("run2")];

    let mut reports = Vec::with_capacity(runs.len());
    for (i, run) in runs.iter().enumerate() {
        log!("verify"; "determinism run {}/{}", i + 1, runs.len());
        let target = BuildTarget {
            out_root: run,
            href_root: &config.build.output,
            show_progress: false,
        };
        reports.push(run_pipeline(config, experiences, &BuiltinEngine, &target)?);
    }

    compare_trees(&runs[0], &runs[1])?;
    log!("verify"; "determinism ok: {} files identical across runs", reports[0].files.len());

    remove_dir_all_if_exists(&config.build.output)?;
    copy_dir_all(&runs[0], &config.build.output)?;
    log!("build"; "published {}", config.build.output.display());

    Ok(reports.swap_remove(0))
}

/// `<UTC timestamp>-<git short sha>`, unless pinned by config or CLI.
pub fn build_label(config: &SiteConfig) -> String {
    if let Some(label) = &config.build.label {
        return label.clone();
    }
    let timestamp = label_timestamp(&build_time(config.build.deterministic));
    let sha = short_head_sha(&config.root).unwrap_or_else(|| NO_GIT.to_owned());
    format!("{timestamp}-{sha}")
}

// ============================================================================
// Pipeline
// ============================================================================

fn run_pipeline(
    config: &SiteConfig,
    experiences: &[&ExperienceConfig],
    engine: &dyn TemplateEngine,
    target: &BuildTarget<'_>,
) -> Result<BuildReport> {
    let store = MicroStore::load(&config.build.store)?;
    log!(
        "store";
        "loaded {} entities, {} blocks from {}",
        store.entity_count(),
        store.block_count(),
        store.root().display()
    );

    let compiled = compile(&store, &config.theme)?;
    log!("compile"; "compiled {} entities", compiled.posts.len());

    let entities: Vec<&Entity> = store.iter_entities(None).collect();
    let items: Vec<ContentItem<'_>> = entities
        .iter()
        .filter_map(|&entity| {
            compiled.post(&entity.id).map(|post| ContentItem {
                entity,
                html: &post.html,
            })
        })
        .collect();

    let plan = SitePlan::build(
        experiences,
        &entities,
        engine,
        &PlanOptions {
            legacy_root: &config.build.legacy_root,
            href_root: target.href_root,
            base_path: &config.site.base_path,
        },
    )?;
    for key in plan.order() {
        log!("route"; "{}: {} pages", key, plan.pages_for_experience(key).count());
    }
    log!("route"; "planned {} pages, {} aliases", plan.pages().len(), plan.alias_count());

    let label = build_label(config);
    let pages = render_pages(config, experiences, engine, &plan, &items, &label)?;
    let aliases: Vec<(PathBuf, Vec<u8>)> = plan
        .render_aliases(&config.site.language)
        .into_iter()
        .map(|(path, html)| (path, html.into_bytes()))
        .collect();

    let routes = pretty_json(&plan.routes_payload());
    let shared: Vec<(PathBuf, Vec<u8>)> = vec![
        (PathBuf::from(STYLESHEET_FILE), compiled.css.as_bytes().to_vec()),
        (PathBuf::from(&config.build.routes_filename), routes.into_bytes()),
    ];

    let mut files: Vec<String> = pages
        .iter()
        .chain(&aliases)
        .chain(&shared)
        .map(|(path, _)| to_slash(path))
        .collect();
    if config.build.buildinfo {
        files.push(BUILDINFO_FILE.to_owned());
    }
    files.sort();

    let report = BuildReport {
        label,
        entities: store.entity_count(),
        blocks: store.block_count(),
        pages: pages.len(),
        aliases: aliases.len(),
        files,
    };

    remove_dir_all_if_exists(target.out_root)?;
    fs::create_dir_all(target.out_root)
        .with_context(|| format!("Failed to create output directory {}", target.out_root.display()))?;

    emit(
        target,
        &[
            ("pages", pages.as_slice()),
            ("aliases", aliases.as_slice()),
            ("shared", shared.as_slice()),
        ],
    )?;

    if config.build.buildinfo {
        let value = serde_json::to_value(&report).context("Failed to serialize build info")?;
        write_file(&target.out_root.join(BUILDINFO_FILE), pretty_json(&value).as_bytes())?;
    }

    Ok(report)
}

/// Render every planned page, in parallel.
fn render_pages(
    config: &SiteConfig,
    experiences: &[&ExperienceConfig],
    engine: &dyn TemplateEngine,
    plan: &SitePlan,
    items: &[ContentItem<'_>],
    label: &str,
) -> Result<Vec<(PathBuf, Vec<u8>)>> {
    let by_key: FxHashMap<&str, &ExperienceConfig> =
        experiences.iter().map(|exp| (exp.key.as_str(), *exp)).collect();
    let ctx = ViewContext {
        site: &config.site,
        plan,
        routes_file: Path::new(&config.build.routes_filename),
        stylesheet_file: Path::new(STYLESHEET_FILE),
        label,
    };

    plan.pages()
        .par_iter()
        .map(|page| {
            let experience = by_key
                .get(page.experience.as_str())
                .ok_or_else(|| anyhow!("page planned for unknown experience `{}`", page.experience))?;
            let view = build_view(&ctx, experience, page, items);
            let html = engine
                .render(&page.template, &view)
                .with_context(|| format!("Failed to render {}", page.out_file.display()))?;
            let html = minify_html(html.as_bytes(), config.build.minify).into_owned();
            Ok((page.out_file.clone(), html))
        })
        .collect()
}

/// Write every file group below the output root, reporting progress per group.
fn emit(target: &BuildTarget<'_>, groups: &[(&'static str, &[(PathBuf, Vec<u8>)])]) -> Result<()> {
    let progress = if target.show_progress {
        let counts: Vec<(&'static str, usize)> = groups.iter().map(|(name, files)| (*name, files.len())).collect();
        Progress::start(&counts)
    } else {
        None
    };
    let has_error = AtomicBool::new(false);

    let result = groups.par_iter().try_for_each(|(name, files)| {
        files.par_iter().try_for_each(|(rel, content)| {
            if has_error.load(Ordering::Relaxed) {
                return Err(anyhow!("Aborted"));
            }
            let path = target.out_root.join(rel);
            if let Err(e) = write_file(&path, content) {
                if !has_error.swap(true, Ordering::Relaxed) {
                    log!("error"; "{}: {:#}", path.display(), e);
                }
                return Err(anyhow!("Build failed"));
            }
            if let Some(progress) = &progress {
                progress.tick(name);
            }
            Ok(())
        })
    });

    if let Some(progress) = &progress {
        progress.finish();
    }
    result?;

    let total: usize = groups.iter().map(|(_, files)| files.len()).sum();
    log!("write"; "wrote {} files", total);
    Ok(())
}

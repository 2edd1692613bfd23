//! Export of compiled entities as legacy post records.

use anyhow::Result;
use std::path::Path;

use crate::{
    compiler::compile,
    config::SiteConfig,
    legacy::emit_legacy,
    log,
    store::MicroStore,
    utils::fs::{write_file, write_json},
};

/// Write `posts/<id>.json` per entity plus `micro.css` below `out`.
///
/// Returns the number of exported entities.
pub fn export_site(config: &SiteConfig, out: &Path) -> Result<usize> {
    let store = MicroStore::load(&config.build.store)?;
    let compiled = compile(&store, &config.theme)?;

    let mut count = 0;
    for post in compiled.posts.values() {
        let Some(entity) = store.entity(&post.entity_id) else {
            continue;
        };
        let record = emit_legacy(entity, &post.html);
        write_json(&out.join("posts").join(format!("{}.json", entity.id)), &record)?;
        count += 1;
    }
    write_file(&out.join("micro.css"), compiled.css.as_bytes())?;

    log!("export"; "exported {} entities to {}", count, out.display());
    Ok(count)
}

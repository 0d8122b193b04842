//! `codenav build`: build the index once and print the project summary.
//! Grounded on `cli::build::build_index`'s progress-line idiom, retargeted
//! from "parse and flush to `.codeindex/`" to "build the in-memory index
//! and report what it found" (spec §6: the index is never persisted).

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::index::IndexHandle;
use crate::query::QueryEngine;

pub fn run(path: &Path) -> Result<()> {
    let config = Config::from_root(path)
        .with_context(|| format!("cannot resolve path: {}", path.display()))?;

    info!("building index for {}", config.root.display());
    let handle = IndexHandle::build(config);

    let summary = handle.with_index(|index| QueryEngine::new(index).get_project_summary());
    info!(
        "indexed {} files, {} symbols ({} functions, {} classes, {} imports); {} file(s) partial",
        summary.file_count,
        summary.symbol_count,
        summary.function_count,
        summary.class_count,
        summary.import_count,
        summary.partial_file_count,
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

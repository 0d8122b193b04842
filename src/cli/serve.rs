//! `codenav serve`: build the index and start the MCP server over stdio,
//! optionally watching the project root for changes in the background.
//! Grounded on `cli::serve::run`, retargeted from "load/flush `.codeindex/`
//! then serve" to "build in memory, serve, optionally watch".

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::index::IndexHandle;
use crate::server::mcp::start_server;

pub fn run(path: &Path, watch: bool) -> Result<()> {
    let config = Config::from_root(path)
        .with_context(|| format!("cannot resolve path: {}", path.display()))?;
    tracing::info!("building index for {}", config.root.display());
    let handle = IndexHandle::build(config);

    if watch {
        let watch_handle = handle.clone();
        std::thread::spawn(move || {
            if let Err(e) = crate::watch::run(watch_handle) {
                tracing::error!("watch error: {e}");
            }
        });
    }

    let rt = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
    rt.block_on(async {
        tracing::info!("starting MCP server on stdio");
        start_server(handle).await
    })
}

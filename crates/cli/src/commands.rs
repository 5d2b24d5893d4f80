//! Graph build and export operations behind the CLI commands

use crate::output::write_file;
use anyhow::{Context, Result};
use codepath_core::{CodeGraph, Config, Error, GraphExport, SymbolProvider};
use codepath_indexer::{build_graph, BuildOutcome, SymbolCache};
use std::path::{Path, PathBuf};
use tracing::info;

/// Fails with the workspace-root error when `root` cannot be listed
pub async fn ensure_readable_root(root: &Path) -> Result<()> {
    let _ = tokio::fs::read_dir(root)
        .await
        .map_err(|e| Error::workspace_root(root, e))?;
    Ok(())
}

/// Builds the deduplicated graph, consulting `cache` first for symbol trees
pub async fn scan(
    root: &Path,
    provider: &dyn SymbolProvider,
    cache: &SymbolCache,
    config: &Config,
) -> Result<BuildOutcome> {
    let outcome = build_graph(root, provider, cache, config).await?;
    info!(
        "Scan complete: {} nodes, {} edges",
        outcome.graph().nodes.len(),
        outcome.graph().edges.len()
    );
    Ok(outcome)
}

/// `{nodes, edges}` JSON for a graph
pub fn graph_json(graph: &CodeGraph, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(graph)?
    } else {
        serde_json::to_string(graph)?
    };
    Ok(json)
}

/// Where an export is written when no path is given
pub fn default_export_path(root: &Path, config: &Config) -> PathBuf {
    root.join(&config.export.file_name)
}

/// Builds with a fresh symbol cache and writes the export document to `output`
pub async fn export(
    root: &Path,
    provider: &dyn SymbolProvider,
    config: &Config,
    output: &Path,
) -> Result<GraphExport> {
    let cache = SymbolCache::new();
    let outcome = build_graph(root, provider, &cache, config).await?;
    let export = GraphExport::new(root, outcome.into_graph());

    let json = export.to_json(config.export.pretty)?;
    write_file(output, &json)
        .await
        .with_context(|| format!("Failed to write export to {}", output.display()))?;

    info!(
        "Exported {} nodes and {} edges to {}",
        export.metadata.total_nodes,
        export.metadata.total_edges,
        output.display()
    );
    Ok(export)
}

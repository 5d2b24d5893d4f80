//! Human-readable summaries and file output

use anyhow::{Context, Result};
use codepath_core::{EdgeKind, NodeKind, Relationship};
use codepath_indexer::BuildOutcome;
use std::fmt::Write as _;
use std::path::Path;

/// Writes `contents` to `path`, creating missing parent directories
pub async fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Per-kind node counts, edge counts and build statistics
pub fn summary(outcome: &BuildOutcome) -> String {
    let graph = outcome.graph();
    let stats = outcome.stats();
    let mut out = String::new();

    let _ = writeln!(out, "Nodes: {}", graph.nodes.len());
    for kind in NodeKind::ALL {
        let _ = writeln!(
            out,
            "  {:<10} {}",
            kind.as_str(),
            graph.nodes_of_kind(kind).count()
        );
    }

    let _ = writeln!(out, "Edges: {}", graph.edges.len());
    let _ = writeln!(
        out,
        "  {:<10} {}",
        "contains",
        graph.edges_of_kind(EdgeKind::Contains).count()
    );
    let _ = writeln!(
        out,
        "  {:<10} {}",
        "calls",
        graph.edges_of_kind(EdgeKind::Calls).count()
    );
    for relationship in [
        Relationship::SameClass,
        Relationship::SamePackage,
        Relationship::CrossPackage,
    ] {
        let count = graph
            .edges
            .iter()
            .filter(|e| e.relationship == Some(relationship))
            .count();
        let _ = writeln!(out, "    {:<14} {count}", relationship.as_str());
    }

    let _ = writeln!(
        out,
        "Calls: {} candidates, {} resolved, {} unresolved",
        stats.call_candidates(),
        stats.resolved_calls(),
        stats.unresolved_calls()
    );
    let _ = write!(
        out,
        "Files: {} processed, {} failed in {}ms",
        stats.files(),
        stats.failed_files(),
        stats.elapsed_ms()
    );
    for error in outcome.errors() {
        let _ = write!(out, "\n  {}: {}", error.path, error.message);
    }
    out
}

//! Code graph construction
//!
//! This crate walks a workspace, asks a [`SymbolProvider`] for the structure
//! of every source file, and assembles a graph of directories, files,
//! packages, classes and methods joined by containment and call edges.
//!
//! The pipeline has three phases:
//!
//! 1. **Traverse**: recursive directory walk with batch-bounded concurrency,
//!    building nodes, containment edges and call candidates per file
//! 2. **Resolve**: candidates are matched against every method registered
//!    during traversal and turned into classified call edges
//! 3. **Deduplicate**: nodes sharing an id are dropped after the first

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

mod accumulator;
mod common;
mod graph_builder;
mod resolve;
mod scope;
mod traverser;

pub mod call_detector;
pub mod semantic_tokens;
pub mod symbol_cache;

pub use accumulator::{GraphAccumulator, MethodRegistry, PendingCalls};
pub use call_detector::{CallCandidate, CallDetector, CallSignal};
pub use common::{load_document, MAX_FILE_SIZE};
pub use graph_builder::GraphBuilder;
pub use resolve::{resolve_calls, ResolutionStats};
pub use symbol_cache::{SymbolCache, SymbolTree};
pub use traverser::WorkspaceTraverser;

// Re-export error types from core
pub use codepath_core::error::{Error, Result};

use accumulator::Counters;
use codepath_core::{CodeGraph, Config, SymbolProvider};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// A non-fatal failure isolated to one file or directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    /// The path where the error occurred
    pub path: String,
    /// The error message
    pub message: String,
}

impl FileError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Statistics for one graph build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStats {
    directories: usize,
    files: usize,
    failed_files: usize,
    methods: usize,
    call_candidates: usize,
    resolved_calls: usize,
    unresolved_calls: usize,
    depth_limited: usize,
    duplicate_nodes: usize,
    elapsed_ms: u64,
}

impl BuildStats {
    /// Get the number of directories visited
    pub fn directories(&self) -> usize {
        self.directories
    }

    /// Get the number of source files processed
    pub fn files(&self) -> usize {
        self.files
    }

    /// Get the number of files whose processing failed
    pub fn failed_files(&self) -> usize {
        self.failed_files
    }

    /// Get the number of distinct methods registered
    pub fn methods(&self) -> usize {
        self.methods
    }

    /// Get the number of call candidates detected
    pub fn call_candidates(&self) -> usize {
        self.call_candidates
    }

    /// Get the number of candidates matched to a known method
    pub fn resolved_calls(&self) -> usize {
        self.resolved_calls
    }

    /// Get the number of candidates dropped for an unknown target
    pub fn unresolved_calls(&self) -> usize {
        self.unresolved_calls
    }

    /// Get the number of branches abandoned at the depth limit
    pub fn depth_limited(&self) -> usize {
        self.depth_limited
    }

    /// Get the number of duplicate nodes dropped
    pub fn duplicate_nodes(&self) -> usize {
        self.duplicate_nodes
    }

    /// Get the build time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }
}

/// Result of [`build_graph`]
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    graph: CodeGraph,
    stats: BuildStats,
    errors: Vec<FileError>,
}

impl BuildOutcome {
    pub fn graph(&self) -> &CodeGraph {
        &self.graph
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Non-fatal errors, in the order they were recorded
    pub fn errors(&self) -> &[FileError] {
        &self.errors
    }

    pub fn into_graph(self) -> CodeGraph {
        self.graph
    }
}

/// Builds the graph for `root` without deduplicating nodes.
///
/// Node ids may repeat (for example a package declared by several files);
/// every edge endpoint is nevertheless present.
///
/// # Errors
///
/// Fails only when `root` cannot be read.
pub async fn traverse(
    root: &Path,
    provider: &dyn SymbolProvider,
    cache: &SymbolCache,
    config: &Config,
) -> Result<CodeGraph> {
    let (acc, _) = run(root, provider, cache, config).await?;
    Ok(acc.into_parts().0)
}

/// Builds the deduplicated graph for `root`.
///
/// `cache` is consulted before the provider for every symbol tree; pass a
/// fresh cache to force every document to be re-queried.
///
/// # Errors
///
/// Fails only when `root` cannot be read. Everything else is recorded in
/// [`BuildOutcome::errors`] and the logs.
///
/// # Example
///
/// ```no_run
/// use codepath_core::{Config, SymbolProvider};
/// use codepath_indexer::{build_graph, SymbolCache};
/// use std::path::Path;
///
/// # async fn example(provider: &dyn SymbolProvider) -> codepath_indexer::Result<()> {
/// let cache = SymbolCache::new();
/// let outcome = build_graph(Path::new("/path/to/project"), provider, &cache, &Config::default()).await?;
/// println!("{} nodes", outcome.graph().nodes.len());
/// # Ok(())
/// # }
/// ```
pub async fn build_graph(
    root: &Path,
    provider: &dyn SymbolProvider,
    cache: &SymbolCache,
    config: &Config,
) -> Result<BuildOutcome> {
    let start_time = Instant::now();
    info!(root = %root.display(), "Building code graph");

    let (acc, resolution) = run(root, provider, cache, config).await?;

    let counters = &acc.counters;
    let mut stats = BuildStats {
        directories: Counters::read(&counters.directories),
        files: Counters::read(&counters.files),
        failed_files: Counters::read(&counters.failed_files),
        methods: acc.methods().len(),
        call_candidates: Counters::read(&counters.call_candidates),
        resolved_calls: resolution.resolved,
        unresolved_calls: resolution.unresolved,
        depth_limited: Counters::read(&counters.depth_limited),
        ..BuildStats::default()
    };

    let (mut graph, errors) = acc.into_parts();
    stats.duplicate_nodes = graph.dedupe_nodes();
    stats.elapsed_ms = start_time.elapsed().as_millis() as u64;

    if !errors.is_empty() {
        warn!("{} paths failed during the build", errors.len());
    }
    info!(
        "Built graph with {} nodes and {} edges from {} files in {}ms",
        graph.nodes.len(),
        graph.edges.len(),
        stats.files,
        stats.elapsed_ms
    );

    Ok(BuildOutcome {
        graph,
        stats,
        errors,
    })
}

async fn run(
    root: &Path,
    provider: &dyn SymbolProvider,
    cache: &SymbolCache,
    config: &Config,
) -> Result<(GraphAccumulator, ResolutionStats)> {
    let acc = GraphAccumulator::new();
    WorkspaceTraverser::new(provider, cache, config)
        .traverse(root, &acc)
        .await?;
    let resolution = resolve_calls(&acc, config.calls.dedupe_edges);
    Ok((acc, resolution))
}

//! Workspace directory traversal
//!
//! Directories are visited recursively. Each directory emits its node before
//! any child is scheduled; children (subdirectories and source files) are run
//! in batches of at most `max_concurrent_files`, each batch awaited in full
//! before the next is started. Batches of different directories are
//! independent, so this bounds pressure per directory rather than globally.

use crate::accumulator::{Counters, GraphAccumulator};
use crate::common::{containment_title, EntryFilter};
use crate::graph_builder::GraphBuilder;
use crate::symbol_cache::SymbolCache;
use crate::FileError;
use codepath_core::node_factory::{directory_id, directory_node};
use codepath_core::{Config, Error, GraphEdge, Result, SymbolProvider, TraversalConfig};
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Recursive, batch-bounded walk over a workspace
pub struct WorkspaceTraverser<'a> {
    builder: GraphBuilder<'a>,
    traversal: &'a TraversalConfig,
    filter: EntryFilter,
}

impl<'a> WorkspaceTraverser<'a> {
    pub fn new(
        provider: &'a dyn SymbolProvider,
        cache: &'a SymbolCache,
        config: &'a Config,
    ) -> Self {
        Self {
            builder: GraphBuilder::new(provider, cache, &config.calls),
            traversal: &config.traversal,
            filter: EntryFilter::new(&config.traversal),
        }
    }

    /// Visits `root` and everything below it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkspaceRoot`] when the root itself cannot be read.
    /// Failures below the root are logged and recorded on `acc`.
    pub async fn traverse(&self, root: &Path, acc: &GraphAccumulator) -> Result<()> {
        self.visit_directory(root.to_path_buf(), None, 0, acc)
            .await
            .map_err(|e| Error::workspace_root(root, e))
    }

    fn visit_directory<'s>(
        &'s self,
        dir: PathBuf,
        parent: Option<PathBuf>,
        depth: usize,
        acc: &'s GraphAccumulator,
    ) -> BoxFuture<'s, io::Result<()>> {
        async move {
            if depth > self.traversal.max_depth {
                warn!("Reached maximum depth at {}", dir.display());
                Counters::bump(&acc.counters.depth_limited);
                return Ok(());
            }

            let dir_id = directory_id(&dir);
            acc.push_node(directory_node(&dir, parent.as_deref()));
            Counters::bump(&acc.counters.directories);
            if let Some(parent) = &parent {
                let parent_id = directory_id(parent);
                acc.push_edge(GraphEdge::contains(
                    parent_id.as_str(),
                    dir_id.as_str(),
                    containment_title(&parent_id, "contains", &dir_id),
                ));
            }

            let entries = read_entries(&dir).await?;
            let mut batch: Vec<BoxFuture<'s, ()>> = Vec::new();

            for (path, is_dir) in entries {
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if self.filter.is_ignored(name) {
                    continue;
                }

                if is_dir {
                    let parent = dir.clone();
                    batch.push(
                        async move {
                            if let Err(e) = self
                                .visit_directory(path.clone(), Some(parent), depth + 1, acc)
                                .await
                            {
                                error!("Failed to read directory {}: {e}", path.display());
                                acc.record_error(FileError::new(
                                    path.display().to_string(),
                                    e.to_string(),
                                ));
                            }
                        }
                        .boxed(),
                    );
                } else if self.traversal.is_source_file(name) {
                    let parent_id = dir_id.clone();
                    batch.push(
                        async move {
                            self.builder.process_file(&path, &parent_id, acc).await;
                        }
                        .boxed(),
                    );
                }

                if batch.len() >= self.traversal.max_concurrent_files {
                    debug!(
                        "Awaiting batch of {} tasks in {}",
                        batch.len(),
                        dir.display()
                    );
                    join_all(std::mem::take(&mut batch)).await;
                }
            }
            join_all(batch).await;

            Ok(())
        }
        .boxed()
    }
}

/// Entries of `dir` as `(path, is_directory)`, sorted by path.
///
/// File types come from the directory entry and do not follow symlinks.
async fn read_entries(dir: &Path) -> io::Result<Vec<(PathBuf, bool)>> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let file_type = match entry.file_type().await {
            Ok(file_type) => file_type,
            Err(e) => {
                warn!("Skipping {}: {e}", entry.path().display());
                continue;
            }
        };
        if file_type.is_dir() {
            entries.push((entry.path(), true));
        } else if file_type.is_file() {
            entries.push((entry.path(), false));
        }
    }
    entries.sort();
    Ok(entries)
}

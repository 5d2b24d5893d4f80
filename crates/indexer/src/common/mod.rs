//! Common utilities for the graph builder
//!
//! This module provides document loading, entry filtering and edge labelling
//! helpers shared by the traverser and the builder.

use codepath_core::error::{Error, Result};
use codepath_core::{Document, TraversalConfig};
use glob::Pattern;
use std::path::Path;
use tracing::{debug, warn};

/// Files larger than this are not opened
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Reads a source file into a [`Document`]
pub async fn load_document(path: &Path) -> Result<Document> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| Error::document(path.display().to_string(), e.to_string()))?;
    if metadata.len() > MAX_FILE_SIZE {
        return Err(Error::document(
            path.display().to_string(),
            format!("file too large ({} bytes)", metadata.len()),
        ));
    }

    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::document(path.display().to_string(), e.to_string()))?;
    Document::new(path, text)
}

/// Entry-name filter built from configured glob patterns
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    ignore: Vec<Pattern>,
}

impl EntryFilter {
    /// Compiles the traversal patterns; invalid patterns are skipped with a warning
    pub fn new(config: &TraversalConfig) -> Self {
        let ignore = config
            .ignore_patterns
            .iter()
            .filter_map(|p| match Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!("Ignoring invalid pattern '{p}': {e}");
                    None
                }
            })
            .collect();
        Self { ignore }
    }

    /// Whether an entry with this name is skipped entirely
    pub fn is_ignored(&self, name: &str) -> bool {
        let ignored = self.ignore.iter().any(|p| p.matches(name));
        if ignored {
            debug!("Skipping ignored entry: {name}");
        }
        ignored
    }
}

/// `"<parent name> <verb> <child id>"` title for a containment edge
pub fn containment_title(parent_id: &str, verb: &str, child_id: &str) -> String {
    let parent_name = Path::new(parent_id)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| parent_id.to_string());
    format!("{parent_name} {verb} {child_id}")
}

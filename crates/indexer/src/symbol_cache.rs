//! Memoized symbol trees keyed by document path
//!
//! The cache is owned by the caller and passed into a build. Reusing one
//! across builds skips provider queries for documents already seen; passing
//! a fresh (or [`SymbolCache::reset`]) cache forces every document to be
//! re-queried.

use codepath_core::{Document, Result, SymbolProvider};
use dashmap::DashMap;
use lsp_types::DocumentSymbol;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

/// Shared symbol tree for one document
pub type SymbolTree = Arc<Vec<DocumentSymbol>>;

#[derive(Debug, Default)]
pub struct SymbolCache {
    entries: DashMap<PathBuf, SymbolTree>,
}

impl SymbolCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached tree for `path`, if any
    pub fn get(&self, path: &Path) -> Option<SymbolTree> {
        self.entries.get(path).map(|entry| Arc::clone(entry.value()))
    }

    /// Pre-populates the cache
    pub fn insert(&self, path: impl Into<PathBuf>, symbols: Vec<DocumentSymbol>) -> SymbolTree {
        let tree = Arc::new(symbols);
        self.entries.insert(path.into(), Arc::clone(&tree));
        tree
    }

    /// Returns the cached tree or queries the provider.
    ///
    /// Only a returned tree is stored; a provider answering "no information"
    /// is asked again on the next lookup.
    pub async fn get_or_fetch(
        &self,
        provider: &dyn SymbolProvider,
        document: &Document,
    ) -> Result<Option<SymbolTree>> {
        if let Some(tree) = self.get(document.path()) {
            trace!("Symbol cache hit: {}", document.path().display());
            return Ok(Some(tree));
        }

        let symbols = provider.symbol_tree(document).await?;
        Ok(symbols.map(|symbols| self.insert(document.path(), symbols)))
    }

    /// Drops every entry
    pub fn reset(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

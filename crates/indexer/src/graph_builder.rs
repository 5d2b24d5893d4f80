//! Per-file graph construction
//!
//! [`GraphBuilder::process_file`] turns one source file into a file node plus
//! the package, class and method nodes of its symbol tree, with containment
//! edges, and records the calls detected inside each method for resolution
//! once the whole workspace has been visited.

use crate::accumulator::{Counters, GraphAccumulator, PendingCalls};
use crate::call_detector::CallDetector;
use crate::common::{containment_title, load_document};
use crate::scope::{advance, children};
use crate::symbol_cache::SymbolCache;
use crate::FileError;
use codepath_core::node_factory::{class_node, file_node, method_name, method_node, package_node};
use codepath_core::{
    CallDetectionConfig, Document, GraphEdge, Result, ScopeContext, SymbolProvider, SymbolRole,
};
use lsp_types::DocumentSymbol;
use std::path::Path;
use tracing::{debug, error};

/// A method symbol and the node built for it
struct MethodSite<'s> {
    symbol: &'s DocumentSymbol,
    node_id: String,
}

/// Builds graph elements for source files
pub struct GraphBuilder<'a> {
    provider: &'a dyn SymbolProvider,
    cache: &'a SymbolCache,
    calls: &'a CallDetectionConfig,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        provider: &'a dyn SymbolProvider,
        cache: &'a SymbolCache,
        calls: &'a CallDetectionConfig,
    ) -> Self {
        Self {
            provider,
            cache,
            calls,
        }
    }

    /// Adds `file_path` and everything declared in it to `acc`.
    ///
    /// A file whose node already exists in `acc` is skipped. Failures are
    /// logged and recorded on the accumulator; the file node stays.
    pub async fn process_file(&self, file_path: &Path, parent_id: &str, acc: &GraphAccumulator) {
        let node = file_node(file_path, parent_id);
        let file_id = node.id.clone();
        if !acc.insert_node_if_absent(node) {
            debug!("Skipping duplicate file: {}", file_path.display());
            return;
        }
        Counters::bump(&acc.counters.files);
        acc.push_edge(GraphEdge::contains(
            parent_id,
            &file_id,
            containment_title(parent_id, "contains", &file_id),
        ));

        if let Err(e) = self.build_file(file_path, &file_id, acc).await {
            error!("Error processing {}: {e}", file_path.display());
            Counters::bump(&acc.counters.failed_files);
            acc.record_error(FileError::new(
                file_path.display().to_string(),
                e.to_string(),
            ));
        }
    }

    async fn build_file(&self, file_path: &Path, file_id: &str, acc: &GraphAccumulator) -> Result<()> {
        let document = load_document(file_path).await?;
        let Some(symbols) = self.cache.get_or_fetch(self.provider, &document).await? else {
            debug!("No symbols for {}", file_path.display());
            return Ok(());
        };

        let mut sites = Vec::new();
        self.walk(&symbols, &ScopeContext::new(), &document, file_id, acc, &mut sites);

        if sites.is_empty() {
            return Ok(());
        }

        let detector =
            CallDetector::new(self.provider, self.cache, self.calls, &document, &symbols).await;
        for site in sites {
            let candidates = detector.detect_calls(site.symbol).await;
            let Some(source) = acc.methods().get(&site.node_id) else {
                continue;
            };
            acc.defer_calls(PendingCalls { source, candidates });
        }

        debug!("Processed file: {}", file_path.display());
        Ok(())
    }

    /// Depth-first walk emitting nodes and containment edges
    fn walk<'s>(
        &self,
        symbols: &'s [DocumentSymbol],
        scope: &ScopeContext,
        document: &Document,
        file_id: &str,
        acc: &GraphAccumulator,
        sites: &mut Vec<MethodSite<'s>>,
    ) {
        let mut scope = scope.clone();
        for symbol in symbols {
            match SymbolRole::of(symbol.kind) {
                Some(SymbolRole::Package) => {
                    acc.push_node(package_node(&symbol.name, file_id));
                }
                Some(SymbolRole::Class) => {
                    let node = class_node(&scope, &symbol.name, document.path(), file_id);
                    let class_id = node.id.clone();
                    if acc.insert_node_if_absent(node) {
                        acc.push_edge(GraphEdge::contains(
                            file_id,
                            &class_id,
                            containment_title(file_id, "contains", &class_id),
                        ));
                    }
                }
                Some(SymbolRole::Method) => {
                    let parent_id = scope.class_id.as_deref().unwrap_or(file_id);
                    let node = method_node(
                        &scope,
                        method_name(&symbol.name),
                        symbol.detail.as_deref(),
                        document.path(),
                        parent_id,
                    );
                    let method_id = node.id.clone();
                    acc.push_node(node.clone());
                    acc.methods().register(node);
                    acc.push_edge(GraphEdge::contains(
                        parent_id,
                        &method_id,
                        containment_title(parent_id, "has", &method_id),
                    ));
                    sites.push(MethodSite {
                        symbol,
                        node_id: method_id,
                    });
                }
                None => {}
            }

            scope = advance(&scope, symbol, document.path());
            self.walk(children(symbol), &scope, document, file_id, acc, sites);
        }
    }
}

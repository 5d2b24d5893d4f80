//! Scripted provider and a one-file workspace for CLI tests

#![allow(dead_code)]
#![allow(clippy::expect_used)]

use async_trait::async_trait;
use codepath_core::{Document, Result, SymbolProvider};
use lsp_types::{DocumentSymbol, Location, Position, Range, SemanticTokens, SymbolKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

pub const GREETER_JAVA: &str = "package demo;

public class Greeter {
    void greet() {
    }
}
";

#[allow(deprecated)]
fn symbol(name: &str, kind: SymbolKind, range: Range, children: Vec<DocumentSymbol>) -> DocumentSymbol {
    DocumentSymbol {
        name: name.to_string(),
        detail: None,
        kind,
        tags: None,
        deprecated: None,
        range,
        selection_range: Range::new(range.start, range.start),
        children: (!children.is_empty()).then_some(children),
    }
}

fn span(start: u32, end: u32) -> Range {
    Range::new(Position::new(start, 0), Position::new(end, 1))
}

pub fn greeter_symbols() -> Vec<DocumentSymbol> {
    vec![
        symbol("demo", SymbolKind::PACKAGE, span(0, 0), vec![]),
        symbol(
            "Greeter",
            SymbolKind::CLASS,
            span(2, 5),
            vec![symbol("greet()", SymbolKind::METHOD, span(3, 4), vec![])],
        ),
    ]
}

/// Answers symbol trees from a script and nothing else
#[derive(Default)]
pub struct ScriptedProvider {
    symbols: HashMap<PathBuf, Vec<DocumentSymbol>>,
    symbol_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn with_symbols(mut self, path: &Path, symbols: Vec<DocumentSymbol>) -> Self {
        self.symbols.insert(path.to_path_buf(), symbols);
        self
    }

    pub fn symbol_calls(&self) -> usize {
        self.symbol_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SymbolProvider for ScriptedProvider {
    async fn symbol_tree(&self, document: &Document) -> Result<Option<Vec<DocumentSymbol>>> {
        self.symbol_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.symbols.get(document.path()).cloned())
    }

    async fn semantic_tokens(&self, _document: &Document) -> Result<Option<SemanticTokens>> {
        Ok(None)
    }

    async fn semantic_token_legend(&self, _document: &Document) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn definition(
        &self,
        _document: &Document,
        _position: Position,
    ) -> Result<Option<Vec<Location>>> {
        Ok(None)
    }
}

/// Workspace holding `Greeter.java`, with a provider scripted for it
pub fn greeter_workspace() -> (TempDir, ScriptedProvider) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let file = temp_dir.path().join("Greeter.java");
    std::fs::write(&file, GREETER_JAVA).expect("Failed to write source");
    let provider = ScriptedProvider::default().with_symbols(&file, greeter_symbols());
    (temp_dir, provider)
}

//! Scripted symbol provider and workspace fixtures shared by integration tests

#![allow(dead_code)]
#![allow(clippy::expect_used)]

use async_trait::async_trait;
use codepath_core::document::range_contains_position;
use codepath_core::{path_to_uri, Document, Error, Result, SymbolProvider};
use lsp_types::{
    DocumentSymbol, Location, Position, Range, SemanticToken, SemanticTokens, SymbolKind,
};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn range(start: (u32, u32), end: (u32, u32)) -> Range {
    Range::new(Position::new(start.0, start.1), Position::new(end.0, end.1))
}

#[allow(deprecated)]
pub fn symbol(
    name: &str,
    kind: SymbolKind,
    range: Range,
    selection: Range,
    children: Vec<DocumentSymbol>,
) -> DocumentSymbol {
    DocumentSymbol {
        name: name.to_string(),
        detail: None,
        kind,
        tags: None,
        deprecated: None,
        range,
        selection_range: selection,
        children: (!children.is_empty()).then_some(children),
    }
}

/// Symbol provider answering from per-path scripts
#[derive(Default)]
pub struct MockSymbolProvider {
    symbols: HashMap<PathBuf, Vec<DocumentSymbol>>,
    tokens: HashMap<PathBuf, Vec<SemanticToken>>,
    legend: Vec<String>,
    definitions: Vec<(PathBuf, Range, Location)>,
    failing: HashSet<PathBuf>,
    symbol_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    queried: Mutex<Vec<PathBuf>>,
}

impl MockSymbolProvider {
    pub fn new() -> Self {
        Self {
            legend: vec![
                "class".to_string(),
                "method".to_string(),
                "variable".to_string(),
            ],
            ..Self::default()
        }
    }

    pub fn with_symbols(mut self, path: &Path, symbols: Vec<DocumentSymbol>) -> Self {
        self.symbols.insert(path.to_path_buf(), symbols);
        self
    }

    pub fn with_tokens(mut self, path: &Path, tokens: Vec<SemanticToken>) -> Self {
        self.tokens.insert(path.to_path_buf(), tokens);
        self
    }

    /// Go-to-definition from `site` (a range in `path`) to `target_range` in `target`
    pub fn with_definition(
        mut self,
        path: &Path,
        site: Range,
        target: &Path,
        target_range: Range,
    ) -> Self {
        let uri = path_to_uri(target).expect("valid path");
        self.definitions
            .push((path.to_path_buf(), site, Location::new(uri, target_range)));
        self
    }

    /// `symbol_tree` fails for `path`
    pub fn failing_on(mut self, path: &Path) -> Self {
        self.failing.insert(path.to_path_buf());
        self
    }

    pub fn symbol_calls(&self) -> usize {
        self.symbol_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn queried(&self) -> Vec<PathBuf> {
        self.queried.lock().expect("lock").clone()
    }
}

#[async_trait]
impl SymbolProvider for MockSymbolProvider {
    async fn symbol_tree(&self, document: &Document) -> Result<Option<Vec<DocumentSymbol>>> {
        self.symbol_calls.fetch_add(1, Ordering::SeqCst);
        self.queried
            .lock()
            .expect("lock")
            .push(document.path().to_path_buf());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(document.path()) {
            return Err(Error::provider("scripted failure"));
        }
        Ok(self.symbols.get(document.path()).cloned())
    }

    async fn semantic_tokens(&self, document: &Document) -> Result<Option<SemanticTokens>> {
        Ok(self.tokens.get(document.path()).map(|data| SemanticTokens {
            result_id: None,
            data: data.clone(),
        }))
    }

    async fn semantic_token_legend(&self, _document: &Document) -> Result<Vec<String>> {
        Ok(self.legend.clone())
    }

    async fn definition(
        &self,
        document: &Document,
        position: Position,
    ) -> Result<Option<Vec<Location>>> {
        let locations: Vec<Location> = self
            .definitions
            .iter()
            .filter(|(path, site, _)| {
                path == document.path() && range_contains_position(site, position)
            })
            .map(|(_, _, location)| location.clone())
            .collect();
        Ok((!locations.is_empty()).then_some(locations))
    }
}

pub const A_JAVA: &str = "package p;

public class A {
    void foo() {
        bar();
    }
}
";

pub const B_JAVA: &str = "package p;

public class B {
    void bar() {
    }
}
";

pub fn a_symbols() -> Vec<DocumentSymbol> {
    let foo = symbol(
        "foo()",
        SymbolKind::METHOD,
        range((3, 4), (5, 5)),
        range((3, 9), (3, 12)),
        vec![],
    );
    vec![
        symbol(
            "p",
            SymbolKind::PACKAGE,
            range((0, 0), (0, 10)),
            range((0, 8), (0, 9)),
            vec![],
        ),
        symbol(
            "A",
            SymbolKind::CLASS,
            range((2, 0), (6, 1)),
            range((2, 13), (2, 14)),
            vec![foo],
        ),
    ]
}

pub fn b_symbols() -> Vec<DocumentSymbol> {
    let bar = symbol(
        "bar()",
        SymbolKind::METHOD,
        range((3, 4), (4, 5)),
        range((3, 9), (3, 12)),
        vec![],
    );
    vec![
        symbol(
            "p",
            SymbolKind::PACKAGE,
            range((0, 0), (0, 10)),
            range((0, 8), (0, 9)),
            vec![],
        ),
        symbol(
            "B",
            SymbolKind::CLASS,
            range((2, 0), (5, 1)),
            range((2, 13), (2, 14)),
            vec![bar],
        ),
    ]
}

/// `bar` at line 4, column 8 of A.java, as a `method` semantic token
pub fn a_tokens() -> Vec<SemanticToken> {
    vec![
        SemanticToken {
            delta_line: 2,
            delta_start: 13,
            length: 1,
            token_type: 0,
            token_modifiers_bitset: 0,
        },
        SemanticToken {
            delta_line: 2,
            delta_start: 8,
            length: 3,
            token_type: 1,
            token_modifiers_bitset: 0,
        },
    ]
}

/// Writes A.java and B.java into `dir` and scripts the provider for them
pub async fn two_class_workspace(dir: &Path) -> MockSymbolProvider {
    let a = dir.join("A.java");
    let b = dir.join("B.java");
    tokio::fs::write(&a, A_JAVA).await.expect("write A.java");
    tokio::fs::write(&b, B_JAVA).await.expect("write B.java");

    MockSymbolProvider::new()
        .with_symbols(&a, a_symbols())
        .with_symbols(&b, b_symbols())
        .with_tokens(&a, a_tokens())
        .with_definition(&a, range((4, 8), (4, 11)), &b, range((3, 9), (3, 12)))
}

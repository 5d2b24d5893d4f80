//! Package/class scope folding over symbol trees
//!
//! A package symbol scopes its later siblings and all of their descendants
//! (language servers report `package p;` as a sibling of the classes it
//! governs). A class symbol scopes its descendants and later siblings. The
//! graph builder and the call detector both fold with [`advance`] so that an
//! id computed while resolving a call matches the id the builder assigned.

use codepath_core::node_factory::class_id;
use codepath_core::{ScopeContext, SymbolRole};
use lsp_types::DocumentSymbol;
use std::path::Path;

/// Scope in effect after visiting `symbol`
pub fn advance(scope: &ScopeContext, symbol: &DocumentSymbol, file_path: &Path) -> ScopeContext {
    match SymbolRole::of(symbol.kind) {
        Some(SymbolRole::Package) => scope.with_package(symbol.name.as_str()),
        Some(SymbolRole::Class) => scope.with_class(
            symbol.name.as_str(),
            class_id(&scope.package, &symbol.name, file_path),
        ),
        _ => scope.clone(),
    }
}

/// Children of a symbol, empty when absent
pub fn children(symbol: &DocumentSymbol) -> &[DocumentSymbol] {
    symbol.children.as_deref().unwrap_or_default()
}

/// Innermost symbol matching `matches`, in walk order, with the scope in effect at it
pub fn find_symbol<'s>(
    symbols: &'s [DocumentSymbol],
    file_path: &Path,
    matches: &dyn Fn(&DocumentSymbol) -> bool,
) -> Option<(ScopeContext, &'s DocumentSymbol)> {
    find_in(symbols, &ScopeContext::new(), file_path, matches)
}

fn find_in<'s>(
    symbols: &'s [DocumentSymbol],
    scope: &ScopeContext,
    file_path: &Path,
    matches: &dyn Fn(&DocumentSymbol) -> bool,
) -> Option<(ScopeContext, &'s DocumentSymbol)> {
    let mut scope = scope.clone();
    for symbol in symbols {
        let at_symbol = scope.clone();
        scope = advance(&scope, symbol, file_path);
        let deeper = find_in(children(symbol), &scope, file_path, matches);
        if deeper.is_some() {
            return deeper;
        }
        if matches(symbol) {
            return Some((at_symbol, symbol));
        }
    }
    None
}

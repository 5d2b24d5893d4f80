//! Trait definition for symbol providers

use crate::document::Document;
use crate::error::Result;
use async_trait::async_trait;
use lsp_types::{DocumentSymbol, Location, Position, SemanticTokens, SymbolKind};
use std::sync::Arc;

/// Source of language-structure facts for a document
///
/// Implementations may be a language server, a static analysis library or a
/// scripted test double. Every query is best-effort: `Ok(None)` or an empty
/// list means "no information" and callers must continue with reduced
/// fidelity. Errors are reserved for failures of the provider itself.
#[async_trait]
pub trait SymbolProvider: Send + Sync {
    /// Hierarchical symbol tree of the document
    async fn symbol_tree(&self, document: &Document) -> Result<Option<Vec<DocumentSymbol>>>;

    /// Semantic token classifications for the whole document
    async fn semantic_tokens(&self, document: &Document) -> Result<Option<SemanticTokens>>;

    /// Token type names indexed by the type index carried in each token
    async fn semantic_token_legend(&self, document: &Document) -> Result<Vec<String>>;

    /// Definition location(s) of the symbol at `position`
    async fn definition(
        &self,
        document: &Document,
        position: Position,
    ) -> Result<Option<Vec<Location>>>;
}

#[async_trait]
impl<T: SymbolProvider + ?Sized> SymbolProvider for Arc<T> {
    async fn symbol_tree(&self, document: &Document) -> Result<Option<Vec<DocumentSymbol>>> {
        (**self).symbol_tree(document).await
    }

    async fn semantic_tokens(&self, document: &Document) -> Result<Option<SemanticTokens>> {
        (**self).semantic_tokens(document).await
    }

    async fn semantic_token_legend(&self, document: &Document) -> Result<Vec<String>> {
        (**self).semantic_token_legend(document).await
    }

    async fn definition(
        &self,
        document: &Document,
        position: Position,
    ) -> Result<Option<Vec<Location>>> {
        (**self).definition(document, position).await
    }
}

/// Structural role a symbol plays in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolRole {
    Package,
    Class,
    Method,
}

impl SymbolRole {
    /// Maps a provider symbol kind to a role; other kinds are only descended into
    pub fn of(kind: SymbolKind) -> Option<Self> {
        match kind {
            SymbolKind::PACKAGE | SymbolKind::NAMESPACE => Some(SymbolRole::Package),
            SymbolKind::CLASS | SymbolKind::INTERFACE | SymbolKind::ENUM => Some(SymbolRole::Class),
            SymbolKind::METHOD => Some(SymbolRole::Method),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_roles() {
        assert_eq!(SymbolRole::of(SymbolKind::PACKAGE), Some(SymbolRole::Package));
        assert_eq!(SymbolRole::of(SymbolKind::CLASS), Some(SymbolRole::Class));
        assert_eq!(SymbolRole::of(SymbolKind::INTERFACE), Some(SymbolRole::Class));
        assert_eq!(SymbolRole::of(SymbolKind::METHOD), Some(SymbolRole::Method));
        assert_eq!(SymbolRole::of(SymbolKind::FIELD), None);
        assert_eq!(SymbolRole::of(SymbolKind::CONSTRUCTOR), None);
    }
}

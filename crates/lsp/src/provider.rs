//! [`SymbolProvider`] backed by a language server

use crate::client::LspClient;
use async_trait::async_trait;
use codepath_core::{Document, ProviderConfig, Result, SymbolProvider};
use lsp_types::{DocumentSymbol, Location, Position, SemanticTokens};
use std::path::Path;
use tracing::debug;

/// Answers symbol queries through an initialized [`LspClient`].
///
/// Every document is opened on the server (once) before it is queried.
pub struct LspSymbolProvider {
    client: LspClient,
    language_id: String,
}

impl LspSymbolProvider {
    pub fn new(client: LspClient, language_id: impl Into<String>) -> Self {
        Self {
            client,
            language_id: language_id.into(),
        }
    }

    /// Spawns and initializes the configured server for `workspace_root`
    pub async fn start(config: &ProviderConfig, workspace_root: &Path) -> Result<Self> {
        let client = LspClient::spawn(config, workspace_root).await?;
        Ok(Self::new(client, config.language_id.clone()))
    }

    pub fn client(&self) -> &LspClient {
        &self.client
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.client.shutdown().await
    }

    async fn ensure_open(&self, document: &Document) -> Result<()> {
        self.client.open_document(document, &self.language_id).await
    }
}

#[async_trait]
impl SymbolProvider for LspSymbolProvider {
    async fn symbol_tree(&self, document: &Document) -> Result<Option<Vec<DocumentSymbol>>> {
        self.ensure_open(document).await?;
        let symbols = self.client.document_symbols(document).await?;
        debug!(
            "{} top-level symbols in {}",
            symbols.as_ref().map_or(0, Vec::len),
            document.path().display()
        );
        Ok(symbols)
    }

    async fn semantic_tokens(&self, document: &Document) -> Result<Option<SemanticTokens>> {
        self.ensure_open(document).await?;
        self.client.semantic_tokens_full(document).await
    }

    async fn semantic_token_legend(&self, _document: &Document) -> Result<Vec<String>> {
        Ok(self.client.legend())
    }

    async fn definition(
        &self,
        document: &Document,
        position: Position,
    ) -> Result<Option<Vec<Location>>> {
        self.ensure_open(document).await?;
        self.client.goto_definition(document, position).await
    }
}

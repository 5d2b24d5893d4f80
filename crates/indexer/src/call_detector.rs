//! Method call detection
//!
//! Candidates come from two independent signals whose results are
//! concatenated without reconciliation:
//!
//! 1. **Lexical**: every `identifier (` in the method's source slice, with
//!    package/class taken from the scope of the method itself.
//! 2. **Semantic**: provider tokens classified as `method` that start inside
//!    the method, with an unresolved `default`/`Unknown` context.
//!
//! When definition resolution is enabled, each candidate's call site is
//! looked up with the provider's go-to-definition and, if it lands inside a
//! known method, the candidate is re-targeted to that method's scope.
//! Resolution never removes a candidate.
//!
//! Detection is best-effort: provider failures are logged and yield a
//! partial result.

use crate::common::load_document;
use crate::scope::find_symbol;
use crate::semantic_tokens::{decode_semantic_tokens, DecodedToken, METHOD_TOKEN_TYPE};
use crate::symbol_cache::SymbolCache;
use codepath_core::document::{range_contains_position, ranges_overlap};
use codepath_core::node_factory::{method_id, method_name, DEFAULT_PACKAGE};
use codepath_core::{
    uri_to_path, CallDetectionConfig, Document, Result, ScopeContext, SymbolProvider, SymbolRole,
};
use lsp_types::{DocumentSymbol, Position};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, error, trace, warn};

/// Class assigned to candidates whose owner was not inferred
pub const UNKNOWN_CLASS: &str = "Unknown";

static CALL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(\b\w+\b)\s*\(")
        .map_err(|e| error!("Call pattern failed to compile; lexical detection disabled: {e}"))
        .ok()
});

/// Signal that produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallSignal {
    Lexical,
    Semantic,
}

/// A possible call from the method being analysed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallCandidate {
    pub package: String,
    pub class_name: String,
    pub method_name: String,
    pub signal: CallSignal,
    /// Call-site position in the calling document
    pub site: Option<Position>,
    /// Package and class came from a definition lookup
    pub resolved_by_definition: bool,
}

impl CallCandidate {
    /// Method id this candidate would resolve to
    pub fn target_id(&self) -> String {
        method_id(&self.package, &self.class_name, &self.method_name)
    }
}

/// Call detection for the methods of one document
pub struct CallDetector<'a> {
    provider: &'a dyn SymbolProvider,
    cache: &'a SymbolCache,
    config: &'a CallDetectionConfig,
    document: &'a Document,
    symbols: &'a [DocumentSymbol],
    method_tokens: Vec<DecodedToken>,
}

impl<'a> CallDetector<'a> {
    /// Prepares detection for `document`, fetching its semantic tokens once
    pub async fn new(
        provider: &'a dyn SymbolProvider,
        cache: &'a SymbolCache,
        config: &'a CallDetectionConfig,
        document: &'a Document,
        symbols: &'a [DocumentSymbol],
    ) -> Self {
        let method_tokens = if config.signals.semantic() {
            match method_tokens(provider, document).await {
                Ok(tokens) => tokens,
                Err(e) => {
                    warn!(
                        "Semantic tokens unavailable for {}: {e}",
                        document.path().display()
                    );
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Self {
            provider,
            cache,
            config,
            document,
            symbols,
            method_tokens,
        }
    }

    /// Call candidates inside `method`
    pub async fn detect_calls(&self, method: &DocumentSymbol) -> Vec<CallCandidate> {
        let mut candidates = Vec::new();
        if self.config.signals.lexical() {
            candidates.extend(self.lexical_candidates(method));
        }
        if self.config.signals.semantic() {
            candidates.extend(self.semantic_candidates(method));
        }

        if self.config.resolve_definitions {
            for candidate in &mut candidates {
                self.resolve_definition(candidate).await;
            }
        }

        trace!(
            "Detected {} call candidates in {}",
            candidates.len(),
            method.name
        );
        candidates
    }

    fn lexical_candidates(&self, method: &DocumentSymbol) -> Vec<CallCandidate> {
        let Some(pattern) = CALL_PATTERN.as_ref() else {
            return Vec::new();
        };
        let lines = self.document.line_index();
        let text = self.document.text();
        let (Some(body), Some(body_start)) = (
            self.document.slice(&method.range),
            lines.offset(text, method.range.start),
        ) else {
            debug!(
                "Method range of {} lies outside {}",
                method.name,
                self.document.path().display()
            );
            return Vec::new();
        };

        let scope = self.method_scope(method);

        pattern
            .captures_iter(body)
            .filter_map(|caps| caps.get(1))
            .filter(|name| !self.is_reserved(name.as_str()))
            .filter_map(|name| {
                let site = lines.position(text, body_start + name.start())?;
                if range_contains_position(&method.selection_range, site) {
                    return None;
                }
                Some(CallCandidate {
                    package: scope.package.clone(),
                    class_name: scope.class_name.clone(),
                    method_name: name.as_str().to_string(),
                    signal: CallSignal::Lexical,
                    site: Some(site),
                    resolved_by_definition: false,
                })
            })
            .collect()
    }

    fn semantic_candidates(&self, method: &DocumentSymbol) -> Vec<CallCandidate> {
        self.method_tokens
            .iter()
            .filter(|token| range_contains_position(&method.range, token.range.start))
            .filter(|token| !ranges_overlap(&method.selection_range, &token.range))
            .filter_map(|token| {
                let name = self.document.slice(&token.range)?.trim();
                (!name.is_empty()).then(|| CallCandidate {
                    package: DEFAULT_PACKAGE.to_string(),
                    class_name: UNKNOWN_CLASS.to_string(),
                    method_name: name.to_string(),
                    signal: CallSignal::Semantic,
                    site: Some(token.range.start),
                    resolved_by_definition: false,
                })
            })
            .collect()
    }

    fn is_reserved(&self, word: &str) -> bool {
        self.config.reserved_words.iter().any(|w| w == word)
    }

    /// Scope the builder assigned to `method`
    fn method_scope(&self, method: &DocumentSymbol) -> ScopeContext {
        find_symbol(self.symbols, self.document.path(), &|s| {
            s.range == method.range && s.kind == method.kind && s.name == method.name
        })
        .map(|(scope, _)| scope)
        .unwrap_or_default()
    }

    async fn resolve_definition(&self, candidate: &mut CallCandidate) {
        let Some(site) = candidate.site else {
            return;
        };

        match self.definition_target(site).await {
            Ok(Some((scope, name))) => {
                trace!(
                    "Definition of {} at {}:{} is {}.{name}",
                    candidate.method_name,
                    site.line,
                    site.character,
                    scope.qualified_class()
                );
                candidate.package = scope.package;
                candidate.class_name = scope.class_name;
                candidate.method_name = name;
                candidate.resolved_by_definition = true;
            }
            Ok(None) => {}
            Err(e) => debug!(
                "Definition lookup for {} failed in {}: {e}",
                candidate.method_name,
                self.document.path().display()
            ),
        }
    }

    /// Scope and bare name of the method declaring the symbol used at `site`
    async fn definition_target(&self, site: Position) -> Result<Option<(ScopeContext, String)>> {
        let Some(locations) = self.provider.definition(self.document, site).await? else {
            return Ok(None);
        };
        let Some(location) = locations.first() else {
            return Ok(None);
        };

        let target_path = uri_to_path(&location.uri)?;
        let declared_at = location.range.start;
        let is_method_at = |s: &DocumentSymbol| {
            SymbolRole::of(s.kind) == Some(SymbolRole::Method)
                && range_contains_position(&s.range, declared_at)
        };

        if target_path == self.document.path() {
            return Ok(find_symbol(self.symbols, &target_path, &is_method_at)
                .map(|(scope, symbol)| (scope, method_name(&symbol.name).to_string())));
        }

        let target = load_document(&target_path).await?;
        let Some(symbols) = self.cache.get_or_fetch(self.provider, &target).await? else {
            return Ok(None);
        };
        Ok(find_symbol(&symbols, &target_path, &is_method_at)
            .map(|(scope, symbol)| (scope, method_name(&symbol.name).to_string())))
    }
}

/// Decoded tokens of the `method` type for a document
async fn method_tokens(
    provider: &dyn SymbolProvider,
    document: &Document,
) -> Result<Vec<DecodedToken>> {
    let Some(tokens) = provider.semantic_tokens(document).await? else {
        return Ok(Vec::new());
    };
    let legend = provider.semantic_token_legend(document).await?;
    Ok(decode_semantic_tokens(&tokens, &legend)
        .into_iter()
        .filter(|token| token.is_type(METHOD_TOKEN_TYPE))
        .collect())
}

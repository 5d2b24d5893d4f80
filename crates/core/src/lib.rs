//! Core types and traits for codepath
//!
//! This crate provides the foundational abstractions used throughout the
//! codepath workspace, including:
//!
//! - **Graph model**: nodes, edges and relationship classification
//! - **Node factory**: deterministic node identifiers and constructors
//! - **Symbol provider**: the contract for language-structure facts
//! - **Documents**: source text with LSP position arithmetic
//! - **Configuration**: layered configuration loading
//! - **Error handling**: unified error types
//!

pub mod classifier;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod graph;
pub mod node_factory;
pub mod provider;

// Re-export main types for convenience
pub use classifier::classify;
pub use config::{
    CallDetectionConfig, CallSignals, Config, ExportConfig, ProviderConfig, TraversalConfig,
};
pub use document::{path_to_uri, uri_to_path, Document, LineIndex};
pub use error::{Error, Result, ResultExt};
pub use export::{ExportMetadata, GraphExport};
pub use graph::{
    dedupe_nodes, CodeGraph, EdgeKind, GraphEdge, GraphNode, NodeKind, NodeMetadata,
    ReferenceLocation, Relationship,
};
pub use node_factory::ScopeContext;
pub use provider::{SymbolProvider, SymbolRole};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Result, ResultExt};
    pub use crate::graph::{CodeGraph, GraphEdge, GraphNode, NodeKind};
    pub use crate::provider::SymbolProvider;
}

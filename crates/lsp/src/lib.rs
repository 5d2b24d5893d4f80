//! Language server symbol provider
//!
//! This crate drives a Language Server Protocol server over stdio and exposes
//! it as a [`codepath_core::SymbolProvider`]. It uses four queries:
//!
//! - `textDocument/documentSymbol` for the hierarchical symbol tree
//! - `textDocument/semanticTokens/full` for method-reference tokens
//! - `textDocument/definition` for call-site resolution
//! - the semantic token legend announced in the `initialize` response
//!
//! ## Supported Language Servers
//!
//! Any server reachable through the configured command works. The default
//! configuration targets `jdtls` for Java.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod client;
pub mod jsonrpc;
pub mod provider;

pub use client::LspClient;
pub use provider::LspSymbolProvider;

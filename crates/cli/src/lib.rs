//! Library interface for the codepath CLI
//!
//! This module exposes the command implementations for integration testing
//! while keeping argument parsing and process setup in main.rs.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod commands;
pub mod output;
pub mod session;

// Re-export commonly needed types for tests
pub use anyhow::Result;
pub use codepath_core::config::Config;
pub use session::{Session, SessionRequest, SessionResponse};

use clap::ValueEnum;

/// How `scan` reports the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Per-kind counts and build statistics
    #[default]
    Summary,
    /// `{nodes, edges}` JSON
    Json,
}

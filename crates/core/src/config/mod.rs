//! Configuration module for codepath
//!
//! This module provides configuration structures and loading mechanisms.
//! Configuration can be loaded from TOML files and/or environment variables.

mod defaults;
mod loading;


use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use defaults::*;

pub use defaults::{DEFAULT_EXPORT_FILE_NAME, WORKSPACE_CONFIG_FILE_NAME};

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.codepath/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".codepath").join("config.toml"))
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Workspace traversal
    #[serde(default)]
    pub traversal: TraversalConfig,

    /// Method call detection
    #[serde(default)]
    pub calls: CallDetectionConfig,

    /// Symbol provider process
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Export output
    #[serde(default)]
    pub export: ExportConfig,
}

/// Workspace traversal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraversalConfig {
    /// Maximum build tasks in flight per directory batch
    #[serde(default = "default_max_concurrent_files")]
    pub max_concurrent_files: usize,

    /// Maximum directory recursion depth; the root is depth 0
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Source file extensions to process, without the leading dot
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,

    /// Glob patterns matched against entry names; matches are not visited
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_concurrent_files: default_max_concurrent_files(),
            max_depth: default_max_depth(),
            source_extensions: default_source_extensions(),
            ignore_patterns: default_ignore_patterns(),
        }
    }
}

/// Which call-detection signals contribute candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallSignals {
    /// Identifier-followed-by-paren scan only
    Lexical,
    /// Semantic token classification only
    Semantic,
    /// Both, concatenated
    #[default]
    Both,
}

impl CallSignals {
    pub fn lexical(&self) -> bool {
        matches!(self, CallSignals::Lexical | CallSignals::Both)
    }

    pub fn semantic(&self) -> bool {
        matches!(self, CallSignals::Semantic | CallSignals::Both)
    }
}

/// Method call detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallDetectionConfig {
    #[serde(default)]
    pub signals: CallSignals,

    /// Re-target candidates through the provider's go-to-definition
    #[serde(default = "default_resolve_definitions")]
    pub resolve_definitions: bool,

    /// Keep only the first call edge per (from, to) pair
    #[serde(default = "default_dedupe_edges")]
    pub dedupe_edges: bool,

    /// Identifiers never treated as call candidates by the lexical scan
    #[serde(default = "default_reserved_words")]
    pub reserved_words: Vec<String>,
}

impl Default for CallDetectionConfig {
    fn default() -> Self {
        Self {
            signals: CallSignals::default(),
            resolve_definitions: default_resolve_definitions(),
            dedupe_edges: default_dedupe_edges(),
            reserved_words: default_reserved_words(),
        }
    }
}

/// Language server process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Command and arguments used to spawn the server
    #[serde(default = "default_provider_command")]
    pub command: Vec<String>,

    /// Language id announced when opening documents
    #[serde(default = "default_language_id")]
    pub language_id: String,

    /// Passed verbatim as `initializationOptions`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initialization_options: Option<serde_json::Value>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            command: default_provider_command(),
            language_id: default_language_id(),
            initialization_options: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// File name used when no output path is given
    #[serde(default = "default_export_file_name")]
    pub file_name: String,

    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: default_export_file_name(),
            pretty: default_pretty(),
        }
    }
}

impl TraversalConfig {
    /// Whether `file_name` ends in one of the configured source extensions
    pub fn is_source_file(&self, file_name: &str) -> bool {
        std::path::Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.source_extensions.iter().any(|s| s == ext))
    }
}

impl Config {
    /// Validates configuration values
    pub fn validate(&self) -> Result<()> {
        if self.traversal.max_concurrent_files == 0 {
            return Err(Error::config(
                "traversal.max_concurrent_files must be greater than 0",
            ));
        }

        if self.traversal.source_extensions.is_empty() {
            return Err(Error::config(
                "traversal.source_extensions must list at least one extension",
            ));
        }

        if let Some(ext) = self
            .traversal
            .source_extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            return Err(Error::config(format!(
                "Invalid source extension '{ext}': expected a bare extension such as 'java'"
            )));
        }

        for pattern in &self.traversal.ignore_patterns {
            glob::Pattern::new(pattern).map_err(|e| {
                Error::config(format!("Invalid ignore pattern '{pattern}': {e}"))
            })?;
        }

        if self.provider.command.first().is_none_or(|c| c.trim().is_empty()) {
            return Err(Error::config("provider.command must not be empty"));
        }

        if self.provider.request_timeout_secs == 0 {
            return Err(Error::config(
                "provider.request_timeout_secs must be greater than 0",
            ));
        }

        Ok(())
    }
}

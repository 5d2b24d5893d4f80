//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::defaults::*;
use super::{global_config_path, Config};

type Builder = LibConfigBuilder<config::builder::DefaultState>;

/// Helper to set a config default with consistent error mapping
fn set_config_default<T: Into<config::Value>>(
    builder: Builder,
    key: &str,
    value: T,
) -> Result<Builder> {
    builder
        .set_default(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} default: {e}")))
}

fn with_defaults(builder: Builder) -> Result<Builder> {
    let builder = set_config_default(
        builder,
        "traversal.max_concurrent_files",
        default_max_concurrent_files() as i64,
    )?;
    let builder = set_config_default(builder, "traversal.max_depth", default_max_depth() as i64)?;
    let builder = set_config_default(
        builder,
        "traversal.source_extensions",
        default_source_extensions(),
    )?;
    let builder = set_config_default(
        builder,
        "traversal.ignore_patterns",
        default_ignore_patterns(),
    )?;

    let builder = set_config_default(builder, "calls.signals", "both")?;
    let builder = set_config_default(
        builder,
        "calls.resolve_definitions",
        default_resolve_definitions(),
    )?;
    let builder = set_config_default(builder, "calls.dedupe_edges", default_dedupe_edges())?;
    let builder = set_config_default(builder, "calls.reserved_words", default_reserved_words())?;

    let builder = set_config_default(builder, "provider.command", default_provider_command())?;
    let builder = set_config_default(builder, "provider.language_id", default_language_id())?;
    let builder = set_config_default(
        builder,
        "provider.request_timeout_secs",
        default_request_timeout_secs() as i64,
    )?;

    let builder = set_config_default(builder, "export.file_name", default_export_file_name())?;
    set_config_default(builder, "export.pretty", default_pretty())
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// A missing file is not an error; defaults and environment still apply.
    /// Environment variables are prefixed with `CODEPATH_` and use double
    /// underscores for nested values, for example `CODEPATH_TRAVERSAL__MAX_DEPTH=5`.
    /// List values are comma separated: `CODEPATH_TRAVERSAL__SOURCE_EXTENSIONS=java,kt`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut builder = with_defaults(ConfigLib::builder())?;

        if path.exists() {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("CODEPATH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("traversal.source_extensions")
                .with_list_parse_key("traversal.ignore_patterns")
                .with_list_parse_key("calls.reserved_words")
                .with_list_parse_key("provider.command"),
        );

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration for a workspace
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file: `--config` path, else `<workspace>/.codepath.toml` when
    ///    present, else `~/.codepath/config.toml`
    /// 3. Environment variables (CODEPATH_*)
    pub fn load(config_path: Option<&Path>, workspace_root: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => Self::discover(workspace_root)?,
        };
        Self::from_file(&path)
    }

    fn discover(workspace_root: Option<&Path>) -> Result<PathBuf> {
        if let Some(local) = workspace_root
            .map(|root| root.join(WORKSPACE_CONFIG_FILE_NAME))
            .filter(|p| p.is_file())
        {
            return Ok(local);
        }
        global_config_path()
    }
}

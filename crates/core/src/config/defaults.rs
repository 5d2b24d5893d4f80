//! Default values and functions for configuration

pub const DEFAULT_EXPORT_FILE_NAME: &str = "code-structure.json";
pub const WORKSPACE_CONFIG_FILE_NAME: &str = ".codepath.toml";

pub(crate) const DEFAULT_LANGUAGE_ID: &str = "java";
pub(crate) const DEFAULT_PROVIDER_COMMAND: &str = "jdtls";

pub(crate) fn default_max_concurrent_files() -> usize {
    100
}

pub(crate) fn default_max_depth() -> usize {
    20
}

pub(crate) fn default_source_extensions() -> Vec<String> {
    vec!["java".to_string()]
}

pub(crate) fn default_ignore_patterns() -> Vec<String> {
    vec![".git".to_string(), "node_modules".to_string()]
}

pub(crate) fn default_resolve_definitions() -> bool {
    true
}

pub(crate) fn default_dedupe_edges() -> bool {
    true
}

pub(crate) fn default_reserved_words() -> Vec<String> {
    vec!["this".to_string(), "super".to_string()]
}

pub(crate) fn default_provider_command() -> Vec<String> {
    vec![DEFAULT_PROVIDER_COMMAND.to_string()]
}

pub(crate) fn default_language_id() -> String {
    DEFAULT_LANGUAGE_ID.to_string()
}

pub(crate) fn default_request_timeout_secs() -> u64 {
    30
}

pub(crate) fn default_export_file_name() -> String {
    DEFAULT_EXPORT_FILE_NAME.to_string()
}

pub(crate) fn default_pretty() -> bool {
    true
}

//! JSON-lines session over stdin/stdout
//!
//! Each input line is one request object tagged by `type`; each produces
//! exactly one response line. The session owns a symbol cache that `scan`
//! reuses across requests, while `exportFullStructure` always starts from an
//! empty cache.

use crate::commands::{default_export_path, export, scan};
use crate::output::write_file;
use anyhow::{anyhow, Context, Result};
use codepath_core::{CodeGraph, Config, NodeKind, SymbolProvider};
use codepath_indexer::{BuildStats, SymbolCache};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info};

/// A request read from the session input
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionRequest {
    /// Build the graph with the session cache
    Scan,
    /// Build with a fresh cache and write the export document
    ExportFullStructure {
        #[serde(default)]
        output: Option<PathBuf>,
    },
    /// A node was selected; file nodes are opened
    NodeClick {
        #[serde(rename = "nodeType")]
        node_type: String,
        path: String,
    },
    /// Save a serialized visualization state verbatim
    Export {
        data: String,
        #[serde(default)]
        output: Option<PathBuf>,
    },
}

/// A response written to the session output
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionResponse {
    Graph {
        #[serde(flatten)]
        graph: CodeGraph,
        stats: BuildStats,
    },
    Exported {
        path: PathBuf,
        #[serde(rename = "totalNodes")]
        total_nodes: usize,
        #[serde(rename = "totalEdges")]
        total_edges: usize,
    },
    OpenFile {
        path: PathBuf,
    },
    Ignored,
    Saved {
        path: PathBuf,
    },
    Error {
        message: String,
    },
}

/// Request handler bound to one workspace
pub struct Session<'a> {
    root: PathBuf,
    provider: &'a dyn SymbolProvider,
    config: &'a Config,
    cache: SymbolCache,
}

impl<'a> Session<'a> {
    pub fn new(root: impl Into<PathBuf>, provider: &'a dyn SymbolProvider, config: &'a Config) -> Self {
        Self {
            root: root.into(),
            provider,
            config,
            cache: SymbolCache::new(),
        }
    }

    /// Symbol trees cached by earlier scans
    pub fn cache(&self) -> &SymbolCache {
        &self.cache
    }

    /// Processes input lines until end of stream; returns the number handled
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> Result<usize>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut handled = 0;

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let response = self.handle_line(&line).await;
            let mut json = serde_json::to_string(&response)?;
            json.push('\n');
            writer.write_all(json.as_bytes()).await?;
            writer.flush().await?;
            handled += 1;
        }

        debug!("Session input closed after {handled} requests");
        Ok(handled)
    }

    /// Parses and handles one line; failures become error responses
    pub async fn handle_line(&self, line: &str) -> SessionResponse {
        let result = match serde_json::from_str::<SessionRequest>(line) {
            Ok(request) => self.handle(request).await,
            Err(e) => Err(anyhow!("Invalid request: {e}")),
        };
        result.unwrap_or_else(|e| {
            error!("Session request failed: {e:#}");
            SessionResponse::Error {
                message: format!("{e:#}"),
            }
        })
    }

    pub async fn handle(&self, request: SessionRequest) -> Result<SessionResponse> {
        match request {
            SessionRequest::Scan => {
                let outcome = scan(&self.root, self.provider, &self.cache, self.config).await?;
                let stats = outcome.stats().clone();
                Ok(SessionResponse::Graph {
                    graph: outcome.into_graph(),
                    stats,
                })
            }
            SessionRequest::ExportFullStructure { output } => {
                let path = self.output_path(output.as_deref());
                let export = export(&self.root, self.provider, self.config, &path).await?;
                Ok(SessionResponse::Exported {
                    path,
                    total_nodes: export.metadata.total_nodes,
                    total_edges: export.metadata.total_edges,
                })
            }
            SessionRequest::NodeClick { node_type, path } => {
                if node_type != NodeKind::File.as_str() {
                    debug!("Ignoring click on {node_type} node");
                    return Ok(SessionResponse::Ignored);
                }
                let resolved = tokio::fs::canonicalize(self.root.join(&path))
                    .await
                    .with_context(|| format!("Cannot open {path}"))?;
                info!("Opening {}", resolved.display());
                Ok(SessionResponse::OpenFile { path: resolved })
            }
            SessionRequest::Export { data, output } => {
                let path = self.output_path(output.as_deref());
                write_file(&path, &data).await?;
                info!("Visualization state exported to {}", path.display());
                Ok(SessionResponse::Saved { path })
            }
        }
    }

    /// Relative paths are taken from the workspace root
    fn output_path(&self, output: Option<&Path>) -> PathBuf {
        match output {
            Some(path) => self.root.join(path),
            None => default_export_path(&self.root, self.config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn test_request_parsing() {
        assert_eq!(
            serde_json::from_str::<SessionRequest>(r#"{"type":"scan"}"#).unwrap(),
            SessionRequest::Scan
        );
        assert_eq!(
            serde_json::from_str::<SessionRequest>(r#"{"type":"exportFullStructure"}"#).unwrap(),
            SessionRequest::ExportFullStructure { output: None }
        );
        assert_eq!(
            serde_json::from_str::<SessionRequest>(
                r#"{"type":"nodeClick","nodeType":"file","path":"/w/A.java"}"#
            )
            .unwrap(),
            SessionRequest::NodeClick {
                node_type: "file".to_string(),
                path: "/w/A.java".to_string()
            }
        );
        assert_eq!(
            serde_json::from_str::<SessionRequest>(
                r#"{"type":"export","data":"{}","output":"state.json"}"#
            )
            .unwrap(),
            SessionRequest::Export {
                data: "{}".to_string(),
                output: Some(PathBuf::from("state.json"))
            }
        );
    }

    #[test]
    fn test_response_shape() {
        let response = SessionResponse::Exported {
            path: PathBuf::from("/w/code-structure.json"),
            total_nodes: 3,
            total_edges: 2,
        };
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            serde_json::json!({
                "type": "exported",
                "path": "/w/code-structure.json",
                "totalNodes": 3,
                "totalEdges": 2
            })
        );
        assert_eq!(
            serde_json::to_value(SessionResponse::Ignored).unwrap(),
            serde_json::json!({"type": "ignored"})
        );
    }
}

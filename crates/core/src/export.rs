//! Export document written for a full code-structure export

use crate::error::Result;
use crate::graph::{CodeGraph, GraphEdge, GraphNode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Header of an export document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub generated_at: DateTime<Utc>,
    pub project_root: String,
    pub total_nodes: usize,
    pub total_edges: usize,
}

/// `{ metadata, nodes, edges }` JSON document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphExport {
    pub metadata: ExportMetadata,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphExport {
    /// Wraps a graph with metadata stamped now
    pub fn new(project_root: &Path, graph: CodeGraph) -> Self {
        Self::generated_at(project_root, graph, Utc::now())
    }

    pub fn generated_at(project_root: &Path, graph: CodeGraph, generated_at: DateTime<Utc>) -> Self {
        Self {
            metadata: ExportMetadata {
                generated_at,
                project_root: project_root.to_string_lossy().into_owned(),
                total_nodes: graph.nodes.len(),
                total_edges: graph.edges.len(),
            },
            nodes: graph.nodes,
            edges: graph.edges,
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn into_graph(self) -> CodeGraph {
        CodeGraph::new(self.nodes, self.edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphEdge, Relationship};
    use crate::node_factory::{directory_node, file_node};
    use chrono::TimeZone;
    use std::path::PathBuf;

    #[test]
    fn test_metadata_counts_and_field_names() {
        let root = PathBuf::from("/w");
        let dir = directory_node(&root, None);
        let file = file_node(&root.join("A.java"), &dir.id);
        let edge = GraphEdge::contains(&dir.id, &file.id, "w contains A.java".to_string());
        let graph = CodeGraph::new(vec![dir, file], vec![edge]);

        let stamp = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let export = GraphExport::generated_at(&root, graph, stamp);
        let value: serde_json::Value =
            serde_json::from_str(&export.to_json(true).unwrap()).unwrap();

        assert_eq!(value["metadata"]["projectRoot"], "/w");
        assert_eq!(value["metadata"]["totalNodes"], 2);
        assert_eq!(value["metadata"]["totalEdges"], 1);
        assert_eq!(value["metadata"]["generatedAt"], "2024-05-01T12:00:00Z");
        assert_eq!(value["nodes"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_export_parses_back() {
        let graph = CodeGraph::new(
            vec![],
            vec![GraphEdge::calls("meth:a", "meth:b", Relationship::SameClass)],
        );
        let export = GraphExport::new(&PathBuf::from("/w"), graph.clone());
        let parsed = GraphExport::from_json(&export.to_json(false).unwrap()).unwrap();
        assert_eq!(parsed.into_graph(), graph);
    }
}

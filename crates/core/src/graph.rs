//! Graph data model
//!
//! Nodes and edges are plain serializable records. Field names follow the
//! camelCase JSON shape consumed by graph renderers, so a [`CodeGraph`] can be
//! handed to a rendering layer without translation.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

/// Color used for every containment edge
pub const CONTAINS_COLOR: &str = "#FF9800";

/// Default rendered edge width
pub const EDGE_WIDTH: u32 = 2;

/// Kind of structural element. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Directory,
    File,
    Package,
    Class,
    Method,
}

impl NodeKind {
    /// All kinds, in containment order
    pub const ALL: [NodeKind; 5] = [
        NodeKind::Directory,
        NodeKind::File,
        NodeKind::Package,
        NodeKind::Class,
        NodeKind::Method,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Directory => "directory",
            NodeKind::File => "file",
            NodeKind::Package => "package",
            NodeKind::Class => "class",
            NodeKind::Method => "method",
        }
    }

    /// Id prefix for nodes of this kind
    pub fn id_prefix(&self) -> &'static str {
        match self {
            NodeKind::Directory => "dir",
            NodeKind::File => "file",
            NodeKind::Package => "pkg",
            NodeKind::Class => "cls",
            NodeKind::Method => "meth",
        }
    }

    /// Fill color renderers use for this kind
    pub fn color(&self) -> &'static str {
        match self {
            NodeKind::Directory => "#4A90E2",
            NodeKind::File => "#50E3C2",
            NodeKind::Package => "#F5A623",
            NodeKind::Class => "#BD10E0",
            NodeKind::Method => "#7ED321",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A location where a node is referenced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceLocation {
    pub file_path: String,
    pub line_number: u32,
    pub context: String,
}

/// Kind-dependent structural metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<ReferenceLocation>,
}

/// A structural element of the code graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Unique within one build after deduplication
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Filesystem path for directories, files and methods; dotted path for packages and classes
    pub path: String,
    /// Renderer grouping key, always the kind name
    pub group: String,
    /// Id of the containing node. Lookup only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NodeMetadata>,
}

impl GraphNode {
    /// Owning package recorded in metadata
    pub fn package(&self) -> Option<&str> {
        self.metadata.as_ref()?.package.as_deref()
    }

    /// Owning class recorded in metadata
    pub fn class_name(&self) -> Option<&str> {
        self.metadata.as_ref()?.class_name.as_deref()
    }
}

/// Edge kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// "X contains Y"
    Contains,
    /// "X calls Y"
    Calls,
}

/// Heuristic scope classification of a call edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relationship {
    SameClass,
    SamePackage,
    CrossPackage,
}

impl Relationship {
    pub fn color(&self) -> &'static str {
        match self {
            Relationship::SameClass => "#4CAF50",
            Relationship::SamePackage => "#2196F3",
            Relationship::CrossPackage => "#FF5252",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::SameClass => "same-class",
            Relationship::SamePackage => "same-package",
            Relationship::CrossPackage => "cross-package",
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed relationship between two node ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    /// Present on call edges only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<Relationship>,
    pub color: String,
    pub width: u32,
    pub arrows: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl GraphEdge {
    /// Containment edge with the fixed containment color
    pub fn contains(from: impl Into<String>, to: impl Into<String>, title: String) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: EdgeKind::Contains,
            relationship: None,
            color: CONTAINS_COLOR.to_string(),
            width: EDGE_WIDTH,
            arrows: "to".to_string(),
            title: Some(title),
        }
    }

    /// Call edge colored by its relationship
    pub fn calls(
        from: impl Into<String>,
        to: impl Into<String>,
        relationship: Relationship,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: EdgeKind::Calls,
            relationship: Some(relationship),
            color: relationship.color().to_string(),
            width: EDGE_WIDTH,
            arrows: "to".to_string(),
            title: None,
        }
    }
}

/// Node and edge arrays produced by one build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl CodeGraph {
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self { nodes, edges }
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |e| e.kind == kind)
    }

    /// Drops nodes whose id was already seen, keeping the first occurrence.
    ///
    /// Returns the number of nodes dropped. Edges are untouched: the set of
    /// node ids is the same before and after.
    pub fn dedupe_nodes(&mut self) -> usize {
        let before = self.nodes.len();
        self.nodes = dedupe_nodes(std::mem::take(&mut self.nodes));
        before - self.nodes.len()
    }

    /// Edges whose endpoints are not present in the node set
    pub fn dangling_edges(&self) -> Vec<&GraphEdge> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.edges
            .iter()
            .filter(|e| !ids.contains(e.from.as_str()) || !ids.contains(e.to.as_str()))
            .collect()
    }
}

/// Filters duplicate node ids, keeping the first occurrence and warning on each drop
pub fn dedupe_nodes(nodes: Vec<GraphNode>) -> Vec<GraphNode> {
    let mut seen = HashSet::with_capacity(nodes.len());
    nodes
        .into_iter()
        .filter(|node| {
            if seen.insert(node.id.clone()) {
                true
            } else {
                warn!("Duplicate node skipped: {}", node.id);
                false
            }
        })
        .collect()
}

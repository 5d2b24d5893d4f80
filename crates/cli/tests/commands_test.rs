//! Scan and export commands against a scripted provider

#![allow(clippy::expect_used)]

mod common;

use codepath::commands::{default_export_path, ensure_readable_root, export, graph_json, scan};
use codepath::output::summary;
use codepath::Config;
use codepath_core::{GraphExport, NodeKind};
use codepath_indexer::SymbolCache;
use common::greeter_workspace;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_scan_builds_every_node_kind() {
    let (temp_dir, provider) = greeter_workspace();
    let config = Config::default();
    let cache = SymbolCache::new();

    let outcome = scan(temp_dir.path(), &provider, &cache, &config)
        .await
        .expect("scan should succeed");

    for kind in NodeKind::ALL {
        assert_eq!(
            outcome.graph().nodes_of_kind(kind).count(),
            1,
            "expected one {kind} node"
        );
    }
    assert!(outcome.graph().dangling_edges().is_empty());
    assert!(outcome.errors().is_empty());

    let text = summary(&outcome);
    assert!(text.starts_with("Nodes: 5"));
    assert!(text.contains("Files: 1 processed, 0 failed"));
}

#[tokio::test]
async fn test_graph_json_has_nodes_and_edges() {
    let (temp_dir, provider) = greeter_workspace();
    let config = Config::default();
    let outcome = scan(temp_dir.path(), &provider, &SymbolCache::new(), &config)
        .await
        .expect("scan should succeed");

    let json = graph_json(outcome.graph(), false).expect("serializable");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value["nodes"].as_array().map(Vec::len), Some(5));
    assert_eq!(
        value["edges"].as_array().map(Vec::len),
        Some(outcome.graph().edges.len())
    );
}

#[tokio::test]
async fn test_export_writes_document_with_totals() {
    let (temp_dir, provider) = greeter_workspace();
    let config = Config::default();
    let output = default_export_path(temp_dir.path(), &config);
    assert_eq!(output, temp_dir.path().join("code-structure.json"));

    let written = export(temp_dir.path(), &provider, &config, &output)
        .await
        .expect("export should succeed");

    let contents = std::fs::read_to_string(&output).expect("export file should exist");
    let document = GraphExport::from_json(&contents).expect("valid export");
    assert_eq!(document, written);
    assert_eq!(document.metadata.total_nodes, document.nodes.len());
    assert_eq!(document.metadata.total_edges, document.edges.len());
    assert_eq!(
        document.metadata.project_root,
        temp_dir.path().to_string_lossy()
    );
}

#[tokio::test]
async fn test_export_into_missing_directory() {
    let (temp_dir, provider) = greeter_workspace();
    let output_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let output = output_dir.path().join("nested").join("graph.json");

    export(temp_dir.path(), &provider, &Config::default(), &output)
        .await
        .expect("export should create parent directories");
    assert!(output.exists());
}

#[tokio::test]
async fn test_unreadable_root_is_rejected() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let missing = temp_dir.path().join("does-not-exist");

    let err = ensure_readable_root(&missing)
        .await
        .expect_err("missing root should be rejected");
    assert!(err.to_string().contains("does-not-exist"));
}

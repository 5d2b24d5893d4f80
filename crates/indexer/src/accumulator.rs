//! Shared append-only build state
//!
//! Every operation takes its lock for a single append or check-and-append and
//! releases it before returning, so no guard is ever held across an await.

use crate::call_detector::CallCandidate;
use crate::FileError;
use codepath_core::{CodeGraph, GraphEdge, GraphNode};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Method nodes by id, accumulated over a whole build
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: DashMap<String, GraphNode>,
}

impl MethodRegistry {
    /// Registers a method node; the first registration of an id wins
    pub fn register(&self, node: GraphNode) {
        self.methods.entry(node.id.clone()).or_insert(node);
    }

    pub fn get(&self, id: &str) -> Option<GraphNode> {
        self.methods.get(id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.methods.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Calls detected inside one method, awaiting target resolution
#[derive(Debug, Clone)]
pub struct PendingCalls {
    pub source: GraphNode,
    pub candidates: Vec<CallCandidate>,
}

#[derive(Debug, Default)]
struct NodeStore {
    nodes: Vec<GraphNode>,
    ids: HashSet<String>,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) directories: AtomicUsize,
    pub(crate) files: AtomicUsize,
    pub(crate) failed_files: AtomicUsize,
    pub(crate) depth_limited: AtomicUsize,
    pub(crate) call_candidates: AtomicUsize,
}

impl Counters {
    pub(crate) fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn bump_by(counter: &AtomicUsize, n: usize) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn read(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::Relaxed)
    }
}

/// Nodes, edges, method registry and pending calls shared by all build tasks
#[derive(Debug, Default)]
pub struct GraphAccumulator {
    nodes: Mutex<NodeStore>,
    edges: Mutex<Vec<GraphEdge>>,
    methods: MethodRegistry,
    pending: Mutex<Vec<PendingCalls>>,
    errors: Mutex<Vec<FileError>>,
    pub(crate) counters: Counters,
}

impl GraphAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any appended node carries `id`
    pub fn contains_node(&self, id: &str) -> bool {
        lock(&self.nodes).ids.contains(id)
    }

    /// Appends a node unconditionally
    pub fn push_node(&self, node: GraphNode) {
        let mut store = lock(&self.nodes);
        store.ids.insert(node.id.clone());
        store.nodes.push(node);
    }

    /// Appends `node` unless a node with its id exists; returns whether it was added
    pub fn insert_node_if_absent(&self, node: GraphNode) -> bool {
        let mut store = lock(&self.nodes);
        if !store.ids.insert(node.id.clone()) {
            return false;
        }
        store.nodes.push(node);
        true
    }

    pub fn push_edge(&self, edge: GraphEdge) {
        lock(&self.edges).push(edge);
    }

    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    pub fn defer_calls(&self, calls: PendingCalls) {
        Counters::bump_by(&self.counters.call_candidates, calls.candidates.len());
        lock(&self.pending).push(calls);
    }

    /// Removes and returns every pending call list
    pub fn take_pending(&self) -> Vec<PendingCalls> {
        std::mem::take(&mut *lock(&self.pending))
    }

    pub fn record_error(&self, error: FileError) {
        lock(&self.errors).push(error);
    }

    pub fn node_count(&self) -> usize {
        lock(&self.nodes).nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        lock(&self.edges).len()
    }

    /// Copy of the current nodes and edges
    pub fn snapshot(&self) -> CodeGraph {
        CodeGraph::new(lock(&self.nodes).nodes.clone(), lock(&self.edges).clone())
    }

    pub fn errors(&self) -> Vec<FileError> {
        lock(&self.errors).clone()
    }

    /// Consumes the accumulator into its graph and recorded errors
    pub fn into_parts(self) -> (CodeGraph, Vec<FileError>) {
        let nodes = self
            .nodes
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .nodes;
        let edges = self.edges.into_inner().unwrap_or_else(PoisonError::into_inner);
        let errors = self.errors.into_inner().unwrap_or_else(PoisonError::into_inner);
        (CodeGraph::new(nodes, edges), errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepath_core::node_factory::{file_node, package_node};
    use std::path::Path;

    #[test]
    fn test_insert_if_absent_guards_ids() {
        let acc = GraphAccumulator::new();
        let file = file_node(Path::new("/w/A.java"), "dir:/w");

        assert!(acc.insert_node_if_absent(file.clone()));
        assert!(!acc.insert_node_if_absent(file));
        assert_eq!(acc.node_count(), 1);
    }

    #[test]
    fn test_push_node_allows_duplicates() {
        let acc = GraphAccumulator::new();
        acc.push_node(package_node("p", "file:/w/A.java"));
        acc.push_node(package_node("p", "file:/w/B.java"));

        assert_eq!(acc.node_count(), 2);
        assert!(acc.contains_node("pkg:p"));
    }

    #[test]
    fn test_registry_first_registration_wins() {
        let registry = MethodRegistry::default();
        let mut first = package_node("p", "file:/w/A.java");
        first.id = "meth:p.A.foo".to_string();
        let mut second = first.clone();
        second.parent_id = Some("file:/w/Other.java".to_string());

        registry.register(first);
        registry.register(second);

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("meth:p.A.foo").and_then(|n| n.parent_id),
            Some("file:/w/A.java".to_string())
        );
    }
}

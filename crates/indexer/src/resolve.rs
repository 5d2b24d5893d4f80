//! Call target resolution
//!
//! Runs once traversal has finished so that every method in the workspace is
//! registered before any candidate is looked up.

use crate::accumulator::{GraphAccumulator, PendingCalls};
use codepath_core::{classify, GraphEdge};
use std::collections::HashSet;
use tracing::{trace, warn};

/// Counts from one resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub resolved: usize,
    pub unresolved: usize,
    pub duplicate_edges: usize,
}

/// Turns every pending candidate with a registered target into a call edge.
///
/// Candidates whose target id is unknown are dropped with a warning, so no
/// call edge ever points at a missing node. With `dedupe` only the first edge
/// per `(from, to)` pair is emitted.
pub fn resolve_calls(acc: &GraphAccumulator, dedupe: bool) -> ResolutionStats {
    let mut stats = ResolutionStats::default();
    let mut emitted: HashSet<(String, String)> = HashSet::new();

    for PendingCalls { source, candidates } in acc.take_pending() {
        for candidate in candidates {
            let target_id = candidate.target_id();
            let Some(target) = acc.methods().get(&target_id) else {
                warn!("Target method not found: {target_id}");
                stats.unresolved += 1;
                continue;
            };
            stats.resolved += 1;

            if dedupe && !emitted.insert((source.id.clone(), target.id.clone())) {
                stats.duplicate_edges += 1;
                continue;
            }

            let relationship = classify(&source, &target);
            trace!("{} calls {} ({relationship})", source.id, target.id);
            acc.push_edge(GraphEdge::calls(&source.id, &target.id, relationship));
        }
    }

    stats
}

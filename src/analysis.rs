use std::collections::{HashMap, HashSet};

use anyhow::anyhow;
use serde::Serialize;

use crate::error::{LibError, Result};
use crate::models::{OrgGraph, OrgNodeId};

/// Structural metrics derived from one snapshot. Recomputed on demand,
/// never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthSpanReport {
    /// Distance from each node to the root of its tree.
    pub depths: HashMap<OrgNodeId, usize>,
    /// Direct-subordinate count for every node with at least one.
    pub spans: HashMap<OrgNodeId, usize>,
    pub max_depth: usize,
    pub avg_depth: f64,
    /// Edges per manager; positions without subordinates are excluded from
    /// the denominator so they do not dilute the average toward zero.
    pub avg_span_of_control: f64,
}

/// Computes per-node depth and span-of-control metrics.
///
/// Depth is resolved by walking up each node's unique incoming edge and
/// memoizing every id on the path, so shared ancestor chains are priced
/// once and the whole pass stays O(V). Nodes without an incoming edge are
/// depth 0 whether or not they are the logical organizational root; a
/// forest is a valid input. Cyclic input fails with `CyclicGraph` instead
/// of looping.
pub fn analyze(graph: &OrgGraph) -> Result<DepthSpanReport> {
    let mut depths: HashMap<OrgNodeId, usize> = HashMap::with_capacity(graph.node_count());

    for node in graph.nodes() {
        if depths.contains_key(&node.id) {
            continue;
        }

        // Climb until a memoized ancestor or a rootless node, collecting
        // the unresolved path. A revisit within one climb means the data
        // carries a reporting cycle.
        let mut path = Vec::new();
        let mut climbing = HashSet::new();
        let mut current = node.id;
        let memoized_base = loop {
            if let Some(known) = depths.get(&current) {
                break Some(*known);
            }
            if !climbing.insert(current) {
                return Err(LibError::cyclic(
                    "Reporting structure must not contain cycles",
                    anyhow!("depth walk revisited {} starting from {}", current, node.id),
                ));
            }
            path.push(current);
            match graph.incoming_edge_of(current) {
                Some(edge) => current = edge.manager_id,
                None => break None,
            }
        };

        for (offset, id) in path.iter().rev().enumerate() {
            let depth = match memoized_base {
                Some(base) => base + 1 + offset,
                None => offset,
            };
            depths.insert(*id, depth);
        }
    }

    let mut spans: HashMap<OrgNodeId, usize> = HashMap::new();
    for node in graph.nodes() {
        let span = graph.outgoing_edges_of(node.id).len();
        if span > 0 {
            spans.insert(node.id, span);
        }
    }

    let max_depth = depths.values().copied().max().unwrap_or(0);
    let avg_depth = if depths.is_empty() {
        0.0
    } else {
        depths.values().sum::<usize>() as f64 / depths.len() as f64
    };
    let avg_span_of_control = if spans.is_empty() {
        0.0
    } else {
        graph.edge_count() as f64 / spans.len() as f64
    };

    Ok(DepthSpanReport {
        depths,
        spans,
        max_depth,
        avg_depth,
        avg_span_of_control,
    })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::models::{OrgEdge, OrgNode};
    use crate::mutation::propose_reparent;

    fn node(id: OrgNodeId, label: &str) -> OrgNode {
        OrgNode {
            id,
            label: label.to_string(),
            department: None,
            manager_id: None,
            occupants: Vec::new(),
        }
    }

    fn edge(manager: OrgNodeId, subordinate: OrgNodeId) -> OrgEdge {
        OrgEdge {
            manager_id: manager,
            subordinate_id: subordinate,
        }
    }

    #[test]
    fn chain_depths_and_span_match_structure() {
        let a = OrgNodeId(Uuid::new_v4());
        let b = OrgNodeId(Uuid::new_v4());
        let c = OrgNodeId(Uuid::new_v4());
        let graph = OrgGraph::load(
            vec![node(a, "A"), node(b, "B"), node(c, "C")],
            vec![edge(a, b), edge(b, c)],
        )
        .expect("graph should load");

        let report = analyze(&graph).expect("analysis should succeed");
        assert_eq!(report.depths[&a], 0);
        assert_eq!(report.depths[&b], 1);
        assert_eq!(report.depths[&c], 2);
        assert_eq!(report.max_depth, 2);
        // Two edges over two managers (A and B).
        assert!((report.avg_span_of_control - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reparenting_flattens_depths_and_concentrates_span() {
        let a = OrgNodeId(Uuid::new_v4());
        let b = OrgNodeId(Uuid::new_v4());
        let c = OrgNodeId(Uuid::new_v4());
        let nodes = vec![node(a, "A"), node(b, "B"), node(c, "C")];
        let graph = OrgGraph::load(nodes.clone(), vec![edge(a, b), edge(b, c)])
            .expect("graph should load");

        let edges = propose_reparent(&graph, a, c).expect("reparent should succeed");
        let updated = OrgGraph::load(nodes, edges).expect("graph should reload");

        let report = analyze(&updated).expect("analysis should succeed");
        assert_eq!(report.depths[&a], 0);
        assert_eq!(report.depths[&b], 1);
        assert_eq!(report.depths[&c], 1);
        // Both edges now hang off A, the only remaining manager.
        assert!((report.avg_span_of_control - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn metrics_are_invariant_to_supply_order() {
        let a = OrgNodeId(Uuid::new_v4());
        let b = OrgNodeId(Uuid::new_v4());
        let c = OrgNodeId(Uuid::new_v4());
        let d = OrgNodeId(Uuid::new_v4());

        let forward = OrgGraph::load(
            vec![node(a, "A"), node(b, "B"), node(c, "C"), node(d, "D")],
            vec![edge(a, b), edge(b, c), edge(a, d)],
        )
        .expect("graph should load");
        let shuffled = OrgGraph::load(
            vec![node(d, "D"), node(c, "C"), node(a, "A"), node(b, "B")],
            vec![edge(a, d), edge(b, c), edge(a, b)],
        )
        .expect("graph should load");

        let lhs = analyze(&forward).expect("analysis should succeed");
        let rhs = analyze(&shuffled).expect("analysis should succeed");
        assert_eq!(lhs.depths, rhs.depths);
        assert_eq!(lhs.max_depth, rhs.max_depth);
        assert!((lhs.avg_depth - rhs.avg_depth).abs() < f64::EPSILON);
        assert!((lhs.avg_span_of_control - rhs.avg_span_of_control).abs() < f64::EPSILON);
    }

    #[test]
    fn forest_roots_all_sit_at_depth_zero() {
        let a = OrgNodeId(Uuid::new_v4());
        let b = OrgNodeId(Uuid::new_v4());
        let c = OrgNodeId(Uuid::new_v4());
        let d = OrgNodeId(Uuid::new_v4());
        let graph = OrgGraph::load(
            vec![node(a, "A"), node(b, "B"), node(c, "C"), node(d, "D")],
            vec![edge(a, b), edge(c, d)],
        )
        .expect("graph should load");

        let report = analyze(&graph).expect("analysis should succeed");
        assert_eq!(report.depths[&a], 0);
        assert_eq!(report.depths[&c], 0);
        assert_eq!(report.depths[&b], 1);
        assert_eq!(report.depths[&d], 1);
        assert_eq!(report.max_depth, 1);
    }

    #[test]
    fn empty_org_yields_zeroed_metrics() {
        let graph = OrgGraph::load(vec![], vec![]).expect("empty graph should load");
        let report = analyze(&graph).expect("analysis should succeed");
        assert_eq!(report.max_depth, 0);
        assert!(report.depths.is_empty());
        assert!((report.avg_depth - 0.0).abs() < f64::EPSILON);
        assert!((report.avg_span_of_control - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cyclic_input_fails_instead_of_looping() {
        let a = OrgNodeId(Uuid::new_v4());
        let b = OrgNodeId(Uuid::new_v4());
        let graph = OrgGraph::load(
            vec![node(a, "A"), node(b, "B")],
            vec![edge(a, b), edge(b, a)],
        )
        .expect("graph should load");

        let err = analyze(&graph).expect_err("cycle should be detected");
        assert_eq!(err.code, "org_reporting_cycle");
    }
}

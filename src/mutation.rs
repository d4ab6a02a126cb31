use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::error::{LibError, Result};
use crate::invariants::HierarchyViolation;
use crate::models::{OrgEdge, OrgGraph, OrgNodeId};

/// A proposed "subordinate now reports to new manager" change.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReparentPayload {
    pub new_manager_id: OrgNodeId,
    pub subordinate_id: OrgNodeId,
}

/// Preflight result for a drag gesture before anything is persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReparentCheckResponse {
    pub valid: bool,
    pub violations: Vec<HierarchyViolation>,
}

/// Reports every reason the reparent would be rejected, without mutating.
pub fn reparent_violations(
    graph: &OrgGraph,
    new_manager_id: OrgNodeId,
    subordinate_id: OrgNodeId,
) -> Vec<HierarchyViolation> {
    let mut violations = Vec::new();
    for id in [new_manager_id, subordinate_id] {
        if !graph.contains(id) {
            violations.push(HierarchyViolation::UnknownNodeReference {
                manager_id: new_manager_id,
                subordinate_id,
                missing_node_id: id,
            });
        }
    }
    if !violations.is_empty() {
        return violations;
    }

    if new_manager_id == subordinate_id {
        violations.push(HierarchyViolation::SelfReport {
            node_id: subordinate_id,
        });
        return violations;
    }

    if is_descendant_of(graph, new_manager_id, subordinate_id) {
        violations.push(HierarchyViolation::ReportingCycle);
    }

    violations
}

pub fn check_reparent(
    graph: &OrgGraph,
    new_manager_id: OrgNodeId,
    subordinate_id: OrgNodeId,
) -> ReparentCheckResponse {
    let violations = reparent_violations(graph, new_manager_id, subordinate_id);
    ReparentCheckResponse {
        valid: violations.is_empty(),
        violations,
    }
}

/// Validates the reparent and returns the complete replacement edge list:
/// the subordinate's previous incoming edge removed, the new edge appended.
///
/// All-or-nothing: on rejection the error carries the first violation's
/// stable code and the input graph is untouched either way.
pub fn propose_reparent(
    graph: &OrgGraph,
    new_manager_id: OrgNodeId,
    subordinate_id: OrgNodeId,
) -> Result<Vec<OrgEdge>> {
    let violations = reparent_violations(graph, new_manager_id, subordinate_id);
    if let Some(first) = violations.first() {
        return Err(LibError::invalid_reparent_with_code(
            first.error_code(),
            first.public_message(),
            anyhow!(
                "reparent of {} under {} rejected: {:?}",
                subordinate_id,
                new_manager_id,
                violations
            ),
        ));
    }

    let mut edges: Vec<OrgEdge> = graph
        .edges()
        .iter()
        .filter(|edge| edge.subordinate_id != subordinate_id)
        .copied()
        .collect();
    edges.push(OrgEdge {
        manager_id: new_manager_id,
        subordinate_id,
    });

    Ok(edges)
}

/// Walks up from `start` along incoming edges looking for `ancestor`.
///
/// The walk is step-bounded by the node count so it terminates even when
/// externally-supplied data smuggled in a cycle.
fn is_descendant_of(graph: &OrgGraph, start: OrgNodeId, ancestor: OrgNodeId) -> bool {
    let mut current = start;
    for _ in 0..graph.node_count() {
        if current == ancestor {
            return true;
        }
        match graph.incoming_edge_of(current) {
            Some(edge) => current = edge.manager_id,
            None => return false,
        }
    }
    false
}

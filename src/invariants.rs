use std::collections::{HashMap, HashSet, VecDeque};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::error::{LibError, Result};
use crate::models::{OrgEdge, OrgNode, OrgNodeId};

/// A way the node/edge lists fail to describe a valid reporting forest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HierarchyViolation {
    UnknownNodeReference {
        manager_id: OrgNodeId,
        subordinate_id: OrgNodeId,
        missing_node_id: OrgNodeId,
    },
    SelfReport {
        node_id: OrgNodeId,
    },
    MultipleManagers {
        node_id: OrgNodeId,
        manager_count: usize,
    },
    ReportingCycle,
    NoRootFound,
}

impl HierarchyViolation {
    pub const fn error_code(&self) -> &'static str {
        match self {
            HierarchyViolation::UnknownNodeReference { .. } => "org_unknown_node",
            HierarchyViolation::SelfReport { .. } => "org_self_report",
            HierarchyViolation::MultipleManagers { .. } => "org_multiple_managers",
            HierarchyViolation::ReportingCycle => "org_reporting_cycle",
            HierarchyViolation::NoRootFound => "org_no_root",
        }
    }

    pub const fn public_message(&self) -> &'static str {
        match self {
            HierarchyViolation::UnknownNodeReference { .. } => {
                "Reporting edge references an unknown position"
            }
            HierarchyViolation::SelfReport { .. } => "A position cannot report to itself",
            HierarchyViolation::MultipleManagers { .. } => {
                "A position cannot report to more than one manager"
            }
            HierarchyViolation::ReportingCycle => "Reporting structure must not contain cycles",
            HierarchyViolation::NoRootFound => "No organizational root could be identified",
        }
    }
}

/// Reports every forest violation in the supplied lists without failing.
///
/// Intended for host-side validation screens; [`crate::models::OrgGraph::load`]
/// only enforces referential integrity so that analysis can still inspect
/// corrupted data.
pub fn forest_violations(nodes: &[OrgNode], edges: &[OrgEdge]) -> Vec<HierarchyViolation> {
    let node_ids: HashSet<OrgNodeId> = nodes.iter().map(|node| node.id).collect();
    let mut indegree: HashMap<OrgNodeId, usize> = HashMap::with_capacity(nodes.len());
    let mut adjacency: HashMap<OrgNodeId, Vec<OrgNodeId>> = HashMap::with_capacity(nodes.len());
    for node in nodes {
        indegree.insert(node.id, 0);
        adjacency.insert(node.id, Vec::new());
    }

    let mut violations = Vec::new();
    for edge in edges {
        if !node_ids.contains(&edge.manager_id) {
            violations.push(HierarchyViolation::UnknownNodeReference {
                manager_id: edge.manager_id,
                subordinate_id: edge.subordinate_id,
                missing_node_id: edge.manager_id,
            });
            continue;
        }
        if !node_ids.contains(&edge.subordinate_id) {
            violations.push(HierarchyViolation::UnknownNodeReference {
                manager_id: edge.manager_id,
                subordinate_id: edge.subordinate_id,
                missing_node_id: edge.subordinate_id,
            });
            continue;
        }

        if edge.manager_id == edge.subordinate_id {
            violations.push(HierarchyViolation::SelfReport {
                node_id: edge.manager_id,
            });
            continue;
        }

        *indegree
            .get_mut(&edge.subordinate_id)
            .expect("subordinate_id should exist in indegree map") += 1;
        adjacency
            .get_mut(&edge.manager_id)
            .expect("manager_id should exist in adjacency map")
            .push(edge.subordinate_id);
    }

    for (node_id, degree) in &indegree {
        if *degree > 1 {
            violations.push(HierarchyViolation::MultipleManagers {
                node_id: *node_id,
                manager_count: *degree,
            });
        }
    }

    if has_cycle(nodes, &adjacency, &indegree) {
        violations.push(HierarchyViolation::ReportingCycle);
    }

    if !nodes.is_empty() {
        let has_attribute_root = nodes.iter().any(OrgNode::is_root);
        let has_structural_root = indegree.values().any(|degree| *degree == 0);
        if !has_attribute_root && !has_structural_root {
            violations.push(HierarchyViolation::NoRootFound);
        }
    }

    violations
}

/// Fails with the first violation's stable code and public message.
pub fn ensure_forest(nodes: &[OrgNode], edges: &[OrgEdge]) -> Result<()> {
    let violations = forest_violations(nodes, edges);
    if let Some(first) = violations.first() {
        let error = LibError::malformed_with_code(
            first.error_code(),
            first.public_message(),
            anyhow!("forest invariant validation failed: {:?}", violations),
        );
        return Err(error);
    }

    Ok(())
}

/// Kahn count check: if the peel-off visits fewer nodes than exist, the
/// remainder sits on a cycle.
fn has_cycle(
    nodes: &[OrgNode],
    adjacency: &HashMap<OrgNodeId, Vec<OrgNodeId>>,
    indegree: &HashMap<OrgNodeId, usize>,
) -> bool {
    let mut indegree = indegree.clone();
    let mut queue = VecDeque::new();
    for (node_id, degree) in &indegree {
        if *degree == 0 {
            queue.push_back(*node_id);
        }
    }

    let mut visited_count = 0usize;
    while let Some(node_id) = queue.pop_front() {
        visited_count += 1;
        if let Some(children) = adjacency.get(&node_id) {
            for child in children {
                if let Some(child_degree) = indegree.get_mut(child) {
                    *child_degree -= 1;
                    if *child_degree == 0 {
                        queue.push_back(*child);
                    }
                }
            }
        }
    }

    visited_count != nodes.len()
}

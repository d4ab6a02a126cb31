use std::collections::HashMap;

use serde::Serialize;

use crate::models::OrgGraph;
use crate::tree::OrgTree;

/// Bucket name for positions without a department attribute.
pub const UNSPECIFIED_DEPARTMENT: &str = "unspecified";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentRollup {
    pub name: String,
    pub node_count: usize,
    pub occupied_count: usize,
    pub occupant_count: usize,
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub tree_count: usize,
    pub occupied_count: usize,
    pub vacant_count: usize,
    pub occupancy_rate: f64,
    /// Sorted descending by occupant count, name ascending as tie-break.
    pub departments: Vec<DepartmentRollup>,
}

/// Turns the traversed forest plus raw node attributes into summary
/// statistics. An empty org is a valid, reportable state: every rate is a
/// guarded division that yields 0 rather than NaN.
pub fn aggregate_report(trees: &[OrgTree], graph: &OrgGraph) -> ReportSummary {
    let mut occupied_count = 0usize;
    let mut buckets: HashMap<String, (usize, usize, usize)> = HashMap::new();

    for tree in trees {
        for id in tree.node_ids() {
            let Some(node) = graph.node(id) else {
                continue;
            };

            let occupied = node.is_occupied();
            if occupied {
                occupied_count += 1;
            }

            let department = node
                .department
                .as_deref()
                .unwrap_or(UNSPECIFIED_DEPARTMENT);
            let bucket = buckets.entry(department.to_string()).or_insert((0, 0, 0));
            bucket.0 += 1;
            if occupied {
                bucket.1 += 1;
            }
            bucket.2 += node.occupants.len();
        }
    }

    let total_nodes = trees.iter().map(|tree| tree.rows.len()).sum::<usize>();
    let mut departments: Vec<DepartmentRollup> = buckets
        .into_iter()
        .map(
            |(name, (node_count, occupied_count, occupant_count))| DepartmentRollup {
                name,
                node_count,
                occupied_count,
                occupant_count,
                occupancy_rate: safe_rate(occupied_count, node_count),
            },
        )
        .collect();
    departments.sort_by(|lhs, rhs| {
        rhs.occupant_count
            .cmp(&lhs.occupant_count)
            .then_with(|| lhs.name.cmp(&rhs.name))
    });

    ReportSummary {
        total_nodes,
        total_edges: graph.edge_count(),
        tree_count: trees.len(),
        occupied_count,
        vacant_count: total_nodes - occupied_count,
        occupancy_rate: safe_rate(occupied_count, total_nodes),
        departments,
    }
}

fn safe_rate(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

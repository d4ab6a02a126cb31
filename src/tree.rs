use std::collections::HashSet;

use anyhow::anyhow;
use serde::Serialize;

use crate::error::{LibError, Result};
use crate::models::{OrgGraph, OrgNodeId};

/// One node of the flattened depth-first traversal.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TreeRow {
    pub node_id: OrgNodeId,
    pub depth: usize,
    /// Document-order index within the tree.
    pub position: usize,
    /// Whether this node is its parent's last child. Only used for
    /// connector-line rendering, not a structural property.
    pub is_last_sibling: bool,
    /// Root-first chain of ancestors, excluding the node itself.
    pub ancestors: Vec<OrgNodeId>,
}

/// A rooted tree view over the flat edge list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgTree {
    pub root: OrgNodeId,
    pub rows: Vec<TreeRow>,
}

impl OrgTree {
    pub fn node_ids(&self) -> impl Iterator<Item = OrgNodeId> + '_ {
        self.rows.iter().map(|row| row.node_id)
    }
}

/// Reconstructs one navigable tree per detected root.
///
/// Root detection: primarily nodes without a "reports to" attribute; when
/// the data source omits that attribute entirely, any node that is never an
/// edge target. A non-empty graph where neither rule finds a root fails
/// with `NoRootFound`. Non-forest input (a node reached twice, or nodes
/// trapped on a cycle away from every root) fails with `CyclicGraph`.
pub fn build_trees(graph: &OrgGraph) -> Result<Vec<OrgTree>> {
    if graph.is_empty() {
        return Ok(Vec::new());
    }

    let roots = detect_roots(graph)?;

    let mut visited: HashSet<OrgNodeId> = HashSet::with_capacity(graph.node_count());
    let mut trees = Vec::with_capacity(roots.len());
    for root in roots {
        trees.push(traverse_tree(graph, root, &mut visited)?);
    }

    if visited.len() != graph.node_count() {
        return Err(LibError::cyclic(
            "Reporting structure must not contain cycles",
            anyhow!(
                "{} of {} positions are unreachable from every root",
                graph.node_count() - visited.len(),
                graph.node_count()
            ),
        ));
    }

    Ok(trees)
}

fn detect_roots(graph: &OrgGraph) -> Result<Vec<OrgNodeId>> {
    let mut roots: Vec<OrgNodeId> = graph
        .nodes()
        .iter()
        .filter(|node| node.is_root())
        .map(|node| node.id)
        .collect();

    if roots.is_empty() {
        // The "reports to" attribute is absent from this data source; fall
        // back to structure. Known limitation: on malformed data this can
        // surface several unintended roots.
        roots = graph
            .nodes()
            .iter()
            .filter(|node| graph.incoming_edge_of(node.id).is_none())
            .map(|node| node.id)
            .collect();
    }

    if roots.is_empty() {
        return Err(LibError::no_root(
            "No organizational root could be identified",
            anyhow!(
                "no node without a manager attribute or incoming edge among {} positions",
                graph.node_count()
            ),
        ));
    }

    Ok(roots)
}

fn traverse_tree(
    graph: &OrgGraph,
    root: OrgNodeId,
    visited: &mut HashSet<OrgNodeId>,
) -> Result<OrgTree> {
    let mut rows = Vec::new();
    // LIFO of (node, depth, is_last_sibling, ancestors); children are pushed
    // in reverse so they pop in edge supply order.
    let mut stack = vec![(root, 0usize, true, Vec::new())];

    while let Some((node_id, depth, is_last_sibling, ancestors)) = stack.pop() {
        if !visited.insert(node_id) {
            return Err(LibError::cyclic(
                "Reporting structure must not contain cycles",
                anyhow!("position {} reached twice during traversal", node_id),
            ));
        }

        let children = graph.outgoing_edges_of(node_id);
        let mut child_ancestors = ancestors.clone();
        child_ancestors.push(node_id);
        for (index, edge) in children.iter().enumerate().rev() {
            stack.push((
                edge.subordinate_id,
                depth + 1,
                index == children.len() - 1,
                child_ancestors.clone(),
            ));
        }

        rows.push(TreeRow {
            node_id,
            depth,
            position: rows.len(),
            is_last_sibling,
            ancestors,
        });
    }

    Ok(OrgTree { root, rows })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use uuid::Uuid;

    use super::*;
    use crate::models::{OrgEdge, OrgNode};

    fn node(id: OrgNodeId, label: &str) -> OrgNode {
        OrgNode {
            id,
            label: label.to_string(),
            department: None,
            manager_id: None,
            occupants: Vec::new(),
        }
    }

    fn reporting_node(id: OrgNodeId, label: &str, manager: OrgNodeId) -> OrgNode {
        OrgNode {
            manager_id: Some(manager),
            ..node(id, label)
        }
    }

    fn edge(manager: OrgNodeId, subordinate: OrgNodeId) -> OrgEdge {
        OrgEdge {
            manager_id: manager,
            subordinate_id: subordinate,
        }
    }

    #[test]
    fn single_tree_traverses_in_document_order() {
        let a = OrgNodeId(Uuid::new_v4());
        let b = OrgNodeId(Uuid::new_v4());
        let c = OrgNodeId(Uuid::new_v4());
        let d = OrgNodeId(Uuid::new_v4());
        let graph = OrgGraph::load(
            vec![
                node(a, "A"),
                reporting_node(b, "B", a),
                reporting_node(c, "C", a),
                reporting_node(d, "D", b),
            ],
            vec![edge(a, b), edge(a, c), edge(b, d)],
        )
        .expect("graph should load");

        let trees = build_trees(&graph).expect("trees should build");
        assert_eq!(trees.len(), 1);

        let rows = &trees[0].rows;
        let order: Vec<OrgNodeId> = rows.iter().map(|row| row.node_id).collect();
        assert_eq!(order, vec![a, b, d, c]);
        assert_eq!(
            rows.iter().map(|row| row.position).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
        assert_eq!(
            rows.iter().map(|row| row.depth).collect::<Vec<_>>(),
            vec![0, 1, 2, 1]
        );
    }

    #[test]
    fn last_sibling_flags_follow_edge_order() {
        let a = OrgNodeId(Uuid::new_v4());
        let b = OrgNodeId(Uuid::new_v4());
        let c = OrgNodeId(Uuid::new_v4());
        let graph = OrgGraph::load(
            vec![
                node(a, "A"),
                reporting_node(b, "B", a),
                reporting_node(c, "C", a),
            ],
            vec![edge(a, b), edge(a, c)],
        )
        .expect("graph should load");

        let trees = build_trees(&graph).expect("trees should build");
        let rows = &trees[0].rows;
        // Root is trivially a last sibling; B has a following sibling, C not.
        assert_eq!(
            rows.iter()
                .map(|row| (row.node_id, row.is_last_sibling))
                .collect::<Vec<_>>(),
            vec![(a, true), (b, false), (c, true)]
        );
    }

    #[test]
    fn ancestor_chains_run_root_first() {
        let a = OrgNodeId(Uuid::new_v4());
        let b = OrgNodeId(Uuid::new_v4());
        let c = OrgNodeId(Uuid::new_v4());
        let graph = OrgGraph::load(
            vec![
                node(a, "A"),
                reporting_node(b, "B", a),
                reporting_node(c, "C", b),
            ],
            vec![edge(a, b), edge(b, c)],
        )
        .expect("graph should load");

        let trees = build_trees(&graph).expect("trees should build");
        let deepest = trees[0]
            .rows
            .iter()
            .find(|row| row.node_id == c)
            .expect("row for C should exist");
        assert_eq!(deepest.ancestors, vec![a, b]);
    }

    #[test]
    fn forest_partitions_nodes_across_trees() {
        let a = OrgNodeId(Uuid::new_v4());
        let b = OrgNodeId(Uuid::new_v4());
        let c = OrgNodeId(Uuid::new_v4());
        let d = OrgNodeId(Uuid::new_v4());
        let graph = OrgGraph::load(
            vec![
                node(a, "A"),
                reporting_node(b, "B", a),
                node(c, "C"),
                reporting_node(d, "D", c),
            ],
            vec![edge(a, b), edge(c, d)],
        )
        .expect("graph should load");

        let trees = build_trees(&graph).expect("trees should build");
        assert_eq!(trees.len(), 2);

        let mut seen = HashSet::new();
        for tree in &trees {
            for id in tree.node_ids() {
                assert!(seen.insert(id), "node {id} appeared in two trees");
            }
        }
        assert_eq!(seen.len(), graph.node_count());
    }

    #[test]
    fn fallback_root_detection_uses_edge_targets() {
        let a = OrgNodeId(Uuid::new_v4());
        let b = OrgNodeId(Uuid::new_v4());
        // The manager attribute is present on every node (no primary root),
        // as when the data source predates the "reports to" field on roots.
        let graph = OrgGraph::load(
            vec![reporting_node(a, "A", a), reporting_node(b, "B", a)],
            vec![edge(a, b)],
        )
        .expect("graph should load");

        let trees = build_trees(&graph).expect("fallback should find the root");
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].root, a);
    }

    #[test]
    fn rootless_cycle_reports_no_root() {
        let a = OrgNodeId(Uuid::new_v4());
        let b = OrgNodeId(Uuid::new_v4());
        let graph = OrgGraph::load(
            vec![reporting_node(a, "A", b), reporting_node(b, "B", a)],
            vec![edge(a, b), edge(b, a)],
        )
        .expect("graph should load");

        let err = build_trees(&graph).expect_err("no root should be found");
        assert_eq!(err.code, "org_no_root");
    }

    #[test]
    fn cycle_hanging_off_a_root_is_detected() {
        let a = OrgNodeId(Uuid::new_v4());
        let b = OrgNodeId(Uuid::new_v4());
        let c = OrgNodeId(Uuid::new_v4());
        // A is a clean root; B and C cycle between themselves and are
        // unreachable from it.
        let graph = OrgGraph::load(
            vec![
                node(a, "A"),
                reporting_node(b, "B", c),
                reporting_node(c, "C", b),
            ],
            vec![edge(b, c), edge(c, b)],
        )
        .expect("graph should load");

        let err = build_trees(&graph).expect_err("trapped cycle should be detected");
        assert_eq!(err.code, "org_reporting_cycle");
    }

    #[test]
    fn empty_org_builds_an_empty_forest() {
        let graph = OrgGraph::load(vec![], vec![]).expect("empty graph should load");
        let trees = build_trees(&graph).expect("empty forest should build");
        assert!(trees.is_empty());
    }
}

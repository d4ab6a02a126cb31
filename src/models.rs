use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LibError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct OrgNodeId(pub Uuid);

impl fmt::Display for OrgNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrgNodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

impl From<Uuid> for OrgNodeId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// A person assigned to a position. Positions may be vacant (no occupants)
/// or shared (several occupants).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occupant {
    pub name: String,
    pub email: String,
}

/// A job-role position in the reporting structure. Positions are created by
/// the surrounding application; this crate only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgNode {
    pub id: OrgNodeId,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// "Reports to" attribute from the data source. Absence marks the node
    /// as an organizational root; the edge list remains the authority for
    /// who the children are.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<OrgNodeId>,
    #[serde(default)]
    pub occupants: Vec<Occupant>,
}

impl OrgNode {
    pub fn is_root(&self) -> bool {
        self.manager_id.is_none()
    }

    pub fn is_occupied(&self) -> bool {
        !self.occupants.is_empty()
    }
}

/// A manager -> subordinate reporting relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgEdge {
    pub manager_id: OrgNodeId,
    pub subordinate_id: OrgNodeId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrgNode {
    pub id: Option<OrgNodeId>,
    pub label: String,
    pub department: Option<String>,
    pub manager_id: Option<OrgNodeId>,
    #[serde(default)]
    pub occupants: Vec<Occupant>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrgEdge {
    pub manager_id: OrgNodeId,
    pub subordinate_id: OrgNodeId,
}

/// The payload a directory collaborator hands over on each fetch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrgSnapshot {
    pub nodes: Vec<RawOrgNode>,
    pub edges: Vec<RawOrgEdge>,
    pub fetched_at: NaiveDateTime,
}

/// Normalized node/edge lists ready to be indexed into an [`OrgGraph`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgSnapshot {
    pub nodes: Vec<OrgNode>,
    pub edges: Vec<OrgEdge>,
    pub fetched_at: NaiveDateTime,
}

impl RawOrgSnapshot {
    pub fn normalize(self) -> Result<OrgSnapshot> {
        let nodes = normalize_nodes(self.nodes)?;
        let edges = normalize_edges(self.edges);
        Ok(OrgSnapshot {
            nodes,
            edges,
            fetched_at: self.fetched_at,
        })
    }
}

fn normalize_nodes(nodes: Vec<RawOrgNode>) -> Result<Vec<OrgNode>> {
    let mut seen_nodes = HashSet::with_capacity(nodes.len());
    let mut output_nodes = Vec::with_capacity(nodes.len());
    for node in nodes {
        let node_id = node.id.unwrap_or_else(|| OrgNodeId(Uuid::new_v4()));
        let label = node.label.trim().to_string();
        if label.is_empty() {
            return Err(LibError::malformed(
                "Position label is required",
                anyhow!("node {} had empty label", node_id),
            ));
        }

        if !seen_nodes.insert(node_id) {
            return Err(LibError::malformed(
                "Position IDs must be unique within the organization",
                anyhow!("duplicate node id {}", node_id),
            ));
        }

        output_nodes.push(OrgNode {
            id: node_id,
            label,
            department: node
                .department
                .map(|department| department.trim().to_string())
                .filter(|department| !department.is_empty()),
            manager_id: node.manager_id,
            occupants: node.occupants,
        });
    }

    Ok(output_nodes)
}

fn normalize_edges(edges: Vec<RawOrgEdge>) -> Vec<OrgEdge> {
    let mut seen_edges = HashSet::with_capacity(edges.len());
    let mut output_edges = Vec::with_capacity(edges.len());
    for edge in edges {
        if !seen_edges.insert((edge.manager_id, edge.subordinate_id)) {
            continue;
        }
        output_edges.push(OrgEdge {
            manager_id: edge.manager_id,
            subordinate_id: edge.subordinate_id,
        });
    }
    output_edges
}

/// Immutable, indexed snapshot of the reporting structure.
///
/// Loading only enforces referential integrity (every edge endpoint must be
/// a known node). Forest-shape violations are deliberately tolerated here so
/// the analyzer and tree builder can detect corrupted stored data instead of
/// refusing to look at it; hosts wanting up-front validation use
/// [`crate::invariants::forest_violations`].
#[derive(Debug, Clone)]
pub struct OrgGraph {
    nodes: Vec<OrgNode>,
    edges: Vec<OrgEdge>,
    node_index: HashMap<OrgNodeId, usize>,
    incoming: HashMap<OrgNodeId, OrgEdge>,
    outgoing: HashMap<OrgNodeId, Vec<OrgEdge>>,
}

impl OrgGraph {
    pub fn load(nodes: Vec<OrgNode>, edges: Vec<OrgEdge>) -> Result<Self> {
        let mut node_index = HashMap::with_capacity(nodes.len());
        for (position, node) in nodes.iter().enumerate() {
            node_index.insert(node.id, position);
        }

        let mut incoming = HashMap::with_capacity(edges.len());
        let mut outgoing: HashMap<OrgNodeId, Vec<OrgEdge>> = HashMap::with_capacity(edges.len());
        for edge in &edges {
            if !node_index.contains_key(&edge.manager_id) {
                return Err(LibError::malformed_with_code(
                    "org_unknown_node",
                    "Reporting edge references an unknown position",
                    anyhow!("missing manager_id {}", edge.manager_id),
                ));
            }
            if !node_index.contains_key(&edge.subordinate_id) {
                return Err(LibError::malformed_with_code(
                    "org_unknown_node",
                    "Reporting edge references an unknown position",
                    anyhow!("missing subordinate_id {}", edge.subordinate_id),
                ));
            }

            // First edge wins when malformed data carries several managers
            // for the same position.
            incoming.entry(edge.subordinate_id).or_insert(*edge);
            outgoing.entry(edge.manager_id).or_default().push(*edge);
        }

        Ok(Self {
            nodes,
            edges,
            node_index,
            incoming,
            outgoing,
        })
    }

    pub fn from_snapshot(snapshot: OrgSnapshot) -> Result<Self> {
        Self::load(snapshot.nodes, snapshot.edges)
    }

    pub fn nodes(&self) -> &[OrgNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[OrgEdge] {
        &self.edges
    }

    pub fn node(&self, id: OrgNodeId) -> Option<&OrgNode> {
        self.node_index.get(&id).map(|position| &self.nodes[*position])
    }

    pub fn contains(&self, id: OrgNodeId) -> bool {
        self.node_index.contains_key(&id)
    }

    pub fn incoming_edge_of(&self, id: OrgNodeId) -> Option<&OrgEdge> {
        self.incoming.get(&id)
    }

    pub fn outgoing_edges_of(&self, id: OrgNodeId) -> &[OrgEdge] {
        self.outgoing.get(&id).map_or(&[], Vec::as_slice)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

use serde::{Deserialize, Serialize};

use crate::analysis::{self, DepthSpanReport};
use crate::error::Result;
use crate::models::{OrgEdge, OrgGraph, OrgNode, OrgNodeId, RawOrgSnapshot};
use crate::mutation::{self, ReparentCheckResponse, ReparentPayload};
use crate::report::{self, ReportSummary};
use crate::tree::{self, OrgTree};

/// External store of the organizational structure.
///
/// The engine never persists anything itself: it fetches a fresh snapshot
/// per call and hands validated reparent commands back to the store. Fetch
/// failures should surface as `SourceUnavailable`; the store may still
/// reject a locally-valid reparent (server-side defense in depth), and that
/// failure is passed through to the caller unchanged.
pub trait OrgDirectory {
    fn fetch_org_graph(&self) -> Result<RawOrgSnapshot>;

    fn persist_reparent(&self, subordinate_id: OrgNodeId, new_manager_id: OrgNodeId)
    -> Result<()>;
}

/// High-level hierarchy actions for the interactive editing session.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum HierarchyOperation {
    Get,
    CheckReparent { payload: ReparentPayload },
    Reparent { payload: ReparentPayload },
    Analyze,
    BuildTrees,
    Report,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum HierarchyOperationResult {
    Snapshot {
        nodes: Vec<OrgNode>,
        edges: Vec<OrgEdge>,
    },
    ReparentCheck {
        response: ReparentCheckResponse,
    },
    Analysis {
        report: DepthSpanReport,
    },
    Trees {
        trees: Vec<OrgTree>,
    },
    Report {
        summary: ReportSummary,
    },
}

/// Stateless facade over one [`OrgDirectory`].
///
/// Every call loads a fresh snapshot, computes, and discards it; nothing is
/// cached between calls. Mutations follow propose -> apply externally ->
/// reload, so two racing sessions resolve by the store's last-write-wins
/// semantics rather than any locking here.
#[derive(Clone)]
pub struct HierarchyService<D> {
    directory: D,
}

impl<D: OrgDirectory> HierarchyService<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    pub fn execute(&self, operation: HierarchyOperation) -> Result<HierarchyOperationResult> {
        match operation {
            HierarchyOperation::Get => {
                let graph = self.get_graph()?;
                Ok(HierarchyOperationResult::Snapshot {
                    nodes: graph.nodes().to_vec(),
                    edges: graph.edges().to_vec(),
                })
            }
            HierarchyOperation::CheckReparent { payload } => {
                let response = self.check_reparent(payload)?;
                Ok(HierarchyOperationResult::ReparentCheck { response })
            }
            HierarchyOperation::Reparent { payload } => {
                let graph = self.reparent(payload)?;
                Ok(HierarchyOperationResult::Snapshot {
                    nodes: graph.nodes().to_vec(),
                    edges: graph.edges().to_vec(),
                })
            }
            HierarchyOperation::Analyze => {
                let report = self.analyze()?;
                Ok(HierarchyOperationResult::Analysis { report })
            }
            HierarchyOperation::BuildTrees => {
                let trees = self.build_trees()?;
                Ok(HierarchyOperationResult::Trees { trees })
            }
            HierarchyOperation::Report => {
                let summary = self.report()?;
                Ok(HierarchyOperationResult::Report { summary })
            }
        }
    }

    pub fn get_graph(&self) -> Result<OrgGraph> {
        let snapshot = self.directory.fetch_org_graph()?.normalize()?;
        OrgGraph::from_snapshot(snapshot)
    }

    pub fn check_reparent(&self, payload: ReparentPayload) -> Result<ReparentCheckResponse> {
        let graph = self.get_graph()?;
        Ok(mutation::check_reparent(
            &graph,
            payload.new_manager_id,
            payload.subordinate_id,
        ))
    }

    /// Validates locally, persists through the store, and reloads.
    pub fn reparent(&self, payload: ReparentPayload) -> Result<OrgGraph> {
        let graph = self.get_graph()?;
        mutation::propose_reparent(&graph, payload.new_manager_id, payload.subordinate_id)?;

        if let Err(error) = self
            .directory
            .persist_reparent(payload.subordinate_id, payload.new_manager_id)
        {
            tracing::error!(
                subordinate_id = %payload.subordinate_id,
                new_manager_id = %payload.new_manager_id,
                error = %error.source,
                "directory rejected reparent"
            );
            return Err(error);
        }

        tracing::info!(
            subordinate_id = %payload.subordinate_id,
            new_manager_id = %payload.new_manager_id,
            "reparent applied"
        );
        self.get_graph()
    }

    pub fn analyze(&self) -> Result<DepthSpanReport> {
        let graph = self.get_graph()?;
        analysis::analyze(&graph)
    }

    pub fn build_trees(&self) -> Result<Vec<OrgTree>> {
        let graph = self.get_graph()?;
        tree::build_trees(&graph)
    }

    pub fn report(&self) -> Result<ReportSummary> {
        let graph = self.get_graph()?;
        let trees = tree::build_trees(&graph)?;
        Ok(report::aggregate_report(&trees, &graph))
    }
}

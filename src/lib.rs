pub mod analysis;
pub mod directory;
pub mod error;
pub mod invariants;
pub mod models;
pub mod mutation;
pub mod report;
pub mod tree;

pub mod prelude {
    pub use crate::analysis::{DepthSpanReport, analyze};
    pub use crate::directory::{
        HierarchyOperation, HierarchyOperationResult, HierarchyService, OrgDirectory,
    };
    pub use crate::error::{ErrorKind, LibError, Result};
    pub use crate::invariants::{HierarchyViolation, ensure_forest, forest_violations};
    pub use crate::models::{
        Occupant, OrgEdge, OrgGraph, OrgNode, OrgNodeId, OrgSnapshot, RawOrgEdge, RawOrgNode,
        RawOrgSnapshot,
    };
    pub use crate::mutation::{
        ReparentCheckResponse, ReparentPayload, check_reparent, propose_reparent,
        reparent_violations,
    };
    pub use crate::report::{
        DepartmentRollup, ReportSummary, UNSPECIFIED_DEPARTMENT, aggregate_report,
    };
    pub use crate::tree::{OrgTree, TreeRow, build_trees};
}

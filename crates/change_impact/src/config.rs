use crate::checker::CheckerKind;
use serde::Deserialize;

/// Options for one analysis run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase", default)]
pub struct AnalysisOptions {
    /// Visits of a single CFG node before the fixpoint is assumed to diverge.
    pub max_steps_per_node: usize,
    /// Scripts with more nodes than this are rejected before analysis.
    pub max_nodes: usize,
    /// The checkers to run, in order.
    pub checkers: Vec<CheckerKind>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            max_steps_per_node: crate::data_flow_analysis::MAX_STEPS_PER_NODE,
            max_nodes: 100_000,
            checkers: vec![CheckerKind::SyncError, CheckerKind::AsyncError],
        }
    }
}

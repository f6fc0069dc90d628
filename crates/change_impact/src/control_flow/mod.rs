//! Intraprocedural control flow graphs.

pub mod analysis;
pub mod graph;
pub mod node;

pub use self::analysis::{
    CfgMap, ControlFlowAnalysis, ControlFlowAnalysisResult, ControlFlowRoot, NodePriority,
};
pub use self::graph::{Branch, CfgEdge, ControlFlowGraph, Edge, EdgeCondition};
pub use self::node::{CfgNode, Node, NodeKind};

#[cfg(test)]
mod tests;

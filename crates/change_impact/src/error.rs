use crate::trace::Address;
use ast::NodeId;
use thiserror::Error;

/// Faults that abort the analysis of a single file.
///
/// Precision losses (unsupported syntax, unresolved references) are never
/// reported here; they degrade the affected values to TOP instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// The script has no statements.
    #[error("empty input")]
    EmptyInput,
    /// The script exceeds the configured node limit.
    #[error("input has {nodes} nodes, which exceeds the limit of {max}")]
    TooLarge { nodes: usize, max: usize },
    /// A store read hit an address that was never allocated.
    #[error("read of unallocated address {0:?}")]
    UnallocatedAddress(Address),
    /// The fixpoint of a function did not stabilize within the step bound.
    #[error("dataflow analysis of function {function} appears to diverge{}", at_node(.node))]
    Divergence { function: NodeId, node: Option<NodeId> },
    /// A closure refers to a function with no control flow graph.
    #[error("no control flow graph for function {0}")]
    MissingFunction(NodeId),
}

fn at_node(node: &Option<NodeId>) -> String {
    match node {
        Some(node) => format!(" at node {}", node),
        None => String::new(),
    }
}

impl AnalysisError {
    /// The stage that failed, for diagnostics.
    pub fn stage(&self) -> &'static str {
        match self {
            AnalysisError::EmptyInput | AnalysisError::TooLarge { .. } => "parse",
            AnalysisError::MissingFunction(_) => "cfg",
            AnalysisError::UnallocatedAddress(_) | AnalysisError::Divergence { .. } => "fixpoint",
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_divergence_message() {
        let at = AnalysisError::Divergence {
            function: NodeId(1),
            node: Some(NodeId(7)),
        };
        assert_eq!(
            at.to_string(),
            "dataflow analysis of function 1 appears to diverge at node 7"
        );
        let anywhere = AnalysisError::Divergence {
            function: NodeId(1),
            node: None,
        };
        assert_eq!(
            anywhere.to_string(),
            "dataflow analysis of function 1 appears to diverge"
        );
        assert_eq!(anywhere.stage(), "fixpoint");
    }

    #[test]
    fn test_too_large_message() {
        let err = AnalysisError::TooLarge { nodes: 12, max: 10 };
        assert_eq!(
            err.to_string(),
            "input has 12 nodes, which exceeds the limit of 10"
        );
        assert_eq!(err.stage(), "parse");
    }
}

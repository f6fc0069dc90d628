//! Labeled source ranges derived from the facts of one analyzed version.
//!
//! Each visitor walks the tree once and reads the fact base; none of them
//! looks at abstract states directly. The result is sorted and free of
//! duplicates, so the two versions of a file can be diffed line by line.

use crate::{facts::FactBase, node_table::NodeTable};
use ast::{Script, Span};
use ecma_visit::VisitWith;
use serde::Serialize;
use std::collections::BTreeSet;

mod control;
mod criteria;
mod environment;
mod values;

#[cfg(test)]
mod tests;

pub const VAL_DEF: &str = "VAL-DEF";
pub const VAL_USE: &str = "VAL-USE";
pub const ENV_DEF: &str = "ENV-DEF";
pub const ENV_USE: &str = "ENV-USE";
pub const CON_DEF: &str = "CON-DEF";
pub const CON_USE: &str = "CON-USE";
pub const CALL_DEF: &str = "CALL-DEF";
pub const CALL_USE: &str = "CALL-USE";

/// A labeled source range.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub label: String,
    /// Ids of the criteria a `_CRIT` or `_DEP` label refers to.
    pub dependency_ids: Vec<u32>,
    pub line: u32,
    pub offset: u32,
    pub len: u32,
}

/// Annotates `script` with the facts its analysis produced.
pub fn annotate(script: &Script, facts: &FactBase) -> Vec<Annotation> {
    let nodes = NodeTable::build(script);
    let mut out = Annotations::default();

    script.visit_with(&mut values::ValueVisitor::new(facts, &mut out));
    script.visit_with(&mut environment::EnvironmentVisitor::new(facts, &mut out));
    script.visit_with(&mut control::ControlVisitor::new(facts, &mut out));
    criteria::annotate(facts, &nodes, &mut out);

    out.0.into_iter().collect()
}

#[derive(Default)]
pub(crate) struct Annotations(BTreeSet<Annotation>);

impl Annotations {
    pub fn add(&mut self, label: &str, span: Span) {
        self.add_with_dependencies(label, span, Vec::new());
    }

    pub fn add_with_dependencies(&mut self, label: &str, span: Span, dependency_ids: Vec<u32>) {
        if span == Span::DUMMY {
            return;
        }
        self.0.insert(Annotation {
            label: label.to_string(),
            dependency_ids,
            line: span.line,
            offset: span.offset,
            len: span.len,
        });
    }
}

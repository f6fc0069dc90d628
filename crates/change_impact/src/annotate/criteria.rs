use super::Annotations;
use crate::{facts::FactBase, lattice::CriterionType, node_table::NodeTable};
use std::collections::BTreeMap;

/// `<TYPE>_CRIT` on every criterion, and `<TYPE>_DEP` on every node that
/// depends on criteria of that type, listing their ids.
pub(super) fn annotate(facts: &FactBase, nodes: &NodeTable<'_>, out: &mut Annotations) {
    for c in facts.criteria() {
        if let Some(span) = nodes.span(c.id) {
            out.add_with_dependencies(&format!("{}_CRIT", c.kind), span, vec![c.id.as_u32()]);
        }
    }

    for (id, deps) in facts.dependencies() {
        let span = match nodes.span(id) {
            Some(span) => span,
            None => continue,
        };
        let mut by_kind: BTreeMap<CriterionType, Vec<u32>> = BTreeMap::new();
        for c in deps.iter() {
            by_kind.entry(c.kind).or_default().push(c.id.as_u32());
        }
        for (kind, ids) in by_kind {
            out.add_with_dependencies(&format!("{}_DEP", kind), span, ids);
        }
    }
}

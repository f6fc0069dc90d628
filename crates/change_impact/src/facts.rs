//! Per-analysis registry of everything the annotation visitors report.
//!
//! One fact base is created for each analyzed script version and threaded
//! through the interpreter and the checkers. Facts only accumulate: every
//! record joins into what is already there, so a fact recorded during an
//! early, imprecise visit of a node is subsumed by later visits.

use crate::{
    lattice::{Change, Criterion, Dependencies},
    state::Control,
};
use ast::NodeId;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct FactBase {
    criteria: BTreeSet<Criterion>,
    dependencies: FxHashMap<NodeId, Dependencies>,
    /// Joined value change of every evaluated expression.
    values: FxHashMap<NodeId, Change>,
    /// Joined change of the variable each identifier resolved to.
    variables: FxHashMap<NodeId, Change>,
    /// Branch conditions that evaluated to a changed value.
    changed_conditions: FxHashSet<NodeId>,
    /// Calls that are new or whose target changed.
    changed_calls: FxHashSet<NodeId>,
    /// Joined control state each statement was reached under.
    controls: FxHashMap<NodeId, Control>,
}

impl FactBase {
    pub fn register_criterion(&mut self, c: Criterion) {
        self.criteria.insert(c);
    }

    /// Records that node `id` depends on `deps`.
    pub fn add_dependencies(&mut self, id: NodeId, deps: &Dependencies) {
        if deps.is_empty() {
            return;
        }
        self.dependencies.entry(id).or_default().join_in(deps);
    }

    pub fn record_value(&mut self, id: NodeId, change: Change) {
        let entry = self.values.entry(id).or_insert(Change::Bottom);
        *entry = entry.join(change);
    }

    pub fn record_variable(&mut self, id: NodeId, change: Change) {
        let entry = self.variables.entry(id).or_insert(Change::Bottom);
        *entry = entry.join(change);
    }

    pub fn record_changed_condition(&mut self, id: NodeId) {
        self.changed_conditions.insert(id);
    }

    pub fn record_changed_call(&mut self, id: NodeId) {
        self.changed_calls.insert(id);
    }

    pub fn record_control(&mut self, id: NodeId, control: &Control) {
        match self.controls.get_mut(&id) {
            Some(old) => *old = old.join(control),
            None => {
                self.controls.insert(id, control.clone());
            }
        }
    }

    pub fn criteria(&self) -> impl Iterator<Item = &Criterion> + '_ {
        self.criteria.iter()
    }

    pub fn dependencies(&self) -> impl Iterator<Item = (NodeId, &Dependencies)> + '_ {
        self.dependencies.iter().map(|(id, deps)| (*id, deps))
    }

    pub fn dependencies_of(&self, id: NodeId) -> Option<&Dependencies> {
        self.dependencies.get(&id)
    }

    pub fn value_change(&self, id: NodeId) -> Change {
        self.values.get(&id).copied().unwrap_or_default()
    }

    pub fn variable_change(&self, id: NodeId) -> Change {
        self.variables.get(&id).copied().unwrap_or_default()
    }

    pub fn is_changed_condition(&self, id: NodeId) -> bool {
        self.changed_conditions.contains(&id)
    }

    pub fn is_changed_call(&self, id: NodeId) -> bool {
        self.changed_calls.contains(&id)
    }

    pub fn control(&self, id: NodeId) -> Option<&Control> {
        self.controls.get(&id)
    }
}

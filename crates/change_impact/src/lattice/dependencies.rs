use crate::facts::FactBase;
use ast::NodeId;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::iter::FromIterator;

/// The kinds of provenance witnesses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CriterionType {
    Variable,
    Value,
    ValueChange,
    VariableChange,
    CallChange,
    ConditionChange,
    SyncErrorApi,
    SyncErrorFunction,
    AsyncErrorCallSite,
    AsyncErrorEparam,
    AsyncErrorVparam,
}

impl CriterionType {
    pub fn as_str(self) -> &'static str {
        match self {
            CriterionType::Variable => "VARIABLE",
            CriterionType::Value => "VALUE",
            CriterionType::ValueChange => "VALUE_CHANGE",
            CriterionType::VariableChange => "VARIABLE_CHANGE",
            CriterionType::CallChange => "CALL_CHANGE",
            CriterionType::ConditionChange => "CONDITION_CHANGE",
            CriterionType::SyncErrorApi => "SYNC_ERROR_API",
            CriterionType::SyncErrorFunction => "SYNC_ERROR_FUNCTION",
            CriterionType::AsyncErrorCallSite => "ASYNC_ERROR_CALL_SITE",
            CriterionType::AsyncErrorEparam => "ASYNC_ERROR_EPARAM",
            CriterionType::AsyncErrorVparam => "ASYNC_ERROR_VPARAM",
        }
    }
}

impl fmt::Display for CriterionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provenance witness: something of kind `kind` originated at node `id`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Criterion {
    pub kind: CriterionType,
    pub id: NodeId,
}

impl Criterion {
    pub fn new(kind: CriterionType, id: NodeId) -> Self {
        Self { kind, id }
    }
}

/// A set of criteria. Joins are unions, so provenance is never dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dependencies(BTreeSet<Criterion>);

impl Dependencies {
    pub fn bottom() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, c: &Criterion) -> bool {
        self.0.contains(c)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Criterion> + '_ {
        self.0.iter()
    }

    pub fn join(&self, other: &Dependencies) -> Dependencies {
        let mut result = self.clone();
        result.join_in(other);
        result
    }

    pub fn join_in(&mut self, other: &Dependencies) {
        self.0.extend(other.0.iter().copied());
    }

    pub fn is_subset(&self, other: &Dependencies) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Creates a new criterion at `id`, registers it and returns it as a
    /// singleton set.
    pub fn inject(facts: &mut FactBase, kind: CriterionType, id: NodeId) -> Dependencies {
        let c = Criterion::new(kind, id);
        facts.register_criterion(c);
        Dependencies(std::iter::once(c).collect())
    }

    pub fn inject_value(facts: &mut FactBase, id: NodeId) -> Dependencies {
        Self::inject(facts, CriterionType::Value, id)
    }

    pub fn inject_value_change(facts: &mut FactBase, id: NodeId) -> Dependencies {
        Self::inject(facts, CriterionType::ValueChange, id)
    }

    pub fn inject_variable(facts: &mut FactBase, id: NodeId) -> Dependencies {
        Self::inject(facts, CriterionType::Variable, id)
    }

    pub fn inject_variable_change(facts: &mut FactBase, id: NodeId) -> Dependencies {
        Self::inject(facts, CriterionType::VariableChange, id)
    }
}

impl FromIterator<Criterion> for Dependencies {
    fn from_iter<T: IntoIterator<Item = Criterion>>(iter: T) -> Self {
        Dependencies(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Dependencies {
    type Item = &'a Criterion;
    type IntoIter = std::collections::btree_set::Iter<'a, Criterion>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

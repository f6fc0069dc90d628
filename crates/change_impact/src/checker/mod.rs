//! Client analyses that run alongside the abstract interpreter.
//!
//! A checker keeps its own abstract state next to the built-in one. The
//! interpreter hands every checker a read-only view of the built-in state at
//! each statement, branch and call, and the checker reports what it finds by
//! registering criteria in the fact base. Checkers never write to the store or
//! the environment.

use crate::{
    control_flow::Node,
    facts::FactBase,
    lattice::{BValue, Change},
    node_table::NodeTable,
    state::State,
};
use ast::{CallExpr, Expr, Function};
use serde::Deserialize;

pub use self::{async_error::AsyncErrorState, sync_error::SyncErrorState};

mod async_error;
mod sync_error;

/// The checkers that can be enabled in [crate::config::AnalysisOptions].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckerKind {
    SyncError,
    AsyncError,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CallKind {
    /// The callee was resolved from the call target.
    Direct,
    /// The callee was passed as an argument to a call that could not be
    /// resolved, and is assumed to run asynchronously.
    Callback,
}

pub struct CallSite<'a, 'ast> {
    pub call: &'ast CallExpr,
    pub kind: CallKind,
    /// The value of the object the target was read from, for method calls.
    pub receiver: Option<&'a BValue>,
}

impl CallSite<'_, '_> {
    /// Whether the call is new, or calls a different target than before.
    pub fn is_changed(&self) -> bool {
        Change::conv(self.call) == Change::Changed
            || Change::conv_u(&*self.call.callee) == Change::Changed
    }
}

/// What a checker may touch besides its own state.
pub struct CheckerContext<'a, 'ast> {
    pub facts: &'a mut FactBase,
    pub nodes: &'a NodeTable<'ast>,
}

pub trait CheckerState: Sized {
    /// The checker state after `stmt`. `state` is the built-in state after
    /// the statement was interpreted.
    fn interpret_statement(
        &self,
        stmt: Node<'_>,
        state: &State,
        cx: &mut CheckerContext<'_, '_>,
    ) -> Self;

    /// The checker state on the edge taken when `condition` is truthy (or
    /// falsy, when `negated`).
    fn interpret_branch_condition(
        &self,
        condition: &Expr,
        negated: bool,
        state: &State,
        cx: &mut CheckerContext<'_, '_>,
    ) -> Self;

    /// The checker state after a call returned. `exits` holds the checker
    /// states at the exit of every callee.
    fn interpret_call_site(
        &self,
        site: &CallSite<'_, '_>,
        exits: &[&Self],
        state: &State,
        cx: &mut CheckerContext<'_, '_>,
    ) -> Self;

    /// The checker state at the entry of `callee`. `state` is the built-in
    /// initial state of the callee.
    fn initialize_callback(
        &self,
        site: &CallSite<'_, '_>,
        callee: &Function,
        state: &State,
        cx: &mut CheckerContext<'_, '_>,
    ) -> Self;

    fn join(&self, other: &Self) -> Self;

    /// Whether two entry states would produce the same checker results.
    fn equivalent_to(&self, other: &Self) -> bool;
}

#[derive(Clone, Debug, PartialEq)]
pub enum Checker {
    SyncError(SyncErrorState),
    AsyncError(AsyncErrorState),
}

impl Checker {
    pub fn new(kind: CheckerKind) -> Self {
        match kind {
            CheckerKind::SyncError => Checker::SyncError(SyncErrorState::default()),
            CheckerKind::AsyncError => Checker::AsyncError(AsyncErrorState::default()),
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $s:ident => $e:expr) => {
        match $self {
            Checker::SyncError($s) => Checker::SyncError($e),
            Checker::AsyncError($s) => Checker::AsyncError($e),
        }
    };
}

impl CheckerState for Checker {
    fn interpret_statement(
        &self,
        stmt: Node<'_>,
        state: &State,
        cx: &mut CheckerContext<'_, '_>,
    ) -> Self {
        dispatch!(self, c => c.interpret_statement(stmt, state, cx))
    }

    fn interpret_branch_condition(
        &self,
        condition: &Expr,
        negated: bool,
        state: &State,
        cx: &mut CheckerContext<'_, '_>,
    ) -> Self {
        dispatch!(self, c => c.interpret_branch_condition(condition, negated, state, cx))
    }

    fn interpret_call_site(
        &self,
        site: &CallSite<'_, '_>,
        exits: &[&Self],
        state: &State,
        cx: &mut CheckerContext<'_, '_>,
    ) -> Self {
        match self {
            Checker::SyncError(c) => {
                let exits: Vec<_> = exits
                    .iter()
                    .filter_map(|e| match e {
                        Checker::SyncError(e) => Some(e),
                        _ => None,
                    })
                    .collect();
                Checker::SyncError(c.interpret_call_site(site, &exits, state, cx))
            }
            Checker::AsyncError(c) => {
                let exits: Vec<_> = exits
                    .iter()
                    .filter_map(|e| match e {
                        Checker::AsyncError(e) => Some(e),
                        _ => None,
                    })
                    .collect();
                Checker::AsyncError(c.interpret_call_site(site, &exits, state, cx))
            }
        }
    }

    fn initialize_callback(
        &self,
        site: &CallSite<'_, '_>,
        callee: &Function,
        state: &State,
        cx: &mut CheckerContext<'_, '_>,
    ) -> Self {
        dispatch!(self, c => c.initialize_callback(site, callee, state, cx))
    }

    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Checker::SyncError(a), Checker::SyncError(b)) => Checker::SyncError(a.join(b)),
            (Checker::AsyncError(a), Checker::AsyncError(b)) => Checker::AsyncError(a.join(b)),
            _ => self.clone(),
        }
    }

    fn equivalent_to(&self, other: &Self) -> bool {
        match (self, other) {
            (Checker::SyncError(a), Checker::SyncError(b)) => a.equivalent_to(b),
            (Checker::AsyncError(a), Checker::AsyncError(b)) => a.equivalent_to(b),
            _ => false,
        }
    }
}

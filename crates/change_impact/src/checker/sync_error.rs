use super::{CallSite, CheckerContext, CheckerState};
use crate::{
    control_flow::Node,
    lattice::{CriterionType, Dependencies},
    state::State,
};
use ast::{Expr, Function, MemberExpr, MemberProp, NodeId};
use tracing::debug;

/// The module whose synchronous API throws on failure.
const API_MODULE: &str = "fs";
const API_FUNCTION: &str = "readFileSync";

/// Flags new or retargeted calls of `fs.readFileSync` that are not inside a
/// `try` block of the calling function.
///
/// The checker is stateless; everything it needs is in the call site and the
/// provenance of the receiver.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SyncErrorState;

impl CheckerState for SyncErrorState {
    fn interpret_statement(
        &self,
        _stmt: Node<'_>,
        _state: &State,
        _cx: &mut CheckerContext<'_, '_>,
    ) -> Self {
        SyncErrorState
    }

    fn interpret_branch_condition(
        &self,
        _condition: &Expr,
        _negated: bool,
        _state: &State,
        _cx: &mut CheckerContext<'_, '_>,
    ) -> Self {
        SyncErrorState
    }

    fn interpret_call_site(
        &self,
        site: &CallSite<'_, '_>,
        _exits: &[&Self],
        _state: &State,
        cx: &mut CheckerContext<'_, '_>,
    ) -> Self {
        if !site.is_changed() {
            return SyncErrorState;
        }
        let function = match site.call.callee.unwrap_parens() {
            Expr::Member(MemberExpr {
                prop: MemberProp::Ident(prop),
                ..
            }) if prop.sym == API_FUNCTION => prop,
            _ => return SyncErrorState,
        };
        let receiver = match site.receiver {
            Some(receiver) => receiver,
            None => return SyncErrorState,
        };
        let call = site.call.info.id;
        if cx.nodes.is_protected(call) {
            return SyncErrorState;
        }

        // The receiver must come from `require('fs')`.
        let apis: Vec<NodeId> = receiver
            .deps
            .iter()
            .filter(|c| {
                c.kind == CriterionType::Value && cx.nodes.require_name(c.id) == Some(API_MODULE)
            })
            .map(|c| c.id)
            .collect();
        for api in apis {
            let mut deps = Dependencies::inject(cx.facts, CriterionType::SyncErrorApi, api);
            deps.join_in(&Dependencies::inject(
                cx.facts,
                CriterionType::SyncErrorFunction,
                function.info.id,
            ));
            cx.facts.add_dependencies(call, &deps);
            debug!(%call, %api, "unprotected call of {}.{}", API_MODULE, API_FUNCTION);
        }
        SyncErrorState
    }

    fn initialize_callback(
        &self,
        _site: &CallSite<'_, '_>,
        _callee: &Function,
        _state: &State,
        _cx: &mut CheckerContext<'_, '_>,
    ) -> Self {
        SyncErrorState
    }

    fn join(&self, _other: &Self) -> Self {
        SyncErrorState
    }

    fn equivalent_to(&self, _other: &Self) -> bool {
        true
    }
}

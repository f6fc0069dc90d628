use super::{CallKind, CallSite, CheckerContext, CheckerState};
use crate::{
    control_flow::Node,
    lattice::{Addresses, CriterionType, Dependencies},
    state::State,
};
use ast::{Expr, FnExpr, Function, Ident, MemberProp, NodeId};
use ecma_visit::{Visit, VisitWith};
use std::collections::BTreeSet;
use tracing::debug;

/// A parameter of the callback under analysis.
#[derive(Clone, Debug, PartialEq)]
struct Param {
    name: String,
    id: NodeId,
    addresses: Addresses,
}

/**
 * Flags uses of the result of an asynchronous call when the error passed to
 * the same callback may be set.
 *
 * The state is only populated inside a callback registered by a new or
 * retargeted call. The first parameter of the callback is the error, the rest
 * are its values. A statement that reads a value while the error's string
 * component may be non-empty depends on the call site and both parameters.
 */
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AsyncErrorState {
    call_sites: BTreeSet<NodeId>,
    error: Option<Param>,
    values: Vec<Param>,
}

impl AsyncErrorState {
    fn used_values<'p>(&'p self, stmt: Node<'_>, state: &State) -> Vec<&'p Param> {
        let mut uses = NameUses::default();
        for expr in stmt.exprs() {
            expr.visit_with(&mut uses);
        }
        self.values
            .iter()
            .filter(|p| uses.names.contains(p.name.as_str()))
            // Shadowed names are other variables.
            .filter(|p| state.env.apply(&p.name).map(|v| &v.addresses) == Some(&p.addresses))
            .collect()
    }
}

impl CheckerState for AsyncErrorState {
    fn interpret_statement(
        &self,
        stmt: Node<'_>,
        state: &State,
        cx: &mut CheckerContext<'_, '_>,
    ) -> Self {
        let error = match &self.error {
            Some(error) if !self.call_sites.is_empty() => error,
            _ => return self.clone(),
        };
        let used = self.used_values(stmt, state);
        if used.is_empty() {
            return self.clone();
        }
        let error_value = match state.env.apply(&error.name) {
            Some(var) if var.addresses == error.addresses => state.store.apply_set(&var.addresses),
            _ => return self.clone(),
        };
        match error_value {
            Ok(value) if !value.str_.is_blank_or_bottom() => {}
            _ => return self.clone(),
        }

        let mut deps = Dependencies::bottom();
        for &call in &self.call_sites {
            deps.join_in(&Dependencies::inject(
                cx.facts,
                CriterionType::AsyncErrorCallSite,
                call,
            ));
        }
        deps.join_in(&Dependencies::inject(
            cx.facts,
            CriterionType::AsyncErrorEparam,
            error.id,
        ));
        for param in used {
            deps.join_in(&Dependencies::inject(
                cx.facts,
                CriterionType::AsyncErrorVparam,
                param.id,
            ));
        }
        cx.facts.add_dependencies(stmt.id(), &deps);
        debug!(stmt = %stmt.id(), "value used while the callback error may be set");
        self.clone()
    }

    fn interpret_branch_condition(
        &self,
        _condition: &Expr,
        _negated: bool,
        _state: &State,
        _cx: &mut CheckerContext<'_, '_>,
    ) -> Self {
        self.clone()
    }

    fn interpret_call_site(
        &self,
        _site: &CallSite<'_, '_>,
        _exits: &[&Self],
        _state: &State,
        _cx: &mut CheckerContext<'_, '_>,
    ) -> Self {
        self.clone()
    }

    fn initialize_callback(
        &self,
        site: &CallSite<'_, '_>,
        callee: &Function,
        state: &State,
        _cx: &mut CheckerContext<'_, '_>,
    ) -> Self {
        if site.kind != CallKind::Callback || !site.is_changed() {
            return AsyncErrorState::default();
        }
        let param = |p: &Ident| Param {
            name: p.sym.clone(),
            id: p.info.id,
            addresses: state
                .env
                .apply(&p.sym)
                .map(|v| v.addresses.clone())
                .unwrap_or_default(),
        };
        let mut params = callee.params.iter();
        let error = params.next().map(param);
        let values = params.map(param).collect();
        AsyncErrorState {
            call_sites: std::iter::once(site.call.info.id).collect(),
            error,
            values,
        }
    }

    fn join(&self, other: &Self) -> Self {
        AsyncErrorState {
            call_sites: self.call_sites.union(&other.call_sites).copied().collect(),
            error: self.error.clone().or_else(|| other.error.clone()),
            values: if self.values.is_empty() {
                other.values.clone()
            } else {
                self.values.clone()
            },
        }
    }

    fn equivalent_to(&self, other: &Self) -> bool {
        self.call_sites == other.call_sites
    }
}

/// Names read by an expression, not counting property names and nested
/// functions.
#[derive(Default)]
struct NameUses {
    names: BTreeSet<String>,
}

impl<'ast> Visit<'ast> for NameUses {
    fn visit_ident(&mut self, n: &'ast Ident) {
        self.names.insert(n.sym.clone());
    }

    fn visit_member_prop(&mut self, n: &'ast MemberProp) {
        if let MemberProp::Computed(e) = n {
            self.visit_expr(e);
        }
    }

    fn visit_fn_expr(&mut self, _n: &'ast FnExpr) {}
}

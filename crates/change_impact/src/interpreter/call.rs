use super::{
    init::{function_entry, Invocation},
    Interpreter,
};
use crate::{
    checker::{CallKind, CallSite, Checker, CheckerContext, CheckerState},
    error::{AnalysisError, Result},
    lattice::{Addresses, BValue, Change, CriterionType, Dependencies},
    object::Closure,
    state::{Control, ControlCall, State},
    store::Store,
};
use ast::{CallExpr, Expr, Function, GetNodeId};
use tracing::trace;

impl<'i, 'c, 'ast> Interpreter<'i, 'c, 'ast> {
    /// Evaluates a call.
    ///
    /// Every closure the target may be is analyzed to completion with the
    /// arguments as its entry state, and the caller continues with the join of
    /// the callee exits. When no closure is known, the result is unknown and
    /// every function passed as an argument is analyzed as a callback.
    pub(super) fn eval_call(&mut self, call: &'ast CallExpr) -> Result<BValue> {
        let id = call.info.id;
        let (fun_val, receiver) = match call.callee.unwrap_parens() {
            Expr::Member(m) => {
                let bases = self.resolve_or_create(&m.obj)?;
                let fun_val = self.eval_property(m, &bases)?;
                self.ctx.facts.record_value(m.info.id, fun_val.change);
                let receiver = self.state.store.apply_set(&bases)?;
                (fun_val, Some(receiver))
            }
            _ => (self.eval(&call.callee)?, None),
        };
        self.ctx
            .facts
            .record_value(call.callee.node_id(), fun_val.change);

        // A new call, or a call whose target expression changed.
        let direct = if Change::conv(call).is_changed() {
            Some(Dependencies::inject_value_change(&mut self.ctx.facts, id))
        } else if Change::conv_u(&*call.callee).is_changed() {
            Some(Dependencies::inject_value_change(
                &mut self.ctx.facts,
                call.callee.node_id(),
            ))
        } else {
            None
        };
        let mut call_deps = Dependencies::inject_value(&mut self.ctx.facts, id);
        if let Some(deps) = &direct {
            self.ctx.facts.record_changed_call(id);
            call_deps.join_in(deps);
            call_deps.join_in(&Dependencies::inject(
                &mut self.ctx.facts,
                CriterionType::CallChange,
                id,
            ));
        }
        let ret_change = if direct.is_some() {
            Change::Changed
        } else if fun_val.change.is_changed() {
            fun_val.change
        } else {
            Change::Bottom
        };

        let mut args = Vec::with_capacity(call.args.len());
        let mut arg_change = Change::Bottom;
        for arg in &call.args {
            let mut value = self.eval(arg)?;
            if let Some(deps) = &direct {
                value = BValue {
                    change: value.change.join(Change::Changed),
                    deps: value.deps.join(deps),
                    ..value
                };
            } else if fun_val.change.is_changed() {
                value.change = value.change.join(fun_val.change);
            }
            let (change, deps) = self.change_u(arg);
            if change.is_changed() {
                value.change = value.change.join(change);
                value.deps.join_in(&deps);
            }
            arg_change = arg_change.join(value.change);
            args.push(value);
        }

        let closures = self.closures(&fun_val.addresses);
        let site = CallSite {
            call,
            kind: CallKind::Direct,
            receiver: receiver.as_ref(),
        };

        let mut exits = Vec::new();
        let value = if closures.is_empty() {
            trace!(call = %id, "unresolved call");
            self.run_callbacks(call, &args)?;
            let mut deps = call_deps;
            deps.join_in(&fun_val.deps);
            for arg in &args {
                deps.join_in(&arg.deps);
            }
            let change = if direct.is_some() {
                Change::Changed
            } else {
                Change::Unchanged.join(arg_change)
            };
            BValue::top(change, deps)
        } else {
            let self_addr = match &receiver {
                Some(r) if r.addresses.iter().next().is_some() => r.addresses.clone(),
                _ => self.state.self_addr.clone(),
            };
            let control = Control::new(if site.is_changed() {
                ControlCall {
                    change: Change::Changed,
                    deps: Dependencies::inject(&mut self.ctx.facts, CriterionType::CallChange, id),
                }
            } else {
                ControlCall::unchanged()
            });
            for closure in &closures {
                let function = self.function(closure)?;
                let entry = self.callee_entry(
                    &site,
                    Invocation {
                        closure,
                        function,
                        args: &args,
                        self_addr: self_addr.clone(),
                        control: control.clone(),
                        context: id,
                    },
                )?;
                if let Some(exit) = self.ctx.analyze_function(closure.function, entry)? {
                    exits.push(exit);
                }
            }

            let mut return_value = BValue::bottom();
            for exit in &exits {
                return_value = return_value.join(&exit.scratch.return_value);
            }
            if let Some(store) = join_stores(exits.iter().map(|e| &e.store)) {
                self.state.store = store;
            }
            if return_value == BValue::bottom() {
                let change = match ret_change {
                    Change::Bottom => Change::Unchanged,
                    change => change,
                };
                BValue::undefined(change, call_deps)
            } else {
                BValue {
                    change: return_value.change.join(ret_change),
                    deps: return_value.deps.join(&call_deps),
                    ..return_value
                }
            }
        };

        self.update_checkers(|i, checker, state, cx| {
            let exit_checkers: Vec<&Checker> =
                exits.iter().filter_map(|e| e.checkers.get(i)).collect();
            checker.interpret_call_site(&site, &exit_checkers, state, cx)
        });

        let calls = &mut self.state.scratch.calls;
        match calls.get_mut(&id) {
            Some(old) => *old = old.join(&value),
            None => {
                calls.insert(id, value.clone());
            }
        }
        Ok(value)
    }

    /// Analyzes every function passed to an unresolved call, with no
    /// arguments, and continues with the join of their exit stores.
    fn run_callbacks(&mut self, call: &'ast CallExpr, args: &[BValue]) -> Result<()> {
        let site = CallSite {
            call,
            kind: CallKind::Callback,
            receiver: None,
        };
        let control = Control::new(if site.is_changed() {
            ControlCall {
                change: Change::Changed,
                deps: Dependencies::inject(
                    &mut self.ctx.facts,
                    CriterionType::CallChange,
                    call.info.id,
                ),
            }
        } else {
            ControlCall::unchanged()
        });

        let mut exits = Vec::new();
        for arg in args {
            for closure in self.closures(&arg.addresses) {
                let function = self.function(&closure)?;
                trace!(call = %call.info.id, callback = %closure.function, "analyzing callback");
                let entry = self.callee_entry(
                    &site,
                    Invocation {
                        closure: &closure,
                        function,
                        args: &[],
                        self_addr: self.state.self_addr.clone(),
                        control: control.clone(),
                        context: call.info.id,
                    },
                )?;
                if let Some(exit) = self.ctx.analyze_function(closure.function, entry)? {
                    exits.push(exit);
                }
            }
        }
        if let Some(store) = join_stores(exits.iter().map(|e| &e.store)) {
            self.state.store = store;
        }
        Ok(())
    }

    /// The entry state of a callee, with checker states initialized from the
    /// caller's.
    fn callee_entry(
        &mut self,
        site: &CallSite<'_, 'ast>,
        invocation: Invocation<'_>,
    ) -> Result<State> {
        let function = invocation.function;
        let mut entry = function_entry(&*self.state, &mut self.ctx.facts, invocation)?;
        let mut cx = CheckerContext {
            facts: &mut self.ctx.facts,
            nodes: self.ctx.nodes,
        };
        entry.checkers = self
            .state
            .checkers
            .iter()
            .map(|c| c.initialize_callback(site, function, &entry, &mut cx))
            .collect();
        Ok(entry)
    }

    /// The closures of the function objects `addrs` may point to.
    fn closures(&self, addrs: &Addresses) -> Vec<Closure> {
        addrs
            .iter()
            .filter_map(|addr| self.state.store.get_obj(addr))
            .filter_map(|obj| obj.internal.closure.clone())
            .collect()
    }

    fn function(&self, closure: &Closure) -> Result<&'ast Function> {
        self.ctx
            .nodes
            .function(closure.function)
            .ok_or(AnalysisError::MissingFunction(closure.function))
    }
}

/// The join of the callee exit stores, which replaces the caller's store
/// after a call. `None` when no callee returned.
fn join_stores<'s>(mut stores: impl Iterator<Item = &'s Store>) -> Option<Store> {
    let first = stores.next()?.clone();
    Some(stores.fold(first, |acc, store| acc.join(store)))
}

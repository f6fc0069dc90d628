//! Transfer functions of the abstract interpreter.
//!
//! An [Interpreter] borrows the analysis context and the state flowing into
//! one CFG node (or edge) and updates the state in place. Expressions are
//! evaluated eagerly and in source order; calls run the callee to completion
//! before the caller continues.

use crate::{
    analysis::AnalysisContext,
    checker::{Checker, CheckerContext, CheckerState},
    control_flow::{Edge, Node, NodeKind},
    environment::Variable,
    error::Result,
    lattice::{Addresses, BValue, Change, CriterionType, Dependencies},
    state::{Condition, State},
    store::MergeMode,
};
use ast::{CatchClause, GetNodeId, Node as AstNode, NodeId, ReturnStmt, VarDecl};
use std::rc::Rc;

pub(crate) use self::init::{function_entry, script_state, Invocation};

mod call;
mod expr;
mod init;
mod refine;

/// The binding `return` writes its value to.
const RETVAL: &str = "~retval~";

/// The property name used when an element key cannot be computed.
pub(crate) const UNKNOWN_PROPERTY: &str = "~unknown~";

pub(crate) struct Interpreter<'i, 'c, 'ast> {
    ctx: &'i mut AnalysisContext<'c, 'ast>,
    state: &'i mut State,
    /// How writes at this program point combine with the old value.
    mode: MergeMode,
}

impl<'i, 'c, 'ast> Interpreter<'i, 'c, 'ast> {
    pub fn new(
        ctx: &'i mut AnalysisContext<'c, 'ast>,
        state: &'i mut State,
        mode: MergeMode,
    ) -> Self {
        Self { ctx, state, mode }
    }

    pub fn interpret_node(&mut self, node: Node<'ast>) -> Result<()> {
        match node.kind {
            NodeKind::ExprStmt(n) => {
                self.eval(&n.expr)?;
            }
            NodeKind::VarDecl(n) => self.interpret_var_decl(n)?,
            NodeKind::ReturnStmt(n) => self.interpret_return(n)?,
            NodeKind::ThrowStmt(n) => {
                self.eval(&n.arg)?;
            }
            NodeKind::IfStmt(n) => {
                self.eval(&n.test)?;
            }
            NodeKind::WhileStmt(n) => {
                self.eval(&n.test)?;
            }
            NodeKind::DoWhileStmt(n) => {
                self.eval(&n.test)?;
            }
            NodeKind::ForStmt(n) => {
                if let Some(test) = &n.test {
                    self.eval(test)?;
                }
            }
            NodeKind::Expr(n) => {
                self.eval(n)?;
            }
            NodeKind::CatchClause(n) => self.interpret_catch(n),
            NodeKind::ImplicitReturn => return Ok(()),
            NodeKind::Script(_)
            | NodeKind::Function(_)
            | NodeKind::TryStmt(_)
            | NodeKind::BreakStmt(_)
            | NodeKind::ContinueStmt(_)
            | NodeKind::EmptyStmt(_) => {}
        }

        self.update_checkers(|_, checker, state, cx| checker.interpret_statement(node, state, cx));
        Ok(())
    }

    /// Transfers the state along a CFG edge. Only conditional edges do
    /// anything: they tag the state with changed conditions and narrow the
    /// values the condition tested.
    pub fn interpret_edge(&mut self, edge: &Edge<'ast>) -> Result<()> {
        let condition = match edge.condition {
            Some(condition) => condition,
            None => return Ok(()),
        };
        let expr = condition.expr;
        let id = expr.node_id();

        let change = self
            .ctx
            .facts
            .value_change(id)
            .join(Change::conv_u(expr));
        if change.is_changed() {
            self.ctx.facts.record_changed_condition(id);
            Dependencies::inject(&mut self.ctx.facts, CriterionType::ConditionChange, id);
            self.state.control.condition = self.state.control.condition.branch(Condition {
                id,
                negated: condition.negated,
            });
        }

        self.refine(expr, !condition.negated)?;

        self.update_checkers(|_, checker, state, cx| {
            checker.interpret_branch_condition(expr, condition.negated, state, cx)
        });
        Ok(())
    }

    fn interpret_var_decl(&mut self, decl: &'ast VarDecl) -> Result<()> {
        for declarator in &decl.decls {
            let addrs = self.resolve_ident(&declarator.name);
            if let Some(init) = &declarator.init {
                let value = self.eval(init)?;
                let value = self.mark_new_value(init, value);
                self.write(&addrs, &value, declarator.name.info.id)?;
            }
        }
        Ok(())
    }

    fn interpret_return(&mut self, ret: &'ast ReturnStmt) -> Result<()> {
        let value = match &ret.arg {
            Some(arg) => self.eval(arg)?,
            None => {
                let (change, deps) = self.origin_u(ret);
                BValue::undefined(change, deps)
            }
        };
        self.state.scratch.return_value = self.state.scratch.return_value.join(&value);

        // Keeps returned closures reachable from the environment.
        let addr = self.state.trace.make_addr(ret.info.id, "");
        let deps = Dependencies::inject_variable(&mut self.ctx.facts, ret.info.id);
        self.bind(Variable {
            name: RETVAL.to_string(),
            addresses: Addresses::single(addr.clone()),
            change: Change::Bottom,
            deps,
        });
        self.state.store.alloc(addr, value);
        Ok(())
    }

    fn interpret_catch(&mut self, clause: &'ast CatchClause) {
        let param = match &clause.param {
            Some(param) => param,
            None => return,
        };
        let addr = self.state.trace.make_addr(param.info.id, "");
        let (change, change_deps) = self.variable_change(param);
        let deps = Dependencies::inject_variable(&mut self.ctx.facts, param.info.id);
        self.bind(Variable {
            name: param.sym.clone(),
            addresses: Addresses::single(addr.clone()),
            change,
            deps: deps.join(&change_deps),
        });
        let value = BValue::top(
            Change::Unchanged,
            Dependencies::inject_value(&mut self.ctx.facts, param.info.id),
        );
        self.state.store.alloc(addr, value);
    }

    /// Binds a variable in the innermost scope.
    fn bind(&mut self, var: Variable) {
        Rc::make_mut(&mut self.state.env).strong_update(var);
    }

    /// Reads the join of the values at `addrs`. The provenance of the value is
    /// recorded on `node`.
    fn read(&mut self, addrs: &Addresses, node: NodeId) -> Result<BValue> {
        let value = self.state.store.apply_set(addrs)?;
        self.ctx.facts.add_dependencies(node, &value.deps);
        Ok(value)
    }

    /// Writes `value` to `addrs` and records its provenance on `node`.
    fn write(&mut self, addrs: &Addresses, value: &BValue, node: NodeId) -> Result<()> {
        self.state.store.update(addrs, value, self.mode)?;
        self.ctx.facts.add_dependencies(node, &value.deps);
        Ok(())
    }

    /// `conv(node)`, with a VALUE_CHANGE criterion when the node changed.
    fn change<N: AstNode + ?Sized>(&mut self, node: &N) -> (Change, Dependencies) {
        self.criterion_change(Change::conv(node), node.node_id(), CriterionType::ValueChange)
    }

    /// `conv_u(node)`, with a VALUE_CHANGE criterion when the node changed.
    fn change_u<N: AstNode + ?Sized>(&mut self, node: &N) -> (Change, Dependencies) {
        self.criterion_change(Change::conv_u(node), node.node_id(), CriterionType::ValueChange)
    }

    /// The change of a value created at `node`, with a VALUE criterion for
    /// the node itself.
    fn origin<N: AstNode + ?Sized>(&mut self, node: &N) -> (Change, Dependencies) {
        let (change, mut deps) = self.change(node);
        deps.join_in(&Dependencies::inject_value(&mut self.ctx.facts, node.node_id()));
        (change, deps)
    }

    /// Like [Interpreter::origin], but updated nodes are changed.
    fn origin_u<N: AstNode + ?Sized>(&mut self, node: &N) -> (Change, Dependencies) {
        let (change, mut deps) = self.change_u(node);
        deps.join_in(&Dependencies::inject_value(&mut self.ctx.facts, node.node_id()));
        (change, deps)
    }

    /// `conv_u(node)` of a declared name, with a VARIABLE_CHANGE criterion.
    fn variable_change<N: AstNode + ?Sized>(&mut self, node: &N) -> (Change, Dependencies) {
        self.criterion_change(
            Change::conv_u(node),
            node.node_id(),
            CriterionType::VariableChange,
        )
    }

    fn criterion_change(
        &mut self,
        change: Change,
        id: NodeId,
        kind: CriterionType,
    ) -> (Change, Dependencies) {
        if change.is_changed() {
            (change, Dependencies::inject(&mut self.ctx.facts, kind, id))
        } else {
            (change, Dependencies::bottom())
        }
    }

    /// Replaces every checker state with `f` applied to it.
    fn update_checkers<F>(&mut self, mut f: F)
    where
        F: FnMut(usize, &Checker, &State, &mut CheckerContext<'_, 'ast>) -> Checker,
    {
        if self.state.checkers.is_empty() {
            return;
        }
        let checkers = std::mem::take(&mut self.state.checkers);
        let updated = {
            let state: &State = &*self.state;
            let mut cx = CheckerContext {
                facts: &mut self.ctx.facts,
                nodes: self.ctx.nodes,
            };
            checkers
                .iter()
                .enumerate()
                .map(|(i, checker)| f(i, checker, state, &mut cx))
                .collect()
        };
        self.state.checkers = updated;
    }
}

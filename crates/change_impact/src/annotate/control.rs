use super::{Annotations, CALL_DEF, CALL_USE, CON_DEF, CON_USE};
use crate::facts::FactBase;
use ast::{CallExpr, Expr, GetNodeId, Node, Stmt};
use ecma_visit::{Visit, VisitWith};

/// Marks changed branch conditions and call targets, and the statements that
/// only run because of them.
pub(super) struct ControlVisitor<'a> {
    facts: &'a FactBase,
    out: &'a mut Annotations,
}

impl<'a> ControlVisitor<'a> {
    pub fn new(facts: &'a FactBase, out: &'a mut Annotations) -> Self {
        Self { facts, out }
    }
}

impl<'ast> Visit<'ast> for ControlVisitor<'_> {
    fn visit_stmt(&mut self, n: &'ast Stmt) {
        if let Some(control) = self.facts.control(n.node_id()) {
            if !control.condition.conditions.is_empty() {
                self.out.add(CON_USE, n.span());
            }
            if control.call.change.is_changed() {
                self.out.add(CALL_USE, n.span());
            }
        }
        n.visit_children_with(self);
    }

    fn visit_expr(&mut self, n: &'ast Expr) {
        if self.facts.is_changed_condition(n.node_id()) {
            self.out.add(CON_DEF, n.span());
        }
        n.visit_children_with(self);
    }

    fn visit_call_expr(&mut self, n: &'ast CallExpr) {
        if self.facts.is_changed_call(n.info.id) {
            self.out.add(CALL_DEF, n.callee.span());
        }
        n.visit_children_with(self);
    }
}

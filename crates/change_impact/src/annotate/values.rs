use super::{Annotations, VAL_DEF, VAL_USE};
use crate::{facts::FactBase, lattice::Change};
use ast::{
    ArrayLit, BinExpr, BinaryOp, Expr, FnDecl, FnExpr, GetNodeId, Lit, MemberExpr, Node,
    ObjectLit, Span,
};
use ecma_visit::{Visit, VisitWith};

/// Marks the expressions whose value may differ between the versions
/// (`VAL-USE`) and the new values that cause it (`VAL-DEF`).
pub(super) struct ValueVisitor<'a> {
    facts: &'a FactBase,
    out: &'a mut Annotations,
}

impl<'a> ValueVisitor<'a> {
    pub fn new(facts: &'a FactBase, out: &'a mut Annotations) -> Self {
        Self { facts, out }
    }

    fn changed(&self, expr: &Expr) -> bool {
        self.facts.value_change(expr.node_id()).is_changed()
    }

    /// The first and last character of a bracketed literal.
    fn brackets(&mut self, span: Span) {
        if span.len == 0 {
            return;
        }
        self.out.add(VAL_DEF, Span::new(span.line, span.offset, 1));
        // Spans do not record the line a literal ends on.
        self.out.add(
            VAL_DEF,
            Span::new(span.line, span.offset + span.len - 1, 1),
        );
    }
}

impl<'ast> Visit<'ast> for ValueVisitor<'_> {
    fn visit_expr(&mut self, n: &'ast Expr) {
        if let Expr::Ident(i) = n {
            if self.changed(n) {
                self.out.add(VAL_USE, i.span());
            }
        }
        n.visit_children_with(self);
    }

    fn visit_member_expr(&mut self, n: &'ast MemberExpr) {
        if self.facts.value_change(n.info.id).is_changed() {
            self.out.add(VAL_USE, n.span());
        }
        n.visit_children_with(self);
    }

    fn visit_lit(&mut self, n: &'ast Lit) {
        if Change::conv_u(n).is_changed() {
            self.out.add(VAL_DEF, n.span());
        }
    }

    fn visit_object_lit(&mut self, n: &'ast ObjectLit) {
        if Change::conv_u(n).is_changed() {
            self.brackets(n.span());
        }
        n.visit_children_with(self);
    }

    fn visit_array_lit(&mut self, n: &'ast ArrayLit) {
        if Change::conv_u(n).is_changed() {
            self.brackets(n.span());
        }
        n.visit_children_with(self);
    }

    fn visit_fn_decl(&mut self, n: &'ast FnDecl) {
        if Change::conv_u(&n.function).is_changed() {
            self.out.add(VAL_DEF, n.ident.span());
        }
        n.visit_children_with(self);
    }

    fn visit_fn_expr(&mut self, n: &'ast FnExpr) {
        if Change::conv_u(&n.function).is_changed() {
            self.out.add(VAL_DEF, n.function.span());
        }
        n.visit_children_with(self);
    }

    fn visit_bin_expr(&mut self, n: &'ast BinExpr) {
        // `+` picks string or numeric addition from its operands.
        if n.op == BinaryOp::Add && (self.changed(&n.left) || self.changed(&n.right)) {
            self.out.add(VAL_DEF, n.span());
        }
        n.visit_children_with(self);
    }
}

use super::{Annotations, ENV_DEF, ENV_USE};
use crate::facts::FactBase;
use ast::{CatchClause, Expr, FnDecl, FnExpr, Function, Ident, MemberProp, Node, VarDeclarator};
use ecma_visit::{Visit, VisitWith};

/// Marks names bound to a changed variable: `ENV-DEF` where the binding is
/// declared and `ENV-USE` where it is read or written.
pub(super) struct EnvironmentVisitor<'a> {
    facts: &'a FactBase,
    out: &'a mut Annotations,
}

impl<'a> EnvironmentVisitor<'a> {
    pub fn new(facts: &'a FactBase, out: &'a mut Annotations) -> Self {
        Self { facts, out }
    }

    fn mark(&mut self, label: &str, ident: &Ident) {
        if self.facts.variable_change(ident.info.id).is_changed() {
            self.out.add(label, ident.span());
        }
    }
}

impl<'ast> Visit<'ast> for EnvironmentVisitor<'_> {
    fn visit_var_declarator(&mut self, n: &'ast VarDeclarator) {
        self.mark(ENV_DEF, &n.name);
        if let Some(init) = &n.init {
            self.visit_expr(init);
        }
    }

    fn visit_fn_decl(&mut self, n: &'ast FnDecl) {
        self.mark(ENV_DEF, &n.ident);
        self.visit_function(&n.function);
    }

    fn visit_fn_expr(&mut self, n: &'ast FnExpr) {
        self.visit_function(&n.function);
    }

    fn visit_function(&mut self, n: &'ast Function) {
        for param in &n.params {
            self.mark(ENV_DEF, param);
        }
        self.visit_block_stmt(&n.body);
    }

    fn visit_catch_clause(&mut self, n: &'ast CatchClause) {
        if let Some(param) = &n.param {
            self.mark(ENV_DEF, param);
        }
        self.visit_block_stmt(&n.body);
    }

    fn visit_expr(&mut self, n: &'ast Expr) {
        match n {
            Expr::Ident(i) => self.mark(ENV_USE, i),
            _ => n.visit_children_with(self),
        }
    }

    // Property names are not bindings.
    fn visit_member_prop(&mut self, n: &'ast MemberProp) {
        if let MemberProp::Computed(e) = n {
            self.visit_expr(e);
        }
    }
}

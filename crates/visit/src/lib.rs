// This is not a public api.
#[doc(hidden)]
pub extern crate ast;

use ast::*;

#[cfg(test)]
mod tests;

/// Read-only traversal. Every method defaults to visiting the node's
/// children, so implementors only override what they care about and call
/// `n.visit_children_with(self)` to keep descending.
pub trait Visit<'ast>: Sized {
    fn visit_script(&mut self, n: &'ast Script) {
        n.visit_children_with(self)
    }
    fn visit_function(&mut self, n: &'ast Function) {
        n.visit_children_with(self)
    }
    fn visit_fn_decl(&mut self, n: &'ast FnDecl) {
        n.visit_children_with(self)
    }
    fn visit_fn_expr(&mut self, n: &'ast FnExpr) {
        n.visit_children_with(self)
    }
    fn visit_stmt(&mut self, n: &'ast Stmt) {
        n.visit_children_with(self)
    }
    fn visit_stmts(&mut self, n: &'ast [Stmt]) {
        for s in n {
            self.visit_stmt(s);
        }
    }
    fn visit_block_stmt(&mut self, n: &'ast BlockStmt) {
        n.visit_children_with(self)
    }
    fn visit_empty_stmt(&mut self, _n: &'ast EmptyStmt) {}
    fn visit_expr_stmt(&mut self, n: &'ast ExprStmt) {
        n.visit_children_with(self)
    }
    fn visit_var_decl(&mut self, n: &'ast VarDecl) {
        n.visit_children_with(self)
    }
    fn visit_var_declarator(&mut self, n: &'ast VarDeclarator) {
        n.visit_children_with(self)
    }
    fn visit_return_stmt(&mut self, n: &'ast ReturnStmt) {
        n.visit_children_with(self)
    }
    fn visit_throw_stmt(&mut self, n: &'ast ThrowStmt) {
        n.visit_children_with(self)
    }
    fn visit_if_stmt(&mut self, n: &'ast IfStmt) {
        n.visit_children_with(self)
    }
    fn visit_while_stmt(&mut self, n: &'ast WhileStmt) {
        n.visit_children_with(self)
    }
    fn visit_do_while_stmt(&mut self, n: &'ast DoWhileStmt) {
        n.visit_children_with(self)
    }
    fn visit_for_stmt(&mut self, n: &'ast ForStmt) {
        n.visit_children_with(self)
    }
    fn visit_var_decl_or_expr(&mut self, n: &'ast VarDeclOrExpr) {
        n.visit_children_with(self)
    }
    fn visit_try_stmt(&mut self, n: &'ast TryStmt) {
        n.visit_children_with(self)
    }
    fn visit_catch_clause(&mut self, n: &'ast CatchClause) {
        n.visit_children_with(self)
    }
    fn visit_break_stmt(&mut self, _n: &'ast BreakStmt) {}
    fn visit_continue_stmt(&mut self, _n: &'ast ContinueStmt) {}
    fn visit_expr(&mut self, n: &'ast Expr) {
        n.visit_children_with(self)
    }
    fn visit_ident(&mut self, _n: &'ast Ident) {}
    fn visit_this_expr(&mut self, _n: &'ast ThisExpr) {}
    fn visit_lit(&mut self, _n: &'ast Lit) {}
    fn visit_array_lit(&mut self, n: &'ast ArrayLit) {
        n.visit_children_with(self)
    }
    fn visit_object_lit(&mut self, n: &'ast ObjectLit) {
        n.visit_children_with(self)
    }
    fn visit_property(&mut self, n: &'ast Property) {
        n.visit_children_with(self)
    }
    fn visit_prop_name(&mut self, _n: &'ast PropName) {}
    fn visit_unary_expr(&mut self, n: &'ast UnaryExpr) {
        n.visit_children_with(self)
    }
    fn visit_update_expr(&mut self, n: &'ast UpdateExpr) {
        n.visit_children_with(self)
    }
    fn visit_bin_expr(&mut self, n: &'ast BinExpr) {
        n.visit_children_with(self)
    }
    fn visit_assign_expr(&mut self, n: &'ast AssignExpr) {
        n.visit_children_with(self)
    }
    fn visit_member_expr(&mut self, n: &'ast MemberExpr) {
        n.visit_children_with(self)
    }
    fn visit_member_prop(&mut self, n: &'ast MemberProp) {
        n.visit_children_with(self)
    }
    fn visit_call_expr(&mut self, n: &'ast CallExpr) {
        n.visit_children_with(self)
    }
    fn visit_new_expr(&mut self, n: &'ast NewExpr) {
        n.visit_children_with(self)
    }
    fn visit_cond_expr(&mut self, n: &'ast CondExpr) {
        n.visit_children_with(self)
    }
    fn visit_paren_expr(&mut self, n: &'ast ParenExpr) {
        n.visit_children_with(self)
    }
}

pub trait VisitWith<'ast, V: Visit<'ast>> {
    /// Calls the visitor method for this node type.
    fn visit_with(&'ast self, v: &mut V);

    /// Visits the children of this node with `v`.
    fn visit_children_with(&'ast self, v: &mut V);
}

macro_rules! visit_with {
    ($ty:ty, $method:ident, |$n:ident, $v:ident| $children:block) => {
        impl<'ast, V: Visit<'ast>> VisitWith<'ast, V> for $ty {
            fn visit_with(&'ast self, v: &mut V) {
                v.$method(self)
            }

            #[allow(unused_variables)]
            fn visit_children_with(&'ast self, $v: &mut V) {
                let $n = self;
                $children
            }
        }
    };
}

visit_with!(Script, visit_script, |n, v| {
    v.visit_stmts(&n.body);
});

visit_with!(Function, visit_function, |n, v| {
    for p in &n.params {
        v.visit_ident(p);
    }
    v.visit_block_stmt(&n.body);
});

visit_with!(FnDecl, visit_fn_decl, |n, v| {
    v.visit_ident(&n.ident);
    v.visit_function(&n.function);
});

visit_with!(FnExpr, visit_fn_expr, |n, v| {
    if let Some(ident) = &n.ident {
        v.visit_ident(ident);
    }
    v.visit_function(&n.function);
});

visit_with!(Stmt, visit_stmt, |n, v| {
    match n {
        Stmt::Block(s) => v.visit_block_stmt(s),
        Stmt::Empty(s) => v.visit_empty_stmt(s),
        Stmt::Return(s) => v.visit_return_stmt(s),
        Stmt::Break(s) => v.visit_break_stmt(s),
        Stmt::Continue(s) => v.visit_continue_stmt(s),
        Stmt::If(s) => v.visit_if_stmt(s),
        Stmt::Throw(s) => v.visit_throw_stmt(s),
        Stmt::Try(s) => v.visit_try_stmt(s),
        Stmt::While(s) => v.visit_while_stmt(s),
        Stmt::DoWhile(s) => v.visit_do_while_stmt(s),
        Stmt::For(s) => v.visit_for_stmt(s),
        Stmt::Fn(s) => v.visit_fn_decl(s),
        Stmt::Var(s) => v.visit_var_decl(s),
        Stmt::Expr(s) => v.visit_expr_stmt(s),
    }
});

visit_with!(BlockStmt, visit_block_stmt, |n, v| {
    v.visit_stmts(&n.stmts);
});

visit_with!(EmptyStmt, visit_empty_stmt, |n, v| {});

visit_with!(ExprStmt, visit_expr_stmt, |n, v| {
    v.visit_expr(&n.expr);
});

visit_with!(VarDecl, visit_var_decl, |n, v| {
    for d in &n.decls {
        v.visit_var_declarator(d);
    }
});

visit_with!(VarDeclarator, visit_var_declarator, |n, v| {
    v.visit_ident(&n.name);
    if let Some(init) = &n.init {
        v.visit_expr(init);
    }
});

visit_with!(ReturnStmt, visit_return_stmt, |n, v| {
    if let Some(arg) = &n.arg {
        v.visit_expr(arg);
    }
});

visit_with!(ThrowStmt, visit_throw_stmt, |n, v| {
    v.visit_expr(&n.arg);
});

visit_with!(IfStmt, visit_if_stmt, |n, v| {
    v.visit_expr(&n.test);
    v.visit_stmt(&n.cons);
    if let Some(alt) = &n.alt {
        v.visit_stmt(alt);
    }
});

visit_with!(WhileStmt, visit_while_stmt, |n, v| {
    v.visit_expr(&n.test);
    v.visit_stmt(&n.body);
});

visit_with!(DoWhileStmt, visit_do_while_stmt, |n, v| {
    v.visit_stmt(&n.body);
    v.visit_expr(&n.test);
});

visit_with!(ForStmt, visit_for_stmt, |n, v| {
    if let Some(init) = &n.init {
        v.visit_var_decl_or_expr(init);
    }
    if let Some(test) = &n.test {
        v.visit_expr(test);
    }
    if let Some(update) = &n.update {
        v.visit_expr(update);
    }
    v.visit_stmt(&n.body);
});

visit_with!(VarDeclOrExpr, visit_var_decl_or_expr, |n, v| {
    match n {
        VarDeclOrExpr::VarDecl(d) => v.visit_var_decl(d),
        VarDeclOrExpr::Expr(e) => v.visit_expr(e),
    }
});

visit_with!(TryStmt, visit_try_stmt, |n, v| {
    v.visit_block_stmt(&n.block);
    if let Some(handler) = &n.handler {
        v.visit_catch_clause(handler);
    }
    if let Some(finalizer) = &n.finalizer {
        v.visit_block_stmt(finalizer);
    }
});

visit_with!(CatchClause, visit_catch_clause, |n, v| {
    if let Some(param) = &n.param {
        v.visit_ident(param);
    }
    v.visit_block_stmt(&n.body);
});

visit_with!(BreakStmt, visit_break_stmt, |n, v| {});

visit_with!(ContinueStmt, visit_continue_stmt, |n, v| {});

visit_with!(Expr, visit_expr, |n, v| {
    match n {
        Expr::This(e) => v.visit_this_expr(e),
        Expr::Array(e) => v.visit_array_lit(e),
        Expr::Object(e) => v.visit_object_lit(e),
        Expr::Fn(e) => v.visit_fn_expr(e),
        Expr::Unary(e) => v.visit_unary_expr(e),
        Expr::Update(e) => v.visit_update_expr(e),
        Expr::Bin(e) => v.visit_bin_expr(e),
        Expr::Assign(e) => v.visit_assign_expr(e),
        Expr::Member(e) => v.visit_member_expr(e),
        Expr::Cond(e) => v.visit_cond_expr(e),
        Expr::Call(e) => v.visit_call_expr(e),
        Expr::New(e) => v.visit_new_expr(e),
        Expr::Ident(e) => v.visit_ident(e),
        Expr::Lit(e) => v.visit_lit(e),
        Expr::Paren(e) => v.visit_paren_expr(e),
    }
});

visit_with!(Ident, visit_ident, |n, v| {});

visit_with!(ThisExpr, visit_this_expr, |n, v| {});

visit_with!(Lit, visit_lit, |n, v| {});

visit_with!(ArrayLit, visit_array_lit, |n, v| {
    for e in &n.elems {
        v.visit_expr(e);
    }
});

visit_with!(ObjectLit, visit_object_lit, |n, v| {
    for p in &n.props {
        v.visit_property(p);
    }
});

visit_with!(Property, visit_property, |n, v| {
    v.visit_prop_name(&n.key);
    v.visit_expr(&n.value);
});

visit_with!(PropName, visit_prop_name, |n, v| {});

visit_with!(UnaryExpr, visit_unary_expr, |n, v| {
    v.visit_expr(&n.arg);
});

visit_with!(UpdateExpr, visit_update_expr, |n, v| {
    v.visit_expr(&n.arg);
});

visit_with!(BinExpr, visit_bin_expr, |n, v| {
    v.visit_expr(&n.left);
    v.visit_expr(&n.right);
});

visit_with!(AssignExpr, visit_assign_expr, |n, v| {
    v.visit_expr(&n.left);
    v.visit_expr(&n.right);
});

visit_with!(MemberExpr, visit_member_expr, |n, v| {
    v.visit_expr(&n.obj);
    v.visit_member_prop(&n.prop);
});

visit_with!(MemberProp, visit_member_prop, |n, v| {
    match n {
        MemberProp::Ident(i) => v.visit_ident(i),
        MemberProp::Computed(e) => v.visit_expr(e),
    }
});

visit_with!(CallExpr, visit_call_expr, |n, v| {
    v.visit_expr(&n.callee);
    for a in &n.args {
        v.visit_expr(a);
    }
});

visit_with!(NewExpr, visit_new_expr, |n, v| {
    v.visit_expr(&n.callee);
    for a in &n.args {
        v.visit_expr(a);
    }
});

visit_with!(CondExpr, visit_cond_expr, |n, v| {
    v.visit_expr(&n.test);
    v.visit_expr(&n.cons);
    v.visit_expr(&n.alt);
});

visit_with!(ParenExpr, visit_paren_expr, |n, v| {
    v.visit_expr(&n.expr);
});

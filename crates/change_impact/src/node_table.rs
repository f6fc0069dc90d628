//! Per-script lookup tables keyed by node id.

use ast::{
    CallExpr, Expr, Function, GetNodeId, Ident, Lit, Node, NodeId, Script, Span, Stmt, TryStmt,
};
use ecma_visit::{Visit, VisitWith};
use rustc_hash::{FxHashMap, FxHashSet};

pub struct NodeTable<'ast> {
    spans: FxHashMap<NodeId, Span>,
    functions: FxHashMap<NodeId, &'ast Function>,
    /// Calls inside a `try` block of their own function.
    protected_calls: FxHashSet<NodeId>,
    /// `require('<name>')` calls and the module name they load.
    requires: FxHashMap<NodeId, &'ast str>,
}

impl<'ast> NodeTable<'ast> {
    pub fn build(script: &'ast Script) -> Self {
        let mut builder = Builder {
            table: NodeTable {
                spans: FxHashMap::default(),
                functions: FxHashMap::default(),
                protected_calls: FxHashSet::default(),
                requires: FxHashMap::default(),
            },
            try_depth: Vec::new(),
        };
        builder.record(script);
        builder.try_depth.push(0);
        script.visit_children_with(&mut builder);
        builder.table
    }

    pub fn span(&self, id: NodeId) -> Option<Span> {
        self.spans.get(&id).copied()
    }

    pub fn function(&self, id: NodeId) -> Option<&'ast Function> {
        self.functions.get(&id).copied()
    }

    pub fn is_protected(&self, call: NodeId) -> bool {
        self.protected_calls.contains(&call)
    }

    pub fn require_name(&self, call: NodeId) -> Option<&'ast str> {
        self.requires.get(&call).copied()
    }
}

struct Builder<'ast> {
    table: NodeTable<'ast>,
    /// Number of enclosing `try` blocks, one entry per enclosing function.
    try_depth: Vec<usize>,
}

impl<'ast> Builder<'ast> {
    fn record<N: Node>(&mut self, n: &N) {
        self.table.spans.insert(n.node_id(), n.span());
    }

    fn in_try(&self) -> bool {
        self.try_depth.last().map_or(false, |&d| d > 0)
    }
}

impl<'ast> Visit<'ast> for Builder<'ast> {
    fn visit_function(&mut self, n: &'ast Function) {
        self.record(n);
        self.table.functions.insert(n.info.id, n);
        self.try_depth.push(0);
        n.visit_children_with(self);
        self.try_depth.pop();
    }

    fn visit_stmt(&mut self, n: &'ast Stmt) {
        // Function declarations share their id with the function.
        if !matches!(n, Stmt::Fn(_)) {
            self.record(n);
        }
        n.visit_children_with(self);
    }

    fn visit_try_stmt(&mut self, n: &'ast TryStmt) {
        if let Some(depth) = self.try_depth.last_mut() {
            *depth += 1;
        }
        self.visit_block_stmt(&n.block);
        if let Some(depth) = self.try_depth.last_mut() {
            *depth -= 1;
        }
        if let Some(handler) = &n.handler {
            self.visit_catch_clause(handler);
        }
        if let Some(finalizer) = &n.finalizer {
            self.visit_block_stmt(finalizer);
        }
    }

    fn visit_catch_clause(&mut self, n: &'ast ast::CatchClause) {
        self.record(n);
        n.visit_children_with(self);
    }

    fn visit_var_declarator(&mut self, n: &'ast ast::VarDeclarator) {
        self.record(n);
        n.visit_children_with(self);
    }

    fn visit_property(&mut self, n: &'ast ast::Property) {
        self.record(n);
        self.record(&n.key);
        n.visit_children_with(self);
    }

    fn visit_expr(&mut self, n: &'ast Expr) {
        self.record(n);
        n.visit_children_with(self);
    }

    fn visit_ident(&mut self, n: &'ast Ident) {
        self.record(n);
    }

    fn visit_call_expr(&mut self, n: &'ast CallExpr) {
        if self.in_try() {
            self.table.protected_calls.insert(n.info.id);
        }
        if let (Expr::Ident(callee), [arg]) = (n.callee.unwrap_parens(), n.args.as_slice()) {
            if callee.sym == "require" {
                if let Expr::Lit(Lit::Str(name)) = arg.unwrap_parens() {
                    self.table.requires.insert(n.info.id, &name.value);
                }
            }
        }
        n.visit_children_with(self);
    }
}

use crate::{
    decl::VarDecl,
    expr::{Expr, MemberProp},
    function::Function,
    stmt::{Stmt, VarDeclOrExpr},
    NodeInfo,
};
use serde::{Deserialize, Serialize};

/// One version of a source file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub body: Vec<Stmt>,
}

impl_node!(Script);

impl Script {
    /// Number of nodes in the tree, the script itself included.
    pub fn node_count(&self) -> usize {
        1 + self.body.iter().map(count_stmt).sum::<usize>()
    }
}

fn count_function(f: &Function) -> usize {
    1 + f.params.len() + 1 + f.body.stmts.iter().map(count_stmt).sum::<usize>()
}

fn count_var_decl(v: &VarDecl) -> usize {
    1 + v
        .decls
        .iter()
        .map(|d| 2 + d.init.as_deref().map_or(0, count_expr))
        .sum::<usize>()
}

fn count_block(stmts: &[Stmt]) -> usize {
    1 + stmts.iter().map(count_stmt).sum::<usize>()
}

fn count_stmt(s: &Stmt) -> usize {
    match s {
        Stmt::Block(b) => count_block(&b.stmts),
        Stmt::Empty(_) | Stmt::Break(_) | Stmt::Continue(_) => 1,
        Stmt::Return(r) => 1 + r.arg.as_deref().map_or(0, count_expr),
        Stmt::If(i) => {
            1 + count_expr(&i.test)
                + count_stmt(&i.cons)
                + i.alt.as_deref().map_or(0, count_stmt)
        }
        Stmt::Throw(t) => 1 + count_expr(&t.arg),
        Stmt::Try(t) => {
            1 + count_block(&t.block.stmts)
                + t.handler.as_ref().map_or(0, |h| {
                    1 + usize::from(h.param.is_some()) + count_block(&h.body.stmts)
                })
                + t.finalizer.as_ref().map_or(0, |f| count_block(&f.stmts))
        }
        Stmt::While(w) => 1 + count_expr(&w.test) + count_stmt(&w.body),
        Stmt::DoWhile(w) => 1 + count_expr(&w.test) + count_stmt(&w.body),
        Stmt::For(f) => {
            1 + match &f.init {
                Some(VarDeclOrExpr::VarDecl(v)) => count_var_decl(v),
                Some(VarDeclOrExpr::Expr(e)) => count_expr(e),
                None => 0,
            } + f.test.as_deref().map_or(0, count_expr)
                + f.update.as_deref().map_or(0, count_expr)
                + count_stmt(&f.body)
        }
        Stmt::Fn(f) => 1 + count_function(&f.function),
        Stmt::Var(v) => count_var_decl(v),
        Stmt::Expr(e) => 1 + count_expr(&e.expr),
    }
}

fn count_expr(e: &Expr) -> usize {
    match e {
        Expr::This(_) | Expr::Ident(_) | Expr::Lit(_) => 1,
        Expr::Array(a) => 1 + a.elems.iter().map(count_expr).sum::<usize>(),
        Expr::Object(o) => {
            1 + o
                .props
                .iter()
                .map(|p| 2 + count_expr(&p.value))
                .sum::<usize>()
        }
        Expr::Fn(f) => usize::from(f.ident.is_some()) + count_function(&f.function),
        Expr::Unary(u) => 1 + count_expr(&u.arg),
        Expr::Update(u) => 1 + count_expr(&u.arg),
        Expr::Bin(b) => 1 + count_expr(&b.left) + count_expr(&b.right),
        Expr::Assign(a) => 1 + count_expr(&a.left) + count_expr(&a.right),
        Expr::Member(m) => {
            1 + count_expr(&m.obj)
                + match &m.prop {
                    MemberProp::Ident(_) => 1,
                    MemberProp::Computed(c) => count_expr(c),
                }
        }
        Expr::Cond(c) => 1 + count_expr(&c.test) + count_expr(&c.cons) + count_expr(&c.alt),
        Expr::Call(c) => 1 + count_expr(&c.callee) + c.args.iter().map(count_expr).sum::<usize>(),
        Expr::New(n) => 1 + count_expr(&n.callee) + n.args.iter().map(count_expr).sum::<usize>(),
        Expr::Paren(p) => 1 + count_expr(&p.expr),
    }
}

//! Id-allocating constructors for building trees by hand.
//!
//! Every constructor takes `&self`, so nested calls such as
//! `b.bin(BinaryOp::Add, b.ident_expr("x"), b.num(0.0))` allocate ids without
//! fighting the borrow checker. Children are allocated before their parents.

use crate::{
    ArrayLit, AssignExpr, AssignOp, BinExpr, BinaryOp, BlockStmt, Bool, BreakStmt, CallExpr,
    CatchClause, ChangeType, CondExpr, ContinueStmt, DoWhileStmt, EmptyStmt, Expr, ExprStmt,
    FnDecl, FnExpr, ForStmt, Function, Ident, IfStmt, Lit, MemberExpr, MemberProp, NewExpr,
    NodeId, NodeInfo, Null, Number, ObjectLit, ParenExpr, PropName, Property, ReturnStmt, Script,
    Span, Stmt, Str, ThisExpr, ThrowStmt, TryStmt, UnaryExpr, UnaryOp, UpdateExpr, UpdateOp,
    VarDecl, VarDeclKind, VarDeclOrExpr, VarDeclarator, WhileStmt,
};
use std::cell::Cell;

pub struct AstBuilder {
    next_id: Cell<u32>,
    offset: Cell<u32>,
    line: Cell<u32>,
    change: Cell<ChangeType>,
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AstBuilder {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            offset: Cell::new(0),
            line: Cell::new(1),
            change: Cell::new(ChangeType::Unchanged),
        }
    }

    /// The id the next allocated node will receive.
    pub fn peek_id(&self) -> NodeId {
        NodeId(self.next_id.get())
    }

    pub fn info(&self) -> NodeInfo {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let offset = self.offset.get();
        self.offset.set(offset + 1);
        NodeInfo::new(
            NodeId(id),
            Span::new(self.line.get(), offset, 1),
            self.change.get(),
        )
    }

    /// Moves subsequent nodes onto the next source line.
    pub fn newline(&self) {
        self.line.set(self.line.get() + 1);
    }

    /// Runs `f` with subsequent nodes placed on the next source line.
    pub fn newline_then<T>(&self, f: impl FnOnce() -> T) -> T {
        self.newline();
        f()
    }

    /// Builds every node created by `f` with the given change label.
    pub fn with_change<T>(&self, change: ChangeType, f: impl FnOnce() -> T) -> T {
        let old = self.change.replace(change);
        let result = f();
        self.change.set(old);
        result
    }

    pub fn inserted<T>(&self, f: impl FnOnce() -> T) -> T {
        self.with_change(ChangeType::Inserted, f)
    }

    pub fn updated<T>(&self, f: impl FnOnce() -> T) -> T {
        self.with_change(ChangeType::Updated, f)
    }

    pub fn removed<T>(&self, f: impl FnOnce() -> T) -> T {
        self.with_change(ChangeType::Removed, f)
    }

    pub fn ident(&self, sym: &str) -> Ident {
        Ident::new(self.info(), sym)
    }

    pub fn ident_expr(&self, sym: &str) -> Expr {
        Expr::Ident(self.ident(sym))
    }

    pub fn this(&self) -> Expr {
        Expr::This(ThisExpr { info: self.info() })
    }

    pub fn str(&self, value: &str) -> Expr {
        Expr::Lit(Lit::Str(Str {
            info: self.info(),
            value: value.to_string(),
        }))
    }

    pub fn num(&self, value: f64) -> Expr {
        Expr::Lit(Lit::Num(Number {
            info: self.info(),
            value,
        }))
    }

    pub fn bool(&self, value: bool) -> Expr {
        Expr::Lit(Lit::Bool(Bool {
            info: self.info(),
            value,
        }))
    }

    pub fn null(&self) -> Expr {
        Expr::Lit(Lit::Null(Null { info: self.info() }))
    }

    pub fn array(&self, elems: Vec<Expr>) -> Expr {
        Expr::Array(ArrayLit {
            info: self.info(),
            elems,
        })
    }

    pub fn object(&self, props: Vec<(&str, Expr)>) -> Expr {
        let props = props
            .into_iter()
            .map(|(key, value)| {
                let key = PropName::Ident(self.ident(key));
                Property {
                    info: self.info(),
                    key,
                    value: Box::new(value),
                }
            })
            .collect();
        Expr::Object(ObjectLit {
            info: self.info(),
            props,
        })
    }

    pub fn unary(&self, op: UnaryOp, arg: Expr) -> Expr {
        Expr::Unary(UnaryExpr {
            info: self.info(),
            op,
            arg: Box::new(arg),
        })
    }

    pub fn not(&self, arg: Expr) -> Expr {
        self.unary(UnaryOp::Bang, arg)
    }

    pub fn update(&self, op: UpdateOp, prefix: bool, arg: Expr) -> Expr {
        Expr::Update(UpdateExpr {
            info: self.info(),
            op,
            prefix,
            arg: Box::new(arg),
        })
    }

    pub fn bin(&self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Bin(BinExpr {
            info: self.info(),
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn assign(&self, left: Expr, right: Expr) -> Expr {
        self.assign_op(AssignOp::Assign, left, right)
    }

    pub fn assign_op(&self, op: AssignOp, left: Expr, right: Expr) -> Expr {
        Expr::Assign(AssignExpr {
            info: self.info(),
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// `obj.prop`
    pub fn member(&self, obj: Expr, prop: &str) -> Expr {
        let prop = MemberProp::Ident(self.ident(prop));
        Expr::Member(MemberExpr {
            info: self.info(),
            obj: Box::new(obj),
            prop,
        })
    }

    /// `obj[prop]`
    pub fn computed(&self, obj: Expr, prop: Expr) -> Expr {
        Expr::Member(MemberExpr {
            info: self.info(),
            obj: Box::new(obj),
            prop: MemberProp::Computed(Box::new(prop)),
        })
    }

    pub fn call(&self, callee: Expr, args: Vec<Expr>) -> Expr {
        Expr::Call(CallExpr {
            info: self.info(),
            callee: Box::new(callee),
            args,
        })
    }

    pub fn new_expr(&self, callee: Expr, args: Vec<Expr>) -> Expr {
        Expr::New(NewExpr {
            info: self.info(),
            callee: Box::new(callee),
            args,
        })
    }

    pub fn cond(&self, test: Expr, cons: Expr, alt: Expr) -> Expr {
        Expr::Cond(CondExpr {
            info: self.info(),
            test: Box::new(test),
            cons: Box::new(cons),
            alt: Box::new(alt),
        })
    }

    pub fn paren(&self, expr: Expr) -> Expr {
        Expr::Paren(ParenExpr {
            info: self.info(),
            expr: Box::new(expr),
        })
    }

    pub fn function(&self, params: &[&str], body: Vec<Stmt>) -> Function {
        let params = params.iter().map(|p| self.ident(p)).collect();
        let body = self.block_stmt(body);
        Function {
            info: self.info(),
            params,
            body,
        }
    }

    pub fn fn_expr(&self, name: Option<&str>, params: &[&str], body: Vec<Stmt>) -> Expr {
        let ident = name.map(|n| self.ident(n));
        Expr::Fn(FnExpr {
            ident,
            function: self.function(params, body),
        })
    }

    pub fn fn_decl(&self, name: &str, params: &[&str], body: Vec<Stmt>) -> Stmt {
        let ident = self.ident(name);
        Stmt::Fn(FnDecl {
            ident,
            function: self.function(params, body),
        })
    }

    pub fn expr_stmt(&self, expr: Expr) -> Stmt {
        Stmt::Expr(ExprStmt {
            info: self.info(),
            expr: Box::new(expr),
        })
    }

    pub fn var_decl(&self, kind: VarDeclKind, decls: Vec<(&str, Option<Expr>)>) -> VarDecl {
        let decls = decls
            .into_iter()
            .map(|(name, init)| {
                let name = self.ident(name);
                VarDeclarator {
                    info: self.info(),
                    name,
                    init: init.map(Box::new),
                }
            })
            .collect();
        VarDecl {
            info: self.info(),
            kind,
            decls,
        }
    }

    /// `var name = init;`
    pub fn var(&self, name: &str, init: Option<Expr>) -> Stmt {
        Stmt::Var(self.var_decl(VarDeclKind::Var, vec![(name, init)]))
    }

    pub fn ret(&self, arg: Option<Expr>) -> Stmt {
        Stmt::Return(ReturnStmt {
            info: self.info(),
            arg: arg.map(Box::new),
        })
    }

    pub fn throw(&self, arg: Expr) -> Stmt {
        Stmt::Throw(ThrowStmt {
            info: self.info(),
            arg: Box::new(arg),
        })
    }

    pub fn block_stmt(&self, stmts: Vec<Stmt>) -> BlockStmt {
        BlockStmt {
            info: self.info(),
            stmts,
        }
    }

    pub fn block(&self, stmts: Vec<Stmt>) -> Stmt {
        Stmt::Block(self.block_stmt(stmts))
    }

    pub fn if_stmt(&self, test: Expr, cons: Vec<Stmt>, alt: Option<Vec<Stmt>>) -> Stmt {
        let cons = Box::new(self.block(cons));
        let alt = alt.map(|alt| Box::new(self.block(alt)));
        Stmt::If(IfStmt {
            info: self.info(),
            test: Box::new(test),
            cons,
            alt,
        })
    }

    pub fn while_stmt(&self, test: Expr, body: Vec<Stmt>) -> Stmt {
        let body = Box::new(self.block(body));
        Stmt::While(WhileStmt {
            info: self.info(),
            test: Box::new(test),
            body,
        })
    }

    pub fn do_while(&self, body: Vec<Stmt>, test: Expr) -> Stmt {
        let body = Box::new(self.block(body));
        Stmt::DoWhile(DoWhileStmt {
            info: self.info(),
            test: Box::new(test),
            body,
        })
    }

    pub fn for_stmt(
        &self,
        init: Option<VarDeclOrExpr>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Vec<Stmt>,
    ) -> Stmt {
        let body = Box::new(self.block(body));
        Stmt::For(ForStmt {
            info: self.info(),
            init,
            test: test.map(Box::new),
            update: update.map(Box::new),
            body,
        })
    }

    pub fn try_stmt(
        &self,
        block: Vec<Stmt>,
        handler: Option<(Option<&str>, Vec<Stmt>)>,
        finalizer: Option<Vec<Stmt>>,
    ) -> Stmt {
        let block = self.block_stmt(block);
        let handler = handler.map(|(param, body)| {
            let param = param.map(|p| self.ident(p));
            let body = self.block_stmt(body);
            CatchClause {
                info: self.info(),
                param,
                body,
            }
        });
        let finalizer = finalizer.map(|f| self.block_stmt(f));
        Stmt::Try(TryStmt {
            info: self.info(),
            block,
            handler,
            finalizer,
        })
    }

    pub fn brk(&self) -> Stmt {
        Stmt::Break(BreakStmt { info: self.info() })
    }

    pub fn cont(&self) -> Stmt {
        Stmt::Continue(ContinueStmt { info: self.info() })
    }

    pub fn empty(&self) -> Stmt {
        Stmt::Empty(EmptyStmt { info: self.info() })
    }

    pub fn script(&self, body: Vec<Stmt>) -> Script {
        Script {
            info: self.info(),
            body,
        }
    }
}

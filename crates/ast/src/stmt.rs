use crate::{
    decl::{FnDecl, VarDecl},
    expr::Expr,
    ident::Ident,
    NodeInfo,
};
use serde::{Deserialize, Serialize};

/// Use when only block statements are allowed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockStmt {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub stmts: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Block(BlockStmt),

    Empty(EmptyStmt),

    Return(ReturnStmt),

    Break(BreakStmt),

    Continue(ContinueStmt),

    If(IfStmt),

    Throw(ThrowStmt),

    Try(TryStmt),

    While(WhileStmt),

    DoWhile(DoWhileStmt),

    For(ForStmt),

    Fn(FnDecl),

    Var(VarDecl),

    Expr(ExprStmt),
}

impl_node_enum!(Stmt {
    Block,
    Empty,
    Return,
    Break,
    Continue,
    If,
    Throw,
    Try,
    While,
    DoWhile,
    For,
    Fn,
    Var,
    Expr,
});

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExprStmt {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub expr: Box<Expr>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmptyStmt {
    #[serde(flatten)]
    pub info: NodeInfo,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReturnStmt {
    #[serde(flatten)]
    pub info: NodeInfo,
    #[serde(default)]
    pub arg: Option<Box<Expr>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BreakStmt {
    #[serde(flatten)]
    pub info: NodeInfo,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContinueStmt {
    #[serde(flatten)]
    pub info: NodeInfo,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub test: Box<Expr>,
    pub cons: Box<Stmt>,
    #[serde(default)]
    pub alt: Option<Box<Stmt>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThrowStmt {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub arg: Box<Expr>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TryStmt {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub block: BlockStmt,
    #[serde(default)]
    pub handler: Option<CatchClause>,
    #[serde(default)]
    pub finalizer: Option<BlockStmt>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WhileStmt {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub test: Box<Expr>,
    pub body: Box<Stmt>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DoWhileStmt {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub test: Box<Expr>,
    pub body: Box<Stmt>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForStmt {
    #[serde(flatten)]
    pub info: NodeInfo,
    #[serde(default)]
    pub init: Option<VarDeclOrExpr>,
    #[serde(default)]
    pub test: Option<Box<Expr>>,
    #[serde(default)]
    pub update: Option<Box<Expr>>,
    pub body: Box<Stmt>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    #[serde(flatten)]
    pub info: NodeInfo,
    /// es2019
    ///
    /// The param is null if the catch binding is omitted. E.g., try { foo() }
    /// catch { bar() }
    #[serde(default)]
    pub param: Option<Ident>,
    pub body: BlockStmt,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum VarDeclOrExpr {
    VarDecl(VarDecl),
    Expr(Box<Expr>),
}

impl_node_enum!(VarDeclOrExpr { VarDecl, Expr });

impl_node!(
    BlockStmt,
    ExprStmt,
    EmptyStmt,
    ReturnStmt,
    BreakStmt,
    ContinueStmt,
    IfStmt,
    ThrowStmt,
    TryStmt,
    WhileStmt,
    DoWhileStmt,
    ForStmt,
    CatchClause,
);

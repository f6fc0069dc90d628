#![deny(unreachable_patterns)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! The syntax tree consumed by the change-impact analysis.
//!
//! Trees are produced by an external parser and tree-differencing stage. Every
//! node carries a unique [NodeId], its source position, the change label the
//! differencing stage assigned to it, and (for nodes that survived the change)
//! the id of the corresponding node in the other version of the file.

pub use self::{
    decl::{FnDecl, VarDecl, VarDeclKind, VarDeclarator},
    expr::{
        num_to_key, ArrayLit, AssignExpr, BinExpr, CallExpr, CondExpr, Expr, FnExpr, MemberExpr,
        MemberProp, NewExpr, ObjectLit, ParenExpr, PropName, Property, ThisExpr, UnaryExpr,
        UpdateExpr,
    },
    function::Function,
    ident::Ident,
    lit::{Bool, Lit, Null, Number, Str},
    module::Script,
    operators::{AssignOp, BinaryOp, UnaryOp, UpdateOp},
    stmt::{
        BlockStmt, BreakStmt, CatchClause, ContinueStmt, DoWhileStmt, EmptyStmt, ExprStmt,
        ForStmt, IfStmt, ReturnStmt, Stmt, ThrowStmt, TryStmt, VarDeclOrExpr, WhileStmt,
    },
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[macro_use]
mod macros;
pub mod builder;
mod decl;
mod expr;
mod function;
mod ident;
mod lit;
mod module;
mod operators;
mod stmt;

#[cfg(test)]
mod tests;

/// Unique identifier of a node within one version of a file.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const DUMMY: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source position of a node.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// 1-based line of the first character.
    pub line: u32,
    /// Absolute character offset from the start of the file.
    pub offset: u32,
    pub len: u32,
}

impl Span {
    pub const DUMMY: Span = Span {
        line: 0,
        offset: 0,
        len: 0,
    };

    pub fn new(line: u32, offset: u32, len: u32) -> Self {
        Self { line, offset, len }
    }
}

/**
 * The classification a tree-differencing pass assigned to a node.
 */
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    Unchanged,
    /** The node only exists in the post-commit version. */
    Inserted,
    /** The node only exists in the pre-commit version. */
    Removed,
    /** The node exists in both versions, but its label or value differs. */
    Updated,
    /** The node exists in both versions, under a different parent. */
    Moved,
    Unknown,
}

impl Default for ChangeType {
    fn default() -> Self {
        ChangeType::Unchanged
    }
}

/// The bookkeeping shared by every node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: NodeId,
    #[serde(default)]
    pub span: Span,
    #[serde(default)]
    pub change: ChangeType,
    /// The corresponding node in the other version of the file, if any.
    #[serde(default)]
    pub mapped: Option<NodeId>,
}

impl NodeInfo {
    pub fn new(id: NodeId, span: Span, change: ChangeType) -> Self {
        Self {
            id,
            span,
            change,
            mapped: None,
        }
    }
}

pub trait GetNodeId {
    fn node_id(&self) -> NodeId;
}

impl<T> GetNodeId for &T
where
    T: GetNodeId,
{
    fn node_id(&self) -> NodeId {
        (*self).node_id()
    }
}

/// Access to the shared [NodeInfo] of a node.
pub trait Node: GetNodeId {
    fn info(&self) -> &NodeInfo;

    fn span(&self) -> Span {
        self.info().span
    }

    fn change_type(&self) -> ChangeType {
        self.info().change
    }
}

impl<T> Node for &T
where
    T: Node,
{
    fn info(&self) -> &NodeInfo {
        (*self).info()
    }
}

impl<T> GetNodeId for Box<T>
where
    T: ?Sized + GetNodeId,
{
    fn node_id(&self) -> NodeId {
        (**self).node_id()
    }
}

impl<T> Node for Box<T>
where
    T: ?Sized + Node,
{
    fn info(&self) -> &NodeInfo {
        (**self).info()
    }
}

use crate::{expr::Expr, function::Function, ident::Ident, NodeId, NodeInfo};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FnDecl {
    pub ident: Ident,
    pub function: Function,
}

impl crate::GetNodeId for FnDecl {
    fn node_id(&self) -> NodeId {
        self.function.info.id
    }
}

impl crate::Node for FnDecl {
    fn info(&self) -> &NodeInfo {
        &self.function.info
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub kind: VarDeclKind,
    pub decls: Vec<VarDeclarator>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarDeclKind {
    /// `var`
    Var,
    /// `let`
    Let,
    /// `const`
    Const,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VarDeclarator {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub name: Ident,
    /// Initialization expression.
    #[serde(default)]
    pub init: Option<Box<Expr>>,
}

impl_node!(VarDecl, VarDeclarator);

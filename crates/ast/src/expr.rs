#![allow(clippy::vec_box)]
use super::{
    function::Function,
    ident::Ident,
    lit::{Lit, Number, Str},
    operators::{AssignOp, BinaryOp, UnaryOp, UpdateOp},
};
use crate::{GetNodeId, NodeId, NodeInfo};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    This(ThisExpr),

    Array(ArrayLit),

    Object(ObjectLit),

    Fn(FnExpr),

    Unary(UnaryExpr),

    /// `++v`, `--v`, `v++`, `v--`
    Update(UpdateExpr),

    Bin(BinExpr),

    Assign(AssignExpr),

    /// A member expression. `a.b` carries an identifier property, `a[b]` a
    /// computed one.
    Member(MemberExpr),

    /// true ? 'a' : 'b'
    Cond(CondExpr),

    Call(CallExpr),

    /// `new Cat()`
    New(NewExpr),

    Ident(Ident),

    Lit(Lit),

    Paren(ParenExpr),
}

impl_node_enum!(Expr {
    This,
    Array,
    Object,
    Fn,
    Unary,
    Update,
    Bin,
    Assign,
    Member,
    Cond,
    Call,
    New,
    Ident,
    Lit,
    Paren,
});

impl Expr {
    /// Strips any number of enclosing parentheses.
    pub fn unwrap_parens(&self) -> &Expr {
        let mut expr = self;
        while let Expr::Paren(paren) = expr {
            expr = &paren.expr;
        }
        expr
    }

    pub fn as_ident(&self) -> Option<&Ident> {
        match self {
            Expr::Ident(i) => Some(i),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThisExpr {
    #[serde(flatten)]
    pub info: NodeInfo,
}

/// Array literal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrayLit {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub elems: Vec<Expr>,
}

/// Object literal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectLit {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub props: Vec<Property>,
}

/// `key: value` inside an object literal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub key: PropName,
    pub value: Box<Expr>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropName {
    Ident(Ident),
    Str(Str),
    Num(Number),
}

impl_node_enum!(PropName { Ident, Str, Num });

impl PropName {
    /// The property name as a string, the way the runtime would key it.
    pub fn as_key(&self) -> String {
        match self {
            PropName::Ident(i) => i.sym.clone(),
            PropName::Str(s) => s.value.clone(),
            PropName::Num(n) => num_to_key(n.value),
        }
    }
}

/// Formats a number the way it is used as a property key.
pub fn num_to_key(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e21 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Function expression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FnExpr {
    pub ident: Option<Ident>,
    pub function: Function,
}

impl crate::GetNodeId for FnExpr {
    fn node_id(&self) -> NodeId {
        self.function.node_id()
    }
}

impl crate::Node for FnExpr {
    fn info(&self) -> &NodeInfo {
        &self.function.info
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpr {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub op: UnaryOp,
    pub arg: Box<Expr>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateExpr {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub op: UpdateOp,
    pub prefix: bool,
    pub arg: Box<Expr>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BinExpr {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssignExpr {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub op: AssignOp,
    /// Either an identifier or a member expression.
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberExpr {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub obj: Box<Expr>,
    pub prop: MemberProp,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MemberProp {
    Ident(Ident),
    Computed(Box<Expr>),
}

impl MemberProp {
    /// The property name if it is known without evaluation.
    pub fn static_name(&self) -> Option<String> {
        match self {
            MemberProp::Ident(i) => Some(i.sym.clone()),
            MemberProp::Computed(e) => match e.unwrap_parens() {
                Expr::Lit(Lit::Str(s)) => Some(s.value.clone()),
                Expr::Lit(Lit::Num(n)) => Some(num_to_key(n.value)),
                _ => None,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CondExpr {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub test: Box<Expr>,
    pub cons: Box<Expr>,
    pub alt: Box<Expr>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewExpr {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParenExpr {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub expr: Box<Expr>,
}

impl_node!(
    ThisExpr,
    ArrayLit,
    ObjectLit,
    Property,
    UnaryExpr,
    UpdateExpr,
    BinExpr,
    AssignExpr,
    MemberExpr,
    CondExpr,
    CallExpr,
    NewExpr,
    ParenExpr,
);

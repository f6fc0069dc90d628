use crate::{ident::Ident, stmt::BlockStmt, NodeInfo};
use serde::{Deserialize, Serialize};

/// Common parts of function declarations and function expressions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Function {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub params: Vec<Ident>,
    pub body: BlockStmt,
}

impl_node!(Function);

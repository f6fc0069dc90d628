use crate::NodeInfo;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Lit {
    Str(Str),
    Bool(Bool),
    Null(Null),
    Num(Number),
}

impl_node_enum!(Lit { Str, Bool, Null, Num });

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Str {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bool {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub value: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Null {
    #[serde(flatten)]
    pub info: NodeInfo,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Number {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub value: f64,
}

impl_node!(Str, Bool, Null, Number);

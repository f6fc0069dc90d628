use crate::NodeInfo;
use serde::{Deserialize, Serialize};

/// Identifier used as a reference, a binding or a static property name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub sym: String,
}

impl_node!(Ident);

impl Ident {
    pub fn new(info: NodeInfo, sym: impl Into<String>) -> Self {
        Self {
            info,
            sym: sym.into(),
        }
    }
}

/// Implements [crate::GetNodeId] and [crate::Node] for structs carrying an
/// `info: NodeInfo` field.
macro_rules! impl_node {
    ($($ty:ty),* $(,)?) => {
        $(
            impl crate::GetNodeId for $ty {
                #[inline]
                fn node_id(&self) -> crate::NodeId {
                    self.info.id
                }
            }

            impl crate::Node for $ty {
                #[inline]
                fn info(&self) -> &crate::NodeInfo {
                    &self.info
                }
            }
        )*
    };
}

/// Implements [crate::GetNodeId] and [crate::Node] for enums whose variants
/// each wrap exactly one node.
macro_rules! impl_node_enum {
    ($ty:ident { $($variant:ident),* $(,)? }) => {
        impl crate::GetNodeId for $ty {
            fn node_id(&self) -> crate::NodeId {
                match self {
                    $($ty::$variant(n) => crate::GetNodeId::node_id(n),)*
                }
            }
        }

        impl crate::Node for $ty {
            fn info(&self) -> &crate::NodeInfo {
                match self {
                    $($ty::$variant(n) => crate::Node::info(n),)*
                }
            }
        }
    };
}

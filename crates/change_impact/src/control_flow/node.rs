use ast::{Expr, GetNodeId, Node as AstNode, NodeId, Span};
use std::fmt;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};

pub trait CfgNode: Copy + Eq + Hash + Debug {
    fn implicit_return() -> Self;
}

impl CfgNode for Node<'_> {
    fn implicit_return() -> Self {
        Node::ImplicitReturn
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Node<'ast> {
    pub node_id: Option<NodeId>,
    pub kind: NodeKind<'ast>,
}

#[allow(non_upper_case_globals)]
impl Node<'_> {
    pub const ImplicitReturn: Node<'static> = Node {
        node_id: None,
        kind: NodeKind::ImplicitReturn,
    };
}

impl Node<'_> {
    pub fn is_implicit_return(&self) -> bool {
        let r = self.node_id.is_none();
        debug_assert!(!r || matches!(self.kind, NodeKind::ImplicitReturn));
        r
    }

    /// The id of the wrapped AST node. The implicit return has none.
    pub fn id(&self) -> NodeId {
        self.node_id.unwrap_or(NodeId::DUMMY)
    }
}

impl PartialEq<Node<'_>> for Node<'_> {
    fn eq(&self, other: &Node<'_>) -> bool {
        self.node_id == other.node_id
    }
}

impl Eq for Node<'_> {}

impl Hash for Node<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node_id.hash(state);
    }
}

impl<'ast> Node<'ast> {
    pub fn visit_with<V: ecma_visit::Visit<'ast>>(&self, v: &mut V) {
        self.kind.visit_with(v);
    }

    pub fn span(&self) -> Span {
        self.kind.span()
    }

    /// The expressions evaluated when control reaches this node. Nested
    /// statements are not included.
    pub fn exprs(&self) -> Vec<&'ast Expr> {
        match self.kind {
            NodeKind::ExprStmt(n) => vec![&*n.expr],
            NodeKind::VarDecl(n) => n.decls.iter().filter_map(|d| d.init.as_deref()).collect(),
            NodeKind::ReturnStmt(n) => n.arg.as_deref().into_iter().collect(),
            NodeKind::ThrowStmt(n) => vec![&*n.arg],
            NodeKind::IfStmt(n) => vec![&*n.test],
            NodeKind::WhileStmt(n) => vec![&*n.test],
            NodeKind::DoWhileStmt(n) => vec![&*n.test],
            NodeKind::ForStmt(n) => n.test.as_deref().into_iter().collect(),
            NodeKind::Expr(n) => vec![n],
            _ => Vec::new(),
        }
    }
}

macro_rules! make {
    ($($field:ident,)*) => {
        #[derive(Copy, Clone)]
        pub enum NodeKind<'ast> {
            ImplicitReturn,
            $($field(&'ast ::ast::$field),)*
        }

        impl <'ast> fmt::Debug for NodeKind<'ast>  {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                 match self {
                    NodeKind::ImplicitReturn => f.write_str("ImplicitReturn"),
                    $(
                        NodeKind::$field(n) => f.write_fmt(format_args!("({}, {})", stringify!($field), n.node_id())),
                    )*
                }

            }
        }

        $(
            impl<'ast> From<&'ast ::ast::$field> for Node<'ast> {
                fn from(other: &'ast ::ast::$field) -> Node<'ast> {
                    Node {
                        node_id: Some(other.node_id()),
                        kind: NodeKind::$field(other)
                    }
                }
            }
        )*

        impl <'ast> NodeKind<'ast> {
            pub fn visit_with<V: ecma_visit::Visit<'ast>>(&self, v: &mut V) {
                use ecma_visit::VisitWith;
                match self {
                    NodeKind::ImplicitReturn=>{},
                    $(NodeKind::$field(n) => n.visit_with(v),)*
                }
            }

            pub fn span(&self) -> Span {
                match self {
                    NodeKind::ImplicitReturn => Span::DUMMY,
                    $(NodeKind::$field(n) => n.span(),)*
                }
            }
        }
    };
}

make!(
    Script,
    Function,
    ExprStmt,
    VarDecl,
    ReturnStmt,
    ThrowStmt,
    IfStmt,
    WhileStmt,
    DoWhileStmt,
    ForStmt,
    TryStmt,
    CatchClause,
    BreakStmt,
    ContinueStmt,
    EmptyStmt,
    // The init and update parts of a `for` loop.
    Expr,
);

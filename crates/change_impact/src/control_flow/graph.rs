use super::node::CfgNode;
use ast::Expr;
use petgraph::{
    graph::{DiGraph, Neighbors, NodeIndex},
    visit::EdgeRef,
    EdgeDirection::{Incoming, Outgoing},
};
use rustc_hash::FxHashMap;
use std::fmt::Debug;
use std::ops::Index;

/**
 * Control flow graph.
 *
 * @param <N> The instruction type of the control flow graph.
 * @param <E> The edge type of the control flow graph.
 */
pub struct ControlFlowGraph<N: CfgNode, E> {
    pub map: FxHashMap<N, NodeIndex>,
    /**
     * A special node marked by the node value key null to a singleton
     * "return" when control is transferred outside of the current control flow
     * graph.
     */
    pub implicit_return: N,
    pub entry: N,
    pub graph: DiGraph<N, E>,
}

impl<N, E> ControlFlowGraph<N, E>
where
    N: CfgNode,
    E: CfgEdge,
{
    pub fn new(entry: N) -> Self {
        let mut graph = DiGraph::<N, E>::new();
        let implicit_return = N::implicit_return();
        let implicit_return_index = graph.add_node(implicit_return);
        let entry_index = graph.add_node(entry);

        let mut map = FxHashMap::with_capacity_and_hasher(2, Default::default());
        map.insert(implicit_return, implicit_return_index);
        map.insert(entry, entry_index);

        Self {
            implicit_return,
            entry,
            graph,
            map,
        }
    }

    pub fn create_node(&mut self, value: N) -> NodeIndex {
        match self.map.get(&value) {
            Some(index) => *index,
            None => {
                let index = self.graph.add_node(value);

                self.map.insert(value, index);

                index
            }
        }
    }

    /**
     * Connects the two nodes in the control flow graph.
     *
     * @param fromNode Source.
     * @param toNode Destination.
     */
    pub fn create_edge(&mut self, from: N, edge: E, to: N) {
        let from_node = self.create_node(from);
        let to_node = self.create_node(to);
        self.connect_if_not_found(from_node, edge, to_node);
    }

    /**
     * Checks whether two nodes in the graph are connected by the given
     * edge type.
     */
    fn is_connected(&self, n1: NodeIndex, edge: &E, n2: NodeIndex) -> bool {
        self.graph
            .edges_connecting(n1, n2)
            .any(|e| e.weight() == edge)
    }

    /**
     * Connects two nodes in the graph with an edge if such edge does not already
     * exists between the nodes.
     */
    fn connect_if_not_found(&mut self, n1: NodeIndex, edge: E, n2: NodeIndex) {
        if !self.is_connected(n1, &edge, n2) {
            self.graph.add_edge(n1, n2, edge);
        }
    }

    /// Note: neighbor are listed in reverse order of their addition to the graph,
    /// so the most recently added edge's neighbor is listed first.
    pub fn get_directed_succ_nodes(&self, node: N) -> Neighbors<'_, E> {
        self.graph.neighbors_directed(self.map[&node], Outgoing)
    }

    pub fn get_directed_pred_nodes(&self, node: N) -> Neighbors<'_, E> {
        self.graph.neighbors_directed(self.map[&node], Incoming)
    }

    /// The number of edges entering `node`.
    pub fn in_degree(&self, node: N) -> usize {
        self.graph.edges_directed(self.map[&node], Incoming).count()
    }

    /// The edges leaving `node`, with their targets.
    pub fn out_edges(&self, node: N) -> impl Iterator<Item = (&E, N)> + '_ {
        self.graph
            .edges_directed(self.map[&node], Outgoing)
            .map(move |e| (e.weight(), self.graph[e.target()]))
    }
}

impl<N: CfgNode, E> Index<NodeIndex> for ControlFlowGraph<N, E> {
    type Output = N;

    fn index(&self, index: NodeIndex) -> &N {
        &self.graph[index]
    }
}

/// Edge weights of a [ControlFlowGraph].
pub trait CfgEdge: PartialEq + Debug {
    fn branch(&self) -> Branch;
}

/**
 * The edge object for the control flow graph.
 */
#[allow(non_camel_case_types)]
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub enum Branch {
    /** Edge is taken if the condition is true. */
    ON_TRUE,
    /** Edge is taken if the condition is false. */
    ON_FALSE,
    /** Unconditional branch. */
    UNCOND,
    /**
     * Exception-handling code paths: an exception is thrown and falls into a
     * catch or finally block.
     */
    ON_EX,
}

impl CfgEdge for Branch {
    fn branch(&self) -> Branch {
        *self
    }
}

/// The condition an edge is taken under.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeCondition<'ast> {
    pub expr: &'ast Expr,
    /// Whether the edge is taken when `expr` is falsy.
    pub negated: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge<'ast> {
    pub branch: Branch,
    pub condition: Option<EdgeCondition<'ast>>,
    /// Whether the edge closes a loop.
    pub loop_edge: bool,
}

impl<'ast> Edge<'ast> {
    pub fn uncond() -> Self {
        Self {
            branch: Branch::UNCOND,
            condition: None,
            loop_edge: false,
        }
    }

    pub fn on_ex() -> Self {
        Self {
            branch: Branch::ON_EX,
            condition: None,
            loop_edge: false,
        }
    }

    /// The true or false edge out of a branch on `expr`.
    pub fn conditional(expr: &'ast Expr, on_true: bool) -> Self {
        Self {
            branch: if on_true {
                Branch::ON_TRUE
            } else {
                Branch::ON_FALSE
            },
            condition: Some(EdgeCondition {
                expr,
                negated: !on_true,
            }),
            loop_edge: false,
        }
    }
}

impl CfgEdge for Edge<'_> {
    fn branch(&self) -> Branch {
        self.branch
    }
}

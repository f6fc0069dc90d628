use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::ops::Index;

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::EdgeDirection;
use rustc_hash::FxHashMap;

use crate::control_flow::{CfgEdge, CfgNode, ControlFlowGraph, NodePriority};


/// The default number of steps per individual CFG node before we assume the analysis is divergent.
pub const MAX_STEPS_PER_NODE: usize = 20000;

pub struct DataFlowAnalysis<'p, N, E, I, L, J>
where
    N: CfgNode,
    E: CfgEdge,
    I: DataFlowAnalysisInner<N, E, L, J>,
    L: LatticeElement,
    J: FlowJoiner<L, I>,
{
    pub inner: I,

    cfg: &'p ControlFlowGraph<N, E>,

    /// The set of nodes that need to be considered, ordered by their priority
    /// as determined by control flow analysis and data flow direction.
    work_queue: UniqueQueue<'p>,

    node_annotations: FxHashMap<N, LinearFlowState>,

    max_steps_per_node: usize,

    _phantom1: PhantomData<L>,
    _phantom2: PhantomData<J>,
}

impl<'p, N, E, I, L, J> DataFlowAnalysis<'p, N, E, I, L, J>
where
    N: CfgNode,
    E: CfgEdge,
    I: DataFlowAnalysisInner<N, E, L, J>,
    L: LatticeElement,
    J: FlowJoiner<L, I>,
{
    /// Constructs a data flow analysis.
    ///
    /// `analyze` annotates the nodes of `cfg` without any modification of the graph
    /// itself.
    pub fn new(
        inner: I,
        cfg: &'p ControlFlowGraph<N, E>,
        node_priorities: &'p [NodePriority],
        max_steps_per_node: usize,
    ) -> Self {
        Self {
            work_queue: UniqueQueue::new(node_priorities, inner.is_forward()),

            inner,
            cfg,
            node_annotations: FxHashMap::default(),
            max_steps_per_node,

            _phantom1: PhantomData,
            _phantom2: PhantomData,
        }
    }

    /// Finds a fixed-point solution.
    ///
    /// Initially, each node's input and output flow state contains the value given by
    /// `create_initial_estimate_lattice` (with the exception of the entry node of the graph which
    /// takes on the `create_entry_lattice` value). Each node will use the output state of its
    /// predecessor and compute an output state according to the instruction. At that time, any nodes
    /// that depend on the node's newly modified output value will need to recompute their output state
    /// again. Each step will perform a computation at one node until no extra computation will modify
    /// any existing output state any more.
    ///
    /// Returns the offending node if some node is visited more than the step
    /// bound allows.
    pub fn analyze(&mut self) -> Result<(), N> {
        self.initialize();
        while let Some(cur_node_idx) = self.work_queue.pop() {
            let cur_node = self.cfg.graph[cur_node_idx];
            if self.node_annotations[&cur_node].step_count > self.max_steps_per_node {
                return Err(cur_node);
            }
            self.get_flow_state_mut(&cur_node).step_count += 1;

            self.join_inputs(cur_node);
            if self.flow(cur_node) {
                // If there is a change in the current node, we want to grab the list
                // of nodes that this node affects.
                let next_nodes = if self.inner.is_forward() {
                    self.cfg.get_directed_succ_nodes(cur_node)
                } else {
                    self.cfg.get_directed_pred_nodes(cur_node)
                };

                for next_node in next_nodes {
                    let node = self.cfg[next_node];
                    if node != self.cfg.implicit_return {
                        self.work_queue.push(next_node);
                    }
                }
            }
        }
        if self.inner.is_forward() {
            self.join_inputs(self.cfg.implicit_return);
        }
        Ok(())
    }

    pub fn node_annotations(&self) -> &FxHashMap<N, LinearFlowState> {
        &self.node_annotations
    }

    pub fn into_parts(self) -> (I, FxHashMap<N, LinearFlowState>) {
        (self.inner, self.node_annotations)
    }

    /// Initializes the work list and the node annotations.
    fn initialize(&mut self) {
        self.work_queue.clear();
        self.node_annotations.clear();

        for i in self.cfg.graph.node_indices() {
            let node = self.cfg.graph[i];
            let in_ = self.inner.create_initial_estimate_lattice();
            let out = self.inner.create_initial_estimate_lattice();
            self.node_annotations
                .insert(node, LinearFlowState::new(in_, out));
            if node != self.cfg.implicit_return {
                self.work_queue.push(i);
            }
        }
    }

    /// Performs a single flow through a node.
    /// Returns `true` if the flow state differs from the previous state.
    fn flow(&mut self, node: N) -> bool {
        let state = self.node_annotations[&node];
        if self.inner.is_forward() {
            let out_before = state.out;
            let new_out = self.inner.flow_through(node, state.in_);
            self.get_flow_state_mut(&node).out = new_out;
            self.inner[out_before] != self.inner[new_out]
        } else {
            let in_before = state.in_;
            let new_in = self.inner.flow_through(node, state.out);
            self.get_flow_state_mut(&node).in_ = new_in;
            self.inner[in_before] != self.inner[new_in]
        }
    }

    /// Computes the new flow state at a given node's entry by merging the output (input) lattice
    /// of the node's predecessor (successor).
    fn join_inputs(&mut self, node: N) {
        let cfg = self.cfg;
        if self.inner.is_forward() && cfg.entry == node {
            let entry = self.inner.create_entry_lattice();
            self.get_flow_state_mut(&node).in_ = entry;
            return;
        }

        let dir = if self.inner.is_forward() {
            EdgeDirection::Incoming
        } else {
            EdgeDirection::Outgoing
        };
        let mut in_edges = cfg
            .graph
            .edges_directed(cfg.map[&node], dir)
            .map(|e| e.id());

        let result = if let Some(first) = in_edges.next() {
            if let Some(second) = in_edges.next() {
                let mut joiner = self.inner.create_flow_joiner();
                let first = self.get_input_from_edge(first);
                joiner.join_flow(&mut self.inner, first);
                let second = self.get_input_from_edge(second);
                joiner.join_flow(&mut self.inner, second);
                for in_edge in in_edges {
                    let id = self.get_input_from_edge(in_edge);
                    joiner.join_flow(&mut self.inner, id);
                }
                self.inner.add_lattice_element(joiner.finish())
            } else {
                // Only one relevant edge.
                self.get_input_from_edge(first)
            }
        } else {
            // No relevant edges.
            return;
        };

        if self.inner.is_forward() {
            self.get_flow_state_mut(&node).in_ = result;
        } else {
            self.get_flow_state_mut(&node).out = result;
        }
    }

    fn get_input_from_edge(&mut self, edge: EdgeIndex) -> LatticeElementId {
        let cfg = self.cfg;
        let (source, target) = match cfg.graph.edge_endpoints(edge) {
            Some(endpoints) => endpoints,
            None => unreachable!("edge of the graph has no endpoints"),
        };
        if self.inner.is_forward() {
            let node = cfg.graph[source];
            let out = self.node_annotations[&node].out;
            self.inner.flow_through_edge(node, &cfg.graph[edge], out)
        } else {
            let node = cfg.graph[target];
            if node == cfg.implicit_return {
                return self.inner.create_entry_lattice();
            }
            self.node_annotations[&node].in_
        }
    }

    fn get_flow_state_mut(&mut self, node: &N) -> &mut LinearFlowState {
        match self.node_annotations.get_mut(node) {
            Some(state) => state,
            None => unreachable!("all nodes should have had their state initialized"),
        }
    }
}

/// A framework to help writing static program analysis.
///
/// Implementers should specify how a single node changes the state of a program.
/// [DataFlowAnalysis] finds a safe estimate (a fixed-point) for the whole program.
///
/// * Flow Direction: Implement [DataFlowAnalysisInner::is_forward].
/// * Lattice Elements: Implement [LatticeElement].
/// * JOIN Operation: Implement [FlowJoiner::join_flow].
/// * Flow Equations: Implement [DataFlowAnalysisInner::flow_through].
/// * Branching: Optionally implement [DataFlowAnalysisInner::flow_through_edge].
/// * Initial Entry Value: Implement [DataFlowAnalysisInner::create_entry_lattice].
/// * Initial Estimate: Implement [DataFlowAnalysisInner::create_initial_estimate_lattice].
///   By definition this lattice JOIN `x` for any `x` must also be `x`.
///
/// - `N` The control flow graph's node value type.
/// - `E` The control flow graph's edge value type.
/// - `L` Lattice element type.
pub trait DataFlowAnalysisInner<N, E, L, J>: Index<LatticeElementId, Output = L>
where
    N: CfgNode,
    E: CfgEdge,
    L: LatticeElement,
    J: FlowJoiner<L, Self>,
    Self: Sized,
{
    fn add_lattice_element(&mut self, element: L) -> LatticeElementId;
    /// Checks whether the analysis is a forward flow analysis or backward flow analysis.
    fn is_forward(&self) -> bool;
    /// Gets the incoming state of the entry node.
    fn create_entry_lattice(&mut self) -> LatticeElementId;
    /// Gets the state of the initial estimation at each node.
    fn create_initial_estimate_lattice(&mut self) -> LatticeElementId;
    /// Gets a new joiner for an analysis step.
    ///
    /// The joiner is invoked once for each input edge and then the final joined result is
    /// retrieved. No joiner will be created for a single input.
    fn create_flow_joiner(&self) -> J;
    /// Computes the output state for a given node given its input state.
    fn flow_through(&mut self, node: N, input: LatticeElementId) -> LatticeElementId;
    /// Computes the state carried along `edge` out of `source`, given the
    /// output state of `source`. Only consulted by forward analyses.
    fn flow_through_edge(
        &mut self,
        _source: N,
        _edge: &E,
        output: LatticeElementId,
    ) -> LatticeElementId {
        output
    }
}

/// A reducer that joins flow states from distinct input states into a single input state.
pub trait FlowJoiner<L, I> {
    fn join_flow(&mut self, inner: &mut I, input: LatticeElementId);

    fn finish(self) -> L;
}

pub trait LatticeElement: PartialEq {}

/// The in and out states of a node.
#[derive(Debug, Clone, Copy)]
pub struct LinearFlowState {
    pub step_count: usize,
    pub in_: LatticeElementId,
    pub out: LatticeElementId,
}

impl LinearFlowState {
    pub fn new(in_: LatticeElementId, out: LatticeElementId) -> Self {
        Self {
            step_count: 0,
            in_,
            out,
        }
    }
}

/// Index of a lattice element owned by a [DataFlowAnalysisInner].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LatticeElementId(u32);

impl LatticeElementId {
    pub fn new(index: usize) -> Self {
        debug_assert!(index < u32::MAX as usize);
        LatticeElementId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub struct PrioritizedNode(NodePriority, NodeIndex);

impl PartialEq for PrioritizedNode {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for PrioritizedNode {}

impl std::cmp::Ord for PrioritizedNode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl std::cmp::PartialOrd for PrioritizedNode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug)]
pub struct UniqueQueue<'p> {
    inner: BTreeSet<PrioritizedNode>,
    priorities: &'p [NodePriority],
    forwards: bool,
}

impl<'p> UniqueQueue<'p> {
    pub fn new(priorities: &'p [NodePriority], forwards: bool) -> Self {
        Self {
            inner: BTreeSet::new(),
            priorities,
            forwards,
        }
    }

    pub fn pop(&mut self) -> Option<NodeIndex> {
        if self.forwards {
            // Forwards analyses visit nodes with lower priorities first.
            self.inner.pop_first().map(|p| p.1)
        } else {
            // Backwards analyses visit nodes with higher priorities first.
            self.inner.pop_last().map(|p| p.1)
        }
    }

    pub fn push(&mut self, node: NodeIndex) {
        self.inner
            .insert(PrioritizedNode(self.priorities[node.index()], node));
    }

    pub fn clear(&mut self) {
        self.inner.clear()
    }
}

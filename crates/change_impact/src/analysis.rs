//! The interprocedural driver.
//!
//! Each function body is solved with the intraprocedural [DataFlowAnalysis]
//! over its CFG. Calls are analyzed eagerly: the callee is solved to a
//! fixpoint from the state at the call site and the caller continues from its
//! exit. Results are memoized per function and calling context, keyed on the
//! entry state, so a callee is only re-analyzed when it is entered with a
//! state it has not seen yet.

use crate::{
    checker::Checker,
    config::AnalysisOptions,
    control_flow::{CfgMap, ControlFlowGraph, Edge, Node},
    data_flow_analysis::{
        DataFlowAnalysis, DataFlowAnalysisInner, FlowJoiner, LatticeElement, LatticeElementId,
        LinearFlowState,
    },
    error::{AnalysisError, Result},
    facts::FactBase,
    interpreter::{self, Interpreter, Invocation},
    lattice::{BValue, Change, Criterion, CriterionType, Dependencies},
    node_table::NodeTable,
    object::Closure,
    state::{Control, ControlCall, State},
    store::MergeMode,
};
use ast::{NodeId, Script};
use rustc_hash::{FxHashMap, FxHashSet};
use std::ops::Index;
use tracing::{debug, trace};

#[cfg(test)]
mod tests;

/// Analyzes one version of a script and returns everything the annotation
/// visitors need.
pub fn analyze_script(script: &Script, options: &AnalysisOptions) -> Result<FactBase> {
    if script.body.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    let count = script.node_count();
    if count > options.max_nodes {
        return Err(AnalysisError::TooLarge {
            nodes: count,
            max: options.max_nodes,
        });
    }
    let nodes = NodeTable::build(script);
    let cfgs = CfgMap::build(script);

    let mut ctx = AnalysisContext::new(&cfgs, &nodes, options);
    let entry = interpreter::script_state(&mut ctx, script);
    if let Some(exit) = ctx.analyze_function(script.info.id, entry)? {
        ctx.analyze_uncalled(exit)?;
    }
    debug!(
        functions = ctx.analyzed.len(),
        summaries = ctx.summaries.len(),
        "analyzed script"
    );
    Ok(ctx.facts)
}

/// The memoized analysis of a function in one calling context.
struct Summary {
    entry: State,
    /// `None` if the function never returns.
    exit: Option<State>,
}

/// Everything shared by the analyses of the functions of one script.
pub(crate) struct AnalysisContext<'c, 'ast> {
    pub(crate) cfgs: &'c CfgMap<'ast>,
    pub(crate) nodes: &'c NodeTable<'ast>,
    pub(crate) options: &'c AnalysisOptions,
    pub(crate) facts: FactBase,
    summaries: FxHashMap<(NodeId, NodeId), Summary>,
    /// Functions and contexts whose analysis is in progress.
    call_stack: Vec<(NodeId, NodeId)>,
    /// Every function analyzed in at least one context.
    analyzed: FxHashSet<NodeId>,
}

impl<'c, 'ast> AnalysisContext<'c, 'ast> {
    pub(crate) fn new(
        cfgs: &'c CfgMap<'ast>,
        nodes: &'c NodeTable<'ast>,
        options: &'c AnalysisOptions,
    ) -> Self {
        Self {
            cfgs,
            nodes,
            options,
            facts: FactBase::default(),
            summaries: FxHashMap::default(),
            call_stack: Vec::new(),
            analyzed: FxHashSet::default(),
        }
    }

    /// Solves `function` from `entry` and returns the state at its implicit
    /// return, or `None` if no path reaches it.
    ///
    /// A function that is already being analyzed in the same context returns
    /// an unknown value without being entered again.
    pub(crate) fn analyze_function(
        &mut self,
        function: NodeId,
        entry: State,
    ) -> Result<Option<State>> {
        let key = (function, entry.trace.context);
        self.analyzed.insert(function);
        if self.call_stack.contains(&key) {
            trace!(%function, context = %key.1, "recursive call");
            let mut exit = entry;
            exit.scratch.return_value = BValue::top(Change::Unchanged, Dependencies::bottom());
            return Ok(Some(exit));
        }

        let entry = match self.summaries.get(&key) {
            Some(summary) => {
                let joined = summary.entry.join(&entry);
                if joined.equivalent_entry(&summary.entry) {
                    return Ok(summary.exit.clone());
                }
                joined
            }
            None => entry,
        };

        self.call_stack.push(key);
        let exit = self.run_fixpoint(function, entry.clone());
        self.call_stack.pop();
        let exit = exit?;
        self.summaries.insert(
            key,
            Summary {
                entry,
                exit: exit.clone(),
            },
        );
        Ok(exit)
    }

    fn run_fixpoint(&mut self, function: NodeId, entry: State) -> Result<Option<State>> {
        let cfgs = self.cfgs;
        let result = cfgs
            .get(function)
            .ok_or(AnalysisError::MissingFunction(function))?;
        let max_steps = self.options.max_steps_per_node;
        trace!(%function, context = %entry.trace.context, "solving function");

        let inner = FunctionAnalysis {
            ctx: self,
            cfg: &result.cfg,
            entry,
            lattice_elements: Vec::new(),
            error: None,
        };
        let mut dfa: DataFlowAnalysis<
            Node<'ast>,
            Edge<'ast>,
            FunctionAnalysis<'_, 'c, 'ast>,
            FlowState,
            FlowStateJoiner,
        > = DataFlowAnalysis::new(inner, &result.cfg, &result.node_priorities, max_steps);
        let outcome = dfa.analyze();
        let (mut inner, annotations) = dfa.into_parts();

        if let Some(err) = inner.error.take() {
            return Err(err);
        }
        if let Err(node) = outcome {
            return Err(AnalysisError::Divergence {
                function,
                node: node.node_id,
            });
        }
        Ok(inner.finish(&annotations))
    }

    /// Analyzes the functions that are reachable from `exit`, or from the exit
    /// of a function analyzed here, but were never called.
    ///
    /// They run with no arguments and an unchanged calling context, so their
    /// bodies are still annotated.
    fn analyze_uncalled(&mut self, exit: State) -> Result<()> {
        let mut worklist = vec![exit];
        while let Some(state) = worklist.pop() {
            for closure in reachable_closures(&state) {
                if self.analyzed.contains(&closure.function) {
                    continue;
                }
                let function = self
                    .nodes
                    .function(closure.function)
                    .ok_or(AnalysisError::MissingFunction(closure.function))?;
                debug!(function = %closure.function, "analyzing uncalled function");
                let mut entry = interpreter::function_entry(
                    &state,
                    &mut self.facts,
                    Invocation {
                        closure: &closure,
                        function,
                        args: &[],
                        self_addr: state.self_addr.clone(),
                        control: Control::new(ControlCall::unchanged()),
                        context: closure.function,
                    },
                )?;
                entry.checkers = self
                    .options
                    .checkers
                    .iter()
                    .map(|&k| Checker::new(k))
                    .collect();
                if let Some(exit) = self.analyze_function(closure.function, entry)? {
                    worklist.push(exit);
                }
            }
        }
        Ok(())
    }
}

fn reachable_closures(state: &State) -> Vec<Closure> {
    let mut closures: Vec<Closure> = state
        .reachable()
        .iter()
        .filter_map(|addr| state.store.get_obj(addr))
        .filter_map(|obj| obj.internal.closure.clone())
        .collect();
    closures.sort_by_key(|c| c.function);
    closures
}

/// The dependencies every statement reached under `control` has.
fn control_dependencies(control: &Control) -> Dependencies {
    let mut deps: Dependencies = control
        .condition
        .conditions
        .iter()
        .map(|c| Criterion::new(CriterionType::ConditionChange, c.id))
        .collect();
    deps.join_in(&control.call.deps);
    deps
}

/// A state, or bottom for program points no path reaches yet.
#[derive(Debug, Clone, PartialEq)]
struct FlowState(Option<State>);

impl LatticeElement for FlowState {}

struct FlowStateJoiner(Option<State>);

impl<'a, 'c, 'ast> FlowJoiner<FlowState, FunctionAnalysis<'a, 'c, 'ast>> for FlowStateJoiner {
    fn join_flow(&mut self, inner: &mut FunctionAnalysis<'a, 'c, 'ast>, input: LatticeElementId) {
        let input = match &inner[input].0 {
            Some(state) => state,
            None => return,
        };
        self.0 = Some(match &self.0 {
            Some(state) => state.join(input),
            None => input.clone(),
        });
    }

    fn finish(self) -> FlowState {
        FlowState(self.0)
    }
}

/// The intraprocedural analysis of one function in one context.
struct FunctionAnalysis<'a, 'c, 'ast> {
    ctx: &'a mut AnalysisContext<'c, 'ast>,
    cfg: &'c ControlFlowGraph<Node<'ast>, Edge<'ast>>,
    entry: State,
    lattice_elements: Vec<FlowState>,
    /// The first fault. Once set, every transfer is the identity so the
    /// driver winds down quickly.
    error: Option<AnalysisError>,
}

impl<'a, 'c, 'ast> FunctionAnalysis<'a, 'c, 'ast> {
    /// Records the control facts of every reached statement and returns the
    /// exit state.
    fn finish(self, annotations: &FxHashMap<Node<'ast>, LinearFlowState>) -> Option<State> {
        let mut exit = None;
        for (node, flow) in annotations {
            let state = match &self.lattice_elements[flow.in_.index()].0 {
                Some(state) => state,
                None => continue,
            };
            if node.is_implicit_return() {
                exit = Some(state.clone());
                continue;
            }
            if *node == self.cfg.entry {
                continue;
            }
            self.ctx.facts.record_control(node.id(), &state.control);
            self.ctx
                .facts
                .add_dependencies(node.id(), &control_dependencies(&state.control));
        }
        exit
    }
}

impl<'a, 'c, 'ast> Index<LatticeElementId> for FunctionAnalysis<'a, 'c, 'ast> {
    type Output = FlowState;

    fn index(&self, index: LatticeElementId) -> &FlowState {
        &self.lattice_elements[index.index()]
    }
}

impl<'a, 'c, 'ast> DataFlowAnalysisInner<Node<'ast>, Edge<'ast>, FlowState, FlowStateJoiner>
    for FunctionAnalysis<'a, 'c, 'ast>
{
    fn add_lattice_element(&mut self, element: FlowState) -> LatticeElementId {
        self.lattice_elements.push(element);
        LatticeElementId::new(self.lattice_elements.len() - 1)
    }

    fn is_forward(&self) -> bool {
        true
    }

    fn create_entry_lattice(&mut self) -> LatticeElementId {
        let entry = FlowState(Some(self.entry.clone()));
        self.add_lattice_element(entry)
    }

    fn create_initial_estimate_lattice(&mut self) -> LatticeElementId {
        self.add_lattice_element(FlowState(None))
    }

    fn create_flow_joiner(&self) -> FlowStateJoiner {
        FlowStateJoiner(None)
    }

    fn flow_through(&mut self, node: Node<'ast>, input: LatticeElementId) -> LatticeElementId {
        if self.error.is_some() {
            return input;
        }
        let mut state = match &self[input].0 {
            Some(state) => state.clone(),
            None => return input,
        };
        state.trace = state.trace.update(node.id());
        let mode = if self.cfg.in_degree(node) > 1 {
            MergeMode::Weak
        } else {
            MergeMode::Strong
        };
        let result = Interpreter::new(&mut *self.ctx, &mut state, mode).interpret_node(node);
        match result {
            Ok(()) => self.add_lattice_element(FlowState(Some(state))),
            Err(err) => {
                self.error = Some(err);
                input
            }
        }
    }

    fn flow_through_edge(
        &mut self,
        source: Node<'ast>,
        edge: &Edge<'ast>,
        output: LatticeElementId,
    ) -> LatticeElementId {
        if edge.condition.is_none() || self.error.is_some() {
            return output;
        }
        let mut state = match &self[output].0 {
            Some(state) => state.clone(),
            None => return output,
        };
        state.trace = state.trace.update(source.id());
        let result =
            Interpreter::new(&mut *self.ctx, &mut state, MergeMode::Strong).interpret_edge(edge);
        match result {
            Ok(()) => self.add_lattice_element(FlowState(Some(state))),
            Err(err) => {
                self.error = Some(err);
                output
            }
        }
    }
}

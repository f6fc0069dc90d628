use super::graph::{ControlFlowGraph, Edge};
use super::node::{CfgNode, Node};
use ast::{Function, NodeId, Script, Stmt, VarDeclOrExpr};
use ecma_visit::{Visit, VisitWith};
use petgraph::graph::NodeIndex;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::collections::BinaryHeap;
use tracing::trace;

pub type NodePriority = usize;

pub struct ControlFlowAnalysisResult<N: CfgNode, E> {
    pub cfg: ControlFlowGraph<N, E>,
    /// Indexed by the [NodeIndex] of each node in `cfg`.
    pub node_priorities: Vec<NodePriority>,
}

#[derive(Clone, Copy)]
pub enum ControlFlowRoot<'ast> {
    Script(&'ast Script),
    Function(&'ast Function),
}

impl<'ast> From<ControlFlowRoot<'ast>> for Node<'ast> {
    fn from(root: ControlFlowRoot<'ast>) -> Node<'ast> {
        match root {
            ControlFlowRoot::Script(n) => Node::from(n),
            ControlFlowRoot::Function(n) => Node::from(n),
        }
    }
}

/// An edge whose target has not been lowered yet.
type Pending<'ast> = (Node<'ast>, Edge<'ast>);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Jump {
    Break,
    Continue,
    Return,
}

enum Frame<'ast> {
    Loop {
        breaks: Vec<Pending<'ast>>,
        continues: Vec<Pending<'ast>>,
    },
    /// A `try` block. Statements that may throw inside it are collected and
    /// connected to the handler once it is lowered.
    Try { throwers: Vec<Node<'ast>> },
    /// The region guarded by a `finally` block. Jumps leaving it are routed
    /// through the finalizer.
    Finally {
        throwers: Vec<Node<'ast>>,
        jumps: Vec<(Jump, Vec<Pending<'ast>>)>,
    },
}

/// Lowers one script or function body to a [ControlFlowGraph].
///
/// Nested functions are not traversed; each function gets its own graph (see
/// [CfgMap]). Function declarations are hoisted by the interpreter and have no
/// node of their own.
pub struct ControlFlowAnalysis<'ast> {
    cfg: ControlFlowGraph<Node<'ast>, Edge<'ast>>,
    ast_position: FxHashMap<Node<'ast>, usize>,
    node_priorities: FxHashMap<Node<'ast>, NodePriority>,
    ast_position_counter: usize,
    priority_counter: usize,
    frames: Vec<Frame<'ast>>,
}

impl<'ast> ControlFlowAnalysis<'ast> {
    pub fn analyze(
        root: ControlFlowRoot<'ast>,
    ) -> ControlFlowAnalysisResult<Node<'ast>, Edge<'ast>> {
        let entry = Node::from(root);
        let mut cfa = Self {
            cfg: ControlFlowGraph::new(entry),
            ast_position: FxHashMap::default(),
            node_priorities: FxHashMap::default(),
            ast_position_counter: 0,
            priority_counter: 0,
            frames: Vec::new(),
        };
        cfa.prioritize_node(entry);

        let body: &'ast [Stmt] = match root {
            ControlFlowRoot::Script(s) => &s.body,
            ControlFlowRoot::Function(f) => &f.body.stmts,
        };
        let exits = cfa.lower_stmts(body, vec![(entry, Edge::uncond())]);
        let implicit_return = cfa.cfg.implicit_return;
        cfa.connect(exits, implicit_return);

        cfa.prioritize_node(implicit_return); // the implicit return is last.

        debug_assert_eq!(cfa.ast_position.len(), cfa.cfg.graph.node_count());

        // Now, generate the priority of nodes by doing a depth-first
        // search on the CFG.
        cfa.prioritize_from_entry_node(entry);

        // At this point, all reachable nodes have been given a priority, but
        // unreachable nodes have not been given a priority. Put them last.
        for &candidate in cfa.cfg.graph.node_weights() {
            if candidate == implicit_return {
                continue;
            }
            if let Entry::Vacant(entry) = cfa.node_priorities.entry(candidate) {
                entry.insert(cfa.priority_counter);
                cfa.priority_counter += 1;
            }
        }

        // Again, the implicit return node is always last.
        cfa.node_priorities
            .insert(implicit_return, cfa.priority_counter);

        debug_assert_eq!(cfa.node_priorities.len(), cfa.cfg.graph.node_count());

        let mut node_priorities = vec![0; cfa.cfg.graph.node_count()];
        for (node, priority) in &cfa.node_priorities {
            node_priorities[cfa.cfg.map[node].index()] = *priority;
        }

        trace!(
            root = %entry.id(),
            nodes = cfa.cfg.graph.node_count(),
            edges = cfa.cfg.graph.edge_count(),
            "built control flow graph"
        );

        ControlFlowAnalysisResult {
            cfg: cfa.cfg,
            node_priorities,
        }
    }

    /**
     * Given an entry node, find all the nodes reachable from that node
     * and prioritize them.
     */
    fn prioritize_from_entry_node(&mut self, entry: Node<'ast>) {
        #[derive(Debug)]
        struct PrioritizedNode<'ast>(usize, Node<'ast>);

        impl PartialEq for PrioritizedNode<'_> {
            fn eq(&self, other: &Self) -> bool {
                self.0 == other.0
            }
        }

        impl Eq for PrioritizedNode<'_> {}

        impl std::cmp::Ord for PrioritizedNode<'_> {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                // Reversed so lower priorities are visited first.
                other.0.cmp(&self.0)
            }
        }

        impl std::cmp::PartialOrd for PrioritizedNode<'_> {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        let implicit_return = self.cfg.implicit_return;
        let mut worklist = BinaryHeap::with_capacity(10);
        worklist.push(PrioritizedNode(self.ast_position[&entry], entry));

        while let Some(PrioritizedNode(_, current)) = worklist.pop() {
            if current == implicit_return || self.node_priorities.contains_key(&current) {
                continue;
            }

            self.node_priorities.insert(current, self.priority_counter);
            self.priority_counter += 1;

            for n in self.cfg.get_directed_succ_nodes(current) {
                let node = self.cfg[n];
                worklist.push(PrioritizedNode(self.ast_position[&node], node));
            }
        }
    }

    fn prioritize_node(&mut self, node: Node<'ast>) {
        debug_assert!(
            !self.ast_position.contains_key(&node),
            "node has already been prioritized {:#?}",
            node
        );
        self.ast_position.insert(node, self.ast_position_counter);
        self.ast_position_counter += 1;
    }

    /// Creates `node`, connects the pending edges to it, and registers it with
    /// the innermost exception handler when evaluating it may throw.
    fn add_node(&mut self, node: Node<'ast>, preds: Vec<Pending<'ast>>, may_throw: bool) {
        self.cfg.create_node(node);
        self.prioritize_node(node);
        self.connect(preds, node);
        if may_throw {
            self.register_protected(node);
        }
    }

    fn connect(&mut self, preds: Vec<Pending<'ast>>, target: Node<'ast>) {
        for (source, edge) in preds {
            self.cfg.create_edge(source, edge, target);
        }
    }

    fn connect_loop(&mut self, preds: Vec<Pending<'ast>>, head: Node<'ast>) {
        for (source, mut edge) in preds {
            edge.loop_edge = true;
            self.cfg.create_edge(source, edge, head);
        }
    }

    fn register_protected(&mut self, node: Node<'ast>) {
        for frame in self.frames.iter_mut().rev() {
            match frame {
                Frame::Try { throwers } | Frame::Finally { throwers, .. } => {
                    throwers.push(node);
                    return;
                }
                Frame::Loop { .. } => {}
            }
        }
    }

    /// An explicit throw. Outside of any handler control leaves the function.
    fn throw_from(&mut self, node: Node<'ast>) {
        let protected = self
            .frames
            .iter()
            .any(|f| matches!(f, Frame::Try { .. } | Frame::Finally { .. }));
        if protected {
            self.register_protected(node);
        } else {
            let implicit_return = self.cfg.implicit_return;
            self.cfg.create_edge(node, Edge::on_ex(), implicit_return);
        }
    }

    fn jump(&mut self, jump: Jump, pending: Vec<Pending<'ast>>) {
        for frame in self.frames.iter_mut().rev() {
            match frame {
                Frame::Finally { jumps, .. } => {
                    jumps.push((jump, pending));
                    return;
                }
                Frame::Loop { breaks, .. } if jump == Jump::Break => {
                    breaks.extend(pending);
                    return;
                }
                Frame::Loop { continues, .. } if jump == Jump::Continue => {
                    continues.extend(pending);
                    return;
                }
                _ => {}
            }
        }
        // Returns, and jumps without an enclosing target, leave the function.
        let implicit_return = self.cfg.implicit_return;
        self.connect(pending, implicit_return);
    }

    fn pop_loop(&mut self) -> (Vec<Pending<'ast>>, Vec<Pending<'ast>>) {
        match self.frames.pop() {
            Some(Frame::Loop { breaks, continues }) => (breaks, continues),
            _ => unreachable!("unbalanced loop frame"),
        }
    }

    fn lower_stmts(
        &mut self,
        stmts: &'ast [Stmt],
        mut preds: Vec<Pending<'ast>>,
    ) -> Vec<Pending<'ast>> {
        for stmt in stmts {
            preds = self.lower_stmt(stmt, preds);
        }
        preds
    }

    /// Lowers `stmt`, entered through `preds`, and returns the edges leaving it
    /// normally.
    fn lower_stmt(&mut self, stmt: &'ast Stmt, preds: Vec<Pending<'ast>>) -> Vec<Pending<'ast>> {
        match stmt {
            Stmt::Block(b) => self.lower_stmts(&b.stmts, preds),
            // Hoisted.
            Stmt::Fn(_) => preds,
            Stmt::Empty(n) => self.simple(Node::from(n), preds, false),
            Stmt::Expr(n) => self.simple(Node::from(n), preds, true),
            Stmt::Var(n) => self.simple(Node::from(n), preds, true),
            Stmt::Return(n) => {
                let node = Node::from(n);
                self.add_node(node, preds, n.arg.is_some());
                self.jump(Jump::Return, vec![(node, Edge::uncond())]);
                Vec::new()
            }
            Stmt::Break(n) => {
                let node = Node::from(n);
                self.add_node(node, preds, false);
                self.jump(Jump::Break, vec![(node, Edge::uncond())]);
                Vec::new()
            }
            Stmt::Continue(n) => {
                let node = Node::from(n);
                self.add_node(node, preds, false);
                self.jump(Jump::Continue, vec![(node, Edge::uncond())]);
                Vec::new()
            }
            Stmt::Throw(n) => {
                let node = Node::from(n);
                self.add_node(node, preds, false);
                self.throw_from(node);
                Vec::new()
            }
            Stmt::If(n) => {
                let node = Node::from(n);
                self.add_node(node, preds, true);
                let mut exits = self.lower_stmt(&n.cons, vec![(node, Edge::conditional(&n.test, true))]);
                let on_false = vec![(node, Edge::conditional(&n.test, false))];
                match &n.alt {
                    Some(alt) => exits.extend(self.lower_stmt(alt, on_false)),
                    None => exits.extend(on_false),
                }
                exits
            }
            Stmt::While(n) => {
                let head = Node::from(n);
                self.add_node(head, preds, true);
                self.frames.push(Frame::Loop {
                    breaks: Vec::new(),
                    continues: Vec::new(),
                });
                let mut back =
                    self.lower_stmt(&n.body, vec![(head, Edge::conditional(&n.test, true))]);
                let (mut breaks, continues) = self.pop_loop();
                back.extend(continues);
                self.connect_loop(back, head);
                breaks.push((head, Edge::conditional(&n.test, false)));
                breaks
            }
            Stmt::DoWhile(n) => {
                let cond = Node::from(n);
                // The first node created from here on is the entry of the body
                // (or the condition itself when the body is empty).
                let body_entry = NodeIndex::new(self.cfg.graph.node_count());
                self.frames.push(Frame::Loop {
                    breaks: Vec::new(),
                    continues: Vec::new(),
                });
                let mut to_cond = self.lower_stmt(&n.body, preds);
                let (mut breaks, continues) = self.pop_loop();
                to_cond.extend(continues);
                self.add_node(cond, to_cond, true);
                let body_entry = self.cfg[body_entry];
                self.connect_loop(vec![(cond, Edge::conditional(&n.test, true))], body_entry);
                breaks.push((cond, Edge::conditional(&n.test, false)));
                breaks
            }
            Stmt::For(n) => {
                let mut preds = preds;
                if let Some(init) = &n.init {
                    let init = match init {
                        VarDeclOrExpr::VarDecl(d) => Node::from(d),
                        VarDeclOrExpr::Expr(e) => Node::from(&**e),
                    };
                    preds = self.simple(init, preds, true);
                }
                let head = Node::from(n);
                self.add_node(head, preds, n.test.is_some());
                let enter = match &n.test {
                    Some(test) => Edge::conditional(test, true),
                    None => Edge::uncond(),
                };
                self.frames.push(Frame::Loop {
                    breaks: Vec::new(),
                    continues: Vec::new(),
                });
                let mut back = self.lower_stmt(&n.body, vec![(head, enter)]);
                let (mut breaks, continues) = self.pop_loop();
                back.extend(continues);
                if let Some(update) = &n.update {
                    back = self.simple(Node::from(&**update), back, true);
                }
                self.connect_loop(back, head);
                if let Some(test) = &n.test {
                    breaks.push((head, Edge::conditional(test, false)));
                }
                breaks
            }
            Stmt::Try(n) => {
                let try_node = Node::from(n);
                self.add_node(try_node, preds, false);
                if n.finalizer.is_some() {
                    self.frames.push(Frame::Finally {
                        throwers: Vec::new(),
                        jumps: Vec::new(),
                    });
                }

                self.frames.push(Frame::Try {
                    throwers: Vec::new(),
                });
                let mut exits = self.lower_stmts(&n.block.stmts, vec![(try_node, Edge::uncond())]);
                let throwers = match self.frames.pop() {
                    Some(Frame::Try { throwers }) => throwers,
                    _ => unreachable!("unbalanced try frame"),
                };

                let mut uncaught = Vec::new();
                match &n.handler {
                    Some(handler) => {
                        let catch = Node::from(handler);
                        self.add_node(catch, Vec::new(), false);
                        for thrower in throwers {
                            self.cfg.create_edge(thrower, Edge::on_ex(), catch);
                        }
                        exits.extend(
                            self.lower_stmts(&handler.body.stmts, vec![(catch, Edge::uncond())]),
                        );
                    }
                    None => uncaught = throwers,
                }

                let finalizer = match &n.finalizer {
                    Some(finalizer) => finalizer,
                    None => {
                        for thrower in uncaught {
                            self.throw_from(thrower);
                        }
                        return exits;
                    }
                };

                let (finally_throwers, jumps) = match self.frames.pop() {
                    Some(Frame::Finally { throwers, jumps }) => (throwers, jumps),
                    _ => unreachable!("unbalanced finally frame"),
                };
                uncaught.extend(finally_throwers);

                let completes_normally = !exits.is_empty();
                let mut preds = exits;
                preds.extend(uncaught.iter().map(|&t| (t, Edge::on_ex())));
                let mut pending_jumps: Vec<Jump> = Vec::new();
                for (jump, pending) in jumps {
                    if !pending_jumps.contains(&jump) {
                        pending_jumps.push(jump);
                    }
                    preds.extend(pending);
                }

                let finally_exits = self.lower_stmts(&finalizer.stmts, preds);

                // Control resumes wherever it was headed when the finalizer
                // was entered.
                for jump in pending_jumps {
                    self.jump(jump, finally_exits.clone());
                }
                if !uncaught.is_empty() {
                    for (source, _) in &finally_exits {
                        self.throw_from(*source);
                    }
                }
                if completes_normally {
                    finally_exits
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn simple(
        &mut self,
        node: Node<'ast>,
        preds: Vec<Pending<'ast>>,
        may_throw: bool,
    ) -> Vec<Pending<'ast>> {
        self.add_node(node, preds, may_throw);
        vec![(node, Edge::uncond())]
    }
}

/// The control flow graphs of a script and every function in it, keyed by the
/// id of the script or function node.
pub struct CfgMap<'ast> {
    cfgs: FxHashMap<NodeId, ControlFlowAnalysisResult<Node<'ast>, Edge<'ast>>>,
}

impl<'ast> CfgMap<'ast> {
    pub fn build(script: &'ast Script) -> Self {
        let mut collector = FunctionCollector::default();
        script.visit_with(&mut collector);

        let mut cfgs = FxHashMap::with_capacity_and_hasher(
            collector.functions.len() + 1,
            Default::default(),
        );
        cfgs.insert(
            script.info.id,
            ControlFlowAnalysis::analyze(ControlFlowRoot::Script(script)),
        );
        for function in collector.functions {
            cfgs.insert(
                function.info.id,
                ControlFlowAnalysis::analyze(ControlFlowRoot::Function(function)),
            );
        }
        Self { cfgs }
    }

    pub fn get(&self, id: NodeId) -> Option<&ControlFlowAnalysisResult<Node<'ast>, Edge<'ast>>> {
        self.cfgs.get(&id)
    }

    pub fn len(&self) -> usize {
        self.cfgs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cfgs.is_empty()
    }
}

#[derive(Default)]
struct FunctionCollector<'ast> {
    functions: Vec<&'ast Function>,
}

impl<'ast> Visit<'ast> for FunctionCollector<'ast> {
    fn visit_function(&mut self, n: &'ast Function) {
        self.functions.push(n);
        n.visit_children_with(self);
    }
}

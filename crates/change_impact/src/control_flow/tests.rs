#![allow(non_snake_case)]

use super::analysis::{CfgMap, ControlFlowAnalysis, ControlFlowRoot};
use super::graph::{Branch, ControlFlowGraph, Edge};
use super::node::{Node, NodeKind};
use ast::builder::AstBuilder;
use ast::{BinaryOp, Function, GetNodeId, Script, Stmt};
use petgraph::visit::EdgeRef;
use pretty_assertions::assert_eq;

macro_rules! make {
    ($($field:ident,)*) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub enum Token {
            ImplicitReturn,
            $($field,)*
        }

        impl <'a> From<Node<'a>> for Token {
            fn from(other: Node<'a>) -> Token {
                match other.kind {
                    NodeKind::ImplicitReturn => Token::ImplicitReturn,
                    $(NodeKind::$field(_) => Token::$field,)*
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
    Expr,
);

type Cfg<'ast> = ControlFlowGraph<Node<'ast>, Edge<'ast>>;

/// Gets all the edges of the graph that flow from a node with the first
/// token to a node with the second token.
fn get_all_edges<'ast>(cfg: &Cfg<'ast>, start_token: Token, end_token: Token) -> Vec<Edge<'ast>> {
    cfg.graph
        .edge_references()
        .filter(|e| {
            Token::from(cfg.graph[e.source()]) == start_token
                && Token::from(cfg.graph[e.target()]) == end_token
        })
        .map(|e| *e.weight())
        .collect()
}

fn get_all_edges_of_type<'ast>(
    cfg: &Cfg<'ast>,
    start_token: Token,
    end_token: Token,
    edge_type: Branch,
) -> Vec<Edge<'ast>> {
    get_all_edges(cfg, start_token, end_token)
        .into_iter()
        .filter(|e| e.branch == edge_type)
        .collect()
}

/// Assert that there exists a control flow edge of the given type from some
/// node with the first token to some node with the second token.
fn assert_edge(cfg: &Cfg<'_>, start_token: Token, end_token: Token, edge_type: Branch) {
    assert!(
        !get_all_edges_of_type(cfg, start_token, end_token, edge_type).is_empty(),
        "No {:?} edge found between {:?} and {:?}",
        edge_type,
        start_token,
        end_token
    );
}

fn assert_no_edge(cfg: &Cfg<'_>, start_token: Token, end_token: Token) {
    assert!(get_all_edges(cfg, start_token, end_token).is_empty());
}

/// Assert that there exists a control flow edge of the given type from some
/// node with the first token to the return node.
fn assert_return_edge(cfg: &Cfg<'_>, start_token: Token, edge_type: Branch) {
    assert_edge(cfg, start_token, Token::ImplicitReturn, edge_type);
}

fn create_cfg(script: &Script) -> Cfg<'_> {
    ControlFlowAnalysis::analyze(ControlFlowRoot::Script(script)).cfg
}

fn first_function(script: &Script) -> &Function {
    match script.body.first() {
        Some(Stmt::Fn(f)) => &f.function,
        _ => unreachable!(),
    }
}

#[test]
fn testSimpleStatementsInScript() {
    // var a; a = a;
    let b = AstBuilder::new();
    let script = b.script(vec![
        b.var("a", None),
        b.expr_stmt(b.assign(b.ident_expr("a"), b.ident_expr("a"))),
    ]);
    let cfg = create_cfg(&script);
    assert_edge(&cfg, Token::Script, Token::VarDecl, Branch::UNCOND);
    assert_edge(&cfg, Token::VarDecl, Token::ExprStmt, Branch::UNCOND);
    assert_return_edge(&cfg, Token::ExprStmt, Branch::UNCOND);
    assert_eq!(cfg.graph.node_count(), 4);
}

#[test]
fn testSimpleIf() {
    // if (x) { a(); } else { b(); } c();
    let b = AstBuilder::new();
    let script = b.script(vec![
        b.if_stmt(
            b.ident_expr("x"),
            vec![b.expr_stmt(b.call(b.ident_expr("a"), vec![]))],
            Some(vec![b.expr_stmt(b.call(b.ident_expr("b"), vec![]))]),
        ),
        b.var("c", None),
    ]);
    let cfg = create_cfg(&script);
    let on_true = get_all_edges_of_type(&cfg, Token::IfStmt, Token::ExprStmt, Branch::ON_TRUE);
    let on_false = get_all_edges_of_type(&cfg, Token::IfStmt, Token::ExprStmt, Branch::ON_FALSE);
    assert_eq!(on_true.len(), 1);
    assert_eq!(on_false.len(), 1);
    assert!(!on_true[0].condition.unwrap().negated);
    assert!(on_false[0].condition.unwrap().negated);
    assert_eq!(get_all_edges(&cfg, Token::ExprStmt, Token::VarDecl).len(), 2);
}

#[test]
fn testIfWithoutElse() {
    // if (x) { a(); } var c;
    let b = AstBuilder::new();
    let script = b.script(vec![
        b.if_stmt(
            b.ident_expr("x"),
            vec![b.expr_stmt(b.call(b.ident_expr("a"), vec![]))],
            None,
        ),
        b.var("c", None),
    ]);
    let cfg = create_cfg(&script);
    assert_edge(&cfg, Token::IfStmt, Token::ExprStmt, Branch::ON_TRUE);
    assert_edge(&cfg, Token::IfStmt, Token::VarDecl, Branch::ON_FALSE);
    assert_edge(&cfg, Token::ExprStmt, Token::VarDecl, Branch::UNCOND);
}

#[test]
fn testWhileLoopEdge() {
    // while (x) { a(); }
    let b = AstBuilder::new();
    let script = b.script(vec![b.while_stmt(
        b.ident_expr("x"),
        vec![b.expr_stmt(b.call(b.ident_expr("a"), vec![]))],
    )]);
    let cfg = create_cfg(&script);
    assert_edge(&cfg, Token::WhileStmt, Token::ExprStmt, Branch::ON_TRUE);
    let back = get_all_edges(&cfg, Token::ExprStmt, Token::WhileStmt);
    assert_eq!(back.len(), 1);
    assert!(back[0].loop_edge);
    assert_return_edge(&cfg, Token::WhileStmt, Branch::ON_FALSE);
    assert!(!get_all_edges(&cfg, Token::WhileStmt, Token::ExprStmt)[0].loop_edge);
}

#[test]
fn testDoWhile() {
    // do { a(); } while (x); var c;
    let b = AstBuilder::new();
    let script = b.script(vec![
        b.do_while(
            vec![b.expr_stmt(b.call(b.ident_expr("a"), vec![]))],
            b.ident_expr("x"),
        ),
        b.var("c", None),
    ]);
    let cfg = create_cfg(&script);
    assert_edge(&cfg, Token::Script, Token::ExprStmt, Branch::UNCOND);
    assert_edge(&cfg, Token::ExprStmt, Token::DoWhileStmt, Branch::UNCOND);
    let back = get_all_edges_of_type(&cfg, Token::DoWhileStmt, Token::ExprStmt, Branch::ON_TRUE);
    assert_eq!(back.len(), 1);
    assert!(back[0].loop_edge);
    assert_edge(&cfg, Token::DoWhileStmt, Token::VarDecl, Branch::ON_FALSE);
}

#[test]
fn testForLoop() {
    // for (i = 0; i < n; i++) { a(); }
    let b = AstBuilder::new();
    let init = ast::VarDeclOrExpr::Expr(Box::new(b.assign(b.ident_expr("i"), b.num(0.0))));
    let script = b.script(vec![b.for_stmt(
        Some(init),
        Some(b.bin(BinaryOp::Lt, b.ident_expr("i"), b.ident_expr("n"))),
        Some(b.update(ast::UpdateOp::PlusPlus, false, b.ident_expr("i"))),
        vec![b.expr_stmt(b.call(b.ident_expr("a"), vec![]))],
    )]);
    let cfg = create_cfg(&script);
    assert_edge(&cfg, Token::Script, Token::Expr, Branch::UNCOND);
    assert_edge(&cfg, Token::Expr, Token::ForStmt, Branch::UNCOND);
    assert_edge(&cfg, Token::ForStmt, Token::ExprStmt, Branch::ON_TRUE);
    assert_edge(&cfg, Token::ExprStmt, Token::Expr, Branch::UNCOND);
    assert_return_edge(&cfg, Token::ForStmt, Branch::ON_FALSE);
    let loop_edges: Vec<_> = get_all_edges(&cfg, Token::Expr, Token::ForStmt)
        .into_iter()
        .filter(|e| e.loop_edge)
        .collect();
    assert_eq!(loop_edges.len(), 1);
}

#[test]
fn testBreakingWhile() {
    // while (x) { if (y) { break; } continue; } var c;
    let b = AstBuilder::new();
    let script = b.script(vec![
        b.while_stmt(
            b.ident_expr("x"),
            vec![b.if_stmt(b.ident_expr("y"), vec![b.brk()], None), b.cont()],
        ),
        b.var("c", None),
    ]);
    let cfg = create_cfg(&script);
    assert_edge(&cfg, Token::BreakStmt, Token::VarDecl, Branch::UNCOND);
    assert_edge(&cfg, Token::IfStmt, Token::ContinueStmt, Branch::ON_FALSE);
    let back = get_all_edges(&cfg, Token::ContinueStmt, Token::WhileStmt);
    assert_eq!(back.len(), 1);
    assert!(back[0].loop_edge);
    assert_edge(&cfg, Token::WhileStmt, Token::VarDecl, Branch::ON_FALSE);
}

#[test]
fn testReturnInFunction() {
    // function f() { return 1; a(); }
    let b = AstBuilder::new();
    let script = b.script(vec![b.fn_decl(
        "f",
        &[],
        vec![
            b.ret(Some(b.num(1.0))),
            b.expr_stmt(b.call(b.ident_expr("a"), vec![])),
        ],
    )]);
    let function = first_function(&script);
    let cfa = ControlFlowAnalysis::analyze(ControlFlowRoot::Function(function));
    let cfg = &cfa.cfg;
    assert_edge(cfg, Token::Function, Token::ReturnStmt, Branch::UNCOND);
    assert_return_edge(cfg, Token::ReturnStmt, Branch::UNCOND);
    assert_no_edge(cfg, Token::ReturnStmt, Token::ExprStmt);
    // The unreachable call still flows to the implicit return.
    assert_return_edge(cfg, Token::ExprStmt, Branch::UNCOND);
}

#[test]
fn testThrowOutsideTry() {
    // throw e;
    let b = AstBuilder::new();
    let script = b.script(vec![b.throw(b.ident_expr("e"))]);
    let cfg = create_cfg(&script);
    assert_return_edge(&cfg, Token::ThrowStmt, Branch::ON_EX);
}

#[test]
fn testSimpleCatch() {
    // try { a(); } catch (e) { b(); } var c;
    let b = AstBuilder::new();
    let script = b.script(vec![
        b.try_stmt(
            vec![b.expr_stmt(b.call(b.ident_expr("a"), vec![]))],
            Some((Some("e"), vec![b.var("b", None)])),
            None,
        ),
        b.empty(),
    ]);
    let cfg = create_cfg(&script);
    assert_edge(&cfg, Token::TryStmt, Token::ExprStmt, Branch::UNCOND);
    assert_edge(&cfg, Token::ExprStmt, Token::CatchClause, Branch::ON_EX);
    assert_edge(&cfg, Token::CatchClause, Token::VarDecl, Branch::UNCOND);
    assert_edge(&cfg, Token::ExprStmt, Token::EmptyStmt, Branch::UNCOND);
    assert_edge(&cfg, Token::VarDecl, Token::EmptyStmt, Branch::UNCOND);
}

#[test]
fn testThrowInCatchBlock() {
    // try { throw ''; } catch (e) { throw e; }
    let b = AstBuilder::new();
    let script = b.script(vec![b.try_stmt(
        vec![b.throw(b.str(""))],
        Some((Some("e"), vec![b.throw(b.ident_expr("e"))])),
        None,
    )]);
    let cfg = create_cfg(&script);
    assert_edge(&cfg, Token::ThrowStmt, Token::CatchClause, Branch::ON_EX);
    assert_return_edge(&cfg, Token::ThrowStmt, Branch::ON_EX);
}

#[test]
fn testReturnThroughFinally() {
    // function f() { try { return x; } finally { a(); } }
    let b = AstBuilder::new();
    let script = b.script(vec![b.fn_decl(
        "f",
        &[],
        vec![b.try_stmt(
            vec![b.ret(Some(b.ident_expr("x")))],
            None,
            Some(vec![b.expr_stmt(b.call(b.ident_expr("a"), vec![]))]),
        )],
    )]);
    let function = first_function(&script);
    let cfa = ControlFlowAnalysis::analyze(ControlFlowRoot::Function(function));
    let cfg = &cfa.cfg;
    assert_edge(cfg, Token::ReturnStmt, Token::ExprStmt, Branch::UNCOND);
    assert_edge(cfg, Token::ReturnStmt, Token::ExprStmt, Branch::ON_EX);
    assert_no_edge(cfg, Token::ReturnStmt, Token::ImplicitReturn);
    assert_return_edge(cfg, Token::ExprStmt, Branch::UNCOND);
    assert_return_edge(cfg, Token::ExprStmt, Branch::ON_EX);
}

#[test]
fn testBreakThroughFinally() {
    // while (x) { try { break; } finally { a(); } } var c;
    let b = AstBuilder::new();
    let script = b.script(vec![
        b.while_stmt(
            b.ident_expr("x"),
            vec![b.try_stmt(
                vec![b.brk()],
                None,
                Some(vec![b.expr_stmt(b.call(b.ident_expr("a"), vec![]))]),
            )],
        ),
        b.var("c", None),
    ]);
    let cfg = create_cfg(&script);
    assert_edge(&cfg, Token::BreakStmt, Token::ExprStmt, Branch::UNCOND);
    assert_edge(&cfg, Token::ExprStmt, Token::VarDecl, Branch::UNCOND);
    // The try block never completes normally, so the finalizer does not loop.
    assert_no_edge(&cfg, Token::ExprStmt, Token::WhileStmt);
}

#[test]
fn testFunctionDeclarationsHaveNoNode() {
    // function f() {} var c;
    let b = AstBuilder::new();
    let script = b.script(vec![b.fn_decl("f", &[], vec![]), b.var("c", None)]);
    let cfg = create_cfg(&script);
    assert_edge(&cfg, Token::Script, Token::VarDecl, Branch::UNCOND);
    assert_eq!(cfg.graph.node_count(), 3);
}

#[test]
fn testPriorities() {
    // if (x) { a(); } var c;
    let b = AstBuilder::new();
    let script = b.script(vec![
        b.if_stmt(
            b.ident_expr("x"),
            vec![b.expr_stmt(b.call(b.ident_expr("a"), vec![]))],
            None,
        ),
        b.var("c", None),
    ]);
    let cfa = ControlFlowAnalysis::analyze(ControlFlowRoot::Script(&script));
    let priority = |token: Token| {
        let index = cfa
            .cfg
            .graph
            .node_indices()
            .find(|&i| Token::from(cfa.cfg.graph[i]) == token)
            .unwrap();
        cfa.node_priorities[index.index()]
    };
    assert_eq!(priority(Token::Script), 0);
    assert!(priority(Token::IfStmt) < priority(Token::ExprStmt));
    assert!(priority(Token::ExprStmt) < priority(Token::VarDecl));
    assert_eq!(priority(Token::ImplicitReturn), 4);
}

#[test]
fn testCfgMapContainsNestedFunctions() {
    // function f() { var g = function () {}; }
    let b = AstBuilder::new();
    let script = b.script(vec![b.fn_decl(
        "f",
        &[],
        vec![b.var("g", Some(b.fn_expr(None, &[], vec![])))],
    )]);
    let cfgs = CfgMap::build(&script);
    assert_eq!(cfgs.len(), 3);
    let f = first_function(&script);
    assert!(cfgs.get(script.node_id()).is_some());
    assert!(cfgs.get(f.info.id).is_some());
    // The script graph holds nothing but its entry and the implicit return.
    assert_eq!(cfgs.get(script.node_id()).unwrap().cfg.graph.node_count(), 2);
}

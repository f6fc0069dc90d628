use super::*;
use ast::{builder::AstBuilder, BinaryOp, Expr, GetNodeId, MemberProp, Stmt};
use pretty_assertions::assert_eq;

fn analyze(script: &Script) -> FactBase {
    match analyze_script(script, &AnalysisOptions::default()) {
        Ok(facts) => facts,
        Err(err) => panic!("analysis failed: {}", err),
    }
}

fn has_criterion(facts: &FactBase, kind: CriterionType) -> bool {
    facts.criteria().any(|c| c.kind == kind)
}

fn depends_on(facts: &FactBase, id: NodeId, c: Criterion) -> bool {
    facts.dependencies_of(id).map_or(false, |deps| deps.contains(&c))
}

/// `var fs = require('fs');`
fn require_fs(b: &AstBuilder) -> (Stmt, NodeId) {
    let call = b.call(b.ident_expr("require"), vec![b.str("fs")]);
    let id = call.node_id();
    (b.var("fs", Some(call)), id)
}

/// `fs.<method>(p, ...rest)`, with the id of the method name.
fn fs_call(b: &AstBuilder, method: &str, rest: Vec<Expr>) -> (Expr, NodeId, NodeId) {
    let callee = b.member(b.ident_expr("fs"), method);
    let prop = match &callee {
        Expr::Member(m) => match &m.prop {
            MemberProp::Ident(i) => i.info.id,
            MemberProp::Computed(_) => unreachable!(),
        },
        _ => unreachable!(),
    };
    let mut args = vec![b.ident_expr("p")];
    args.extend(rest);
    let call = b.call(callee, args);
    let id = call.node_id();
    (call, id, prop)
}

#[test]
fn test_empty_script_is_rejected() {
    let b = AstBuilder::new();
    let script = b.script(vec![]);
    assert_eq!(
        analyze_script(&script, &AnalysisOptions::default()).err(),
        Some(AnalysisError::EmptyInput)
    );
}

#[test]
fn test_oversized_script_is_rejected() {
    let b = AstBuilder::new();
    let script = b.script(vec![
        b.var("a", Some(b.num(1.0))),
        b.var("b", Some(b.ident_expr("a"))),
    ]);
    let options = AnalysisOptions {
        max_nodes: 3,
        ..AnalysisOptions::default()
    };
    match analyze_script(&script, &options) {
        Err(AnalysisError::TooLarge { nodes, max }) => {
            assert_eq!(nodes, script.node_count());
            assert_eq!(max, 3);
        }
        other => panic!("expected the size guard to fire, got {:?}", other.err()),
    }
}

#[test]
fn test_inserted_operand_changes_sum_but_not_operand() {
    // y = x;  ->  y = x + 0;
    let old = {
        let b = AstBuilder::new();
        let x = b.ident_expr("x");
        let x_id = x.node_id();
        let script = b.script(vec![b.var("x", Some(b.num(1.0))), b.var("y", Some(x))]);
        (analyze(&script), x_id)
    };
    assert_eq!(old.0.value_change(old.1), Change::Unchanged);

    let b = AstBuilder::new();
    let x = b.ident_expr("x");
    let x_id = x.node_id();
    let zero = b.inserted(|| b.num(0.0));
    let sum = b.inserted(|| b.bin(BinaryOp::Add, x, zero));
    let sum_id = sum.node_id();
    let script = b.script(vec![b.var("x", Some(b.num(1.0))), b.var("y", Some(sum))]);
    let facts = analyze(&script);

    assert_eq!(facts.value_change(x_id), Change::Unchanged);
    assert_eq!(facts.value_change(sum_id), Change::Changed);
    assert!(facts
        .criteria()
        .any(|c| *c == Criterion::new(CriterionType::ValueChange, sum_id)));
}

#[test]
fn test_unprotected_read_file_sync_is_flagged() {
    let b = AstBuilder::new();
    let (require, require_id) = require_fs(&b);
    let (call, call_id, prop_id) = b.inserted(|| fs_call(&b, "readFileSync", vec![]));
    let script = b.script(vec![require, b.inserted(|| b.expr_stmt(call))]);
    let facts = analyze(&script);

    let api = Criterion::new(CriterionType::SyncErrorApi, require_id);
    let function = Criterion::new(CriterionType::SyncErrorFunction, prop_id);
    assert!(facts.criteria().any(|c| *c == api));
    assert!(facts.criteria().any(|c| *c == function));
    assert!(depends_on(&facts, call_id, api));
    assert!(depends_on(&facts, call_id, function));
}

#[test]
fn test_read_file_sync_in_try_is_not_flagged() {
    let b = AstBuilder::new();
    let (require, _) = require_fs(&b);
    let guarded = b.inserted(|| {
        let (call, _, _) = fs_call(&b, "readFileSync", vec![]);
        b.try_stmt(vec![b.expr_stmt(call)], Some((Some("e"), vec![])), None)
    });
    let script = b.script(vec![require, guarded]);
    let facts = analyze(&script);

    assert!(!has_criterion(&facts, CriterionType::SyncErrorApi));
    assert!(!has_criterion(&facts, CriterionType::SyncErrorFunction));
}

#[test]
fn test_unchanged_read_file_sync_is_not_flagged() {
    let b = AstBuilder::new();
    let (require, _) = require_fs(&b);
    let (call, _, _) = fs_call(&b, "readFileSync", vec![]);
    let script = b.script(vec![require, b.expr_stmt(call)]);
    let facts = analyze(&script);

    assert!(!has_criterion(&facts, CriterionType::SyncErrorApi));
}

#[test]
fn test_loop_with_unknown_call_stabilizes() {
    // var x = 0; while (c) { x = f(x); }
    let b = AstBuilder::new();
    let arg = b.ident_expr("x");
    let arg_id = arg.node_id();
    let call = b.inserted(|| b.call(b.ident_expr("f"), vec![arg]));
    let body = vec![b.expr_stmt(b.assign(b.ident_expr("x"), call))];
    let script = b.script(vec![
        b.var("x", Some(b.num(0.0))),
        b.while_stmt(b.ident_expr("c"), body),
    ]);
    let facts = analyze(&script);

    // The first iteration reads the unchanged initializer, later ones the
    // changed call result.
    assert_eq!(facts.value_change(arg_id), Change::Top);

    // The loop head is revisited only a few times before the states settle.
    let options = AnalysisOptions {
        max_steps_per_node: 3,
        ..AnalysisOptions::default()
    };
    match analyze_script(&script, &options) {
        Ok(bounded) => assert_eq!(bounded.value_change(arg_id), Change::Top),
        Err(err) => panic!("loop did not settle within 3 steps: {}", err),
    }
}

#[test]
fn test_callee_overwrite_replaces_caller_binding() {
    // var x = 1; function f() { x = 'a'; } f(); var y = x;
    let b = AstBuilder::new();
    let overwrite = b.expr_stmt(b.assign(b.ident_expr("x"), b.inserted(|| b.str("a"))));
    let f = b.fn_decl("f", &[], vec![overwrite]);
    let read = b.ident_expr("x");
    let read_id = read.node_id();
    let script = b.script(vec![
        b.var("x", Some(b.num(1.0))),
        f,
        b.expr_stmt(b.call(b.ident_expr("f"), vec![])),
        b.var("y", Some(read)),
    ]);
    let facts = analyze(&script);

    assert_eq!(facts.value_change(read_id), Change::Changed);
}

#[test]
fn test_step_bound_reports_divergence() {
    let b = AstBuilder::new();
    let update = b.assign(
        b.ident_expr("i"),
        b.bin(BinaryOp::Add, b.ident_expr("i"), b.num(1.0)),
    );
    let script = b.script(vec![
        b.var("i", Some(b.num(0.0))),
        b.while_stmt(b.ident_expr("c"), vec![b.expr_stmt(update)]),
    ]);
    let options = AnalysisOptions {
        max_steps_per_node: 0,
        ..AnalysisOptions::default()
    };
    match analyze_script(&script, &options) {
        Err(AnalysisError::Divergence { function, .. }) => assert_eq!(function, script.info.id),
        other => panic!("expected divergence, got {:?}", other.err()),
    }
}

fn read_file_with_callback(checked: bool) -> (FactBase, NodeId, NodeId) {
    let b = AstBuilder::new();
    let (require, _) = require_fs(&b);
    let (stmt, use_id, data_id) = b.inserted(|| {
        let use_data = b.expr_stmt(b.call(b.ident_expr("use"), vec![b.ident_expr("data")]));
        let use_id = use_data.node_id();
        let mut body = Vec::new();
        if checked {
            body.push(b.if_stmt(b.ident_expr("err"), vec![b.ret(None)], None));
        }
        body.push(use_data);
        let err_id = b.peek_id();
        let callback = b.fn_expr(None, &["err", "data"], body);
        let (call, _, _) = fs_call(&b, "readFile", vec![callback]);
        (b.expr_stmt(call), use_id, NodeId(err_id.0 + 1))
    });
    let script = b.script(vec![require, stmt]);
    (analyze(&script), use_id, data_id)
}

#[test]
fn test_unchecked_callback_error_is_flagged() {
    let (facts, use_id, data_id) = read_file_with_callback(false);
    assert!(depends_on(
        &facts,
        use_id,
        Criterion::new(CriterionType::AsyncErrorVparam, data_id)
    ));
    assert!(has_criterion(&facts, CriterionType::AsyncErrorCallSite));
    assert!(has_criterion(&facts, CriterionType::AsyncErrorEparam));
}

#[test]
fn test_checked_callback_error_is_not_flagged() {
    let (facts, use_id, data_id) = read_file_with_callback(true);
    assert!(!depends_on(
        &facts,
        use_id,
        Criterion::new(CriterionType::AsyncErrorVparam, data_id)
    ));
    assert!(!has_criterion(&facts, CriterionType::AsyncErrorVparam));
}

#[test]
fn test_call_returns_callee_value() {
    // function id(a) { return a; } var y = id(s);  with `s` inserted
    let b = AstBuilder::new();
    let f = b.fn_decl("id", &["a"], vec![b.ret(Some(b.ident_expr("a")))]);
    let arg = b.inserted(|| b.str("s"));
    let call = b.call(b.ident_expr("id"), vec![arg]);
    let call_id = call.node_id();
    let script = b.script(vec![f, b.var("y", Some(call))]);
    let facts = analyze(&script);

    assert_eq!(facts.value_change(call_id), Change::Changed);
    assert!(!facts.is_changed_call(call_id));
}

#[test]
fn test_recursion_terminates() {
    let b = AstBuilder::new();
    let recurse = b.call(b.ident_expr("f"), vec![b.ident_expr("n")]);
    let f = b.fn_decl("f", &["n"], vec![b.ret(Some(recurse))]);
    let script = b.script(vec![
        f,
        b.expr_stmt(b.call(b.ident_expr("f"), vec![b.num(1.0)])),
    ]);
    analyze(&script);
}

#[test]
fn test_uncalled_functions_are_analyzed() {
    let b = AstBuilder::new();
    let inner = b.var("z", Some(b.ident_expr("a")));
    let inner_id = inner.node_id();
    let script = b.script(vec![b.fn_decl("g", &["a"], vec![inner])]);
    let facts = analyze(&script);

    assert!(facts.control(inner_id).is_some());
}

#[test]
fn test_statements_under_changed_condition_depend_on_it() {
    let b = AstBuilder::new();
    let test = b.inserted(|| b.ident_expr("flag"));
    let test_id = test.node_id();
    let then = b.expr_stmt(b.call(b.ident_expr("run"), vec![]));
    let then_id = then.node_id();
    let after = b.expr_stmt(b.call(b.ident_expr("done"), vec![]));
    let after_id = after.node_id();
    let script = b.script(vec![b.if_stmt(test, vec![then], None), after]);
    let facts = analyze(&script);

    let condition = Criterion::new(CriterionType::ConditionChange, test_id);
    assert!(facts.is_changed_condition(test_id));
    assert!(depends_on(&facts, then_id, condition));
    // Both branches reach the statement after the `if`.
    assert!(!depends_on(&facts, after_id, condition));
}

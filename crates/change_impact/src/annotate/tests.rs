use super::*;
use crate::{analysis::analyze_script, config::AnalysisOptions};
use ast::{builder::AstBuilder, BinaryOp, Expr, GetNodeId, Node};
use pretty_assertions::assert_eq;

fn run(script: &Script) -> Vec<Annotation> {
    match analyze_script(script, &AnalysisOptions::default()) {
        Ok(facts) => annotate(script, &facts),
        Err(err) => panic!("analysis failed: {}", err),
    }
}

fn labels_at(annotations: &[Annotation], span: Span) -> Vec<&str> {
    annotations
        .iter()
        .filter(|a| a.line == span.line && a.offset == span.offset && a.len == span.len)
        .map(|a| a.label.as_str())
        .collect()
}

fn has(annotations: &[Annotation], label: &str, span: Span) -> bool {
    labels_at(annotations, span).contains(&label)
}

#[test]
fn test_plus_with_new_operand_is_a_value_definition() {
    let old = {
        let b = AstBuilder::new();
        let script = b.script(vec![
            b.var("x", Some(b.num(1.0))),
            b.var("y", Some(b.ident_expr("x"))),
        ]);
        run(&script)
    };
    assert!(old.iter().all(|a| a.label != VAL_DEF));

    let b = AstBuilder::new();
    let x = b.ident_expr("x");
    let x_span = x.span();
    let zero = b.inserted(|| b.num(0.0));
    let sum = b.inserted(|| b.bin(BinaryOp::Add, x, zero));
    let sum_span = sum.span();
    let script = b.script(vec![b.var("x", Some(b.num(1.0))), b.var("y", Some(sum))]);
    let annotations = run(&script);

    assert!(has(&annotations, VAL_DEF, sum_span));
    assert!(!has(&annotations, VAL_USE, x_span));
}

#[test]
fn test_new_object_literal_marks_both_braces() {
    let b = AstBuilder::new();
    let mut obj = b.inserted(|| b.object(vec![("a", b.num(1.0))]));
    if let Expr::Object(o) = &mut obj {
        o.info.span = Span::new(1, 100, 10);
    }
    let script = b.script(vec![b.var("o", Some(obj))]);
    let annotations = run(&script);

    assert!(has(&annotations, VAL_DEF, Span::new(1, 100, 1)));
    assert!(has(&annotations, VAL_DEF, Span::new(1, 109, 1)));
}

#[test]
fn test_new_binding_is_marked_at_declaration_and_use() {
    let b = AstBuilder::new();
    let decl = b.inserted(|| b.var("a", Some(b.num(1.0))));
    let name_span = match &decl {
        ast::Stmt::Var(v) => v.decls[0].name.span(),
        _ => unreachable!(),
    };
    let read = b.ident_expr("a");
    let read_span = read.span();
    let script = b.script(vec![decl, b.expr_stmt(b.call(b.ident_expr("log"), vec![read]))]);
    let annotations = run(&script);

    assert!(has(&annotations, ENV_DEF, name_span));
    assert!(has(&annotations, ENV_USE, read_span));
    assert!(has(&annotations, VAL_USE, read_span));
}

#[test]
fn test_changed_condition_and_guarded_statement() {
    let b = AstBuilder::new();
    let test = b.inserted(|| b.ident_expr("flag"));
    let test_span = test.span();
    let then = b.expr_stmt(b.call(b.ident_expr("run"), vec![]));
    let then_span = then.span();
    let after = b.expr_stmt(b.call(b.ident_expr("done"), vec![]));
    let after_span = after.span();
    let script = b.script(vec![b.if_stmt(test, vec![then], None), after]);
    let annotations = run(&script);

    assert!(has(&annotations, CON_DEF, test_span));
    assert!(has(&annotations, CON_USE, then_span));
    assert!(!has(&annotations, CON_USE, after_span));
}

#[test]
fn test_new_call_marks_target_and_callee_body() {
    let b = AstBuilder::new();
    let inner = b.expr_stmt(b.call(b.ident_expr("work"), vec![]));
    let inner_span = inner.span();
    let f = b.fn_decl("f", &[], vec![inner]);
    let callee = b.inserted(|| b.ident_expr("f"));
    let callee_span = callee.span();
    let call = b.inserted(|| b.call(callee, vec![]));
    let script = b.script(vec![f, b.expr_stmt(call)]);
    let annotations = run(&script);

    assert!(has(&annotations, CALL_DEF, callee_span));
    assert!(has(&annotations, CALL_USE, inner_span));
}

#[test]
fn test_sync_error_labels() {
    let b = AstBuilder::new();
    let require = b.call(b.ident_expr("require"), vec![b.str("fs")]);
    let require_span = require.span();
    let require_id = require.node_id();
    let stmt = b.inserted(|| {
        b.expr_stmt(b.call(
            b.member(b.ident_expr("fs"), "readFileSync"),
            vec![b.ident_expr("p")],
        ))
    });
    let call_span = match &stmt {
        ast::Stmt::Expr(s) => s.expr.span(),
        _ => unreachable!(),
    };
    let script = b.script(vec![b.var("fs", Some(require)), stmt]);
    let annotations = run(&script);

    let crit = annotations
        .iter()
        .find(|a| a.label == "SYNC_ERROR_API_CRIT")
        .map(|a| (a.offset, a.dependency_ids.clone()));
    assert_eq!(crit, Some((require_span.offset, vec![require_id.as_u32()])));
    assert!(has(&annotations, "SYNC_ERROR_API_DEP", call_span));
    assert!(has(&annotations, "SYNC_ERROR_FUNCTION_DEP", call_span));
}

#[test]
fn test_annotations_are_sorted_and_unique() {
    let b = AstBuilder::new();
    let script = b.inserted(|| {
        b.script(vec![
            b.var("a", Some(b.array(vec![b.num(1.0), b.num(2.0)]))),
            b.expr_stmt(b.assign(b.ident_expr("a"), b.ident_expr("a"))),
        ])
    });
    let annotations = run(&script);

    let mut sorted = annotations.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(annotations, sorted);
}

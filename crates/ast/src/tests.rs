use crate::{builder::AstBuilder, BinaryOp, ChangeType, Expr, GetNodeId, Node, NodeId, Stmt};
use pretty_assertions::assert_eq;

#[test]
fn test_builder_allocates_children_first() {
    let b = AstBuilder::new();
    let e = b.bin(BinaryOp::Add, b.ident_expr("x"), b.num(0.0));
    match &e {
        Expr::Bin(bin) => {
            assert_eq!(bin.left.node_id(), NodeId(0));
            assert_eq!(bin.right.node_id(), NodeId(1));
            assert_eq!(bin.info.id, NodeId(2));
        }
        _ => panic!("expected a binary expression"),
    }
}

#[test]
fn test_with_change_is_scoped() {
    let b = AstBuilder::new();
    let inserted = b.inserted(|| b.num(1.0));
    let plain = b.num(2.0);
    assert_eq!(inserted.change_type(), ChangeType::Inserted);
    assert_eq!(plain.change_type(), ChangeType::Unchanged);
}

#[test]
fn test_node_count() {
    let b = AstBuilder::new();
    // y = x + 0;
    let script = b.script(vec![b.expr_stmt(b.assign(
        b.ident_expr("y"),
        b.bin(BinaryOp::Add, b.ident_expr("x"), b.num(0.0)),
    ))]);
    // script, stmt, assign, y, bin, x, 0
    assert_eq!(script.node_count(), 7);
}

#[test]
fn test_node_count_function() {
    let b = AstBuilder::new();
    let script = b.script(vec![b.fn_decl(
        "f",
        &["a", "b"],
        vec![b.ret(Some(b.ident_expr("a")))],
    )]);
    // script, decl, function, 2 params, body, return, a
    assert_eq!(script.node_count(), 8);
}

#[test]
fn test_json_round_trip() {
    let b = AstBuilder::new();
    let script = b.script(vec![
        b.var("x", Some(b.str("a"))),
        b.newline_then(|| {
            b.if_stmt(
                b.ident_expr("x"),
                vec![b.expr_stmt(b.call(b.ident_expr("f"), vec![]))],
                None,
            )
        }),
    ]);
    let json = serde_json::to_string(&script).unwrap();
    let back: crate::Script = serde_json::from_str(&json).unwrap();
    assert_eq!(script, back);
    match &back.body[1] {
        Stmt::If(i) => assert_eq!(i.info.span.line, 2),
        _ => panic!("expected an if statement"),
    }
}

#[test]
fn test_deserialize_defaults() {
    let json = r#"{"id": 3, "sym": "foo"}"#;
    let ident: crate::Ident = serde_json::from_str(json).unwrap();
    assert_eq!(ident.node_id(), NodeId(3));
    assert_eq!(ident.change_type(), ChangeType::Unchanged);
    assert_eq!(ident.info.mapped, None);
}

#[test]
fn test_num_to_key() {
    assert_eq!(crate::num_to_key(1.0), "1");
    assert_eq!(crate::num_to_key(-3.0), "-3");
    assert_eq!(crate::num_to_key(1.5), "1.5");
}

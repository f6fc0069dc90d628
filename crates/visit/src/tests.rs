use crate::{Visit, VisitWith};
use ast::{builder::AstBuilder, BinaryOp, Function, Ident};
use pretty_assertions::assert_eq;

#[derive(Default)]
struct IdentCollector {
    names: Vec<String>,
}

impl<'ast> Visit<'ast> for IdentCollector {
    fn visit_ident(&mut self, n: &'ast Ident) {
        self.names.push(n.sym.clone());
    }
}

#[test]
fn test_visits_in_source_order() {
    let b = AstBuilder::new();
    let script = b.script(vec![
        b.var("a", Some(b.bin(BinaryOp::Add, b.ident_expr("x"), b.ident_expr("y")))),
        b.expr_stmt(b.call(b.member(b.ident_expr("o"), "p"), vec![b.ident_expr("a")])),
    ]);
    let mut v = IdentCollector::default();
    script.visit_with(&mut v);
    assert_eq!(v.names, vec!["a", "x", "y", "o", "p", "a"]);
}

/// Does not descend into nested functions.
#[derive(Default)]
struct ShallowCollector {
    names: Vec<String>,
}

impl<'ast> Visit<'ast> for ShallowCollector {
    fn visit_ident(&mut self, n: &'ast Ident) {
        self.names.push(n.sym.clone());
    }

    fn visit_function(&mut self, _: &'ast Function) {}
}

#[test]
fn test_override_stops_descent() {
    let b = AstBuilder::new();
    let script = b.script(vec![b.expr_stmt(b.call(
        b.ident_expr("f"),
        vec![b.fn_expr(None, &["e"], vec![b.expr_stmt(b.ident_expr("inner"))])],
    ))]);
    let mut v = ShallowCollector::default();
    script.visit_with(&mut v);
    assert_eq!(v.names, vec!["f"]);
}

//! Initial states of scripts and function invocations.

use crate::{
    analysis::AnalysisContext,
    checker::Checker,
    environment::{Environment, Variable},
    error::Result,
    facts::FactBase,
    lattice::{Addresses, BValue, Change, CriterionType, Dependencies, Num},
    object::{Closure, Obj},
    state::{Control, ControlCall, Scratchpad, State},
    store::{MergeMode, Store},
    trace::{Address, JsClass, Trace},
};
use ast::{Expr, FnDecl, FnExpr, Function, Ident, Node as AstNode, NodeId, Script, Stmt, VarDeclarator};
use ecma_visit::{Visit, VisitWith};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// The value of the internal prototype link of a new object of `class`.
pub(crate) fn prototype_value(class: JsClass) -> BValue {
    match class.prototype() {
        Some(proto) => BValue::of_addr(
            Address::builtin(proto),
            Change::Unchanged,
            Dependencies::bottom(),
        ),
        None => BValue::null(Change::Unchanged, Dependencies::bottom()),
    }
}

/// Allocates a function object closing over the current environment.
pub(crate) fn alloc_function(state: &mut State, function: &Function) -> Address {
    let id = function.info.id;
    let addr = Trace::mod_addr(&state.trace.make_addr(id, ""), JsClass::Function);
    let closure = Closure {
        function: id,
        env: state.env.clone(),
    };
    let mut obj = Obj::new(
        JsClass::Function,
        prototype_value(JsClass::Function),
        Some(closure),
    );

    let length = state.trace.make_addr(id, "length");
    state.store.alloc(
        length.clone(),
        BValue::of_num(
            Num::inject(function.params.len() as f64),
            Change::Unchanged,
            Dependencies::bottom(),
        ),
    );
    obj.define(id, "length", length);
    state.store.alloc_obj(addr.clone(), obj);
    addr
}

/// `conv_u(node)`, with a criterion of `kind` when the node changed.
fn declared_change<N: AstNode + ?Sized>(
    facts: &mut FactBase,
    node: &N,
    kind: CriterionType,
) -> (Change, Dependencies) {
    let change = Change::conv_u(node);
    if change.is_changed() {
        (change, Dependencies::inject(facts, kind, node.node_id()))
    } else {
        (change, Dependencies::bottom())
    }
}

/// A binding for the declaration `name`, holding `addr`.
fn declare(facts: &mut FactBase, name: &Ident, addr: Address) -> Variable {
    let (change, change_deps) = declared_change(facts, name, CriterionType::VariableChange);
    facts.record_variable(name.info.id, change);
    let mut deps = Dependencies::inject_variable(facts, name.info.id);
    deps.join_in(&change_deps);
    Variable {
        name: name.sym.clone(),
        addresses: Addresses::single(addr),
        change,
        deps,
    }
}

/// Declarations of one function body, not counting nested functions.
#[derive(Default)]
struct Declarations<'ast> {
    functions: Vec<&'ast FnDecl>,
    vars: Vec<&'ast VarDeclarator>,
}

impl<'ast> Visit<'ast> for Declarations<'ast> {
    fn visit_fn_decl(&mut self, n: &'ast FnDecl) {
        self.functions.push(n);
    }

    fn visit_fn_expr(&mut self, _n: &'ast FnExpr) {}

    fn visit_var_declarator(&mut self, n: &'ast VarDeclarator) {
        self.vars.push(n);
    }

    fn visit_expr(&mut self, _n: &'ast Expr) {}
}

/// Binds the function and variable declarations of `body` in the innermost
/// scope, before any statement runs.
///
/// Function names are bound first, then variables that are not already bound
/// in the scope. The function objects are created last, so every closure sees
/// every hoisted name.
pub(crate) fn hoist(state: &mut State, facts: &mut FactBase, body: &[Stmt]) {
    let mut decls = Declarations::default();
    decls.visit_stmts(body);

    for f in &decls.functions {
        let slot = state.trace.make_addr(f.function.info.id, "");
        let var = declare(facts, &f.ident, slot);
        Rc::make_mut(&mut state.env).strong_update(var);
    }

    for d in &decls.vars {
        if state.env.is_local(&d.name.sym) {
            continue;
        }
        let slot = state.trace.make_addr(d.info.id, "");
        let var = declare(facts, &d.name, slot.clone());
        Rc::make_mut(&mut state.env).strong_update(var);

        let (change, mut deps) = declared_change(facts, &d.name, CriterionType::ValueChange);
        deps.join_in(&Dependencies::inject_value(facts, d.name.info.id));
        state.store.alloc(slot, BValue::undefined(change, deps));
    }

    for f in &decls.functions {
        let addr = alloc_function(state, &f.function);
        let slot = state.trace.make_addr(f.function.info.id, "");
        let (change, mut deps) = if Change::conv(&f.function).is_changed() {
            (
                Change::Changed,
                Dependencies::inject(facts, CriterionType::ValueChange, f.function.info.id),
            )
        } else {
            (Change::Unchanged, Dependencies::bottom())
        };
        deps.join_in(&Dependencies::inject_value(facts, f.function.info.id));
        state.store.alloc(slot, BValue::of_addr(addr, change, deps));
    }
}

/// Names read anywhere in the script, with the first node that reads them.
#[derive(Default)]
struct Globals {
    names: FxHashMap<String, NodeId>,
}

impl<'ast> Visit<'ast> for Globals {
    fn visit_expr(&mut self, n: &'ast Expr) {
        match n {
            Expr::Ident(i) => {
                self.names.entry(i.sym.clone()).or_insert(i.info.id);
            }
            _ => n.visit_children_with(self),
        }
    }
}

/// The state at the start of `script`.
///
/// Besides the hoisted declarations, every name the script reads but never
/// declares is bound to an unknown value owned by the environment the script
/// runs in. `undefined` is bound to its actual value.
pub(crate) fn script_state<'ast>(
    ctx: &mut AnalysisContext<'_, 'ast>,
    script: &'ast Script,
) -> State {
    let mut store = Store::default();
    let builtins = [
        JsClass::Global,
        JsClass::ObjectPrototype,
        JsClass::FunctionPrototype,
        JsClass::ArgumentsPrototype,
        JsClass::ArrayPrototype,
    ];
    for &class in &builtins {
        store.alloc_obj(
            Address::builtin(class),
            Obj::new(class, prototype_value(class), None),
        );
    }

    let mut state = State {
        env: Rc::new(Environment::default()),
        store,
        scratch: Scratchpad::new(Addresses::Bottom),
        trace: Trace::root(script.info.id),
        control: Control::new(ControlCall::unchanged()),
        self_addr: Addresses::single(Address::builtin(JsClass::Global)),
        checkers: ctx.options.checkers.iter().map(|&k| Checker::new(k)).collect(),
    };
    hoist(&mut state, &mut ctx.facts, &script.body);

    let mut globals = Globals::default();
    script.visit_with(&mut globals);
    let mut names: Vec<_> = globals.names.into_iter().collect();
    names.sort_by_key(|&(_, id)| id);
    for (name, id) in names {
        if state.env.is_local(&name) {
            continue;
        }
        let addr = state.trace.make_addr(id, "");
        let value = if name == "undefined" {
            BValue::undefined(Change::Unchanged, Dependencies::bottom())
        } else {
            BValue::top(Change::Unchanged, Dependencies::bottom())
        };
        state.store.alloc(addr.clone(), value);
        Rc::make_mut(&mut state.env).strong_update(Variable {
            name,
            addresses: Addresses::single(addr),
            change: Change::Unchanged,
            deps: Dependencies::bottom(),
        });
    }
    state
}

/// One invocation of a closure.
pub(crate) struct Invocation<'a> {
    pub closure: &'a Closure,
    pub function: &'a Function,
    pub args: &'a [BValue],
    /// The value of `this` inside the callee.
    pub self_addr: Addresses,
    pub control: Control,
    /// The call site, or the function itself when nothing calls it.
    pub context: NodeId,
}

/// The state at the entry of a callee. Checker states are left empty for the
/// caller to fill in.
pub(crate) fn function_entry(
    caller: &State,
    facts: &mut FactBase,
    invocation: Invocation<'_>,
) -> Result<State> {
    let Invocation {
        closure,
        function,
        args,
        self_addr,
        control,
        context,
    } = invocation;
    let id = function.info.id;
    let trace = caller
        .trace
        .update_call(&caller.env, &caller.store, &caller.self_addr, context);
    let mut store = caller.store.clone();

    let args_addr = Trace::mod_addr(&trace.make_addr(id, ""), JsClass::Arguments);
    let mut args_obj = Obj::new(
        JsClass::Arguments,
        prototype_value(JsClass::Arguments),
        None,
    );
    for (i, arg) in args.iter().enumerate() {
        let addr = trace.make_addr(id, &i.to_string());
        store.alloc(addr.clone(), arg.clone());
        store.update(&Addresses::single(addr.clone()), arg, MergeMode::Strong)?;
        args_obj.define(id, &i.to_string(), addr);
    }

    // Parameters alias the slots of the arguments object.
    let mut env = Environment::new(Some(closure.env.clone()));
    for (i, param) in function.params.iter().enumerate() {
        let addr = match args.get(i) {
            Some(_) => trace.make_addr(id, &i.to_string()),
            None => {
                let addr = trace.make_addr(param.info.id, "");
                let (change, mut deps) =
                    declared_change(facts, param, CriterionType::ValueChange);
                deps.join_in(&Dependencies::inject_value(facts, param.info.id));
                store.alloc(addr.clone(), BValue::top(change, deps));
                args_obj.define(param.info.id, &i.to_string(), addr.clone());
                addr
            }
        };
        env.strong_update(declare(facts, param, addr));
    }
    store.alloc_obj(args_addr.clone(), args_obj);

    let mut state = State {
        env: Rc::new(env),
        store,
        scratch: Scratchpad::new(Addresses::single(args_addr)),
        trace,
        control,
        self_addr,
        checkers: Vec::new(),
    };
    hoist(&mut state, facts, &function.body.stmts);
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ast::builder::AstBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_prototype_chain_ends_in_null() {
        assert!(prototype_value(JsClass::ObjectPrototype).is_null());
        assert_eq!(
            prototype_value(JsClass::Array).addresses,
            Addresses::single(Address::builtin(JsClass::ArrayPrototype))
        );
    }

    #[test]
    fn test_hoisting_skips_nested_functions() {
        let b = AstBuilder::new();
        let body = vec![
            b.var("a", None),
            b.fn_decl("f", &[], vec![b.var("inner", None)]),
            b.if_stmt(b.bool(true), vec![b.var("b", Some(b.num(1.0)))], None),
        ];
        let mut decls = Declarations::default();
        decls.visit_stmts(&body);
        let names: Vec<_> = decls.vars.iter().map(|d| d.name.sym.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(decls.functions.len(), 1);
    }

    #[test]
    fn test_globals_collect_read_names() {
        let b = AstBuilder::new();
        let script = b.script(vec![
            b.var("x", Some(b.ident_expr("y"))),
            b.expr_stmt(b.call(b.member(b.ident_expr("console"), "log"), vec![b.ident_expr("x")])),
        ]);
        let mut globals = Globals::default();
        script.visit_with(&mut globals);
        let mut names: Vec<_> = globals.names.keys().cloned().collect();
        names.sort();
        assert_eq!(names, vec!["console", "x", "y"]);
    }
}

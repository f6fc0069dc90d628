use super::{init::alloc_function, init::prototype_value, Interpreter, UNKNOWN_PROPERTY};
use crate::{
    environment::Variable,
    error::Result,
    lattice::{Addresses, BValue, Bool, Change, Dependencies, Num, NumKind, Str},
    object::Obj,
    store::MergeMode,
    trace::{JsClass, Trace},
};
use ast::{
    num_to_key, ArrayLit, AssignExpr, BinExpr, BinaryOp, CondExpr, Expr, FnExpr, GetNodeId,
    Ident, Lit, MemberExpr, MemberProp, NewExpr, Node as AstNode, ObjectLit, ThisExpr, UnaryExpr,
    UnaryOp, UpdateExpr,
};
use rustc_hash::FxHashSet;

impl<'i, 'c, 'ast> Interpreter<'i, 'c, 'ast> {
    /// Evaluates `expr` and records the change of its value.
    pub(super) fn eval(&mut self, expr: &'ast Expr) -> Result<BValue> {
        let value = match expr {
            Expr::This(n) => self.eval_this(n),
            Expr::Lit(n) => self.eval_lit(n),
            Expr::Ident(n) => self.eval_ident(n)?,
            Expr::Object(n) => self.eval_object(n)?,
            Expr::Array(n) => self.eval_array(n)?,
            Expr::Fn(n) => self.eval_fn(n),
            Expr::Unary(n) => self.eval_unary(n)?,
            Expr::Update(n) => self.eval_update(n)?,
            Expr::Bin(n) => self.eval_bin(n)?,
            Expr::Assign(n) => self.eval_assign(n)?,
            Expr::Member(n) => self.eval_member(n)?,
            Expr::Cond(n) => self.eval_cond(n)?,
            Expr::Call(n) => self.eval_call(n)?,
            Expr::New(n) => self.eval_new(n)?,
            Expr::Paren(n) => self.eval(&n.expr)?,
        };
        self.ctx.facts.record_value(expr.node_id(), value.change);
        Ok(value)
    }

    fn eval_this(&mut self, n: &'ast ThisExpr) -> BValue {
        let (change, deps) = self.origin(n);
        BValue {
            addresses: self.state.self_addr.clone(),
            change,
            deps,
            ..BValue::bottom()
        }
    }

    fn eval_lit(&mut self, lit: &'ast Lit) -> BValue {
        let (change, deps) = self.origin_u(lit);
        match lit {
            Lit::Str(s) => BValue::of_str(Str::inject(&s.value), change, deps),
            Lit::Num(n) => BValue::of_num(Num::inject(n.value), change, deps),
            Lit::Bool(b) => BValue::of_bool(Bool::inject(b.value), change, deps),
            Lit::Null(_) => BValue::null(change, deps),
        }
    }

    fn eval_ident(&mut self, ident: &'ast Ident) -> Result<BValue> {
        let id = ident.info.id;
        let addrs = self.resolve_ident(ident);
        let value = if addrs.is_top() {
            BValue::top(
                Change::Unchanged,
                Dependencies::inject_value(&mut self.ctx.facts, id),
            )
        } else {
            self.read(&addrs, id)?
        };
        let (change, deps) = self.change_u(ident);
        Ok(BValue {
            change: value.change.join(change),
            deps: value.deps.join(&deps),
            ..value
        })
    }

    fn eval_object(&mut self, lit: &'ast ObjectLit) -> Result<BValue> {
        let mut obj = Obj::new(JsClass::Object, prototype_value(JsClass::Object), None);
        for prop in &lit.props {
            let key = prop.key.as_key();
            let value = self.eval(&prop.value)?;
            let value = self.mark_new_value(&prop.value, value);
            let addr = self.state.trace.make_addr(prop.info.id, &key);
            self.ctx
                .facts
                .add_dependencies(prop.key.node_id(), &value.deps);
            self.state.store.alloc(addr.clone(), value);
            obj.define(prop.info.id, &key, addr);
        }
        let addr = Trace::mod_addr(
            &self.state.trace.make_addr(lit.info.id, ""),
            JsClass::Object,
        );
        self.state.store.alloc_obj(addr.clone(), obj);

        let (change, deps) = self.origin(lit);
        Ok(BValue::of_addr(addr, change, deps))
    }

    fn eval_array(&mut self, lit: &'ast ArrayLit) -> Result<BValue> {
        let mut obj = Obj::new(JsClass::Array, prototype_value(JsClass::Array), None);
        for (i, elem) in lit.elems.iter().enumerate() {
            let key = i.to_string();
            let value = self.eval(elem)?;
            let value = self.mark_new_value(elem, value);
            let addr = self.state.trace.make_addr(elem.node_id(), &key);
            self.state.store.alloc(addr.clone(), value);
            obj.define(elem.node_id(), &key, addr);
        }
        let addr = Trace::mod_addr(
            &self.state.trace.make_addr(lit.info.id, ""),
            JsClass::Array,
        );
        self.state.store.alloc_obj(addr.clone(), obj);

        let (change, deps) = self.origin(lit);
        Ok(BValue::of_addr(addr, change, deps))
    }

    fn eval_fn(&mut self, f: &'ast FnExpr) -> BValue {
        let addr = alloc_function(self.state, &f.function);
        let (change, deps) = self.origin_u(f);
        BValue::of_addr(addr, change, deps)
    }

    fn eval_unary(&mut self, n: &'ast UnaryExpr) -> Result<BValue> {
        let operand = self.eval(&n.arg)?;
        let (change, deps) = self.operator(n, &[&operand]);
        Ok(match n.op {
            UnaryOp::Bang | UnaryOp::Delete => BValue::of_bool(Bool::Top, change, deps),
            UnaryOp::TypeOf => BValue::of_str(Str::top(), change, deps),
            UnaryOp::Void => BValue::undefined(change, deps),
            UnaryOp::Minus | UnaryOp::Plus | UnaryOp::Tilde => {
                BValue::of_num(Num::top(), change, deps)
            }
        })
    }

    fn eval_update(&mut self, n: &'ast UpdateExpr) -> Result<BValue> {
        let addrs = self.resolve_or_create(&n.arg)?;
        let operand = self.eval(&n.arg)?;
        let (change, deps) = self.operator(n, &[&operand]);
        let value = BValue::of_num(Num::top(), change, deps);
        self.write(&addrs, &value, n.arg.node_id())?;
        Ok(value)
    }

    fn eval_bin(&mut self, n: &'ast BinExpr) -> Result<BValue> {
        let left = self.eval(&n.left)?;
        let right = self.eval(&n.right)?;
        Ok(self.apply_binary(n, n.op, &left, &right))
    }

    fn eval_assign(&mut self, n: &'ast AssignExpr) -> Result<BValue> {
        let addrs = self.resolve_or_create(&n.left)?;
        let value = match n.op.to_update() {
            None => {
                let value = self.eval(&n.right)?;
                self.mark_new_value(&n.right, value)
            }
            Some(op) => {
                let left = self.eval(&n.left)?;
                let right = self.eval(&n.right)?;
                self.apply_binary(n, op, &left, &right)
            }
        };
        self.write(&addrs, &value, n.left.node_id())?;
        Ok(value)
    }

    fn eval_member(&mut self, n: &'ast MemberExpr) -> Result<BValue> {
        let bases = self.resolve_or_create(&n.obj)?;
        self.eval_property(n, &bases)
    }

    /// The value of the property `n` names on the objects `bases` hold.
    pub(super) fn eval_property(
        &mut self,
        n: &'ast MemberExpr,
        bases: &Addresses,
    ) -> Result<BValue> {
        let addrs = self.resolve_property(n, bases)?;
        let value = if addrs.iter().next().is_none() {
            BValue::top(
                Change::Unchanged,
                Dependencies::inject_value(&mut self.ctx.facts, n.info.id),
            )
        } else {
            self.read(&addrs, n.info.id)?
        };
        let (change, deps) = self.change_u(n);
        Ok(BValue {
            change: value.change.join(change),
            deps: value.deps.join(&deps),
            ..value
        })
    }

    fn eval_cond(&mut self, n: &'ast CondExpr) -> Result<BValue> {
        let test = self.eval(&n.test)?;
        let cons = self.eval(&n.cons)?;
        let alt = self.eval(&n.alt)?;
        let value = cons.join(&alt);
        let (change, mut deps) = self.origin(n);
        deps.join_in(&value.deps);
        deps.join_in(&test.deps);
        Ok(value.with(value.change.join(test.change).join(change), deps))
    }

    fn eval_new(&mut self, n: &'ast NewExpr) -> Result<BValue> {
        self.eval(&n.callee)?;
        for arg in &n.args {
            self.eval(arg)?;
        }
        let (change, deps) = self.origin_u(n);
        Ok(BValue::top(change, deps))
    }

    /// The change and provenance of an operator applied to `operands`.
    fn operator<N: AstNode + ?Sized>(
        &mut self,
        node: &N,
        operands: &[&BValue],
    ) -> (Change, Dependencies) {
        let (mut change, mut deps) = self.origin(node);
        for operand in operands {
            change = operand.change.join(change);
            deps.join_in(&operand.deps);
        }
        (change, deps)
    }

    pub(super) fn apply_binary<N: AstNode + ?Sized>(
        &mut self,
        node: &N,
        op: BinaryOp,
        left: &BValue,
        right: &BValue,
    ) -> BValue {
        let (change, deps) = self.operator(node, &[left, right]);
        match op {
            BinaryOp::LogicalAnd => left.falsy().join(right).with(change, deps),
            BinaryOp::LogicalOr => left.truthy().join(right).with(change, deps),
            BinaryOp::NullishCoalescing => left.join(right).with(change, deps),
            BinaryOp::Add => plus(left, right).with(change, deps),
            BinaryOp::Sub
            | BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Mod
            | BinaryOp::Exp
            | BinaryOp::LShift
            | BinaryOp::RShift
            | BinaryOp::ZeroFillRShift
            | BinaryOp::BitOr
            | BinaryOp::BitXor
            | BinaryOp::BitAnd => BValue::of_num(Num::top(), change, deps),
            BinaryOp::EqEq
            | BinaryOp::NotEq
            | BinaryOp::EqEqEq
            | BinaryOp::NotEqEq
            | BinaryOp::Lt
            | BinaryOp::LtEq
            | BinaryOp::Gt
            | BinaryOp::GtEq
            | BinaryOp::In
            | BinaryOp::InstanceOf => BValue::of_bool(Bool::Top, change, deps),
        }
    }

    /// Marks a value as changed when it is written by an updated expression
    /// whose own value did not change. Allocations and calls keep their own
    /// change.
    pub(super) fn mark_new_value(&mut self, rhs: &'ast Expr, value: BValue) -> BValue {
        if value.change.is_changed()
            || matches!(rhs, Expr::Object(_) | Expr::Array(_) | Expr::Call(_))
        {
            return value;
        }
        let (change, deps) = self.change_u(rhs);
        if !change.is_changed() {
            return value;
        }
        BValue {
            change: value.change.join(change),
            deps: value.deps.join(&deps),
            ..value
        }
    }

    /// The addresses of the variable `ident` names. Unbound names get a fresh
    /// binding in the innermost scope, holding an unknown value.
    pub(super) fn resolve_ident(&mut self, ident: &'ast Ident) -> Addresses {
        let id = ident.info.id;
        if let Some(var) = self.state.env.apply(&ident.sym) {
            let addresses = var.addresses.clone();
            let (change, deps) = (var.change, var.deps.clone());
            self.ctx.facts.record_variable(id, change);
            self.ctx.facts.add_dependencies(id, &deps);
            return addresses;
        }

        let addr = self.state.trace.make_addr(id, "");
        self.bind(Variable {
            name: ident.sym.clone(),
            addresses: Addresses::single(addr.clone()),
            change: Change::Bottom,
            deps: Dependencies::bottom(),
        });
        let value = BValue::top(
            Change::Bottom,
            Dependencies::inject_value(&mut self.ctx.facts, id),
        );
        self.state.store.alloc(addr.clone(), value);
        self.ctx.facts.record_variable(id, Change::Bottom);
        Addresses::single(addr)
    }

    /// The addresses of the property `m` names on every object its base may
    /// point to. Missing properties, and objects for bases that point to
    /// none, are created on demand.
    pub(super) fn resolve_member(&mut self, m: &'ast MemberExpr) -> Result<Addresses> {
        let bases = self.resolve_or_create(&m.obj)?;
        self.resolve_property(m, &bases)
    }

    fn resolve_property(&mut self, m: &'ast MemberExpr, bases: &Addresses) -> Result<Addresses> {
        let (key, prop_id) = match &m.prop {
            MemberProp::Ident(i) => (i.sym.clone(), i.info.id),
            MemberProp::Computed(e) => {
                let value = self.eval(e)?;
                (property_key(&value), m.info.id)
            }
        };
        let obj_id = m.obj.node_id();

        let mut result = FxHashSet::default();
        for base in bases.iter() {
            let base_addrs = Addresses::single(base.clone());
            let mut value = self.read(&base_addrs, obj_id)?;
            if value.addresses.iter().next().is_none() {
                let dummy =
                    Trace::mod_addr(&self.state.trace.make_addr(obj_id, ""), JsClass::Object);
                if self.state.store.get_obj(&dummy).is_none() {
                    self.state.store.alloc_obj(
                        dummy.clone(),
                        Obj::new(JsClass::Object, prototype_value(JsClass::Object), None),
                    );
                }
                value = value.join(&BValue::of_addr(dummy, Change::Bottom, Dependencies::bottom()));
                self.state
                    .store
                    .update(&base_addrs, &value, MergeMode::Strong)?;
            }

            for obj_addr in value.addresses.iter() {
                let existing = match self.state.store.get_obj(obj_addr) {
                    Some(obj) => obj.apply(&key).cloned(),
                    // Not an object, e.g. a builtin we do not model.
                    None => continue,
                };
                if let Some(addr) = existing {
                    result.insert(addr);
                    continue;
                }
                let addr = self.state.trace.make_addr(prop_id, &key);
                let deps = Dependencies::inject_value(&mut self.ctx.facts, m.info.id);
                self.state
                    .store
                    .alloc(addr.clone(), BValue::top(Change::Bottom, deps));
                if let Some(obj) = self.state.store.get_obj_mut(obj_addr) {
                    obj.define(prop_id, &key, addr.clone());
                }
                result.insert(addr);
            }
        }
        Ok(Addresses::from_set(result))
    }

    /// The addresses an assignment target or property base refers to. Any
    /// other expression is evaluated into a temporary.
    pub(super) fn resolve_or_create(&mut self, expr: &'ast Expr) -> Result<Addresses> {
        match expr.unwrap_parens() {
            Expr::Ident(i) => Ok(self.resolve_ident(i)),
            Expr::Member(m) => self.resolve_member(m),
            other => {
                let value = self.eval(other)?;
                let addr = self.state.trace.make_addr(other.node_id(), "");
                self.state.store.alloc(addr.clone(), value);
                Ok(Addresses::single(addr))
            }
        }
    }
}

/// The abstraction of `left + right`: a string if either side may be one,
/// a number if either side may convert to one.
fn plus(left: &BValue, right: &BValue) -> BValue {
    let mut value = BValue::bottom();
    let either = |f: fn(&BValue) -> bool| f(left) || f(right);
    if either(|v| !v.str_.is_bottom()) {
        value.str_ = Str::top();
    }
    if either(|v| {
        !v.num.is_bottom()
            || v.bool_ != Bool::Bottom
            || v.null.is_top()
            || v.undefined.is_top()
    }) {
        value.num = Num::top();
    }
    if either(|v| !v.addresses.is_bottom()) {
        value.num = Num::top();
        value.str_ = Str::top();
    }
    value
}

/// The property name a computed key evaluates to.
fn property_key(value: &BValue) -> String {
    let only_num = value.str_.is_bottom();
    let only_str = value.num.is_bottom();
    match (&value.num.value, &value.str_.value) {
        (Some(n), _) if only_num => num_to_key(*n),
        (_, Some(s)) if only_str => s.clone(),
        _ if only_num && value.num.kind == NumKind::ZERO => "0".to_string(),
        _ => UNKNOWN_PROPERTY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bottom_with(f: impl FnOnce(&mut BValue)) -> BValue {
        let mut v = BValue::bottom();
        f(&mut v);
        v
    }

    #[test]
    fn test_plus_of_strings_and_numbers() {
        let s = bottom_with(|v| v.str_ = Str::inject("a"));
        let n = bottom_with(|v| v.num = Num::inject(1.0));
        let sum = plus(&s, &n);
        assert_eq!(sum.str_, Str::top());
        assert_eq!(sum.num, Num::top());

        let nn = plus(&n, &n);
        assert!(nn.str_.is_bottom());
        assert_eq!(nn.num, Num::top());
    }

    #[test]
    fn test_plus_of_undefined_is_numeric() {
        let u = BValue::undefined(Change::Unchanged, Dependencies::bottom());
        let sum = plus(&u, &u);
        assert!(sum.str_.is_bottom());
        assert_eq!(sum.num, Num::top());
    }

    #[test]
    fn test_property_keys() {
        assert_eq!(property_key(&bottom_with(|v| v.num = Num::inject(2.0))), "2");
        assert_eq!(property_key(&bottom_with(|v| v.num = Num::inject(0.0))), "0");
        assert_eq!(
            property_key(&bottom_with(|v| v.str_ = Str::inject("name"))),
            "name"
        );
        assert_eq!(
            property_key(&BValue::top(Change::Unchanged, Dependencies::bottom())),
            UNKNOWN_PROPERTY
        );
    }
}

//! Narrowing of values along conditional edges.
//!
//! Only operands that resolve to exactly one address are narrowed, and the
//! narrowed value replaces the old one. Anything the refinement does not
//! understand leaves the state alone.

use super::Interpreter;
use crate::{
    error::Result,
    lattice::{Addresses, BValue, Bool, Null, NumKind, StrKind, Undefined},
    store::MergeMode,
};
use ast::{BinExpr, BinaryOp, Expr, Lit, UnaryOp};

/// A literal an operand can be compared against.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Probe {
    Null,
    Undefined,
    Blank,
    Zero,
    False,
}

impl Probe {
    fn of(expr: &Expr) -> Option<Probe> {
        match expr.unwrap_parens() {
            Expr::Lit(Lit::Null(_)) => Some(Probe::Null),
            Expr::Lit(Lit::Str(s)) if s.value.is_empty() => Some(Probe::Blank),
            Expr::Lit(Lit::Num(n)) if n.value == 0.0 => Some(Probe::Zero),
            Expr::Lit(Lit::Bool(b)) if !b.value => Some(Probe::False),
            Expr::Ident(i) if i.sym == "undefined" => Some(Probe::Undefined),
            Expr::Unary(u) if u.op == UnaryOp::Void => Some(Probe::Undefined),
            _ => None,
        }
    }
}

impl<'i, 'c, 'ast> Interpreter<'i, 'c, 'ast> {
    /// Narrows the values `cond` tests, given that it evaluated to `truthy`.
    pub(super) fn refine(&mut self, cond: &'ast Expr, truthy: bool) -> Result<()> {
        match cond.unwrap_parens() {
            Expr::Unary(u) if u.op == UnaryOp::Bang => self.refine(&u.arg, !truthy),
            Expr::Bin(b) if b.op == BinaryOp::LogicalAnd && truthy => {
                self.refine(&b.left, true)?;
                self.refine(&b.right, true)
            }
            Expr::Bin(b) if b.op == BinaryOp::LogicalOr && !truthy => {
                self.refine(&b.left, false)?;
                self.refine(&b.right, false)
            }
            Expr::Bin(b) if b.op.is_equality() => self.refine_equality(b, truthy),
            operand @ Expr::Ident(_) | operand @ Expr::Member(_) => {
                self.narrow(operand, |v| if truthy { v.truthy() } else { v.falsy() })
            }
            _ => Ok(()),
        }
    }

    fn refine_equality(&mut self, b: &'ast BinExpr, truthy: bool) -> Result<()> {
        let (operand, probe) = match (Probe::of(&b.left), Probe::of(&b.right)) {
            (None, Some(probe)) => (&*b.left, probe),
            (Some(probe), None) => (&*b.right, probe),
            _ => return Ok(()),
        };
        match operand.unwrap_parens() {
            Expr::Ident(_) | Expr::Member(_) => {}
            _ => return Ok(()),
        }
        let equal = b.op.is_positive_equality() == truthy;
        let strict = b.op.is_strict();
        self.narrow(operand.unwrap_parens(), |v| {
            compare(v, probe, strict, equal)
        })
    }

    /// Replaces the value of `operand` with `f` of it, when the operand is a
    /// single known location.
    fn narrow<F>(&mut self, operand: &'ast Expr, f: F) -> Result<()>
    where
        F: FnOnce(&BValue) -> BValue,
    {
        let addrs = match operand {
            Expr::Ident(i) => match self.state.env.apply(&i.sym) {
                Some(var) => var.addresses.clone(),
                None => return Ok(()),
            },
            Expr::Member(m) => self.resolve_member(m)?,
            _ => return Ok(()),
        };
        let addr = match addrs.as_single() {
            Some(addr) => addr.clone(),
            None => return Ok(()),
        };
        let narrowed = f(self.state.store.apply(&addr)?);
        self.state
            .store
            .update(&Addresses::single(addr), &narrowed, MergeMode::Strong)
    }
}

/// The part of `v` for which `v == probe` (or `===`, when `strict`) is
/// `equal`.
fn compare(v: &BValue, probe: Probe, strict: bool, equal: bool) -> BValue {
    let mut r = v.clone();
    match (probe, strict, equal) {
        (Probe::Null, true, true) => {
            r = only(v, |r, v| r.null = v.null);
        }
        (Probe::Undefined, true, true) => {
            r = only(v, |r, v| r.undefined = v.undefined);
        }
        (Probe::Null, false, true) | (Probe::Undefined, false, true) => {
            r = only(v, |r, v| {
                r.null = v.null;
                r.undefined = v.undefined;
            });
        }
        (Probe::Null, true, false) => r.null = Null::Bottom,
        (Probe::Undefined, true, false) => r.undefined = Undefined::Bottom,
        (Probe::Null, false, false) | (Probe::Undefined, false, false) => {
            r.null = Null::Bottom;
            r.undefined = Undefined::Bottom;
        }

        (Probe::Blank, true, true) => {
            r = only(v, |r, v| r.str_ = v.str_.restrict(StrKind::SBLANK));
        }
        (Probe::Zero, true, true) => {
            r = only(v, |r, v| r.num = v.num.restrict(NumKind::ZERO));
        }
        (Probe::False, true, true) => {
            r = only(v, |r, v| r.bool_ = v.bool_.falsy());
        }
        // `x == ''`, `x == 0` and `x == false` hold for the same primitives.
        (Probe::Blank, false, true) | (Probe::Zero, false, true) | (Probe::False, false, true) => {
            r = only(v, |r, v| {
                r.str_ = v.str_.restrict(StrKind::SBLANK | StrKind::SNUM);
                r.num = v.num.restrict(NumKind::ZERO);
                r.bool_ = v.bool_.falsy();
                r.addresses = v.addresses.clone();
            });
        }

        (Probe::Blank, true, false) => r.str_ = v.str_.restrict(StrKind::SNOTBLANK),
        (Probe::Zero, true, false) => r.num = v.num.restrict(NumKind::NOT_ZERO),
        (Probe::False, true, false) => r.bool_ = v.bool_.truthy(),
        (Probe::Blank, false, false) | (Probe::Zero, false, false) | (Probe::False, false, false) => {
            r.str_ = v.str_.restrict(StrKind::SNOTBLANK);
            r.num = v.num.restrict(NumKind::NOT_ZERO);
            r.bool_ = v.bool_.truthy();
        }
    }
    r
}

/// A value with only the components `keep` copies from `v`.
fn only(v: &BValue, keep: impl FnOnce(&mut BValue, &BValue)) -> BValue {
    let mut r = BValue::bottom().with(v.change, v.deps.clone());
    keep(&mut r, v);
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::{Change, Dependencies, Num, Str};
    use pretty_assertions::assert_eq;

    fn maybe_null_str() -> BValue {
        BValue::null(Change::Unchanged, Dependencies::bottom())
            .join(&BValue::of_str(Str::top(), Change::Unchanged, Dependencies::bottom()))
    }

    #[test]
    fn test_strict_null_check() {
        let v = maybe_null_str();
        assert!(compare(&v, Probe::Null, true, true).is_null());
        let not_null = compare(&v, Probe::Null, true, false);
        assert_eq!(not_null.null, Null::Bottom);
        assert_eq!(not_null.str_, Str::top());
    }

    #[test]
    fn test_loose_null_check_covers_undefined() {
        let v = maybe_null_str().join(&BValue::undefined(Change::Unchanged, Dependencies::bottom()));
        let eq = compare(&v, Probe::Undefined, false, true);
        assert!(eq.null.is_top());
        assert!(eq.undefined.is_top());
        assert!(eq.str_.is_bottom());
        let ne = compare(&v, Probe::Null, false, false);
        assert_eq!(ne.null, Null::Bottom);
        assert_eq!(ne.undefined, Undefined::Bottom);
    }

    #[test]
    fn test_blank_check_keeps_change() {
        let v = BValue::of_str(Str::top(), Change::Changed, Dependencies::bottom());
        let blank = compare(&v, Probe::Blank, true, true);
        assert!(blank.is_blank());
        assert_eq!(blank.change, Change::Changed);
        let not_blank = compare(&v, Probe::Blank, true, false);
        assert_eq!(not_blank.str_.kind, StrKind::SNOTBLANK);
    }

    #[test]
    fn test_zero_check() {
        let v = BValue::of_num(Num::top(), Change::Unchanged, Dependencies::bottom());
        assert_eq!(compare(&v, Probe::Zero, true, true).num.kind, NumKind::ZERO);
        assert_eq!(
            compare(&v, Probe::Zero, true, false).num.kind,
            NumKind::NOT_ZERO
        );
    }

    #[test]
    fn test_false_check() {
        let v = BValue::of_bool(Bool::Top, Change::Unchanged, Dependencies::bottom());
        assert_eq!(compare(&v, Probe::False, true, true).bool_, Bool::False);
        assert_eq!(compare(&v, Probe::False, true, false).bool_, Bool::True);
    }

    #[test]
    fn test_probes() {
        let b = ast::builder::AstBuilder::new();
        assert_eq!(Probe::of(&b.null()), Some(Probe::Null));
        assert_eq!(Probe::of(&b.ident_expr("undefined")), Some(Probe::Undefined));
        assert_eq!(Probe::of(&b.str("")), Some(Probe::Blank));
        assert_eq!(Probe::of(&b.paren(b.num(0.0))), Some(Probe::Zero));
        assert_eq!(Probe::of(&b.bool(false)), Some(Probe::False));
        assert_eq!(Probe::of(&b.bool(true)), None);
        assert_eq!(Probe::of(&b.ident_expr("x")), None);
    }
}

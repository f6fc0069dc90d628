use super::*;
use crate::trace::{Address, Trace};
use ast::NodeId;
use pretty_assertions::assert_eq;

fn deps(ids: &[u32]) -> Dependencies {
    ids.iter()
        .map(|&i| Criterion::new(CriterionType::Value, NodeId(i)))
        .collect()
}

fn addr(site: u32) -> Address {
    Trace::root(NodeId(0)).make_addr(NodeId(site), "")
}

fn samples() -> Vec<BValue> {
    vec![
        BValue::bottom(),
        BValue::top(Change::Unchanged, deps(&[1])),
        BValue::top(Change::Changed, deps(&[2])),
        BValue::of_str(Str::inject(""), Change::Unchanged, deps(&[3])),
        BValue::of_str(Str::inject("abc"), Change::Changed, deps(&[])),
        BValue::of_str(Str::inject("12"), Change::Unchanged, deps(&[4])),
        BValue::of_str(Str::inject("length"), Change::Top, deps(&[4, 5])),
        BValue::of_num(Num::inject(0.0), Change::Unchanged, deps(&[6])),
        BValue::of_num(Num::inject(3.5), Change::Changed, deps(&[])),
        BValue::of_num(Num::inject(7.0), Change::Unchanged, deps(&[7])),
        BValue::of_num(Num::inject(f64::NAN), Change::Bottom, deps(&[])),
        BValue::of_bool(Bool::True, Change::Unchanged, deps(&[8])),
        BValue::of_bool(Bool::False, Change::Changed, deps(&[8])),
        BValue::null(Change::Unchanged, deps(&[])),
        BValue::undefined(Change::Changed, deps(&[9])),
        BValue::of_addr(addr(10), Change::Unchanged, deps(&[10])),
        BValue::of_addr(addr(11), Change::Changed, deps(&[])),
    ]
}

#[test]
fn test_change_join_table() {
    use Change::*;
    assert_eq!(Unchanged.join(Unchanged), Unchanged);
    assert_eq!(Changed.join(Changed), Changed);
    assert_eq!(Unchanged.join(Changed), Top);
    assert_eq!(Changed.join(Unchanged), Top);
    for &x in &[Bottom, Unchanged, Changed, Top] {
        assert_eq!(x.join(Bottom), x);
        assert_eq!(Bottom.join(x), x);
        assert_eq!(x.join(Top), Top);
    }
}

#[test]
fn test_join_commutative() {
    let samples = samples();
    for a in &samples {
        for b in &samples {
            assert_eq!(a.join(b), b.join(a));
        }
    }
}

#[test]
fn test_join_associative() {
    let samples = samples();
    for a in &samples {
        for b in &samples {
            for c in &samples {
                assert_eq!(a.join(&b.join(c)), a.join(b).join(c));
            }
        }
    }
}

#[test]
fn test_join_idempotent_with_bottom_identity() {
    for a in &samples() {
        assert_eq!(&a.join(a), a);
        assert_eq!(&a.join(&BValue::bottom()), a);
    }
}

#[test]
fn test_join_keeps_provenance() {
    let samples = samples();
    for a in &samples {
        for b in &samples {
            let joined = a.join(b);
            assert!(a.deps.is_subset(&joined.deps));
            assert!(b.deps.is_subset(&joined.deps));
        }
    }
}

#[test]
fn test_str_inject() {
    assert_eq!(Str::inject("").kind, StrKind::BLANK);
    assert_eq!(Str::inject("").value, None);
    assert_eq!(Str::inject("42").kind, StrKind::NUM);
    assert_eq!(Str::inject("42").value.as_deref(), Some("42"));
    assert_eq!(Str::inject("prototype").kind, StrKind::SPL);
    assert_eq!(Str::inject("hello").kind, StrKind::OTHER);
}

#[test]
fn test_str_join_forgets_value() {
    let joined = Str::inject("a").join(&Str::inject("b"));
    assert_eq!(joined, Str::of_kind(StrKind::OTHER));
    assert_eq!(Str::inject("a").join(&Str::inject("a")), Str::inject("a"));
}

#[test]
fn test_num_inject() {
    assert_eq!(Num::inject(0.0).kind, NumKind::ZERO);
    assert_eq!(Num::inject(f64::NAN).kind, NumKind::NAN);
    assert_eq!(Num::inject(2.0).value, Some(2.0));
    assert!(NumKind::REAL.contains(Num::inject(2.0).kind));
}

#[test]
fn test_truthy_falsy() {
    let v = BValue::top(Change::Unchanged, Dependencies::bottom());
    let t = v.truthy();
    assert_eq!(t.str_.kind, StrKind::SNOTBLANK);
    assert_eq!(t.num.kind, NumKind::NOT_ZERO_NOR_NAN);
    assert_eq!(t.bool_, Bool::True);
    assert_eq!(t.null, Null::Bottom);
    let f = v.falsy();
    assert!(f.str_.is_blank_or_bottom());
    assert_eq!(f.num.kind, NumKind::NAN_ZERO);
    assert_eq!(f.bool_, Bool::False);
    assert!(f.undefined.is_top());
}

#[test]
fn test_addresses_bound() {
    let mut acc = Addresses::Bottom;
    for i in 0..MAX_ADDRESSES as u32 {
        acc = acc.join(&Addresses::single(addr(i)));
    }
    assert!(matches!(&acc, Addresses::Set(s) if s.len() == MAX_ADDRESSES));
    acc = acc.join(&Addresses::single(addr(1000)));
    assert!(acc.is_top());
}

#[test]
fn test_predicates() {
    assert!(BValue::undefined(Change::Unchanged, deps(&[1])).is_undefined());
    assert!(BValue::null(Change::Changed, deps(&[])).is_null());
    assert!(BValue::of_str(Str::inject(""), Change::Unchanged, deps(&[])).is_blank());
    assert!(!BValue::top(Change::Unchanged, deps(&[])).is_undefined());
    assert!(BValue::of_addr(addr(3), Change::Unchanged, deps(&[])).is_address());
}

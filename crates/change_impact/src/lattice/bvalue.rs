use super::{Addresses, Bool, Change, Dependencies, Null, Num, Str, Undefined};
use crate::trace::Address;

/// An abstract value: what it may be, whether it changed, and where it came
/// from.
#[derive(Clone, Debug, PartialEq)]
pub struct BValue {
    pub str_: Str,
    pub num: Num,
    pub bool_: Bool,
    pub null: Null,
    pub undefined: Undefined,
    pub addresses: Addresses,
    pub change: Change,
    pub deps: Dependencies,
}

impl BValue {
    pub fn bottom() -> Self {
        Self {
            str_: Str::bottom(),
            num: Num::bottom(),
            bool_: Bool::Bottom,
            null: Null::Bottom,
            undefined: Undefined::Bottom,
            addresses: Addresses::Bottom,
            change: Change::Bottom,
            deps: Dependencies::bottom(),
        }
    }

    /// Any primitive value. References stay bottom, since nothing is known
    /// about which objects it could point to.
    pub fn top(change: Change, deps: Dependencies) -> Self {
        Self {
            str_: Str::top(),
            num: Num::top(),
            bool_: Bool::Top,
            null: Null::Top,
            undefined: Undefined::Top,
            addresses: Addresses::Bottom,
            change,
            deps,
        }
    }

    pub fn undefined(change: Change, deps: Dependencies) -> Self {
        Self {
            undefined: Undefined::Top,
            change,
            deps,
            ..Self::bottom()
        }
    }

    pub fn null(change: Change, deps: Dependencies) -> Self {
        Self {
            null: Null::Top,
            change,
            deps,
            ..Self::bottom()
        }
    }

    pub fn of_str(str_: Str, change: Change, deps: Dependencies) -> Self {
        Self {
            str_,
            change,
            deps,
            ..Self::bottom()
        }
    }

    pub fn of_num(num: Num, change: Change, deps: Dependencies) -> Self {
        Self {
            num,
            change,
            deps,
            ..Self::bottom()
        }
    }

    pub fn of_bool(bool_: Bool, change: Change, deps: Dependencies) -> Self {
        Self {
            bool_,
            change,
            deps,
            ..Self::bottom()
        }
    }

    pub fn of_addr(addr: Address, change: Change, deps: Dependencies) -> Self {
        Self {
            addresses: Addresses::single(addr),
            change,
            deps,
            ..Self::bottom()
        }
    }

    pub fn join(&self, other: &BValue) -> BValue {
        BValue {
            str_: self.str_.join(&other.str_),
            num: self.num.join(&other.num),
            bool_: self.bool_.join(other.bool_),
            null: self.null.join(other.null),
            undefined: self.undefined.join(other.undefined),
            addresses: self.addresses.join(&other.addresses),
            change: self.change.join(other.change),
            deps: self.deps.join(&other.deps),
        }
    }

    /// A copy with a different change and provenance.
    pub fn with(&self, change: Change, deps: Dependencies) -> BValue {
        BValue {
            change,
            deps,
            ..self.clone()
        }
    }

    pub fn is_undefined(&self) -> bool {
        self.undefined.is_top() && self.is_otherwise_bottom(|v| v.undefined = Undefined::Bottom)
    }

    pub fn is_null(&self) -> bool {
        self.null.is_top() && self.is_otherwise_bottom(|v| v.null = Null::Bottom)
    }

    pub fn is_address(&self) -> bool {
        !self.addresses.is_bottom()
            && self.is_otherwise_bottom(|v| v.addresses = Addresses::Bottom)
    }

    /// Whether the value is only ever the empty string.
    pub fn is_blank(&self) -> bool {
        self.str_.kind == super::StrKind::BLANK
            && self.is_otherwise_bottom(|v| v.str_ = Str::bottom())
    }

    fn is_otherwise_bottom(&self, clear: impl FnOnce(&mut BValue)) -> bool {
        let mut v = BValue {
            change: Change::Bottom,
            deps: Dependencies::bottom(),
            ..self.clone()
        };
        clear(&mut v);
        v == BValue::bottom()
    }

    /// The part of the value that converts to `true`.
    pub fn truthy(&self) -> BValue {
        BValue {
            str_: self.str_.truthy(),
            num: self.num.truthy(),
            bool_: self.bool_.truthy(),
            null: Null::Bottom,
            undefined: Undefined::Bottom,
            addresses: self.addresses.clone(),
            change: self.change,
            deps: self.deps.clone(),
        }
    }

    /// The part of the value that converts to `false`.
    pub fn falsy(&self) -> BValue {
        BValue {
            str_: self.str_.falsy(),
            num: self.num.falsy(),
            bool_: self.bool_.falsy(),
            null: self.null,
            undefined: self.undefined,
            addresses: Addresses::Bottom,
            change: self.change,
            deps: self.deps.clone(),
        }
    }
}

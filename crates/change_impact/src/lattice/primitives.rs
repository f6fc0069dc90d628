//! Primitive sub-lattices.
//!
//! `Str` and `Num` are powersets of a few disjoint categories, optionally
//! refined to one exact value when that is all a value can be. Joining two
//! different elements keeps the union of their categories and forgets the
//! exact value.

use bitflags::bitflags;

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct StrKind: u8 {
        /// Strings that parse as numbers.
        const NUM = 1 << 0;
        /// The empty string.
        const BLANK = 1 << 1;
        /// Property names with special runtime meaning.
        const SPL = 1 << 2;
        const OTHER = 1 << 3;
    }
}

impl StrKind {
    pub const SBLANK: StrKind = StrKind::BLANK;
    pub const SNOTBLANK: StrKind = StrKind::NUM.union(StrKind::SPL).union(StrKind::OTHER);
    pub const SNUM: StrKind = StrKind::NUM;
    pub const SNOTNUMNORSPL: StrKind = StrKind::OTHER;
    pub const SSPL: StrKind = StrKind::SPL;
    pub const SNOTSPL: StrKind = StrKind::NUM.union(StrKind::OTHER).union(StrKind::BLANK);
    pub const SNOTNUM: StrKind = StrKind::OTHER.union(StrKind::SPL).union(StrKind::BLANK);
}

const SPECIAL_NAMES: &[&str] = &[
    "length",
    "prototype",
    "constructor",
    "__proto__",
    "arguments",
    "caller",
    "toString",
    "valueOf",
];

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Str {
    pub kind: StrKind,
    /// Set only when the value is known exactly.
    pub value: Option<String>,
}

impl Str {
    pub fn bottom() -> Self {
        Self {
            kind: StrKind::empty(),
            value: None,
        }
    }

    pub fn top() -> Self {
        Self {
            kind: StrKind::all(),
            value: None,
        }
    }

    pub fn of_kind(kind: StrKind) -> Self {
        Self { kind, value: None }
    }

    /// The abstraction of a string literal.
    pub fn inject(value: &str) -> Self {
        if value.is_empty() {
            return Self::of_kind(StrKind::BLANK);
        }
        let kind = if value.trim().parse::<f64>().is_ok() {
            StrKind::NUM
        } else if SPECIAL_NAMES.contains(&value) {
            StrKind::SPL
        } else {
            StrKind::OTHER
        };
        Self {
            kind,
            value: Some(value.to_string()),
        }
    }

    pub fn is_bottom(&self) -> bool {
        self.kind.is_empty()
    }

    /// Whether every concrete value is `""`, or there is none.
    pub fn is_blank_or_bottom(&self) -> bool {
        StrKind::BLANK.contains(self.kind)
    }

    pub fn join(&self, other: &Str) -> Str {
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() || self == other {
            return self.clone();
        }
        Str::of_kind(self.kind | other.kind)
    }

    /// The part of `self` that converts to `true`.
    pub fn truthy(&self) -> Str {
        self.restrict(StrKind::SNOTBLANK)
    }

    /// The part of `self` that converts to `false`.
    pub fn falsy(&self) -> Str {
        self.restrict(StrKind::SBLANK)
    }

    pub fn restrict(&self, kind: StrKind) -> Str {
        let kind = self.kind & kind;
        if kind == self.kind {
            self.clone()
        } else {
            Str::of_kind(kind)
        }
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct NumKind: u8 {
        const ZERO = 1 << 0;
        const NAN = 1 << 1;
        const NEG_INF = 1 << 2;
        const POS_INF = 1 << 3;
        const FINITE_NONZERO = 1 << 4;
    }
}

impl NumKind {
    pub const REAL: NumKind = NumKind::ZERO.union(NumKind::FINITE_NONZERO);
    pub const NOT_NAN: NumKind = NumKind::NAN.complement();
    pub const NOT_ZERO: NumKind = NumKind::ZERO.complement();
    pub const NOT_ZERO_NOR_NAN: NumKind = NumKind::ZERO.union(NumKind::NAN).complement();
    pub const NAN_ZERO: NumKind = NumKind::NAN.union(NumKind::ZERO);
}

#[derive(Clone, Debug, PartialEq)]
pub struct Num {
    pub kind: NumKind,
    /// Set only when the value is a known finite non-zero number.
    pub value: Option<f64>,
}

impl Num {
    pub fn bottom() -> Self {
        Self {
            kind: NumKind::empty(),
            value: None,
        }
    }

    pub fn top() -> Self {
        Self {
            kind: NumKind::all(),
            value: None,
        }
    }

    pub fn of_kind(kind: NumKind) -> Self {
        Self { kind, value: None }
    }

    /// The abstraction of a number literal.
    pub fn inject(value: f64) -> Self {
        if value == 0.0 {
            Num::of_kind(NumKind::ZERO)
        } else if value.is_nan() {
            Num::of_kind(NumKind::NAN)
        } else if value == f64::INFINITY {
            Num::of_kind(NumKind::POS_INF)
        } else if value == f64::NEG_INFINITY {
            Num::of_kind(NumKind::NEG_INF)
        } else {
            Num {
                kind: NumKind::FINITE_NONZERO,
                value: Some(value),
            }
        }
    }

    pub fn is_bottom(&self) -> bool {
        self.kind.is_empty()
    }

    pub fn join(&self, other: &Num) -> Num {
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() || self == other {
            return self.clone();
        }
        Num::of_kind(self.kind | other.kind)
    }

    pub fn truthy(&self) -> Num {
        self.restrict(NumKind::NOT_ZERO_NOR_NAN)
    }

    pub fn falsy(&self) -> Num {
        self.restrict(NumKind::NAN_ZERO)
    }

    pub fn restrict(&self, kind: NumKind) -> Num {
        let kind = self.kind & kind;
        if kind == self.kind {
            self.clone()
        } else {
            Num::of_kind(kind)
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Bool {
    Bottom,
    True,
    False,
    Top,
}

impl Bool {
    pub fn inject(value: bool) -> Self {
        if value {
            Bool::True
        } else {
            Bool::False
        }
    }

    pub fn join(self, other: Bool) -> Bool {
        match (self, other) {
            (Bool::Bottom, x) | (x, Bool::Bottom) => x,
            (a, b) if a == b => a,
            _ => Bool::Top,
        }
    }

    fn meet(self, other: Bool) -> Bool {
        match (self, other) {
            (Bool::Top, x) | (x, Bool::Top) => x,
            (a, b) if a == b => a,
            _ => Bool::Bottom,
        }
    }

    pub fn truthy(self) -> Bool {
        self.meet(Bool::True)
    }

    pub fn falsy(self) -> Bool {
        self.meet(Bool::False)
    }
}

macro_rules! two_point {
    ($name:ident) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            Bottom,
            Top,
        }

        impl $name {
            pub fn join(self, other: $name) -> $name {
                if self == $name::Top || other == $name::Top {
                    $name::Top
                } else {
                    $name::Bottom
                }
            }

            pub fn is_top(self) -> bool {
                self == $name::Top
            }
        }
    };
}

two_point!(Null);
two_point!(Undefined);

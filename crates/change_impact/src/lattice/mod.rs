//! The product lattice tracked for every abstract value.

pub use self::{
    addresses::{Addresses, MAX_ADDRESSES},
    bvalue::BValue,
    change::Change,
    dependencies::{Criterion, CriterionType, Dependencies},
    primitives::{Bool, Null, Num, NumKind, Str, StrKind, Undefined},
};

mod addresses;
mod bvalue;
mod change;
mod dependencies;
mod primitives;

#[cfg(test)]
mod tests;

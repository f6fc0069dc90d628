use crate::trace::Address;
use rustc_hash::FxHashSet;

/// Sets larger than this collapse to [Addresses::Top].
pub const MAX_ADDRESSES: usize = 10;

/// The objects a value may reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Addresses {
    Bottom,
    Set(FxHashSet<Address>),
    Top,
}

impl Default for Addresses {
    fn default() -> Self {
        Addresses::Bottom
    }
}

impl Addresses {
    pub fn single(addr: Address) -> Self {
        let mut set = FxHashSet::default();
        set.insert(addr);
        Addresses::Set(set)
    }

    pub fn from_set(set: FxHashSet<Address>) -> Self {
        if set.is_empty() {
            Addresses::Bottom
        } else if set.len() > MAX_ADDRESSES {
            Addresses::Top
        } else {
            Addresses::Set(set)
        }
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, Addresses::Bottom)
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Addresses::Top)
    }

    /// The single member, if there is exactly one.
    pub fn as_single(&self) -> Option<&Address> {
        match self {
            Addresses::Set(set) if set.len() == 1 => set.iter().next(),
            _ => None,
        }
    }

    /// The members of a finite set. Empty for bottom and top.
    pub fn iter(&self) -> impl Iterator<Item = &Address> + '_ {
        let set = match self {
            Addresses::Set(set) => Some(set),
            _ => None,
        };
        set.into_iter().flatten()
    }

    pub fn join(&self, other: &Addresses) -> Addresses {
        match (self, other) {
            (Addresses::Bottom, x) | (x, Addresses::Bottom) => x.clone(),
            (Addresses::Top, _) | (_, Addresses::Top) => Addresses::Top,
            (Addresses::Set(a), Addresses::Set(b)) => {
                Addresses::from_set(a.union(b).cloned().collect())
            }
        }
    }
}

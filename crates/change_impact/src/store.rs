use crate::{
    error::{AnalysisError, Result},
    lattice::{Addresses, BValue},
    object::Obj,
    trace::Address,
};
use rustc_hash::FxHashMap;
use tracing::debug;

/// How a write combines with the value already stored.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MergeMode {
    /// Replace the old value. Only legal for a single target address.
    Strong,
    /// Join into the old value.
    Weak,
}

/// The abstract heap.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Store {
    values: FxHashMap<Address, BValue>,
    objects: FxHashMap<Address, Obj>,
}

impl Store {
    /// Allocates `value` at `addr`, joining with any value already there.
    pub fn alloc(&mut self, addr: Address, value: BValue) {
        match self.values.get_mut(&addr) {
            Some(old) => *old = old.join(&value),
            None => {
                self.values.insert(addr, value);
            }
        }
    }

    pub fn alloc_obj(&mut self, addr: Address, obj: Obj) {
        match self.objects.get_mut(&addr) {
            Some(old) => *old = old.join(&obj),
            None => {
                self.objects.insert(addr, obj);
            }
        }
    }

    pub fn contains(&self, addr: &Address) -> bool {
        self.values.contains_key(addr)
    }

    pub fn apply(&self, addr: &Address) -> Result<&BValue> {
        self.values
            .get(addr)
            .ok_or_else(|| AnalysisError::UnallocatedAddress(addr.clone()))
    }

    /// The join of the values at every address in `addrs`.
    pub fn apply_set(&self, addrs: &Addresses) -> Result<BValue> {
        let mut result = BValue::bottom();
        for addr in addrs.iter() {
            result = result.join(self.apply(addr)?);
        }
        Ok(result)
    }

    pub fn get_obj(&self, addr: &Address) -> Option<&Obj> {
        self.objects.get(addr)
    }

    pub fn get_obj_mut(&mut self, addr: &Address) -> Option<&mut Obj> {
        self.objects.get_mut(addr)
    }

    /// Writes `value` to every address in `addrs`.
    ///
    /// A strong update only happens for a single address under
    /// [MergeMode::Strong]. Every other write joins. A write through
    /// [Addresses::Top] has no known target and is dropped.
    pub fn update(&mut self, addrs: &Addresses, value: &BValue, mode: MergeMode) -> Result<()> {
        if addrs.is_top() {
            debug!(change = ?value.change, "dropping write to an unknown address");
            return Ok(());
        }
        if let (MergeMode::Strong, Some(addr)) = (mode, addrs.as_single()) {
            match self.values.get_mut(addr) {
                Some(old) => *old = value.clone(),
                None => return Err(AnalysisError::UnallocatedAddress(addr.clone())),
            }
            return Ok(());
        }
        for addr in addrs.iter() {
            match self.values.get_mut(addr) {
                Some(old) => *old = old.join(value),
                None => return Err(AnalysisError::UnallocatedAddress(addr.clone())),
            }
        }
        Ok(())
    }

    pub fn join(&self, other: &Store) -> Store {
        let mut result = self.clone();
        for (addr, value) in &other.values {
            result.alloc(addr.clone(), value.clone());
        }
        for (addr, obj) in &other.objects {
            result.alloc_obj(addr.clone(), obj.clone());
        }
        result
    }

    pub fn values(&self) -> impl Iterator<Item = (&Address, &BValue)> + '_ {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lattice::{Change, Criterion, CriterionType, Num},
        trace::Trace,
    };
    use ast::NodeId;
    use pretty_assertions::assert_eq;

    fn num(v: f64, dep: u32) -> BValue {
        BValue::of_num(
            Num::inject(v),
            Change::Unchanged,
            std::iter::once(Criterion::new(CriterionType::Value, NodeId(dep))).collect(),
        )
    }

    #[test]
    fn test_unallocated_read_faults() {
        let store = Store::default();
        let addr = Trace::root(NodeId(0)).make_addr(NodeId(1), "");
        assert_eq!(
            store.apply(&addr),
            Err(AnalysisError::UnallocatedAddress(addr.clone()))
        );
    }

    #[test]
    fn test_strong_update_replaces() {
        let mut store = Store::default();
        let addr = Trace::root(NodeId(0)).make_addr(NodeId(1), "");
        store.alloc(addr.clone(), num(1.0, 1));
        store
            .update(&Addresses::single(addr.clone()), &num(2.0, 2), MergeMode::Strong)
            .unwrap();
        assert_eq!(store.apply(&addr).unwrap(), &num(2.0, 2));
    }

    #[test]
    fn test_weak_update_joins() {
        let mut store = Store::default();
        let addr = Trace::root(NodeId(0)).make_addr(NodeId(1), "");
        store.alloc(addr.clone(), num(1.0, 1));
        store
            .update(&Addresses::single(addr.clone()), &num(2.0, 2), MergeMode::Weak)
            .unwrap();
        let expected = num(1.0, 1).join(&num(2.0, 2));
        assert_eq!(store.apply(&addr).unwrap(), &expected);
        assert_eq!(expected.deps.len(), 2);
    }

    #[test]
    fn test_weak_update_idempotent() {
        let mut store = Store::default();
        let addr = Trace::root(NodeId(0)).make_addr(NodeId(1), "");
        let addrs = Addresses::single(addr.clone());
        store.alloc(addr.clone(), num(1.0, 1));
        store.update(&addrs, &num(2.0, 2), MergeMode::Weak).unwrap();
        let once = store.clone();
        store.update(&addrs, &num(2.0, 2), MergeMode::Weak).unwrap();
        assert_eq!(store, once);
    }

    #[test]
    fn test_strong_mode_with_many_addresses_is_weak() {
        let mut store = Store::default();
        let t = Trace::root(NodeId(0));
        let (a, b) = (t.make_addr(NodeId(1), ""), t.make_addr(NodeId(2), ""));
        store.alloc(a.clone(), num(1.0, 1));
        store.alloc(b.clone(), num(1.0, 1));
        let both = Addresses::single(a.clone()).join(&Addresses::single(b));
        store.update(&both, &num(2.0, 2), MergeMode::Strong).unwrap();
        assert_eq!(store.apply(&a).unwrap(), &num(1.0, 1).join(&num(2.0, 2)));
    }

    #[test]
    fn test_write_to_unknown_address_leaves_store_unchanged() {
        let mut store = Store::default();
        let addr = Trace::root(NodeId(0)).make_addr(NodeId(1), "");
        store.alloc(addr.clone(), num(1.0, 1));
        let before = store.clone();
        store
            .update(&Addresses::Top, &num(2.0, 2), MergeMode::Strong)
            .unwrap();
        assert_eq!(store, before);
    }

    #[test]
    fn test_apply_set_joins() {
        let mut store = Store::default();
        let t = Trace::root(NodeId(0));
        let (a, b) = (t.make_addr(NodeId(1), ""), t.make_addr(NodeId(2), ""));
        store.alloc(a.clone(), num(1.0, 1));
        store.alloc(b.clone(), num(2.0, 2));
        let both = Addresses::single(a).join(&Addresses::single(b));
        let v = store.apply_set(&both).unwrap();
        assert_eq!(v, num(1.0, 1).join(&num(2.0, 2)));
    }
}

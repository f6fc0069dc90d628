use crate::{
    checker::{Checker, CheckerState},
    environment::Environment,
    lattice::{Addresses, BValue, Change, Dependencies},
    store::Store,
    trace::{Address, Trace},
};
use ast::NodeId;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use std::rc::Rc;

/// Values that live outside the store for the duration of one function.
#[derive(Clone, Debug, PartialEq)]
pub struct Scratchpad {
    /// Joined value of every `return` reached so far.
    pub return_value: BValue,
    /// The arguments object of the current call.
    pub args: Addresses,
    /// The value each call expression evaluated to.
    pub calls: FxHashMap<NodeId, BValue>,
}

impl Scratchpad {
    pub fn new(args: Addresses) -> Self {
        Self {
            return_value: BValue::bottom(),
            args,
            calls: FxHashMap::default(),
        }
    }

    pub fn join(&self, other: &Scratchpad) -> Scratchpad {
        let mut calls = self.calls.clone();
        for (id, value) in &other.calls {
            match calls.get_mut(id) {
                Some(mine) => *mine = mine.join(value),
                None => {
                    calls.insert(*id, value.clone());
                }
            }
        }
        Scratchpad {
            return_value: self.return_value.join(&other.return_value),
            args: self.args.join(&other.args),
            calls,
        }
    }
}

/// A branch taken on the value of the condition at node `id`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Condition {
    pub id: NodeId,
    pub negated: bool,
}

impl Condition {
    pub fn negate(self) -> Condition {
        Condition {
            id: self.id,
            negated: !self.negated,
        }
    }
}

/// Whether the current function runs because of a changed call.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlCall {
    pub change: Change,
    pub deps: Dependencies,
}

impl ControlCall {
    pub fn unchanged() -> Self {
        Self {
            change: Change::Unchanged,
            deps: Dependencies::bottom(),
        }
    }

    pub fn join(&self, other: &ControlCall) -> ControlCall {
        ControlCall {
            change: self.change.join(other.change),
            deps: self.deps.join(&other.deps),
        }
    }
}

/// The changed branch conditions the current program point depends on.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControlCondition {
    pub conditions: BTreeSet<Condition>,
    /// The sibling of every condition taken. Reaching a point through both a
    /// condition and its sibling makes the point independent of it.
    pub neg_conditions: BTreeSet<Condition>,
}

impl ControlCondition {
    pub fn branch(&self, cond: Condition) -> ControlCondition {
        let mut result = self.clone();
        result.conditions.remove(&cond.negate());
        result.conditions.insert(cond);
        result.neg_conditions.insert(cond.negate());
        result
    }

    pub fn join(&self, other: &ControlCondition) -> ControlCondition {
        let conditions = self
            .conditions
            .union(&other.conditions)
            .filter(|c| {
                !(self.neg_conditions.contains(c) && other.conditions.contains(c))
                    && !(other.neg_conditions.contains(c) && self.conditions.contains(c))
            })
            .copied()
            .collect();
        ControlCondition {
            conditions,
            neg_conditions: self
                .neg_conditions
                .union(&other.neg_conditions)
                .copied()
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Control {
    pub call: ControlCall,
    pub condition: ControlCondition,
}

impl Control {
    pub fn new(call: ControlCall) -> Self {
        Self {
            call,
            condition: ControlCondition::default(),
        }
    }

    pub fn join(&self, other: &Control) -> Control {
        Control {
            call: self.call.join(&other.call),
            condition: self.condition.join(&other.condition),
        }
    }
}

/// The abstract state at one program point.
#[derive(Clone, Debug)]
pub struct State {
    pub env: Rc<Environment>,
    pub store: Store,
    pub scratch: Scratchpad,
    pub trace: Trace,
    pub control: Control,
    /// The value of `this`.
    pub self_addr: Addresses,
    pub checkers: Vec<Checker>,
}

impl State {
    pub fn join(&self, other: &State) -> State {
        let env = if Rc::ptr_eq(&self.env, &other.env) {
            self.env.clone()
        } else {
            Rc::new(self.env.join(&other.env))
        };
        let checkers = self
            .checkers
            .iter()
            .zip(&other.checkers)
            .map(|(a, b)| a.join(b))
            .collect();
        State {
            env,
            store: self.store.join(&other.store),
            scratch: self.scratch.join(&other.scratch),
            trace: self.trace,
            control: self.control.join(&other.control),
            self_addr: self.self_addr.join(&other.self_addr),
            checkers,
        }
    }

    /// Addresses reachable from the environment, `this` and the arguments
    /// object, following object properties.
    pub fn reachable(&self) -> FxHashSet<Address> {
        let mut seen = FxHashSet::default();
        let mut worklist: Vec<Address> = self
            .env
            .addresses()
            .chain(self.self_addr.iter())
            .chain(self.scratch.args.iter())
            .cloned()
            .collect();
        while let Some(addr) = worklist.pop() {
            if !seen.insert(addr.clone()) {
                continue;
            }
            if let Ok(value) = self.store.apply(&addr) {
                worklist.extend(value.addresses.iter().cloned());
            }
            if let Some(obj) = self.store.get_obj(&addr) {
                worklist.extend(obj.external.values().map(|p| p.address.clone()));
                worklist.extend(obj.internal.prototype.addresses.iter().cloned());
            }
        }
        seen
    }

    /// Whether two entry states of a function would produce the same
    /// analysis: equal bindings, equal control, and equal store contents at
    /// every reachable address.
    pub fn equivalent_entry(&self, other: &State) -> bool {
        if self.env != other.env
            || self.control != other.control
            || self.self_addr != other.self_addr
            || self.scratch.args != other.scratch.args
            || !self.checkers_equivalent(other)
        {
            return false;
        }
        let reachable = self.reachable();
        if reachable != other.reachable() {
            return false;
        }
        reachable.iter().all(|addr| {
            self.store.apply(addr).ok() == other.store.apply(addr).ok()
                && self.store.get_obj(addr) == other.store.get_obj(addr)
        })
    }

    fn checkers_equivalent(&self, other: &State) -> bool {
        self.checkers.len() == other.checkers.len()
            && self
                .checkers
                .iter()
                .zip(&other.checkers)
                .all(|(a, b)| a.equivalent_to(b))
    }
}

impl PartialEq for State {
    fn eq(&self, other: &State) -> bool {
        self.env == other.env
            && self.store == other.store
            && self.scratch == other.scratch
            && self.control == other.control
            && self.self_addr == other.self_addr
            && self.checkers_equivalent(other)
    }
}

use crate::lattice::{Addresses, Change, Dependencies};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// A binding of a name to the addresses that hold its value.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub name: String,
    pub addresses: Addresses,
    /// Whether the binding itself (not its value) differs between versions.
    pub change: Change,
    pub deps: Dependencies,
}

impl Variable {
    pub fn join(&self, other: &Variable) -> Variable {
        Variable {
            name: self.name.clone(),
            addresses: self.addresses.join(&other.addresses),
            change: self.change.join(other.change),
            deps: self.deps.join(&other.deps),
        }
    }
}

/// Lexical scope. Lookups that miss fall through to the enclosing scope.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Environment {
    vars: FxHashMap<String, Variable>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new(parent: Option<Rc<Environment>>) -> Self {
        Self {
            vars: FxHashMap::default(),
            parent,
        }
    }

    pub fn parent(&self) -> Option<&Rc<Environment>> {
        self.parent.as_ref()
    }

    pub fn apply(&self, name: &str) -> Option<&Variable> {
        match self.vars.get(name) {
            Some(var) => Some(var),
            None => self.parent.as_ref().and_then(|p| p.apply(name)),
        }
    }

    /// Whether `name` is bound in this scope, ignoring enclosing ones.
    pub fn is_local(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Replaces the binding of `var.name` in this scope.
    pub fn strong_update(&mut self, var: Variable) {
        self.vars.insert(var.name.clone(), var);
    }

    /// Joins the bindings of both environments, variable by variable.
    pub fn join(&self, other: &Environment) -> Environment {
        let mut vars = self.vars.clone();
        for (name, var) in &other.vars {
            match vars.get_mut(name) {
                Some(mine) => *mine = mine.join(var),
                None => {
                    vars.insert(name.clone(), var.clone());
                }
            }
        }
        let parent = match (&self.parent, &other.parent) {
            (Some(a), Some(b)) if !Rc::ptr_eq(a, b) && a != b => Some(Rc::new(a.join(b))),
            (Some(p), _) | (None, Some(p)) => Some(p.clone()),
            (None, None) => None,
        };
        Environment { vars, parent }
    }

    /// Every address reachable through a binding, enclosing scopes included.
    pub fn addresses(&self) -> impl Iterator<Item = &crate::trace::Address> + '_ {
        let mut scopes: Vec<&Environment> = vec![self];
        let mut current = self;
        while let Some(parent) = &current.parent {
            current = &**parent;
            scopes.push(current);
        }
        scopes
            .into_iter()
            .flat_map(|s| s.vars.values())
            .flat_map(|v| v.addresses.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::Trace;
    use ast::NodeId;
    use pretty_assertions::assert_eq;

    fn var(name: &str, site: u32, change: Change) -> Variable {
        Variable {
            name: name.to_string(),
            addresses: Addresses::single(Trace::root(NodeId(0)).make_addr(NodeId(site), "")),
            change,
            deps: Dependencies::bottom(),
        }
    }

    #[test]
    fn test_lookup_falls_through_to_parent() {
        let mut global = Environment::default();
        global.strong_update(var("g", 1, Change::Unchanged));
        let mut local = Environment::new(Some(Rc::new(global)));
        local.strong_update(var("l", 2, Change::Unchanged));
        assert_eq!(local.apply("g"), Some(&var("g", 1, Change::Unchanged)));
        assert_eq!(local.apply("l"), Some(&var("l", 2, Change::Unchanged)));
        assert_eq!(local.apply("missing"), None);
        assert!(!local.is_local("g"));
    }

    #[test]
    fn test_join_is_variable_wise() {
        let mut a = Environment::default();
        a.strong_update(var("x", 1, Change::Unchanged));
        let mut b = Environment::default();
        b.strong_update(var("x", 2, Change::Changed));
        b.strong_update(var("y", 3, Change::Unchanged));
        let joined = a.join(&b);
        let x = joined.apply("x").unwrap();
        assert_eq!(x.change, Change::Top);
        assert_eq!(x.addresses.iter().count(), 2);
        assert!(joined.apply("y").is_some());
    }
}

use crate::{environment::Environment, lattice::BValue, trace::Address, trace::JsClass};
use ast::NodeId;
use indexmap::IndexMap;
use std::rc::Rc;

/// A named slot of an object. The value lives in the store at `address`.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    /// The node that defined the property.
    pub definer: NodeId,
    pub name: String,
    pub address: Address,
}

/// A function together with the environment it was created in.
#[derive(Clone, Debug, PartialEq)]
pub struct Closure {
    pub function: NodeId,
    pub env: Rc<Environment>,
}

impl Closure {
    pub fn join(&self, other: &Closure) -> Closure {
        if Rc::ptr_eq(&self.env, &other.env) {
            return self.clone();
        }
        Closure {
            function: self.function,
            env: Rc::new(self.env.join(&other.env)),
        }
    }
}

/// Properties the runtime keeps on an object but a program cannot name.
#[derive(Clone, Debug, PartialEq)]
pub struct InternalProperties {
    pub prototype: BValue,
    pub class: JsClass,
    pub closure: Option<Closure>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Obj {
    pub external: IndexMap<String, Property>,
    pub internal: InternalProperties,
}

impl Obj {
    pub fn new(class: JsClass, prototype: BValue, closure: Option<Closure>) -> Self {
        Self {
            external: IndexMap::new(),
            internal: InternalProperties {
                prototype,
                class,
                closure,
            },
        }
    }

    /// The address of property `prop`, if the object has it.
    pub fn apply(&self, prop: &str) -> Option<&Address> {
        self.external.get(prop).map(|p| &p.address)
    }

    pub fn define(&mut self, definer: NodeId, name: &str, address: Address) {
        self.external.insert(
            name.to_string(),
            Property {
                definer,
                name: name.to_string(),
                address,
            },
        );
    }

    pub fn join(&self, other: &Obj) -> Obj {
        let mut external = self.external.clone();
        for (name, prop) in &other.external {
            external.entry(name.clone()).or_insert_with(|| prop.clone());
        }
        let closure = match (&self.internal.closure, &other.internal.closure) {
            (Some(a), Some(b)) => Some(a.join(b)),
            (Some(c), None) | (None, Some(c)) => Some(c.clone()),
            (None, None) => None,
        };
        Obj {
            external,
            internal: InternalProperties {
                prototype: self.internal.prototype.join(&other.internal.prototype),
                class: self.internal.class,
                closure,
            },
        }
    }
}

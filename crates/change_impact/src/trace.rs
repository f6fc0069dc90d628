//! Heap addressing.
//!
//! An [Address] is a composite key: the analysis context it was allocated in,
//! the allocation site, a per-class offset and a property name. Contexts are
//! call-site node ids, so the number of distinct addresses is bounded by the
//! size of the program.

use crate::{environment::Environment, lattice::Addresses, store::Store};
use ast::NodeId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    pub context: NodeId,
    pub site: NodeId,
    pub class: u8,
    pub prop: String,
}

impl Address {
    /// The fixed address of a built-in object.
    pub fn builtin(class: JsClass) -> Address {
        Address {
            context: NodeId::DUMMY,
            site: NodeId::DUMMY,
            class: class.offset(),
            prop: String::new(),
        }
    }
}

/**
 * The runtime class of an abstract object. Objects of different classes
 * allocated at the same site receive different addresses.
 */
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum JsClass {
    Object,
    Function,
    Arguments,
    Array,
    Global,
    ObjectPrototype,
    FunctionPrototype,
    ArgumentsPrototype,
    ArrayPrototype,
}

impl JsClass {
    pub const ALL: [JsClass; 9] = [
        JsClass::Object,
        JsClass::Function,
        JsClass::Arguments,
        JsClass::Array,
        JsClass::Global,
        JsClass::ObjectPrototype,
        JsClass::FunctionPrototype,
        JsClass::ArgumentsPrototype,
        JsClass::ArrayPrototype,
    ];

    pub fn offset(self) -> u8 {
        match self {
            JsClass::Object => 0,
            JsClass::Function => 1,
            JsClass::Arguments => 2,
            JsClass::Array => 3,
            JsClass::Global => 4,
            JsClass::ObjectPrototype => 5,
            JsClass::FunctionPrototype => 6,
            JsClass::ArgumentsPrototype => 7,
            JsClass::ArrayPrototype => 8,
        }
    }

    /// The built-in prototype objects of this class are allocated from.
    pub fn prototype(self) -> Option<JsClass> {
        match self {
            JsClass::Object | JsClass::Global => Some(JsClass::ObjectPrototype),
            JsClass::Function => Some(JsClass::FunctionPrototype),
            JsClass::Arguments => Some(JsClass::ArgumentsPrototype),
            JsClass::Array => Some(JsClass::ArrayPrototype),
            JsClass::FunctionPrototype
            | JsClass::ArgumentsPrototype
            | JsClass::ArrayPrototype => Some(JsClass::ObjectPrototype),
            JsClass::ObjectPrototype => None,
        }
    }
}

/// Flow-sensitive, context-insensitive trace.
///
/// Intraprocedural steps only move the program point. A call replaces the
/// whole context with the call site, so every call through one site shares a
/// context.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Trace {
    pub context: NodeId,
    pub pp: NodeId,
}

impl Trace {
    /// The trace at the start of a script.
    pub fn root(script: NodeId) -> Self {
        Self {
            context: script,
            pp: script,
        }
    }

    pub fn update(&self, pp: NodeId) -> Trace {
        Trace {
            context: self.context,
            pp,
        }
    }

    /// The trace of a callee invoked from `call`. Caller history is discarded.
    pub fn update_call(
        &self,
        _env: &Environment,
        _store: &Store,
        _self_addr: &Addresses,
        call: NodeId,
    ) -> Trace {
        Trace {
            context: call,
            pp: call,
        }
    }

    /// An address at the current program point.
    pub fn to_addr(&self, prop: &str) -> Address {
        Address {
            context: self.context,
            site: self.pp,
            class: JsClass::Object.offset(),
            prop: prop.to_string(),
        }
    }

    /// An address for the declaration or allocation site `id`.
    ///
    /// Independent of the program point, so lookups made anywhere in the
    /// function agree with the address the site was allocated at.
    pub fn make_addr(&self, id: NodeId, prop: &str) -> Address {
        Address {
            context: self.context,
            site: id,
            class: JsClass::Object.offset(),
            prop: prop.to_string(),
        }
    }

    pub fn mod_addr(addr: &Address, class: JsClass) -> Address {
        Address {
            class: class.offset(),
            ..addr.clone()
        }
    }
}

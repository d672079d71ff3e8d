//! Type-level insertion capability.
//!
//! An `AdderSlot` is the one mutable cell a container type exposes: the
//! operation that construction resolves by name. It can be reassigned at
//! any time, including from inside a running adder. A construction reads
//! it exactly once and keeps its own `Rc` to whatever it found.

use crate::error::ConstructError;
use crate::invoke::{Adder, Invocable};
use core::cell::RefCell;
use core::fmt;
use std::rc::Rc;

/// What a slot currently holds.
pub enum Capability<C, K, V, E> {
    /// Nothing assigned.
    Absent,
    /// A value that exists but cannot be invoked; `found` names its type.
    Uncallable { found: &'static str },
    Callable(Adder<C, K, V, E>),
}

impl<C, K, V, E> Capability<C, K, V, E> {
    fn describe(&self) -> &'static str {
        match self {
            Capability::Absent => "undefined",
            Capability::Uncallable { found } => *found,
            Capability::Callable(_) => "function",
        }
    }
}

impl<C, K, V, E> Clone for Capability<C, K, V, E> {
    fn clone(&self) -> Self {
        match self {
            Capability::Absent => Capability::Absent,
            Capability::Uncallable { found } => Capability::Uncallable { found: *found },
            Capability::Callable(a) => Capability::Callable(Rc::clone(a)),
        }
    }
}

impl<C, K, V, E> fmt::Debug for Capability<C, K, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Absent => f.write_str("Absent"),
            Capability::Uncallable { found } => {
                f.debug_struct("Uncallable").field("found", found).finish()
            }
            Capability::Callable(a) => f
                .debug_tuple("Callable")
                .field(&Rc::as_ptr(a).cast::<()>())
                .finish(),
        }
    }
}

pub struct AdderSlot<C, K, V, E> {
    name: &'static str,
    current: RefCell<Capability<C, K, V, E>>,
}

impl<C, K, V, E> AdderSlot<C, K, V, E> {
    pub fn new(name: &'static str, initial: Capability<C, K, V, E>) -> Self {
        Self {
            name,
            current: RefCell::new(initial),
        }
    }

    pub fn with_adder<A>(name: &'static str, adder: A) -> Self
    where
        A: Invocable<C, K, V, E> + 'static,
    {
        Self::new(name, Capability::Callable(Rc::new(adder)))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Snapshot of the current capability.
    pub fn current(&self) -> Capability<C, K, V, E> {
        self.current.borrow().clone()
    }

    pub fn set<A>(&self, adder: A)
    where
        A: Invocable<C, K, V, E> + 'static,
    {
        self.replace(Capability::Callable(Rc::new(adder)));
    }

    pub fn set_shared(&self, adder: Adder<C, K, V, E>) {
        self.replace(Capability::Callable(adder));
    }

    pub fn set_uncallable(&self, found: &'static str) {
        self.replace(Capability::Uncallable { found });
    }

    pub fn clear(&self) {
        self.replace(Capability::Absent);
    }

    /// Swap in a new capability and return the old one.
    ///
    /// The old value is dropped by the caller, outside the borrow, so a
    /// `Drop` impl that touches this slot again does not panic.
    pub fn replace(&self, next: Capability<C, K, V, E>) -> Capability<C, K, V, E> {
        self.current.replace(next)
    }

    /// Resolve the slot to an invocable reference.
    pub fn resolve(&self) -> Result<Adder<C, K, V, E>, ConstructError<E>> {
        let found = self.current();
        match found {
            Capability::Callable(adder) => Ok(adder),
            other => Err(ConstructError::NotCallable {
                name: self.name,
                found: other.describe(),
            }),
        }
    }
}

impl<C, K, V, E> fmt::Debug for AdderSlot<C, K, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("AdderSlot");
        d.field("name", &self.name);
        match self.current.try_borrow() {
            Ok(c) => d.field("current", &*c),
            Err(_) => d.field("current", &"<borrowed>"),
        };
        d.finish()
    }
}

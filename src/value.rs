//! Dynamic values for script-host style construction.
//!
//! `Value` covers just enough of a dynamically typed host to express the
//! inputs a constructor has to cope with: the two nullish sentinels,
//! scalars that cannot be iterated, and list-shaped entries.

use crate::error::ConstructError;
use crate::source::{Cursor, EntryLike, Source};
use core::fmt;
use std::rc::Rc;

#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Str(Rc<str>),
    List(Rc<[Value]>),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    pub fn list<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::List(items.into_iter().collect())
    }

    /// A two-element list, the canonical entry shape.
    pub fn pair(key: Value, value: Value) -> Self {
        Value::List(Rc::from([key, value]))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "object",
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Read position `i` of a list; missing positions and non-lists read as
    /// `Undefined`.
    pub fn at(&self, i: usize) -> Value {
        match self {
            Value::List(items) => items.get(i).cloned().unwrap_or_default(),
            _ => Value::Undefined,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

/// Any list reads as an entry; position 0 is the key, position 1 the value.
impl EntryLike<Value, Value> for Value {
    fn into_entry(self) -> Result<(Value, Value), &'static str> {
        match self {
            Value::List(_) => Ok((self.at(0), self.at(1))),
            other => Err(other.type_name()),
        }
    }
}

/// Cursor over the elements of a list value.
pub struct ListCursor {
    items: Rc<[Value]>,
    pos: usize,
}

impl<E> Cursor<E> for ListCursor {
    type Item = Value;

    fn advance(&mut self) -> Result<Option<Value>, E> {
        let next = self.items.get(self.pos).cloned();
        if next.is_some() {
            self.pos += 1;
        }
        Ok(next)
    }
}

impl<E> Source<Value, Value, E> for Value {
    type Item = Value;
    type Cursor = ListCursor;

    fn is_absent(&self) -> bool {
        self.is_nullish()
    }

    fn open(self) -> Result<ListCursor, ConstructError<E>> {
        match self {
            Value::List(items) => Ok(ListCursor { items, pos: 0 }),
            other => Err(ConstructError::NotIterable {
                found: other.type_name(),
            }),
        }
    }
}

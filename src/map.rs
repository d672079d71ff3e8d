//! `Map`: unique keys, last write wins.

use crate::construct::{construct, ContainerType};
use crate::entry_table::{self, EntryTable};
use crate::error::Aborted;
use crate::invoke::{adder_fn, Adder};
use crate::slot::AdderSlot;
use crate::source::Source;
use core::borrow::Borrow;
use core::convert::Infallible;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;
use std::rc::Rc;

pub struct Map<K, V, S = RandomState> {
    table: EntryTable<K, V, S>,
}

impl<K, V> Map<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            table: EntryTable::new(),
        }
    }
}

impl<K, V> Default for Map<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Map<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            table: EntryTable::with_hasher(hasher),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.contains_key(q)
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get(q)
    }

    /// The insert primitive: add `key`, or overwrite its value if present.
    /// Returns the previous value.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        self.table.upsert(key, value).1
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.remove_key(q).map(|(_, v)| v)
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }
}

impl<K, V, S> fmt::Debug for Map<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.table, f)
    }
}

/// Iterator over `(&K, &V)`; order is unspecified.
pub struct Iter<'a, K, V> {
    inner: entry_table::Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, k, v)| (k, v))
    }
}

/// The `Map` container type, carrying its reassignable `set` adder.
///
/// `E` is the error type adders installed on this type may raise; the
/// native adder never fails.
pub struct MapType<K, V, E = Infallible, S = RandomState> {
    hasher: S,
    set: Rc<AdderSlot<Map<K, V, S>, K, V, E>>,
}

impl<K, V, E> MapType<K, V, E>
where
    K: Eq + Hash + 'static,
    V: 'static,
    E: 'static,
{
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }
}

impl<K, V, E> Default for MapType<K, V, E>
where
    K: Eq + Hash + 'static,
    V: 'static,
    E: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, E, S> MapType<K, V, E, S>
where
    K: Eq + Hash + 'static,
    V: 'static,
    E: 'static,
    S: BuildHasher + Clone + 'static,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            set: Rc::new(AdderSlot::with_adder("set", Self::native_set())),
        }
    }

    /// The built-in adder: `Map::set` on the receiver.
    pub fn native_adder() -> Adder<Map<K, V, S>, K, V, E> {
        Rc::new(Self::native_set())
    }

    fn native_set() -> impl crate::invoke::Invocable<Map<K, V, S>, K, V, E> {
        adder_fn(|map: &mut Map<K, V, S>, k: K, v: V| {
            map.set(k, v);
            Ok(())
        })
    }

    /// Shared handle to the type-level `set` slot, for reassignment from
    /// anywhere, including from inside an adder.
    pub fn set_slot(&self) -> Rc<AdderSlot<Map<K, V, S>, K, V, E>> {
        Rc::clone(&self.set)
    }

    /// Build a map from `input`; see [`construct`].
    pub fn construct<I>(&self, input: I) -> Result<Map<K, V, S>, Aborted<Map<K, V, S>, E>>
    where
        I: Source<K, V, E>,
    {
        construct(self, input)
    }
}

impl<K, V, E, S> ContainerType for MapType<K, V, E, S>
where
    K: Eq + Hash,
    S: BuildHasher + Clone,
{
    type Container = Map<K, V, S>;
    type Key = K;
    type Value = V;
    type Error = E;

    fn allocate(&self) -> Map<K, V, S> {
        Map::with_hasher(self.hasher.clone())
    }

    fn adder_slot(&self) -> &AdderSlot<Map<K, V, S>, K, V, E> {
        &self.set
    }
}

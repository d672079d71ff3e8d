//! `MultiMap`: one entry per key, values accumulate in arrival order.

use crate::construct::{construct, ContainerType};
use crate::entry_table::{self, EntryTable};
use crate::error::Aborted;
use crate::invoke::{adder_fn, Adder, Invocable};
use crate::slot::AdderSlot;
use crate::source::Source;
use core::borrow::Borrow;
use core::convert::Infallible;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;
use std::rc::Rc;

pub struct MultiMap<K, V, S = RandomState> {
    table: EntryTable<K, Vec<V>, S>,
    values: usize,
}

impl<K, V> MultiMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }
}

impl<K, V> Default for MultiMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> MultiMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            table: EntryTable::with_hasher(hasher),
            values: 0,
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Number of values across all keys.
    pub fn value_count(&self) -> usize {
        self.values
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.contains_key(q)
    }

    /// Values stored under `q`, oldest first; empty if the key is absent.
    pub fn get_all<Q>(&self, q: &Q) -> &[V]
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get(q).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The insert primitive: push `value` onto the list for `key`.
    pub fn append(&mut self, key: K, value: V) {
        let h = self.table.get_or_insert_with(key, Vec::new);
        // A handle fresh from the table always resolves.
        if let Some(list) = h.value_mut(&mut self.table) {
            list.push(value);
            self.values += 1;
        }
    }

    pub fn remove_all<Q>(&mut self, q: &Q) -> Vec<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let removed = self.table.remove_key(q).map(|(_, v)| v).unwrap_or_default();
        self.values -= removed.len();
        removed
    }

    pub fn clear(&mut self) {
        self.table.clear();
        self.values = 0;
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }
}

impl<K, V, S> fmt::Debug for MultiMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.table, f)
    }
}

/// Iterator over `(&K, &[V])`; key order is unspecified.
pub struct Iter<'a, K, V> {
    inner: entry_table::Iter<'a, K, Vec<V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a [V]);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, k, v)| (k, v.as_slice()))
    }
}

/// The `MultiMap` container type with its reassignable `append` adder.
pub struct MultiMapType<K, V, E = Infallible, S = RandomState> {
    hasher: S,
    append: Rc<AdderSlot<MultiMap<K, V, S>, K, V, E>>,
}

impl<K, V, E> MultiMapType<K, V, E>
where
    K: Eq + Hash + 'static,
    V: 'static,
    E: 'static,
{
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }
}

impl<K, V, E> Default for MultiMapType<K, V, E>
where
    K: Eq + Hash + 'static,
    V: 'static,
    E: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, E, S> MultiMapType<K, V, E, S>
where
    K: Eq + Hash + 'static,
    V: 'static,
    E: 'static,
    S: BuildHasher + Clone + 'static,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            append: Rc::new(AdderSlot::with_adder("append", Self::native_append())),
        }
    }

    /// The built-in adder: `MultiMap::append` on the receiver.
    pub fn native_adder() -> Adder<MultiMap<K, V, S>, K, V, E> {
        Rc::new(Self::native_append())
    }

    fn native_append() -> impl Invocable<MultiMap<K, V, S>, K, V, E> {
        adder_fn(|m: &mut MultiMap<K, V, S>, k: K, v: V| {
            m.append(k, v);
            Ok(())
        })
    }

    pub fn append_slot(&self) -> Rc<AdderSlot<MultiMap<K, V, S>, K, V, E>> {
        Rc::clone(&self.append)
    }

    pub fn construct<I>(
        &self,
        input: I,
    ) -> Result<MultiMap<K, V, S>, Aborted<MultiMap<K, V, S>, E>>
    where
        I: Source<K, V, E>,
    {
        construct(self, input)
    }
}

impl<K, V, E, S> ContainerType for MultiMapType<K, V, E, S>
where
    K: Eq + Hash,
    S: BuildHasher + Clone,
{
    type Container = MultiMap<K, V, S>;
    type Key = K;
    type Value = V;
    type Error = E;

    fn allocate(&self) -> MultiMap<K, V, S> {
        MultiMap::with_hasher(self.hasher.clone())
    }

    fn adder_slot(&self) -> &AdderSlot<MultiMap<K, V, S>, K, V, E> {
        &self.append
    }
}

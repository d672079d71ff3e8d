//! EntryTable: unique-key storage with generational handles.
//!
//! Entries live in a `SlotMap`; a `hashbrown::HashTable` indexes slot keys
//! by the hash stored alongside each entry, so `K: Hash` runs once per
//! insert or lookup and never during a resize.

use crate::reentrancy::ProbeGuard;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_table;
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

/// Stable reference to a live entry. Becomes stale once the entry is removed;
/// a stale handle never resolves to a later entry in the same slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub fn key<'a, K, V, S>(&self, table: &'a EntryTable<K, V, S>) -> Option<&'a K>
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        table.slots.get(self.0).map(|e| &e.key)
    }

    pub fn value<'a, K, V, S>(&self, table: &'a EntryTable<K, V, S>) -> Option<&'a V>
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        table.slots.get(self.0).map(|e| &e.value)
    }

    pub fn value_mut<'a, K, V, S>(&self, table: &'a mut EntryTable<K, V, S>) -> Option<&'a mut V>
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        table.slots.get_mut(self.0).map(|e| &mut e.value)
    }
}

#[derive(Debug)]
struct Slot<K, V> {
    key: K,
    value: V,
    hash: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InsertError {
    #[error("key already present")]
    DuplicateKey,
}

pub struct EntryTable<K, V, S = RandomState> {
    hasher: S,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Slot<K, V>>,
    probe: ProbeGuard,
}

impl<K, V> EntryTable<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }
}

impl<K, V> Default for EntryTable<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> core::fmt::Debug for EntryTable<K, V, S>
where
    K: core::fmt::Debug,
    V: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(self.slots.values().map(|s| (&s.key, &s.value)))
            .finish()
    }
}

/// Iterator over `(handle, key, value)` triples.
pub struct Iter<'a, K, V> {
    it: slotmap::basic::Iter<'a, DefaultKey, Slot<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (Handle, &'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, s)| (Handle(k), &s.key, &s.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Iterator over `(handle, key, &mut value)` triples.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, DefaultKey, Slot<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (Handle, &'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .next()
            .map(|(k, s)| (Handle(k), &s.key, &mut s.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V, S> EntryTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::new(),
            slots: SlotMap::with_key(),
            probe: ProbeGuard::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn lookup<Q>(&self, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hasher.hash_one(q);
        self.index
            .find(hash, |&k| {
                self.slots
                    .get(k)
                    .map(|s| s.key.borrow() == q)
                    .unwrap_or(false)
            })
            .copied()
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.probe.enter();
        self.lookup(q).map(Handle)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.probe.enter();
        self.lookup(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.probe.enter();
        let k = self.lookup(q)?;
        self.slots.get(k).map(|s| &s.value)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = {
            let _g = self.probe.enter();
            self.lookup(q)?
        };
        self.slots.get_mut(k).map(|s| &mut s.value)
    }

    /// Insert a fresh entry; an existing equal key leaves the table untouched.
    pub fn insert(&mut self, key: K, value: V) -> Result<Handle, InsertError> {
        self.insert_with(key, move || value)
    }

    /// Like `insert`, but `make` only runs when the key is vacant.
    pub fn insert_with<F>(&mut self, key: K, make: F) -> Result<Handle, InsertError>
    where
        F: FnOnce() -> V,
    {
        let _g = self.probe.enter();
        let hash = self.hasher.hash_one(&key);
        let slots = &mut self.slots;
        match self.index.entry(
            hash,
            |&kk| slots.get(kk).map(|s| s.key == key).unwrap_or(false),
            |&kk| slots.get(kk).map(|s| s.hash).unwrap_or(0),
        ) {
            hash_table::Entry::Occupied(_) => Err(InsertError::DuplicateKey),
            hash_table::Entry::Vacant(v) => {
                let value = make();
                let k = slots.insert(Slot { key, value, hash });
                v.insert(k);
                Ok(Handle(k))
            }
        }
    }

    /// Insert or overwrite. On overwrite the stored key is kept and the
    /// previous value is returned; the entry keeps its handle.
    pub fn upsert(&mut self, key: K, value: V) -> (Handle, Option<V>) {
        let _g = self.probe.enter();
        let hash = self.hasher.hash_one(&key);
        let slots = &mut self.slots;
        match self.index.entry(
            hash,
            |&kk| slots.get(kk).map(|s| s.key == key).unwrap_or(false),
            |&kk| slots.get(kk).map(|s| s.hash).unwrap_or(0),
        ) {
            hash_table::Entry::Occupied(o) => {
                let k = *o.get();
                let prev = slots
                    .get_mut(k)
                    .map(|s| core::mem::replace(&mut s.value, value));
                (Handle(k), prev)
            }
            hash_table::Entry::Vacant(v) => {
                let k = slots.insert(Slot { key, value, hash });
                v.insert(k);
                (Handle(k), None)
            }
        }
    }

    /// Handle to the entry for `key`, inserting `make()` first if vacant.
    /// Hashes and probes once.
    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> Handle
    where
        F: FnOnce() -> V,
    {
        let _g = self.probe.enter();
        let hash = self.hasher.hash_one(&key);
        let slots = &mut self.slots;
        match self.index.entry(
            hash,
            |&kk| slots.get(kk).map(|s| s.key == key).unwrap_or(false),
            |&kk| slots.get(kk).map(|s| s.hash).unwrap_or(0),
        ) {
            hash_table::Entry::Occupied(o) => Handle(*o.get()),
            hash_table::Entry::Vacant(v) => {
                let value = make();
                let k = slots.insert(Slot { key, value, hash });
                v.insert(k);
                Handle(k)
            }
        }
    }

    pub fn remove(&mut self, handle: Handle) -> Option<(K, V)> {
        let _g = self.probe.enter();
        let k = handle.0;
        let slot = self.slots.remove(k)?;
        // The index holds exactly one reference to every live slot key.
        if let Ok(occupied) = self.index.find_entry(slot.hash, |&kk| kk == k) {
            occupied.remove();
        }
        Some((slot.key, slot.value))
    }

    pub fn remove_key<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let handle = self.find(q)?;
        self.remove(handle)
    }

    pub fn clear(&mut self) {
        let _g = self.probe.enter();
        self.index.clear();
        self.slots.clear();
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.slots.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.slots.iter_mut(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::BTreeSet;
    use std::hash::Hasher;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        }
    }

    /// Invariant: Duplicate keys are rejected by `insert` and the table is unchanged.
    #[test]
    fn duplicate_insert_rejected() {
        let mut t: EntryTable<String, i32> = EntryTable::new();
        let h = t.insert("dup".to_string(), 1).unwrap();
        assert_eq!(
            t.insert("dup".to_string(), 2),
            Err(InsertError::DuplicateKey)
        );
        assert_eq!(h.value(&t), Some(&1));
        assert_eq!(t.len(), 1);
    }

    /// Invariant: `upsert` overwrites in place, returns the old value and keeps
    /// the handle; on a vacant key it behaves like `insert`.
    #[test]
    fn upsert_overwrites_and_keeps_handle() {
        let mut t: EntryTable<String, i32> = EntryTable::new();
        let (h1, prev) = t.upsert("k".to_string(), 1);
        assert_eq!(prev, None);
        let (h2, prev) = t.upsert("k".to_string(), 2);
        assert_eq!(prev, Some(1));
        assert_eq!(h1, h2);
        assert_eq!(t.get("k"), Some(&2));
        assert_eq!(t.len(), 1);
    }

    /// Invariant: `find(k).is_some() == contains_key(k)`; borrowed lookups work.
    #[test]
    fn find_contains_parity_with_borrowed_keys() {
        let mut t: EntryTable<String, i32> = EntryTable::new();
        for (i, k) in ["a", "b", "c"].iter().enumerate() {
            t.insert((*k).to_string(), i as i32).unwrap();
        }
        for k in ["a", "b", "c", "x", "y"] {
            assert_eq!(t.find(k).is_some(), t.contains_key(k));
        }
        assert!(t.contains_key("a"));
        assert!(!t.contains_key("x"));
        assert_eq!(t.get("b"), Some(&1));
    }

    /// Invariant: A removed entry's handle goes stale and never aliases an entry
    /// inserted afterwards, even when the slot is reused.
    #[test]
    fn stale_handle_does_not_alias_new_entry() {
        let mut t: EntryTable<String, i32> = EntryTable::new();
        let h1 = t.insert("old".to_string(), 1).unwrap();
        assert_eq!(t.remove(h1), Some(("old".to_string(), 1)));
        let h2 = t.insert("new".to_string(), 2).unwrap();
        assert_ne!(h1, h2);
        assert!(h1.value(&t).is_none());
        assert!(t.remove(h1).is_none());
        assert!(t.contains_key("new"));
        assert!(!t.contains_key("old"));
    }

    /// Invariant: `remove_key` unlinks from the index; reinsertion sees a fresh entry.
    #[test]
    fn remove_key_then_reinsert() {
        let mut t: EntryTable<String, i32> = EntryTable::new();
        t.insert("k".to_string(), 1).unwrap();
        assert_eq!(t.remove_key("k"), Some(("k".to_string(), 1)));
        assert_eq!(t.remove_key("k"), None);
        assert!(t.is_empty());
        t.insert("k".to_string(), 2).expect("reinsert allowed");
        assert_eq!(t.get("k"), Some(&2));
    }

    /// Invariant: Iteration yields every live entry exactly once and `iter_mut`
    /// writes are visible to lookups.
    #[test]
    fn iteration_and_mutation() {
        let mut t: EntryTable<String, i32> = EntryTable::new();
        for (i, k) in ["k1", "k2", "k3"].iter().enumerate() {
            t.insert((*k).to_string(), i as i32).unwrap();
        }
        let seen: BTreeSet<String> = t.iter().map(|(_, k, _)| k.clone()).collect();
        assert_eq!(seen.len(), 3);
        for (_, _, v) in t.iter_mut() {
            *v += 10;
        }
        assert_eq!(t.get("k1"), Some(&10));
        assert_eq!(t.get("k3"), Some(&12));
        if let Some(v) = t.get_mut("k2") {
            *v = 0;
        }
        assert_eq!(t.get("k2"), Some(&0));
    }

    /// Invariant: Lookups stay correct when every key collides.
    #[test]
    fn collisions_resolve_by_equality() {
        let mut t: EntryTable<String, i32, ConstBuildHasher> =
            EntryTable::with_hasher(ConstBuildHasher);
        t.insert("a".to_string(), 1).unwrap();
        t.insert("b".to_string(), 2).unwrap();
        t.upsert("a".to_string(), 3);
        let ha = t.find("a").unwrap();
        let hb = t.find("b").unwrap();
        assert_ne!(ha, hb);
        assert_eq!(ha.value(&t), Some(&3));
        assert_eq!(hb.key(&t), Some(&"b".to_string()));
        assert_eq!(t.len(), 2);
    }

    /// Invariant: `insert_with` only builds the value on a vacant key.
    #[test]
    fn insert_with_is_lazy() {
        let mut t: EntryTable<String, String> = EntryTable::new();
        let calls = Cell::new(0);
        t.insert_with("k".to_string(), || {
            calls.set(calls.get() + 1);
            "v".to_string()
        })
        .unwrap();
        let r = t.insert_with("k".to_string(), || {
            calls.set(calls.get() + 1);
            "v2".to_string()
        });
        assert_eq!(r, Err(InsertError::DuplicateKey));
        assert_eq!(calls.get(), 1);
        assert_eq!(t.get("k"), Some(&"v".to_string()));
    }

    /// Invariant: `get_or_insert_with` builds once and returns the same handle
    /// for the key afterwards.
    #[test]
    fn get_or_insert_with_reuses_entry() {
        let mut t: EntryTable<String, Vec<u8>> = EntryTable::new();
        let calls = Cell::new(0);
        let h1 = t.get_or_insert_with("k".to_string(), || {
            calls.set(calls.get() + 1);
            Vec::new()
        });
        if let Some(v) = h1.value_mut(&mut t) {
            v.push(1);
        }
        let h2 = t.get_or_insert_with("k".to_string(), || {
            calls.set(calls.get() + 1);
            vec![9]
        });
        assert_eq!(h1, h2);
        assert_eq!(calls.get(), 1);
        assert_eq!(t.get("k"), Some(&vec![1]));
        assert_eq!(t.len(), 1);
        assert_eq!(t.find("k"), Some(h1));
    }

    /// Invariant: `clear` empties both storage and index.
    #[test]
    fn clear_empties_table() {
        let mut t: EntryTable<u32, u32> = EntryTable::new();
        let h = t.insert(1, 1).unwrap();
        t.insert(2, 2).unwrap();
        t.clear();
        assert!(t.is_empty());
        assert!(!t.contains_key(&1));
        assert!(h.value(&t).is_none());
        t.insert(1, 5).unwrap();
        assert_eq!(t.get(&1), Some(&5));
    }

    /// Invariant (debug-only): a key whose `Eq` re-enters the table mid-probe panics.
    #[cfg(debug_assertions)]
    #[test]
    fn reentry_from_eq_during_probe_panics() {
        struct ReentryKey {
            id: &'static str,
            table: *const EntryTable<ReentryKey, i32, ConstBuildHasher>,
            trigger: bool,
        }
        impl PartialEq for ReentryKey {
            fn eq(&self, other: &Self) -> bool {
                if self.id == other.id {
                    return true;
                }
                if other.trigger {
                    unsafe {
                        let _ = (*other.table).contains_key(self.id);
                    }
                }
                false
            }
        }
        impl Eq for ReentryKey {}
        impl Hash for ReentryKey {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }
        impl Borrow<str> for ReentryKey {
            fn borrow(&self) -> &str {
                self.id
            }
        }

        let mut t: EntryTable<ReentryKey, i32, ConstBuildHasher> =
            EntryTable::with_hasher(ConstBuildHasher);
        let ptr: *const EntryTable<ReentryKey, i32, ConstBuildHasher> = &t;
        t.insert(
            ReentryKey {
                id: "a",
                table: ptr,
                trigger: false,
            },
            1,
        )
        .unwrap();

        let query = ReentryKey {
            id: "b",
            table: ptr,
            trigger: true,
        };
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = t.find(&query);
        }));
        assert!(res.is_err(), "expected nested probe to panic in debug builds");
    }
}

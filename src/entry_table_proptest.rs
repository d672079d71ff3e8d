// Property tests for EntryTable kept inside the crate so they can reach the
// private storage layer without feature gates.

use crate::entry_table::{EntryTable, Handle, InsertError};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Operations index into a small key pool so shrinking converges on early keys.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Upsert(usize, i32),
    Remove(usize),
    RemoveKey(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=6).prop_flat_map(|pool| {
        let idx = proptest::sample::select((0..pool.len()).collect::<Vec<_>>());
        let named = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Upsert(i, v)),
            idx.clone().prop_map(Op::Remove),
            idx.clone().prop_map(Op::RemoveKey),
            idx.clone().prop_map(Op::Find),
            prop_oneof![named, "[a-z]{0,4}"].prop_map(Op::Contains),
            (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

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

// Replays `ops` against both the table and a std HashMap model, checking
// after every step that:
// - insert rejects exactly the keys the model already holds;
// - upsert returns the model's previous value and keeps the live handle;
// - removal returns the model's pair and leaves the handle stale forever;
// - find/contains agree with the model and with tracked handles;
// - iteration yields the model's key set; len/is_empty match.
fn run<S: BuildHasher>(
    mut sut: EntryTable<Key, i32, S>,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut live: HashMap<Key, Handle> = HashMap::new();
    let mut stale: Vec<Handle> = Vec::new();
    let key = |i: usize| Key(pool[i].clone());

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = key(i);
                let already = model.contains_key(&k);
                match sut.insert(k.clone(), v) {
                    Ok(h) => {
                        prop_assert!(!already, "insert must fail on duplicate");
                        prop_assert!(live.insert(k.clone(), h).is_none());
                        model.insert(k, v);
                    }
                    Err(InsertError::DuplicateKey) => prop_assert!(already),
                }
            }
            Op::Upsert(i, v) => {
                let k = key(i);
                let (h, prev) = sut.upsert(k.clone(), v);
                prop_assert_eq!(prev, model.insert(k.clone(), v));
                if let Some(&lh) = live.get(&k) {
                    prop_assert_eq!(h, lh, "overwrite keeps the handle");
                }
                live.insert(k, h);
            }
            Op::Remove(i) => {
                let k = key(i);
                if let Some(h) = live.remove(&k) {
                    let (kk, vv) = sut.remove(h).expect("live handle removes");
                    prop_assert!(kk == k);
                    prop_assert_eq!(Some(vv), model.remove(&kk));
                    stale.push(h);
                } else {
                    prop_assert!(sut.find(&k).is_none());
                }
            }
            Op::RemoveKey(i) => {
                let k = key(i);
                let got = sut.remove_key(k.0.as_str()).map(|(_, v)| v);
                prop_assert_eq!(got, model.remove(&k));
                if let Some(h) = live.remove(&k) {
                    stale.push(h);
                }
            }
            Op::Find(i) => {
                let k = key(i);
                let found = sut.find(&k);
                prop_assert_eq!(found.is_some(), model.contains_key(&k));
                if let Some(h) = found {
                    prop_assert_eq!(Some(&h), live.get(&k));
                    prop_assert_eq!(h.value(&sut), model.get(&k));
                }
            }
            Op::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            Op::Mutate(i, d) => {
                let k = key(i);
                if let Some(&h) = live.get(&k) {
                    let Some(vr) = h.value_mut(&mut sut) else {
                        return Err(TestCaseError::fail("live handle should resolve"));
                    };
                    *vr = vr.saturating_add(d);
                    if let Some(mv) = model.get_mut(&k) {
                        *mv = mv.saturating_add(d);
                    }
                }
            }
            Op::Iterate => {
                let s_keys: BTreeSet<_> = sut.iter().map(|(_, k, _)| k.clone()).collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
            }
        }

        for &h in &stale {
            prop_assert!(h.value(&sut).is_none());
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run(EntryTable::new(), &pool, ops)?;
    }

    // Every key collides, so probing relies on `Eq` alone.
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run(EntryTable::with_hasher(ConstBuildHasher), &pool, ops)?;
    }
}

//! adder-map: associative containers populated from entry sequences through
//! a resolve-once, reassignable insertion operation (the *adder*).
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a construction protocol that stays well-defined when the adder
//!   is swapped out, wrapped, or reassigned while construction runs.
//! - Layers:
//!   - EntryTable<K, V, S>: unique-key storage with generational handles
//!     and a debug-only guard against re-entry from `K: Eq/Hash`.
//!   - Map / MultiMap: containers over EntryTable exposing their insert
//!     primitive (`set`, `append`).
//!   - AdderSlot: the per-type, reassignable insertion capability.
//!   - construct / populate: allocate, resolve the adder once, open the
//!     input, drain it entry by entry.
//!
//! Protocol
//! - Absent input (`None`, `Value::Undefined`, `Value::Null`) yields an
//!   empty container without looking at the slot.
//! - The slot is read exactly once, before the input is opened. A
//!   non-callable slot fails with `NotCallable` and the input is never
//!   opened.
//! - Every produced entry is handed to that one captured adder, in order.
//!   Reassigning the slot (while the input opens, or from inside the adder)
//!   does not change what the running construction calls.
//! - The adder may be a plain closure or a `Proxy`; the protocol cannot
//!   tell. It may insert something other than what it was given.
//! - Errors from the cursor or the adder come back as
//!   `ConstructError::Thrown(e)` with `e` untouched. Entries inserted before
//!   the failure stay in the container (`Aborted::container`).
//! - On a malformed element or a failing adder the cursor's `close` hook
//!   runs once.
//!
//! Constraints
//! - Single-threaded: adders are `Rc<dyn Invocable>`, slots are `RefCell`s.
//! - Synchronous: no cancellation; an endless input never returns.
//!
//! Notes and non-goals
//! - No object model beyond the slot: no prototype chains, no general
//!   proxy traps, only `apply` on the adder.
//! - Iteration order of the containers is unspecified.

mod construct;
#[cfg_attr(not(feature = "bench_internal"), allow(dead_code))]
mod entry_table;
#[cfg(test)]
mod entry_table_proptest;
mod error;
mod invoke;
mod map;
mod multimap;
mod reentrancy;
mod slot;
mod source;
mod value;

// Public surface
pub use construct::{construct, populate, ContainerType};
pub use entry_table::InsertError;
pub use error::{Aborted, ConstructError, ErrorKind};
pub use invoke::{adder_fn, Adder, FnAdder, Invocable, Proxy};
pub use map::{Map, MapType};
pub use multimap::{MultiMap, MultiMapType};
pub use slot::{AdderSlot, Capability};
pub use source::{
    cursor_fn, deferred, entries, try_entries, Cursor, Deferred, Entries, EntryLike, FnCursor,
    Source, TryEntries,
};
pub use value::{ListCursor, Value};

#[cfg(feature = "bench_internal")]
pub use entry_table::{EntryTable, Handle};

pub mod iter {
    //! Container iterators.
    pub use crate::map::Iter as MapIter;
    pub use crate::multimap::Iter as MultiMapIter;
}

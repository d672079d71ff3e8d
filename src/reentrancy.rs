//! Debug-only probe guard for the entry table.
//!
//! The table calls into user code (`K: Eq`, `K: Hash`) while its index and
//! slot storage may disagree. A key whose `Eq` reaches back into the same
//! table at that moment would observe a torn structure, so debug builds
//! panic on nested entry. Release builds compile the check away.
//!
//! Note that this guard is about the table only. Adders legitimately call
//! back into the container they are populating; that happens between
//! table operations and never trips the guard.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table nesting tracker. Each public table entry-point starts with
/// `let _g = self.probe.enter();`.
#[derive(Debug)]
pub(crate) struct ProbeGuard {
    #[cfg(debug_assertions)]
    active: Cell<bool>,
    // Single-threaded like the rest of the crate.
    _nosend: PhantomData<*mut ()>,
}

impl ProbeGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(false),
            _nosend: PhantomData,
        }
    }

    /// Mark the table as busy until the returned token is dropped.
    #[inline]
    pub(crate) fn enter(&self) -> Entered<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.active.replace(true),
                "entry table re-entered while probing"
            );
            Entered { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            Entered { _z: PhantomData }
        }
    }

    #[cfg(all(test, debug_assertions))]
    fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl Default for ProbeGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Token returned by `ProbeGuard::enter`; clears the busy flag on drop.
pub(crate) struct Entered<'a> {
    #[cfg(debug_assertions)]
    owner: &'a ProbeGuard,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let was = self.owner.active.replace(false);
            debug_assert!(was);
        }
    }
}

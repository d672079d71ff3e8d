//! The construction protocol.
//!
//! ```text
//! allocate -> absent? -> resolve adder -> open input -> drain
//! ```
//!
//! The adder is read from the type's slot once, before the input is
//! touched, and that one reference is used for every entry. Reassigning
//! the slot while the input opens, or from inside the adder, only affects
//! later constructions.

use crate::error::{Aborted, ConstructError};
use crate::slot::AdderSlot;
use crate::source::{Cursor, EntryLike, Source};

/// A container type that can be built from an entry sequence.
pub trait ContainerType {
    type Container;
    type Key;
    type Value;
    type Error;

    /// A fresh, empty container.
    fn allocate(&self) -> Self::Container;

    /// The type-level insertion capability.
    fn adder_slot(&self) -> &AdderSlot<Self::Container, Self::Key, Self::Value, Self::Error>;
}

/// Allocate a container of type `ty` and populate it from `input`.
///
/// On failure the partially populated container is handed back inside
/// [`Aborted`]; nothing is rolled back.
pub fn construct<T, I>(
    ty: &T,
    input: I,
) -> Result<T::Container, Aborted<T::Container, T::Error>>
where
    T: ContainerType,
    I: Source<T::Key, T::Value, T::Error>,
{
    let mut container = ty.allocate();
    let mut consumed = 0;
    match drive(&mut container, ty.adder_slot(), input, &mut consumed) {
        Ok(()) => Ok(container),
        Err(error) => {
            tracing::trace!(consumed, kind = ?error.kind(), "construct: aborted");
            Err(Aborted {
                container,
                consumed,
                error,
            })
        }
    }
}

/// Populate an existing container from `input` through the adder in `slot`.
///
/// Returns the number of adder invocations. On error the container keeps
/// whatever was inserted before the failure.
pub fn populate<C, K, V, E, I>(
    container: &mut C,
    slot: &AdderSlot<C, K, V, E>,
    input: I,
) -> Result<usize, ConstructError<E>>
where
    I: Source<K, V, E>,
{
    let mut consumed = 0;
    drive(container, slot, input, &mut consumed)?;
    Ok(consumed)
}

fn drive<C, K, V, E, I>(
    container: &mut C,
    slot: &AdderSlot<C, K, V, E>,
    input: I,
    consumed: &mut usize,
) -> Result<(), ConstructError<E>>
where
    I: Source<K, V, E>,
{
    if input.is_absent() {
        tracing::trace!(adder = slot.name(), "construct: no initializer");
        return Ok(());
    }

    let adder = slot.resolve().inspect_err(|e| {
        tracing::debug!(adder = slot.name(), kind = ?e.kind(), "construct: adder not callable");
    })?;
    tracing::trace!(adder = slot.name(), "construct: resolved adder");

    let mut cursor = input.open().inspect_err(|e| {
        tracing::debug!(adder = slot.name(), kind = ?e.kind(), "construct: input not opened");
    })?;
    tracing::trace!(adder = slot.name(), "construct: opened input");

    loop {
        let item = match cursor.advance() {
            Ok(Some(item)) => item,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(
                    adder = slot.name(),
                    consumed = *consumed,
                    "construct: cursor failed"
                );
                return Err(ConstructError::Thrown(e));
            }
        };

        let (key, value) = match item.into_entry() {
            Ok(pair) => pair,
            Err(found) => {
                cursor.close();
                tracing::debug!(
                    adder = slot.name(),
                    consumed = *consumed,
                    found,
                    "construct: element is not an entry"
                );
                return Err(ConstructError::InvalidEntryShape {
                    index: *consumed,
                    found,
                });
            }
        };

        if let Err(e) = adder.invoke(container, key, value) {
            cursor.close();
            tracing::debug!(
                adder = slot.name(),
                consumed = *consumed,
                "construct: adder failed"
            );
            return Err(ConstructError::Thrown(e));
        }
        *consumed += 1;
    }

    tracing::debug!(adder = slot.name(), consumed = *consumed, "construct: drained");
    Ok(())
}

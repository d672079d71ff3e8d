//! Input side of construction: sources, cursors and entry shapes.
//!
//! A [`Source`] is whatever the caller passes as the initializer. It may be
//! absent (construction stops with an empty container), or it may be opened
//! once into a [`Cursor`], which the drain loop advances one element at a
//! time. Each element must be [`EntryLike`].

use crate::error::ConstructError;

/// A stateful producer of elements.
pub trait Cursor<E> {
    type Item;

    /// Produce the next element, `Ok(None)` once exhausted, or fail.
    fn advance(&mut self) -> Result<Option<Self::Item>, E>;

    /// Called once when the consumer stops early because of an error it
    /// raised itself or received from the adder. Not called after
    /// exhaustion, nor after `advance` failed.
    fn close(&mut self) {}
}

/// An initializer that can be opened into a cursor of entries.
pub trait Source<K, V, E>: Sized {
    type Item: EntryLike<K, V>;
    type Cursor: Cursor<E, Item = Self::Item>;

    /// True for the "no initializer" sentinel.
    fn is_absent(&self) -> bool {
        false
    }

    /// Obtain a cursor. Inputs that cannot produce a sequence return
    /// [`ConstructError::NotIterable`].
    fn open(self) -> Result<Self::Cursor, ConstructError<E>>;
}

/// An element that can be read as a `(key, value)` pair.
pub trait EntryLike<K, V> {
    /// Split into key and value, or name what was found instead.
    fn into_entry(self) -> Result<(K, V), &'static str>;
}

impl<K, V> EntryLike<K, V> for (K, V) {
    #[inline]
    fn into_entry(self) -> Result<(K, V), &'static str> {
        Ok(self)
    }
}

impl<T> EntryLike<T, T> for [T; 2] {
    #[inline]
    fn into_entry(self) -> Result<(T, T), &'static str> {
        let [k, v] = self;
        Ok((k, v))
    }
}

/// Cursor over an infallible iterator.
pub struct Entries<I> {
    iter: I,
}

/// Use any iterator of entries as a source.
pub fn entries<I: IntoIterator>(iter: I) -> Entries<I::IntoIter> {
    Entries {
        iter: iter.into_iter(),
    }
}

impl<I: Iterator, E> Cursor<E> for Entries<I> {
    type Item = I::Item;

    #[inline]
    fn advance(&mut self) -> Result<Option<I::Item>, E> {
        Ok(self.iter.next())
    }
}

impl<K, V, E, I> Source<K, V, E> for Entries<I>
where
    I: Iterator,
    I::Item: EntryLike<K, V>,
{
    type Item = I::Item;
    type Cursor = Self;

    fn open(self) -> Result<Self, ConstructError<E>> {
        Ok(self)
    }
}

impl<K, V, E, T> Source<K, V, E> for Vec<T>
where
    T: EntryLike<K, V>,
{
    type Item = T;
    type Cursor = Entries<std::vec::IntoIter<T>>;

    fn open(self) -> Result<Self::Cursor, ConstructError<E>> {
        Ok(entries(self))
    }
}

/// Cursor over an iterator whose elements may fail.
pub struct TryEntries<I> {
    iter: I,
}

/// Use an iterator of `Result`s as a source; an `Err` element is a failed
/// advance.
pub fn try_entries<I: IntoIterator>(iter: I) -> TryEntries<I::IntoIter> {
    TryEntries {
        iter: iter.into_iter(),
    }
}

impl<I, T, E> Cursor<E> for TryEntries<I>
where
    I: Iterator<Item = Result<T, E>>,
{
    type Item = T;

    #[inline]
    fn advance(&mut self) -> Result<Option<T>, E> {
        self.iter.next().transpose()
    }
}

impl<K, V, E, I, T> Source<K, V, E> for TryEntries<I>
where
    I: Iterator<Item = Result<T, E>>,
    T: EntryLike<K, V>,
{
    type Item = T;
    type Cursor = Self;

    fn open(self) -> Result<Self, ConstructError<E>> {
        Ok(self)
    }
}

/// Cursor backed by a closure; see [`cursor_fn`].
pub struct FnCursor<F> {
    next: F,
}

/// Build a cursor (and source) from a closure returning the next element.
pub fn cursor_fn<F, T, E>(next: F) -> FnCursor<F>
where
    F: FnMut() -> Result<Option<T>, E>,
{
    FnCursor { next }
}

impl<F, T, E> Cursor<E> for FnCursor<F>
where
    F: FnMut() -> Result<Option<T>, E>,
{
    type Item = T;

    #[inline]
    fn advance(&mut self) -> Result<Option<T>, E> {
        (self.next)()
    }
}

impl<K, V, E, F, T> Source<K, V, E> for FnCursor<F>
where
    F: FnMut() -> Result<Option<T>, E>,
    T: EntryLike<K, V>,
{
    type Item = T;
    type Cursor = Self;

    fn open(self) -> Result<Self, ConstructError<E>> {
        Ok(self)
    }
}

/// Source whose open step runs a closure; see [`deferred`].
pub struct Deferred<F> {
    open: F,
}

/// A source that produces its cursor lazily. The closure runs when, and
/// only when, the construction opens the input.
pub fn deferred<F, C, E>(open: F) -> Deferred<F>
where
    F: FnOnce() -> Result<C, ConstructError<E>>,
    C: Cursor<E>,
{
    Deferred { open }
}

impl<K, V, E, F, C> Source<K, V, E> for Deferred<F>
where
    F: FnOnce() -> Result<C, ConstructError<E>>,
    C: Cursor<E>,
    C::Item: EntryLike<K, V>,
{
    type Item = C::Item;
    type Cursor = C;

    fn open(self) -> Result<C, ConstructError<E>> {
        (self.open)()
    }
}

/// `None` is the "no initializer" sentinel.
impl<K, V, E, S> Source<K, V, E> for Option<S>
where
    S: Source<K, V, E>,
{
    type Item = S::Item;
    type Cursor = S::Cursor;

    fn is_absent(&self) -> bool {
        match self {
            Some(s) => s.is_absent(),
            None => true,
        }
    }

    fn open(self) -> Result<S::Cursor, ConstructError<E>> {
        match self {
            Some(s) => s.open(),
            None => Err(ConstructError::NotIterable { found: "undefined" }),
        }
    }
}

//! Errors raised by the construction protocol.
//!
//! Protocol errors and thrown errors share one enum so the drain loop can
//! short-circuit with `?`. A thrown error is carried as-is: it formats and
//! reports its source exactly like the thrown value, and
//! [`ConstructError::into_thrown`] hands it back by value.

use core::fmt;

/// Coarse classification of a [`ConstructError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotCallable,
    NotIterable,
    InvalidEntryShape,
    Thrown,
}

#[derive(Debug, thiserror::Error)]
pub enum ConstructError<E> {
    /// The type's insertion capability is absent or holds something that
    /// cannot be invoked. Raised before the input is opened.
    #[error("`{name}` is not callable (found {found})")]
    NotCallable {
        name: &'static str,
        found: &'static str,
    },

    /// The input is present but cannot produce a sequence.
    #[error("{found} is not iterable")]
    NotIterable { found: &'static str },

    /// The element at `index` (0-based, in production order) is not a
    /// key/value entry.
    #[error("iterator value at index {index} is not an entry object (found {found})")]
    InvalidEntryShape { index: usize, found: &'static str },

    /// Raised by the cursor or by the adder; passed through untouched.
    #[error(transparent)]
    Thrown(E),
}

impl<E> ConstructError<E> {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConstructError::NotCallable { .. } => ErrorKind::NotCallable,
            ConstructError::NotIterable { .. } => ErrorKind::NotIterable,
            ConstructError::InvalidEntryShape { .. } => ErrorKind::InvalidEntryShape,
            ConstructError::Thrown(_) => ErrorKind::Thrown,
        }
    }

    /// True for errors the protocol raised itself.
    pub fn is_protocol(&self) -> bool {
        !matches!(self, ConstructError::Thrown(_))
    }

    pub fn thrown(&self) -> Option<&E> {
        match self {
            ConstructError::Thrown(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_thrown(self) -> Option<E> {
        match self {
            ConstructError::Thrown(e) => Some(e),
            _ => None,
        }
    }
}

/// A construction that stopped on an error.
///
/// No rollback happens: `container` holds whatever the adder managed to
/// insert before the failure, and `consumed` counts the entries that were
/// handed to the adder and returned successfully.
pub struct Aborted<C, E> {
    pub container: C,
    pub consumed: usize,
    pub error: ConstructError<E>,
}

impl<C, E> Aborted<C, E> {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    pub fn into_parts(self) -> (C, ConstructError<E>) {
        (self.container, self.error)
    }

    pub fn into_error(self) -> ConstructError<E> {
        self.error
    }
}

impl<C, E: fmt::Debug> fmt::Debug for Aborted<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aborted")
            .field("consumed", &self.consumed)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<C, E: fmt::Display> fmt::Display for Aborted<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "construction aborted after {} entries: {}",
            self.consumed, self.error
        )
    }
}

impl<C, E> std::error::Error for Aborted<C, E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

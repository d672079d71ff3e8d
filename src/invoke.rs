//! Insertion operations and intercepting wrappers around them.

use std::rc::Rc;

/// Something the protocol can call with a receiver and one entry.
///
/// The receiver is the container under construction. What the call does
/// with it is up to the implementation: it may insert the pair, insert a
/// different pair, insert nothing, or fail.
pub trait Invocable<C, K, V, E> {
    fn invoke(&self, receiver: &mut C, key: K, value: V) -> Result<(), E>;
}

/// Shared handle to an insertion operation. Cloning it copies the
/// reference, not the operation.
pub type Adder<C, K, V, E> = Rc<dyn Invocable<C, K, V, E>>;

/// Closure-backed insertion operation; see [`adder_fn`].
#[derive(Clone, Copy)]
pub struct FnAdder<F>(F);

/// Wrap a closure as an [`Invocable`].
pub fn adder_fn<C, K, V, E, F>(f: F) -> FnAdder<F>
where
    F: Fn(&mut C, K, V) -> Result<(), E>,
{
    FnAdder(f)
}

impl<C, K, V, E, F> Invocable<C, K, V, E> for FnAdder<F>
where
    F: Fn(&mut C, K, V) -> Result<(), E>,
{
    #[inline]
    fn invoke(&self, receiver: &mut C, key: K, value: V) -> Result<(), E> {
        (self.0)(receiver, key, value)
    }
}

impl<C, K, V, E, T> Invocable<C, K, V, E> for Rc<T>
where
    T: Invocable<C, K, V, E> + ?Sized,
{
    #[inline]
    fn invoke(&self, receiver: &mut C, key: K, value: V) -> Result<(), E> {
        (**self).invoke(receiver, key, value)
    }
}

type ApplyTrap<C, K, V, E> = Box<dyn Fn(&dyn Invocable<C, K, V, E>, &mut C, K, V) -> Result<(), E>>;

/// Intercepting wrapper around an insertion operation.
///
/// Without a trap every call is forwarded to the target. With an `apply`
/// trap every call goes to the trap instead, which receives the target and
/// decides whether, and with what arguments, to call it. Callers see an
/// ordinary [`Invocable`] either way.
pub struct Proxy<C, K, V, E> {
    target: Adder<C, K, V, E>,
    apply: Option<ApplyTrap<C, K, V, E>>,
}

impl<C, K, V, E> Proxy<C, K, V, E> {
    pub fn new(target: Adder<C, K, V, E>) -> Self {
        Self {
            target,
            apply: None,
        }
    }

    pub fn with_apply<F>(target: Adder<C, K, V, E>, trap: F) -> Self
    where
        F: Fn(&dyn Invocable<C, K, V, E>, &mut C, K, V) -> Result<(), E> + 'static,
    {
        Self {
            target,
            apply: Some(Box::new(trap)),
        }
    }

    pub fn target(&self) -> &Adder<C, K, V, E> {
        &self.target
    }
}

impl<C, K, V, E> Invocable<C, K, V, E> for Proxy<C, K, V, E> {
    fn invoke(&self, receiver: &mut C, key: K, value: V) -> Result<(), E> {
        match &self.apply {
            Some(trap) => trap(&*self.target, receiver, key, value),
            None => self.target.invoke(receiver, key, value),
        }
    }
}

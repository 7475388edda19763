//! The debounced wrapper around an async operation.

use std::future::Future;
use std::time::Duration;

use crate::keyed::KeyedDebounced;
use crate::outcome::DebounceOutcome;

/// Trailing-edge debounced wrapper around an async operation.
///
/// Each [`call`](Self::call) (re)starts the quiet-period timer with the new
/// arguments. When the timer fires, the operation runs once with the most
/// recent arguments and its outcome is delivered to every caller that joined
/// the window. Calls made while an execution is in flight open a new window.
///
/// This is a [`KeyedDebounced`] with a single key; use that type when calls
/// for different resources must not share a window.
///
/// Cloning yields another handle to the same coordinator.
pub struct Debounced<A, T, E> {
    keyed: KeyedDebounced<(), A, T, E>,
}

impl<A, T, E> Clone for Debounced<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            keyed: self.keyed.clone(),
        }
    }
}

impl<A, T, E> std::fmt::Debug for Debounced<A, T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Debounced").field(&self.keyed).finish()
    }
}

impl<A, T, E> Debounced<A, T, E>
where
    A: Send + 'static,
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Wrap `operation` so that it only runs after `delay` of quiet.
    pub fn new<F, Fut>(operation: F, delay: Duration) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::named("debounce", operation, delay)
    }

    /// Like [`new`](Self::new), with a name used in log fields.
    pub fn named<F, Fut>(name: impl Into<String>, operation: F, delay: Duration) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            keyed: KeyedDebounced::named(name, operation, delay),
        }
    }

    pub fn name(&self) -> &str {
        self.keyed.name()
    }

    pub fn delay(&self) -> Duration {
        self.keyed.delay()
    }

    /// Whether an execution is scheduled and has not fired yet.
    pub fn is_pending(&self) -> bool {
        self.keyed.is_pending(&())
    }

    /// Join the current window with `args`.
    ///
    /// Registration happens before this returns; the returned future only
    /// waits for the window to settle. Must be called within a tokio runtime.
    pub fn call(
        &self,
        args: A,
    ) -> impl Future<Output = DebounceOutcome<T, E>> + Send + use<A, T, E> {
        self.keyed.call((), args)
    }

    /// Abort the scheduled execution, if any.
    ///
    /// Every waiter of the aborted window receives
    /// [`DebounceOutcome::Cancelled`]. An execution that is already running
    /// is not affected. Returns whether anything was cancelled.
    pub fn cancel(&self) -> bool {
        self.keyed.cancel(&())
    }
}

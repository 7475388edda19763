//! Debounce windows tracked per logical key.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::outcome::DebounceOutcome;

type Operation<A, T, E> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;
type Waiter<T, E> = oneshot::Sender<DebounceOutcome<T, E>>;

/// A scheduled execution that has not fired yet.
struct Pending<A, T, E> {
    /// The timer only fires this window if the generation still matches.
    generation: u64,
    args: A,
    timer: JoinHandle<()>,
    waiters: Vec<Waiter<T, E>>,
}

struct State<K, A, T, E> {
    next_generation: u64,
    pending: HashMap<K, Pending<A, T, E>>,
}

struct Inner<K, A, T, E> {
    name: String,
    delay: Duration,
    operation: Operation<A, T, E>,
    state: Mutex<State<K, A, T, E>>,
}

impl<K, A, T, E> Drop for Inner<K, A, T, E> {
    fn drop(&mut self) {
        // Dropping the waiters resolves them as cancelled
        for (_, pending) in self.state.get_mut().pending.drain() {
            pending.timer.abort();
        }
    }
}

/// Trailing-edge debouncer with one independent window per key.
///
/// Calls for the same key collapse into a single execution that runs with
/// the most recent arguments for that key. Calls for different keys never
/// share a window, so each caller receives the outcome for its own key.
/// Calls made while a key's execution is in flight open a new window for
/// that key.
///
/// Cloning yields another handle to the same coordinator.
pub struct KeyedDebounced<K, A, T, E> {
    inner: Arc<Inner<K, A, T, E>>,
}

impl<K, A, T, E> Clone for KeyedDebounced<K, A, T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, A, T, E> fmt::Debug for KeyedDebounced<K, A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedDebounced")
            .field("name", &self.inner.name)
            .field("delay", &self.inner.delay)
            .finish_non_exhaustive()
    }
}

impl<K, A, T, E> KeyedDebounced<K, A, T, E>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + 'static,
    A: Send + 'static,
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Wrap `operation`; each key runs only after `delay` of quiet.
    pub fn named<F, Fut>(name: impl Into<String>, operation: F, delay: Duration) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let operation: Operation<A, T, E> =
            Arc::new(move |args: A| -> BoxFuture<'static, Result<T, E>> {
                Box::pin(operation(args))
            });

        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                delay,
                operation,
                state: Mutex::new(State {
                    next_generation: 0,
                    pending: HashMap::new(),
                }),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Whether an execution for `key` is scheduled and has not fired yet.
    pub fn is_pending(&self, key: &K) -> bool {
        self.inner.state.lock().pending.contains_key(key)
    }

    /// Number of keys with a scheduled execution.
    pub fn pending_count(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Join the current window of `key` with `args`.
    ///
    /// Registration happens before this returns; the returned future only
    /// waits for the window to settle. Must be called within a tokio runtime.
    pub fn call(
        &self,
        key: K,
        args: A,
    ) -> impl Future<Output = DebounceOutcome<T, E>> + Send + use<K, A, T, E> {
        let (tx, rx) = oneshot::channel();

        {
            let mut state = self.inner.state.lock();
            state.next_generation += 1;
            let generation = state.next_generation;
            let timer = tokio::spawn(fire(
                Arc::downgrade(&self.inner),
                key.clone(),
                generation,
                self.inner.delay,
            ));

            match state.pending.get_mut(&key) {
                Some(pending) => {
                    pending.timer.abort();
                    pending.timer = timer;
                    pending.generation = generation;
                    pending.args = args;
                    pending.waiters.push(tx);
                    trace!(
                        debounce = %self.inner.name,
                        key = ?key,
                        waiters = pending.waiters.len(),
                        "Rescheduled pending call"
                    );
                }
                None => {
                    trace!(debounce = %self.inner.name, key = ?key, "Scheduled call");
                    state.pending.insert(
                        key,
                        Pending {
                            generation,
                            args,
                            timer,
                            waiters: vec![tx],
                        },
                    );
                }
            }
        }

        async move { rx.await.unwrap_or(DebounceOutcome::Cancelled) }
    }

    /// Abort the scheduled execution of `key`, if any.
    ///
    /// Every waiter of the aborted window receives
    /// [`DebounceOutcome::Cancelled`]. An execution that is already running
    /// is not affected. Returns whether anything was cancelled.
    pub fn cancel(&self, key: &K) -> bool {
        let Some(pending) = self.inner.state.lock().pending.remove(key) else {
            return false;
        };
        pending.timer.abort();
        debug!(
            debounce = %self.inner.name,
            key = ?key,
            waiters = pending.waiters.len(),
            "Cancelled pending call"
        );
        for waiter in pending.waiters {
            let _ = waiter.send(DebounceOutcome::Cancelled);
        }
        true
    }
}

async fn fire<K, A, T, E>(inner: Weak<Inner<K, A, T, E>>, key: K, generation: u64, delay: Duration)
where
    K: Eq + Hash + fmt::Debug,
    A: Send + 'static,
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    tokio::time::sleep(delay).await;

    let Some(inner) = inner.upgrade() else {
        return;
    };
    let pending = {
        let mut state = inner.state.lock();
        if state.pending.get(&key).map(|p| p.generation) != Some(generation) {
            return;
        }
        state.pending.remove(&key)
    };
    let Some(Pending { args, waiters, .. }) = pending else {
        return;
    };

    debug!(
        debounce = %inner.name,
        key = ?key,
        waiters = waiters.len(),
        "Executing debounced call"
    );
    let operation = Arc::clone(&inner.operation);
    let outcome = DebounceOutcome::from(operation(args).await);

    for waiter in waiters {
        let _ = waiter.send(outcome.clone());
    }
}

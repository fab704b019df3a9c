//! # Brewstand Runtime
//!
//! Runtime implementation for the Brewstand state container.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: The runtime that manages state and executes effects
//! - **Effect Executor**: Executes effect descriptions and feeds actions back to reducers
//! - **Cancellation Registry**: Keeps at most one running task per cancellable effect id
//! - **State Observation**: A `watch` channel carrying the latest state after every reduction
//!
//! ## Example
//!
//! ```ignore
//! use brewstand_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action
//! store.send(Action::DoSomething).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field.clone()).await;
//!
//! // Observe state
//! let mut rx = store.subscribe_state();
//! rx.changed().await?;
//! ```

use brewstand_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, watch};

/// Registry of running cancellable effects
pub mod cancellation;

pub use cancellation::CancellationRegistry;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for terminal action
        ///
        /// Returned by `send_and_wait_for` when the timeout expires before
        /// a matching action is received.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Default capacity of the action broadcast channel
pub const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the effects launched by
/// that action to complete. Long-running effects (live streams) only complete
/// when their source ends or they are cancelled.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // All effects from Action::Start are now complete
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a new handle together with the tracking context that drives it
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (handle, _tracking) = Self::new();
        handle
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Every tracker is gone, so nothing is left to wait for
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: Effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    /// Increment the effect counter (effect started)
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement the effect counter (effect completed)
    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements effect counter on drop
///
/// Ensures the effect counter is always decremented, even if the effect panics
/// or is cancelled.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, AtomicCounterGuard, AtomicUsize, CancellationRegistry,
        DEFAULT_BROADCAST_CAPACITY, DecrementGuard, Duration, Effect, EffectHandle,
        EffectTracking, Ordering, Reducer, RwLock, StoreError, watch,
    };
    use brewstand_core::effect::EffectId;
    use futures::StreamExt;
    use futures::future::BoxFuture;
    use tokio::sync::broadcast;
    use tokio::task::JoinHandle;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access, mirrored into a `watch` channel)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop and cancellation)
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        observers: Arc<watch::Sender<S>>,
        reducer: R,
        environment: E,
        cancellations: CancellationRegistry,
        /// Flips to `true` once shutdown starts; waiters select on it.
        shutdown: Arc<watch::Sender<bool>>,
        pending_effects: Arc<AtomicUsize>,
        /// Actions produced by effects, broadcast after they have been reduced.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(
                initial_state,
                reducer,
                environment,
                DEFAULT_BROADCAST_CAPACITY,
            )
        }

        /// Create a store with a custom action broadcast capacity
        ///
        /// Observers that fall more than `capacity` actions behind skip the
        /// oldest ones.
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));
            let (observers, _) = watch::channel(initial_state.clone());
            let (shutdown, _) = watch::channel(false);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                observers: Arc::new(observers),
                reducer,
                environment,
                cancellations: CancellationRegistry::new(),
                shutdown: Arc::new(shutdown),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// The environment this store was built with
        #[must_use]
        pub const fn environment(&self) -> &E {
            &self.environment
        }

        /// Registry of running cancellable effects
        #[must_use]
        pub const fn cancellations(&self) -> &CancellationRegistry {
            &self.cancellations
        }

        /// Whether a cancellable effect is currently running under `id`
        #[must_use]
        pub fn is_effect_active(&self, id: EffectId) -> bool {
            self.cancellations.is_active(id)
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Publishes the new state to observers
        /// 4. Launches returned effects in order, before the lock is released
        ///
        /// Launch order therefore matches reduce order even under concurrent
        /// senders, which is what keeps `Cancel` / `Cancellable` pairs coherent.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        ///
        /// # Panics
        ///
        /// If the reducer panics, the panic will propagate and halt the store.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if *self.shutdown.borrow() {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let mut state = self.state.write().await;
            let effects = {
                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();
                self.reducer.reduce(&mut *state, action, &self.environment)
            };
            tracing::trace!("Reducer completed, returned {} effects", effects.len());

            self.observers.send_replace(state.clone());

            for effect in effects {
                self.execute_effect(effect, &tracking);
            }
            drop(state);

            Ok(handle)
        }

        /// Send an action and wait for a matching result action
        ///
        /// Designed for request-response patterns. Subscribes to the action
        /// broadcast before sending, then returns the first action produced by
        /// an effect that matches `predicate`. Because actions are broadcast
        /// after they are reduced, the state already reflects the returned action.
        /// A shutdown that starts while waiting ends the wait at once, since
        /// the answer can no longer be reduced.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: Timeout expired before matching action received
        /// - [`StoreError::ChannelClosed`]: Action broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: Store was or started shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            // Subscribe BEFORE sending to avoid race condition
            let mut rx = self.action_broadcast.subscribe();
            let mut stopping = self.shutdown.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    tokio::select! {
                        biased;

                        received = rx.recv() => match received {
                            Ok(action) if predicate(&action) => return Ok(action),
                            Ok(_) => {},
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                tracing::warn!(skipped, "Action observer lagged");
                            },
                            Err(broadcast::error::RecvError::Closed) => {
                                return Err(StoreError::ChannelClosed);
                            },
                        },
                        _ = stopping.wait_for(|stopping| *stopping) => {
                            tracing::debug!("Stopped waiting for answer: store is shutting down");
                            return Err(StoreError::ShutdownInProgress);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to all actions produced by effects
        ///
        /// Each action is delivered after the reducer has processed it.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Subscribe to state changes
        ///
        /// The receiver always holds the state as of the last reduction and is
        /// notified after every action.
        #[must_use]
        pub fn subscribe_state(&self) -> watch::Receiver<S> {
            self.observers.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.beverages.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Initiate graceful shutdown
        ///
        /// Rejects new actions, cancels every registered cancellable effect,
        /// then waits for the remaining effects to finish.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
        /// pending effects complete.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.send_replace(true);

            let cancelled = self.cancellations.cancel_all();
            if cancelled > 0 {
                tracing::debug!(cancelled, "Cancelled long-running effects");
            }

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timeout");
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Launch an effect
        ///
        /// `None` and `Cancel` take effect immediately. Everything else runs in
        /// a spawned task tracked by `tracking` and by the shutdown counter.
        /// `Cancellable` first cancels the current holder of its id, then
        /// registers the new task under it.
        fn execute_effect(&self, effect: Effect<A>, tracking: &EffectTracking) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Cancel(id) => {
                    metrics::counter!("store.effects.executed", "type" => "cancel").increment(1);
                    if self.cancellations.cancel(id) {
                        tracing::debug!(effect_id = %id, "Cancelled running effect");
                        metrics::counter!("store.effects.cancelled").increment(1);
                    }
                },
                Effect::Cancellable { id, effect } => {
                    metrics::counter!("store.effects.executed", "type" => "cancellable")
                        .increment(1);
                    let _ = self.spawn_cancellable(id, *effect, tracking);
                },
                effect => {
                    metrics::counter!("store.effects.executed", "type" => "task").increment(1);
                    let _ = self.spawn_tracked(effect, tracking, None);
                },
            }
        }

        fn spawn_cancellable(
            &self,
            id: EffectId,
            effect: Effect<A>,
            tracking: &EffectTracking,
        ) -> JoinHandle<()> {
            if self.cancellations.cancel(id) {
                tracing::debug!(effect_id = %id, "Replaced running effect");
                metrics::counter!("store.effects.cancelled").increment(1);
            }
            let token = self.cancellations.next_token();
            let task = self.spawn_tracked(effect, tracking, Some((id, token)));
            self.cancellations.insert(id, token, task.abort_handle());
            task
        }

        /// Spawn `effect`, keeping both counters accurate even on abort
        fn spawn_tracked(
            &self,
            effect: Effect<A>,
            tracking: &EffectTracking,
            registration: Option<(EffectId, u64)>,
        ) -> JoinHandle<()> {
            tracking.increment();
            let guard = DecrementGuard(tracking.clone());

            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

            let store = self.clone();
            let child_tracking = tracking.clone();
            tokio::spawn(async move {
                let _guard = guard;
                let _pending_guard = pending_guard;

                store.run_effect(effect, child_tracking).await;

                if let Some((id, token)) = registration {
                    store.cancellations.finish(id, token);
                }
            })
        }

        /// Drive an effect to completion inside the current task
        fn run_effect(&self, effect: Effect<A>, tracking: EffectTracking) -> BoxFuture<'_, ()> {
            Box::pin(async move {
                match effect {
                    Effect::None => {},
                    Effect::Future(fut) => {
                        if let Some(action) = fut.await {
                            self.feed_back(action).await;
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }
                    },
                    Effect::Stream(mut stream) => {
                        while let Some(action) = stream.next().await {
                            self.feed_back(action).await;
                        }
                        tracing::trace!("Effect::Stream ended");
                    },
                    Effect::Cancel(id) => {
                        self.cancellations.cancel(id);
                    },
                    Effect::Cancellable { id, effect } => {
                        let task = self.spawn_cancellable(id, *effect, &tracking);
                        if let Err(error) = task.await {
                            tracing::trace!(effect_id = %id, %error, "Cancellable effect ended early");
                        }
                    },
                }
            })
        }

        /// Send an effect-produced action back through the reducer, then broadcast it
        async fn feed_back(&self, action: A) {
            match self.send(action.clone()).await {
                Ok(_) => {
                    // No receivers is fine: nobody is waiting on this action
                    let _ = self.action_broadcast.send(action);
                },
                Err(error) => {
                    tracing::debug!(%error, "Dropped action produced by effect");
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                observers: Arc::clone(&self.observers),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                cancellations: self.cancellations.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;

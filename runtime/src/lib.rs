//! # Form Action Runtime
//!
//! Presentation-side driver for form actions.
//!
//! An [`ActionStore`] holds the latest [`SubmissionState`] of one action,
//! feeds it back as the previous state of the next submission, and tracks
//! whether a submission is in flight. Readers get an
//! [`ActionView`](form_action_core::state::ActionView): the state, its
//! derived flags and `isPending`.
//!
//! ## Example
//!
//! ```
//! use form_action_core::prelude::*;
//! use form_action_runtime::ActionStore;
//!
//! # tokio_test::block_on(async {
//! let greet = form_action()
//!     .input(schema::object().field("name", schema::string().min_length(1)))
//!     .error(|error, _ctx| error.to_string())
//!     .run(|call: ActionCall<serde_json::Value>| async move {
//!         anyhow::Ok(format!("Hello, {}!", call.input["name"].as_str().unwrap_or_default()))
//!     });
//!
//! let store = ActionStore::new(greet, String::new());
//! assert!(store.view().await.flags().is_initial);
//!
//! let view = store.dispatch(FormData::new().with("name", "Ann")).await?;
//! assert_eq!(view.state.data().map(String::as_str), Some("Hello, Ann!"));
//! assert!(!view.is_pending);
//! # Ok::<(), form_action_runtime::error::StoreError>(())
//! # });
//! ```

use form_action_core::state::SubmissionState;

/// Prometheus metrics for observability
pub mod metrics;

/// Error types for the action store
pub mod error {
    use form_action_core::error::ActionError;
    use thiserror::Error;

    /// Errors that can occur while dispatching a submission
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// The action failed without producing a state
        ///
        /// The stored state is left unchanged.
        #[error(transparent)]
        Action(#[from] ActionError),

        /// A submission is already in flight and the store admits only one
        #[error("a submission is already in flight")]
        SubmissionInFlight,
    }
}

pub use store::ActionStore;

/// Store module - state holder for one action
pub mod store {
    use super::error::StoreError;
    use super::metrics::SubmissionMetrics;
    use super::SubmissionState;
    use form_action_core::action::{FormAction, Submission};
    use form_action_core::payload::FormData;
    use form_action_core::state::ActionView;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;
    use tokio::sync::RwLock;

    /// Holds the state of one form action across submissions.
    ///
    /// Cloning is cheap; clones share state and the pending counter.
    ///
    /// # Type Parameters
    ///
    /// - `D`: Success data, also the initial value
    /// - `E`: Transformed handler error
    pub struct ActionStore<D, E> {
        action: FormAction<D, E>,
        bound_args: Vec<Value>,
        state: Arc<RwLock<SubmissionState<D, E>>>,
        pending: Arc<AtomicUsize>,
        single_flight: bool,
    }

    impl<D, E> Clone for ActionStore<D, E> {
        fn clone(&self) -> Self {
            Self {
                action: self.action.clone(),
                bound_args: self.bound_args.clone(),
                state: Arc::clone(&self.state),
                pending: Arc::clone(&self.pending),
                single_flight: self.single_flight,
            }
        }
    }

    impl<D, E> std::fmt::Debug for ActionStore<D, E> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("ActionStore")
                .field("bound_args", &self.bound_args)
                .field("pending", &self.pending.load(Ordering::SeqCst))
                .field("single_flight", &self.single_flight)
                .finish_non_exhaustive()
        }
    }

    impl<D, E> ActionStore<D, E>
    where
        D: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create a store in the `initial` state carrying `initial_data`.
        #[must_use]
        pub fn new(action: FormAction<D, E>, initial_data: D) -> Self {
            Self {
                action,
                bound_args: Vec::new(),
                state: Arc::new(RwLock::new(SubmissionState::initial(initial_data))),
                pending: Arc::new(AtomicUsize::new(0)),
                single_flight: false,
            }
        }

        /// Bind positional arguments passed ahead of every submission.
        #[must_use]
        pub fn with_bound_args<I>(mut self, args: I) -> Self
        where
            I: IntoIterator,
            I::Item: Into<Value>,
        {
            self.bound_args = args.into_iter().map(Into::into).collect();
            self
        }

        /// Reject a dispatch while another submission is in flight.
        #[must_use]
        pub const fn with_single_flight(mut self, enabled: bool) -> Self {
            self.single_flight = enabled;
            self
        }

        /// Read the current state
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&SubmissionState<D, E>) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        /// Whether a submission is in flight.
        #[must_use]
        pub fn is_pending(&self) -> bool {
            self.pending.load(Ordering::SeqCst) > 0
        }

        /// Snapshot of the current state with the pending flag.
        ///
        /// While a submission is in flight the state shown is the previous
        /// cycle's result.
        pub async fn view(&self) -> ActionView<D, E> {
            let state = self.state.read().await.clone();
            state.view(self.is_pending())
        }

        /// Return to the `initial` state.
        pub async fn reset(&self, initial_data: D) {
            *self.state.write().await = SubmissionState::initial(initial_data);
        }

        /// Submit `payload`, passing the current state as the previous
        /// state, and store the result.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::Action`] when the action propagates an
        /// error (the state is left unchanged), or
        /// [`StoreError::SubmissionInFlight`] when single-flight is enabled
        /// and a submission is already running.
        #[tracing::instrument(skip_all, name = "store_dispatch", fields(fields = payload.len()))]
        pub async fn dispatch(&self, payload: FormData) -> Result<ActionView<D, E>, StoreError> {
            let guard = self.begin()?;

            let previous_state = self.state.read().await.clone();
            tracing::debug!(previous = %previous_state.tag(), "dispatching submission");

            let start = Instant::now();
            let result = self
                .action
                .call(Submission {
                    bound_args: self.bound_args.clone(),
                    previous_state,
                    payload,
                })
                .await;
            let duration = start.elapsed();

            match result {
                Ok(next) => {
                    SubmissionMetrics::record_outcome(next.tag(), duration);
                    tracing::debug!(next = %next.tag(), "submission completed");
                    *self.state.write().await = next.clone();
                    drop(guard);
                    Ok(next.view(self.is_pending()))
                }
                Err(error) => {
                    SubmissionMetrics::record_error(duration);
                    tracing::warn!(%error, "submission failed");
                    Err(StoreError::Action(error))
                }
            }
        }

        fn begin(&self) -> Result<PendingGuard, StoreError> {
            if self.single_flight {
                self.pending
                    .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
                    .map_err(|_| StoreError::SubmissionInFlight)?;
            } else {
                self.pending.fetch_add(1, Ordering::SeqCst);
            }
            Ok(PendingGuard(Arc::clone(&self.pending)))
        }
    }

    /// Decrements the pending counter on drop, even if the submission panics.
    struct PendingGuard(Arc<AtomicUsize>);

    impl Drop for PendingGuard {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

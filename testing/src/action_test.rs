//! Ergonomic testing utilities for form actions
//!
//! This module provides a fluent API for testing actions with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ActionTest is the natural name

use form_action_core::action::{FormAction, Submission};
use form_action_core::error::ActionError;
use form_action_core::payload::FormData;
use form_action_core::state::SubmissionState;
use serde_json::Value;
use std::fmt::Debug;

/// Type alias for state assertion functions
type StateAssertion<D, E> = Box<dyn FnOnce(&SubmissionState<D, E>) + Send>;

/// Type alias for propagated-error assertion functions
type ErrorAssertion = Box<dyn FnOnce(&ActionError) + Send>;

/// Fluent API for testing form actions with Given-When-Then syntax
///
/// The submission is only run by [`ActionTest::run`]; every `then_*`
/// assertion is applied to its outcome in registration order.
///
/// # Example
///
/// ```
/// use form_action_core::prelude::*;
/// use form_action_testing::ActionTest;
///
/// # tokio_test::block_on(async {
/// let subscribe = form_action()
///     .input(schema::object().field("email", schema::email()))
///     .run(|_: ActionCall<serde_json::Value>| async { anyhow::Ok(true) });
///
/// ActionTest::new(subscribe)
///     .given_state(SubmissionState::<bool, ()>::initial(false))
///     .when_submitted(FormData::new().with("email", "nope"))
///     .then_invalid_at("email")
///     .run()
///     .await;
/// # });
/// ```
pub struct ActionTest<D, E> {
    action: FormAction<D, E>,
    previous_state: Option<SubmissionState<D, E>>,
    args: Vec<Value>,
    payload: Option<FormData>,
    state_assertions: Vec<StateAssertion<D, E>>,
    error_assertions: Vec<ErrorAssertion>,
}

impl<D, E> ActionTest<D, E>
where
    D: Debug + Send + 'static,
    E: Debug + Send + 'static,
{
    /// Create a new test for `action`
    #[must_use]
    pub const fn new(action: FormAction<D, E>) -> Self {
        Self {
            action,
            previous_state: None,
            args: Vec::new(),
            payload: None,
            state_assertions: Vec::new(),
            error_assertions: Vec::new(),
        }
    }

    /// Set the previous state (Given)
    #[must_use]
    pub fn given_state(mut self, state: SubmissionState<D, E>) -> Self {
        self.previous_state = Some(state);
        self
    }

    /// Set the bound positional arguments (Given)
    #[must_use]
    pub fn given_args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the submitted payload (When)
    ///
    /// An empty payload is submitted if this is never called.
    #[must_use]
    pub fn when_submitted(mut self, payload: FormData) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&SubmissionState<D, E>) + Send + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Expect the resulting state to equal `expected` (Then)
    #[must_use]
    pub fn then_state_eq(self, expected: SubmissionState<D, E>) -> Self
    where
        D: PartialEq,
        E: PartialEq,
    {
        self.then_state(move |state| assert_eq!(state, &expected))
    }

    /// Expect an `invalid` state with at least one message at `path` (Then)
    #[must_use]
    pub fn then_invalid_at(self, path: &'static str) -> Self {
        self.then_state(move |state| crate::assertions::assert_invalid_at(state, path))
    }

    /// Expect the action to propagate an error instead of producing a state (Then)
    #[must_use]
    pub fn then_error<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&ActionError) + Send + 'static,
    {
        self.error_assertions.push(Box::new(assertion));
        self
    }

    /// Run the submission and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if the previous state is not set, if the outcome is of the
    /// other kind than the registered assertions expect, or if any
    /// assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub async fn run(self) {
        let previous_state = self
            .previous_state
            .expect("Previous state must be set with given_state()");

        let result = self
            .action
            .call(Submission {
                bound_args: self.args,
                previous_state,
                payload: self.payload.unwrap_or_default(),
            })
            .await;

        match result {
            Ok(state) => {
                assert!(
                    self.error_assertions.is_empty(),
                    "Expected a propagated error, but the action produced {state:?}"
                );
                for assertion in self.state_assertions {
                    assertion(&state);
                }
            }
            Err(error) => {
                assert!(
                    self.state_assertions.is_empty(),
                    "Expected a state, but the action propagated: {error}"
                );
                for assertion in self.error_assertions {
                    assertion(&error);
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use form_action_core::prelude::*;
    use serde_json::json;

    fn echo_name() -> FormAction<String, String> {
        form_action()
            .input(schema::object().field("name", schema::string().min_length(2)))
            .error(|error, _ctx| error.to_string())
            .run(|call: ActionCall<Value>| async move {
                anyhow::Ok(call.input["name"].as_str().unwrap_or_default().to_string())
            })
    }

    #[tokio::test]
    async fn test_success_state_assertion() {
        ActionTest::new(echo_name())
            .given_state(SubmissionState::initial(String::new()))
            .when_submitted(FormData::new().with("name", "Ann"))
            .then_state_eq(SubmissionState::success("Ann".to_string()))
            .run()
            .await;
    }

    #[tokio::test]
    async fn test_invalid_at_path() {
        ActionTest::new(echo_name())
            .given_state(SubmissionState::initial(String::new()))
            .when_submitted(FormData::new().with("name", "A"))
            .then_invalid_at("name")
            .run()
            .await;
    }

    #[tokio::test]
    async fn test_args_reach_handler() {
        let action = form_action()
            .args([schema::string()])
            .run(|call: ActionCall| async move { anyhow::Ok(call.args.as_slice().to_vec()) });

        ActionTest::new(action)
            .given_state(SubmissionState::<Vec<Value>, ()>::initial(Vec::new()))
            .given_args(["abc"])
            .then_state(|state| assert_eq!(state.data(), Some(&vec![json!("abc")])))
            .run()
            .await;
    }

    #[tokio::test]
    async fn test_propagated_error() {
        let action = form_action()
            .run(|_: ActionCall| async { Err::<(), _>(anyhow::anyhow!("boom")) });

        ActionTest::new(action)
            .given_state(SubmissionState::<(), ()>::initial(()))
            .then_error(|error| assert!(matches!(error, ActionError::Handler(_))))
            .run()
            .await;
    }

    #[tokio::test]
    #[should_panic(expected = "Previous state must be set")]
    async fn test_missing_previous_state_panics() {
        ActionTest::new(echo_name()).run().await;
    }
}

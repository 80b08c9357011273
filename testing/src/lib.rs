//! # Form Action Testing
//!
//! Testing utilities and helpers for form actions.
//!
//! This crate provides:
//! - [`ActionTest`], a Given-When-Then harness around one submission
//! - Assertion helpers for submission states
//! - Property-based testing strategies for error trees and states
//! - A tracing subscriber for test output
//!
//! ## Example
//!
//! ```
//! use form_action_core::prelude::*;
//! use form_action_testing::assertions::assert_field_errors;
//!
//! # tokio_test::block_on(async {
//! let signup = form_action()
//!     .input(schema::object().field("password", schema::string().min_length(8)))
//!     .run(|_: ActionCall<serde_json::Value>| async { anyhow::Ok(()) });
//!
//! let state: SubmissionState<(), ()> = signup
//!     .submit(SubmissionState::initial(()), FormData::new().with("password", "short"))
//!     .await
//!     .unwrap();
//!
//! assert_field_errors(&state, "password", &["String must contain at least 8 character(s)"]);
//! # });
//! ```

mod action_test;

pub use action_test::ActionTest;

/// Install a `fmt` subscriber that writes through the test harness.
///
/// The filter comes from `RUST_LOG` and defaults to `warn`. Safe to call
/// from every test; only the first call installs anything.
pub fn init_test_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Helper assertions for submission states
pub mod assertions {
    use form_action_core::state::{StateTag, SubmissionState};
    use serde::Serialize;
    use std::fmt::Debug;

    /// Assert that `state` is `success` carrying `expected`
    ///
    /// # Panics
    ///
    /// Panics if the state has another tag or other data.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_success<D, E>(state: &SubmissionState<D, E>, expected: &D)
    where
        D: PartialEq + Debug,
        E: Debug,
    {
        match state {
            SubmissionState::Success(data) => assert_eq!(data, expected),
            other => panic!("Expected success, but found {other:?}"),
        }
    }

    /// Assert that `state` is `failure` carrying `expected`
    ///
    /// # Panics
    ///
    /// Panics if the state has another tag or another error.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_failure<D, E>(state: &SubmissionState<D, E>, expected: &E)
    where
        D: Debug,
        E: PartialEq + Debug,
    {
        match state {
            SubmissionState::Failure(error) => assert_eq!(error, expected),
            other => panic!("Expected failure, but found {other:?}"),
        }
    }

    /// Assert that `state` is `invalid` with at least one message at `path`
    ///
    /// # Panics
    ///
    /// Panics if the state is not `invalid` or `path` has no message.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_invalid_at<D: Debug, E: Debug>(state: &SubmissionState<D, E>, path: &str) {
        assert_eq!(
            state.tag(),
            StateTag::Invalid,
            "Expected invalid, but found {state:?}"
        );
        assert!(
            state.field_error(path).has_error(),
            "Expected a message at {path:?}, but found none in {:?}",
            state.validation_error()
        );
    }

    /// Assert the exact messages resolved for `path`
    ///
    /// # Panics
    ///
    /// Panics if the resolved messages differ from `expected`.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_field_errors<D, E>(state: &SubmissionState<D, E>, path: &str, expected: &[&str]) {
        let field = state.field_error(path);
        assert_eq!(
            field.errors, expected,
            "Unexpected messages at {path:?}"
        );
    }

    /// Assert that the serialized state populates only the field its tag
    /// names
    ///
    /// # Panics
    ///
    /// Panics if serialization fails or another field is non-null.
    #[allow(clippy::panic)] // Test assertion
    #[allow(clippy::expect_used)] // Test assertion
    pub fn assert_one_field_populated<D: Serialize, E: Serialize>(state: &SubmissionState<D, E>) {
        let value = serde_json::to_value(state).expect("state serializes");
        let expected = match state.tag() {
            StateTag::Initial | StateTag::Success => "data",
            StateTag::Failure => "error",
            StateTag::Invalid => "validationError",
        };
        for field in ["data", "error", "validationError"] {
            if field != expected {
                assert!(
                    value[field].is_null(),
                    "{field} must be null for a {} state, found {}",
                    state.tag(),
                    value[field]
                );
            }
        }
        assert_eq!(value["tag"], state.tag().as_str());
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use form_action_core::error_tree::ErrorTree;
    use form_action_core::state::SubmissionState;
    use proptest::prelude::*;
    use std::fmt::Debug;

    /// Messages drawn from a small lowercase alphabet.
    pub fn arb_messages() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-z ]{1,12}", 0..3)
    }

    /// Error trees up to three levels deep, with lowercase property names
    /// and indices below 4.
    pub fn arb_error_tree() -> BoxedStrategy<ErrorTree> {
        let leaf = arb_messages().prop_map(|errors| ErrorTree {
            errors,
            ..ErrorTree::new()
        });
        leaf.prop_recursive(3, 24, 4, |inner| {
            (
                arb_messages(),
                prop::collection::btree_map("[a-z]{1,4}", inner.clone(), 0..4),
                prop::collection::btree_map(0usize..4, inner, 0..3),
            )
                .prop_map(|(errors, properties, items)| ErrorTree {
                    errors,
                    properties,
                    items,
                })
        })
        .boxed()
    }

    /// States of every tag, with data and error drawn from the given
    /// strategies.
    pub fn arb_state<D, E>(
        data: impl Strategy<Value = D> + Clone + 'static,
        error: impl Strategy<Value = E> + 'static,
    ) -> BoxedStrategy<SubmissionState<D, E>>
    where
        D: Debug + Clone + 'static,
        E: Debug + Clone + 'static,
    {
        prop_oneof![
            data.clone().prop_map(SubmissionState::<D, E>::initial),
            arb_error_tree().prop_map(SubmissionState::<D, E>::invalid),
            error.prop_map(SubmissionState::<D, E>::failure),
            data.prop_map(SubmissionState::<D, E>::success),
        ]
        .boxed()
    }
}

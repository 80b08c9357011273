//! The shipped strategies generate states the assertions accept.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use form_action_core::state::SubmissionState;
use form_action_testing::assertions::assert_one_field_populated;
use form_action_testing::properties::{arb_error_tree, arb_state};
use proptest::prelude::*;

proptest! {
    #[test]
    fn generated_states_keep_one_field(state in arb_state(any::<i32>(), "[a-z]{0,6}")) {
        assert_one_field_populated(&state);

        let json = serde_json::to_string(&state).unwrap();
        let back: SubmissionState<i32, String> = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, state);
    }

    #[test]
    fn flattened_paths_resolve_to_their_messages(tree in arb_error_tree()) {
        let flat = tree.flatten();
        prop_assert_eq!(&flat.form_errors, &tree.errors);
        for (path, messages) in &flat.field_errors {
            prop_assert_eq!(tree.field(path).errors, messages.as_slice());
        }
    }
}

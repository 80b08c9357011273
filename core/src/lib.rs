//! # Form Action Core
//!
//! Server-executed form actions with typed validation, contextual
//! middleware and a submission state machine.
//!
//! ## Core Concepts
//!
//! - **Payload** ([`payload::FormData`]): ordered field names to text or
//!   file values, as an HTML form submits them; dot-path keys address
//!   nested fields
//! - **Schema** ([`schema`]): validates a payload into a value or an
//!   [`error_tree::ErrorTree`]
//! - **Context** ([`context::Context`]): fields contributed by middleware,
//!   rebuilt for every submission
//! - **Action** ([`action::FormAction`]): `(bound args, previous state,
//!   payload) -> next state`, assembled with [`action::form_action`]
//! - **State** ([`state::SubmissionState`]): `initial`, `invalid`,
//!   `failure` or `success`, with derived status flags
//!
//! ## Failure categories
//!
//! - Validation failures are data: the `invalid` state
//! - Handler failures become `failure` when an error transform is
//!   installed, and propagate otherwise
//! - Middleware failures always propagate as [`error::ActionError`]
//!
//! ## Example
//!
//! ```
//! use form_action_core::prelude::*;
//! use serde_json::{json, Value};
//!
//! let signup = form_action()
//!     .input(
//!         schema::object()
//!             .field("user", schema::object().field("email", schema::email()))
//!             .field("password", schema::string().min_length(8))
//!             .field("confirm", schema::string())
//!             .refine_at("confirm", |v| v["password"] == v["confirm"], "Passwords don't match"),
//!     )
//!     .error(|error, _ctx| error.to_string())
//!     .run(|call: ActionCall<Value>| async move { anyhow::Ok(call.input["user"]["email"].clone()) });
//!
//! # tokio_test::block_on(async {
//! let payload = FormData::new()
//!     .with("user.email", "ann@example.com")
//!     .with("password", "nbusr123")
//!     .with("confirm", "deusvult");
//!
//! let state = signup.submit(SubmissionState::initial(Value::Null), payload).await?;
//!
//! assert!(state.flags().is_invalid);
//! assert_eq!(state.field_error("confirm").error, Some("Passwords don't match"));
//! assert_eq!(state.field_error("user.email").errors, &[] as &[String]);
//! # Ok::<(), ActionError>(())
//! # });
//! ```

pub mod action;
pub mod context;
pub mod error;
pub mod error_tree;
pub mod field_error;
pub mod payload;
pub mod schema;
pub mod state;

/// Commonly used types.
pub mod prelude {
    pub use crate::action::{form_action, ActionBuilder, ActionCall, Args, BoundAction, FormAction, Submission};
    pub use crate::context::{Context, Middleware, FORM_DATA_KEY};
    pub use crate::error::{ActionError, ArgError, ContextError};
    pub use crate::error_tree::{ErrorTree, FlattenedErrors, PathSegment};
    pub use crate::field_error::FieldError;
    pub use crate::payload::{FormData, FormFile, FormValue};
    pub use crate::schema::{self, ArgsSchema, InputSchema, NoInput, ObjectSchema, RefinedSchema, Schema};
    pub use crate::state::{ActionView, StateTag, StatusFlags, SubmissionState};
}

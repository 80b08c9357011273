//! The demo's form actions.
//!
//! - [`subscribe`]: newsletter signup with a transformed error message
//! - [`signup`]: nested input and a password confirmation refinement, no
//!   error transform
//! - [`update_user`]: a bound, validated user id
//! - [`rename_user`]: the same idea built directly on [`FormAction::new`]

use crate::store::Subscribers;
use form_action_core::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The only user [`update_user`] knows.
pub const KNOWN_USER_ID: u64 = 9;

/// Business failures raised by the demo handlers.
#[derive(Debug, Error)]
pub enum DemoError {
    /// The email is already registered
    #[error("Already subscribed!")]
    AlreadySubscribed,

    /// No user with this id
    #[error("User with id={0} not found")]
    UserNotFound(u64),
}

/// Message shown for a handler failure: the text of a [`DemoError`], or a
/// generic message for anything else.
fn describe(error: &anyhow::Error) -> String {
    error
        .downcast_ref::<DemoError>()
        .map_or_else(|| "Unexpected error".to_string(), ToString::to_string)
}

#[derive(Debug, Deserialize)]
struct SubscribeInput {
    email: String,
}

/// Newsletter signup. A repeated email fails with "Already subscribed!".
#[must_use]
pub fn subscribe(subscribers: Subscribers) -> FormAction<(), String> {
    form_action()
        .input(schema::object().field("email", schema::email()))
        .error(|error, _ctx| describe(&error))
        .run(move |call: ActionCall<SubscribeInput>| {
            let subscribers = subscribers.clone();
            async move {
                if !subscribers.insert(&call.input.email).await {
                    anyhow::bail!(DemoError::AlreadySubscribed);
                }
                tracing::info!(email = %call.input.email, "subscribed");
                anyhow::Ok(())
            }
        })
}

/// Input of [`signup`] after validation.
#[derive(Debug, Deserialize)]
pub struct SignupInput {
    /// Account owner
    pub user: SignupUser,
    /// Chosen password, at least 8 characters
    pub password: String,
}

/// Nested `user` object of [`SignupInput`].
#[derive(Debug, Deserialize)]
pub struct SignupUser {
    /// Contact email
    pub email: String,
}

/// The signup form's schema: `user.email`, `password` and a matching
/// `confirm`. A mismatch is a form-level error.
#[must_use]
pub fn signup_schema() -> RefinedSchema {
    schema::object()
        .field("user", schema::object().field("email", schema::email()))
        .field("password", schema::string().min_length(8))
        .field("confirm", schema::string())
        .refine(
            |data: &Value| data["password"] == data["confirm"],
            "Passwords don't match",
        )
}

/// Account signup.
///
/// No error transform is installed, so a repeated email escapes as
/// [`ActionError::Handler`].
#[must_use]
pub fn signup(subscribers: Subscribers) -> FormAction<(), ()> {
    form_action()
        .input(signup_schema())
        .run(move |call: ActionCall<SignupInput>| {
            let subscribers = subscribers.clone();
            async move {
                if !subscribers.insert(&call.input.user.email).await {
                    anyhow::bail!(DemoError::AlreadySubscribed);
                }
                tracing::info!(
                    email = %call.input.user.email,
                    password_len = call.input.password.len(),
                    "signed up"
                );
                anyhow::Ok(())
            }
        })
}

/// Result of [`update_user`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedUser {
    /// The updated user's id
    pub user_id: u64,
}

/// Update a user whose id is bound as the single positional argument.
///
/// The argument must be a number; any id other than [`KNOWN_USER_ID`]
/// fails with "User with id=… not found".
#[must_use]
pub fn update_user() -> FormAction<UpdatedUser, String> {
    form_action()
        .args([schema::number()])
        .error(|error, _ctx| describe(&error))
        .run(|call: ActionCall| async move {
            let user_id: u64 = call.args.get(0)?;
            if user_id != KNOWN_USER_ID {
                anyhow::bail!(DemoError::UserNotFound(user_id));
            }
            anyhow::Ok(UpdatedUser { user_id })
        })
}

/// Result of [`rename_user`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenamedUser {
    /// The bound user id, verbatim
    pub user_id: String,
    /// The submitted `name` field, if any
    pub name: Option<String>,
}

/// Echo the bound user id and submitted name without any validation.
#[must_use]
pub fn rename_user() -> FormAction<RenamedUser, String> {
    FormAction::new(|submission: Submission<RenamedUser, String>| async move {
        let user_id = match submission.bound_args.first() {
            Some(Value::String(id)) => id.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        let name = submission.payload.get_text("name").map(str::to_string);
        anyhow::Ok(SubmissionState::success(RenamedUser { user_id, name }))
    })
}

/// The positional argument for a user id taken from a URL: a JSON number
/// when it parses as one, the raw string otherwise.
#[must_use]
pub fn user_id_arg(raw: &str) -> Value {
    raw.parse::<u64>().map_or_else(|_| Value::from(raw), Value::from)
}

//! Error types for action execution.
//!
//! Validation failures are never errors: they become
//! [`SubmissionState::Invalid`](crate::state::SubmissionState::Invalid).
//! The types here cover what escapes a submission instead: middleware
//! failures, handler failures without an error transform, and mismatches
//! between validated data and the Rust types a handler asks for.

use thiserror::Error;

/// A submission that could not produce a [`SubmissionState`](crate::state::SubmissionState).
#[derive(Error, Debug)]
pub enum ActionError {
    /// Building the context failed. Never converted by an error transform.
    #[error("context construction failed: {0}")]
    Context(#[from] ContextError),

    /// The handler failed and no error transform is installed.
    #[error("action handler failed: {0}")]
    Handler(#[source] anyhow::Error),

    /// The validated input does not deserialize into the handler's input type.
    #[error("validated input does not match the handler input type: {0}")]
    InputMismatch(#[source] serde_json::Error),
}

/// Failures while folding middleware into a [`Context`](crate::context::Context).
#[derive(Error, Debug)]
pub enum ContextError {
    /// A middleware returned an error.
    #[error("middleware #{index} failed: {source}")]
    Middleware {
        /// Position of the middleware in registration order
        index: usize,
        /// The middleware's error
        #[source]
        source: anyhow::Error,
    },

    /// A middleware contributed something other than an object.
    #[error("middleware #{index} returned {found}, expected an object")]
    NotAnObject {
        /// Position of the middleware in registration order
        index: usize,
        /// JSON type of the returned value
        found: &'static str,
    },

    /// A middleware tried to overwrite the submitted payload.
    #[error("middleware #{index} returned the reserved key `{key}`")]
    ReservedKey {
        /// Position of the middleware in registration order
        index: usize,
        /// The reserved key
        key: &'static str,
    },

    /// A requested context field is absent.
    #[error("context has no field `{0}`")]
    MissingKey(String),

    /// A context field does not deserialize into the requested type.
    #[error("context field `{key}` has an unexpected type: {source}")]
    KeyType {
        /// The requested field
        key: String,
        /// Deserialization error
        #[source]
        source: serde_json::Error,
    },
}

/// Failures reading a positional argument inside a handler.
#[derive(Error, Debug)]
pub enum ArgError {
    /// No argument at this position.
    #[error("no argument at position {0}")]
    Missing(usize),

    /// The argument does not deserialize into the requested type.
    #[error("argument {index} has an unexpected type: {source}")]
    Type {
        /// Argument position
        index: usize,
        /// Deserialization error
        #[source]
        source: serde_json::Error,
    },
}

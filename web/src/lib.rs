//! Axum web framework integration for form actions.
//!
//! This crate is the request/response shell around the form-action core:
//! it turns a submitted HTML form into [`FormData`](form_action_core::payload::FormData),
//! runs the action, and maps the resulting state to an HTTP response.
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives with a urlencoded or multipart body
//! 2. **Extract** the payload ([`FormPayload`]) and the client's previous
//!    state ([`PreviousState`])
//! 3. **Submit** the payload to the action
//! 4. **Map** the state to a response ([`ActionResponse`]): `422` for
//!    `invalid`, `200` otherwise
//! 5. **Errors** that escape the action become an [`AppError`] (`500`)
//!
//! # Example
//!
//! ```
//! use axum::{routing::get, Router};
//! use form_action_core::prelude::*;
//! use form_action_web::handlers::{health_check, submit_route};
//!
//! let subscribe = form_action()
//!     .input(schema::object().field("email", schema::email()))
//!     .error(|error, _ctx| error.to_string())
//!     .run(|_: ActionCall<serde_json::Value>| async { anyhow::Ok(true) });
//!
//! let app: Router = Router::new()
//!     .route("/health", get(health_check))
//!     .route("/subscribe", submit_route(subscribe, false));
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;

// Re-export key types for convenience
pub use error::{AppError, PayloadError};
pub use extractors::{FormPayload, PreviousState, STATE_HEADER};
pub use response::{state_header, ActionResponse, ViewResponse, TAG_HEADER};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;

//! HTTP request handlers.
//!
//! [`action`] mounts form actions and action stores as routes; [`health`]
//! is the liveness probe.

pub mod action;
pub mod health;

pub use action::{dispatch_route, submit_route, view_handler};
pub use health::health_check;

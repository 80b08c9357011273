//! Demo server for form actions.
//!
//! Serves the reference actions over HTTP: newsletter subscribe, account
//! signup with password confirmation, and a user update bound to a URL
//! parameter. Registered emails live in an in-memory [`store::Subscribers`]
//! set that the handlers call into.

pub mod actions;
pub mod config;
pub mod server;
pub mod store;

pub use config::Config;
pub use server::{build_router, AppState};

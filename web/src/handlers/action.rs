//! Routes backed by form actions.
//!
//! Two ways to serve an action:
//!
//! - [`submit_route`]: stateless. The client echoes its last state in the
//!   [`STATE_HEADER`](crate::extractors::STATE_HEADER) header and receives
//!   the next one, as a progressively enhanced HTML form would.
//! - [`dispatch_route`] and [`view_handler`]: the server keeps the state in
//!   an [`ActionStore`] and answers with the full [`ActionView`](form_action_core::state::ActionView).
//!   The store is one form instance, so these routes suit a single client
//!   such as a kiosk, a demo or an internal tool. Serve multi-user forms
//!   with [`submit_route`].
//!
//! # Example
//!
//! ```
//! use axum::Router;
//! use form_action_core::prelude::*;
//! use form_action_web::handlers::submit_route;
//!
//! let greet = form_action()
//!     .input(schema::object().field("name", schema::string().min_length(1)))
//!     .error(|error, _ctx| error.to_string())
//!     .run(|call: ActionCall<serde_json::Value>| async move {
//!         anyhow::Ok(format!("Hello, {}!", call.input["name"].as_str().unwrap_or_default()))
//!     });
//!
//! let app: Router = Router::new().route("/greet", submit_route(greet, String::new()));
//! ```

use crate::error::AppError;
use crate::extractors::{FormPayload, PreviousState};
use crate::response::{ActionResponse, ViewResponse};
use axum::extract::State;
use axum::routing::{post, MethodRouter};
use form_action_core::action::FormAction;
use form_action_runtime::ActionStore;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A `POST` route submitting the form to `action`.
///
/// Without a previous-state header the submission starts from the
/// `initial` state carrying `initial`.
pub fn submit_route<D, E, S>(action: FormAction<D, E>, initial: D) -> MethodRouter<S>
where
    D: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    E: Serialize + DeserializeOwned + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    post(
        move |previous: PreviousState<D, E>, FormPayload(payload): FormPayload| async move {
            let state = action.submit(previous.or_initial(initial), payload).await?;
            Ok::<_, AppError>(ActionResponse(state))
        },
    )
}

/// A `POST` route dispatching the form through `store`.
///
/// Every request shares `store`: one client's result is the next client's
/// previous state, and the pending flag covers all of them.
pub fn dispatch_route<D, E, S>(store: ActionStore<D, E>) -> MethodRouter<S>
where
    D: Serialize + Clone + Send + Sync + 'static,
    E: Serialize + Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    post(move |FormPayload(payload): FormPayload| async move {
        let view = store.dispatch(payload).await?;
        Ok::<_, AppError>(ViewResponse(view))
    })
}

/// `GET` handler returning the store's current view.
pub async fn view_handler<D, E>(State(store): State<ActionStore<D, E>>) -> ViewResponse<D, E>
where
    D: Serialize + Clone + Send + Sync + 'static,
    E: Serialize + Clone + Send + Sync + 'static,
{
    ViewResponse(store.view().await)
}

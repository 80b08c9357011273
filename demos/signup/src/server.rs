//! HTTP routes of the demo.

use crate::actions::{self, RenamedUser, UpdatedUser};
use crate::store::Subscribers;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use form_action_core::action::FormAction;
use form_action_runtime::metrics::MetricsServer;
use form_action_runtime::ActionStore;
use form_action_web::handlers::{dispatch_route, health_check, submit_route, view_handler};
use form_action_web::{ActionResponse, FormPayload, PreviousState, WebResult};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Registered emails
    pub subscribers: Subscribers,
    /// Prometheus recorder, when installed
    pub metrics: Option<Arc<MetricsServer>>,
    update_user: FormAction<UpdatedUser, String>,
    rename_user: FormAction<RenamedUser, String>,
}

impl AppState {
    /// Create the state around `subscribers`.
    #[must_use]
    pub fn new(subscribers: Subscribers) -> Self {
        Self {
            subscribers,
            metrics: None,
            update_user: actions::update_user(),
            rename_user: actions::rename_user(),
        }
    }

    /// Serve `/metrics` from `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsServer) -> Self {
        self.metrics = Some(Arc::new(metrics));
        self
    }
}

/// Build the router.
///
/// | Route | Action |
/// |---|---|
/// | `POST /subscribe` | [`actions::subscribe`] |
/// | `POST /signup` | [`actions::signup`] |
/// | `POST /users/:id` | [`actions::update_user`] bound to `id` |
/// | `POST /react/users/:id` | [`actions::rename_user`] bound to `id` |
/// | `GET, POST /newsletter` | [`actions::subscribe`] through an [`ActionStore`] |
///
/// `/newsletter` holds a single form state for the whole server, shared by
/// every client.
pub fn build_router(state: AppState) -> Router {
    let newsletter = ActionStore::new(actions::subscribe(state.subscribers.clone()), ());
    let newsletter_routes = Router::new()
        .route(
            "/newsletter",
            dispatch_route(newsletter.clone()).get(view_handler::<(), String>),
        )
        .with_state(newsletter);

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/subscribe", submit_route(actions::subscribe(state.subscribers.clone()), ()))
        .route("/signup", submit_route(actions::signup(state.subscribers.clone()), ()))
        .route("/users/:id", post(update_user))
        .route("/react/users/:id", post(rename_user))
        .with_state(state)
        .merge(newsletter_routes)
        .layer(TraceLayer::new_for_http())
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    previous: PreviousState<UpdatedUser, String>,
    FormPayload(payload): FormPayload,
) -> WebResult<ActionResponse<UpdatedUser, String>> {
    let next = state
        .update_user
        .bind([actions::user_id_arg(&id)])
        .submit(previous.or_initial(UpdatedUser::default()), payload)
        .await?;
    Ok(ActionResponse(next))
}

async fn rename_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    previous: PreviousState<RenamedUser, String>,
    FormPayload(payload): FormPayload,
) -> WebResult<ActionResponse<RenamedUser, String>> {
    let next = state
        .rename_user
        .bind([id])
        .submit(previous.or_initial(RenamedUser::default()), payload)
        .await?;
    Ok(ActionResponse(next))
}

#[allow(clippy::unused_async)]
async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.as_deref().and_then(MetricsServer::render) {
        Some(body) => (StatusCode::OK, body),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}

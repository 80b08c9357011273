//! Submission states as HTTP responses.

use crate::extractors::STATE_HEADER;
use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use form_action_core::state::{ActionView, SubmissionState};
use serde::Serialize;

/// Header naming the tag of the returned state.
pub static TAG_HEADER: HeaderName = HeaderName::from_static("x-form-action-tag");

/// A submission state as a JSON response.
///
/// `invalid` states answer `422 Unprocessable Entity`; every other state,
/// `failure` included, answers `200 OK` since it is a normal outcome the
/// form renders. The [`TAG_HEADER`] carries the tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse<D, E>(pub SubmissionState<D, E>);

impl<D: Serialize, E: Serialize> IntoResponse for ActionResponse<D, E> {
    fn into_response(self) -> Response {
        let status = if self.0.is_invalid() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::OK
        };
        let tag = HeaderValue::from_static(self.0.tag().as_str());

        (status, [(TAG_HEADER.clone(), tag)], Json(self.0)).into_response()
    }
}

/// An [`ActionView`] as a JSON response, for clients that render the
/// derived flags directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewResponse<D, E>(pub ActionView<D, E>);

impl<D: Serialize, E: Serialize> IntoResponse for ViewResponse<D, E> {
    fn into_response(self) -> Response {
        let tag = HeaderValue::from_static(self.0.state.tag().as_str());
        (StatusCode::OK, [(TAG_HEADER.clone(), tag)], Json(self.0)).into_response()
    }
}

/// The header pair a client sends back as its previous state.
///
/// # Errors
///
/// Returns an error if the state cannot be serialized or is not a valid
/// header value.
pub fn state_header<D: Serialize, E: Serialize>(
    state: &SubmissionState<D, E>,
) -> anyhow::Result<(HeaderName, HeaderValue)> {
    let json = serde_json::to_string(state)?;
    Ok((STATE_HEADER.clone(), HeaderValue::from_str(&json)?))
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use form_action_core::error_tree::ErrorTree;
    use serde_json::{json, Value};

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn test_invalid_is_422() {
        let state = SubmissionState::<(), ()>::invalid(ErrorTree::with_error("Required"));
        let response = ActionResponse(state).into_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.headers()[&TAG_HEADER], "invalid");
        assert_eq!(
            body_json(response).await,
            json!({ "tag": "invalid", "data": null, "error": null, "validationError": { "errors": ["Required"] } })
        );
    }

    #[tokio::test]
    async fn test_failure_is_200() {
        let response = ActionResponse(SubmissionState::<(), _>::failure("nope")).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[&TAG_HEADER], "failure");
    }

    #[tokio::test]
    async fn test_view_carries_flags() {
        let view = SubmissionState::<u8, ()>::success(3).view(false);
        let body = body_json(ViewResponse(view).into_response()).await;
        assert_eq!(body["isSuccess"], true);
        assert_eq!(body["isPending"], false);
        assert_eq!(body["data"], 3);
    }

    #[test]
    fn test_state_header_round_trip() {
        let (name, value) = state_header(&SubmissionState::<u8, String>::success(1)).expect("header");
        assert_eq!(name, STATE_HEADER);
        let back: SubmissionState<u8, String> =
            serde_json::from_slice(value.as_bytes()).expect("valid state");
        assert_eq!(back, SubmissionState::success(1));
    }
}

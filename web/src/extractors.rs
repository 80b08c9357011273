//! Custom Axum extractors.
//!
//! - [`FormPayload`]: the submitted form as [`FormData`], from an
//!   `application/x-www-form-urlencoded` or `multipart/form-data` body
//! - [`PreviousState`]: the state the client last rendered, echoed back in
//!   the [`STATE_HEADER`] header
//!
//! # Examples
//!
//! ```ignore
//! use form_action_web::extractors::{FormPayload, PreviousState};
//!
//! async fn subscribe(
//!     previous: PreviousState<bool, String>,
//!     FormPayload(payload): FormPayload,
//! ) -> Result<ActionResponse<bool, String>, AppError> {
//!     let state = action.submit(previous.or_initial(false), payload).await?;
//!     Ok(ActionResponse(state))
//! }
//! ```

use crate::error::PayloadError;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Multipart, Request},
    http::{header::CONTENT_TYPE, request::Parts, HeaderName},
};
use form_action_core::payload::{FormData, FormFile};
use form_action_core::state::SubmissionState;
use serde::de::DeserializeOwned;

/// Header carrying the JSON-serialized previous submission state.
pub static STATE_HEADER: HeaderName = HeaderName::from_static("x-form-action-state");

const URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART: &str = "multipart/form-data";

/// The submitted form.
///
/// A body without a content type is read as urlencoded. File parts of a
/// multipart body become [`FormFile`] values; every other part is text.
#[derive(Debug, Clone, Default)]
pub struct FormPayload(pub FormData);

#[async_trait]
impl<S> FromRequest<S> for FormPayload
where
    S: Send + Sync,
{
    type Rejection = PayloadError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with(MULTIPART) {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| PayloadError::Multipart(e.body_text()))?;
            return read_multipart(multipart).await.map(Self);
        }

        if content_type.is_empty() || content_type.starts_with(URLENCODED) {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|e| PayloadError::Body(e.body_text()))?;
            return Ok(Self(FormData::from_urlencoded(&body)));
        }

        Err(PayloadError::UnsupportedContentType(content_type))
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<FormData, PayloadError> {
    let mut form = FormData::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PayloadError::Multipart(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_string);
                let content = field
                    .bytes()
                    .await
                    .map_err(|e| PayloadError::Multipart(e.body_text()))?;
                form.append(name, FormFile::new(file_name, content_type, content));
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| PayloadError::Multipart(e.body_text()))?;
                form.append(name, text);
            }
        }
    }

    tracing::debug!(fields = form.len(), "read multipart form");
    Ok(form)
}

/// The previous submission state sent by the client, if any.
///
/// A missing header means the client has not submitted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviousState<D, E>(pub Option<SubmissionState<D, E>>);

impl<D, E> PreviousState<D, E> {
    /// The sent state, or the `initial` state carrying `data`.
    #[must_use]
    pub fn or_initial(self, data: D) -> SubmissionState<D, E> {
        self.0.unwrap_or(SubmissionState::Initial(data))
    }
}

#[async_trait]
impl<S, D, E> FromRequestParts<S> for PreviousState<D, E>
where
    S: Send + Sync,
    D: DeserializeOwned,
    E: DeserializeOwned,
{
    type Rejection = PayloadError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(&STATE_HEADER) else {
            return Ok(Self(None));
        };

        serde_json::from_slice(header.as_bytes())
            .map(|state| Self(Some(state)))
            .map_err(PayloadError::PreviousState)
    }
}

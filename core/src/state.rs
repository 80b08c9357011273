//! Submission state machine.
//!
//! A [`SubmissionState`] is the result of one submission cycle. It has four
//! variants, and exactly one of `data`, `error` and `validationError` is
//! populated, determined by the variant. The boolean status flags are
//! projections of the tag ([`SubmissionState::flags`]) and are never stored.
//!
//! Across a serialization boundary the state is a plain record:
//!
//! ```
//! use form_action_core::state::SubmissionState;
//! use serde_json::json;
//!
//! let state: SubmissionState<u32, String> = SubmissionState::failure("whoops".into());
//! assert_eq!(
//!     serde_json::to_value(&state)?,
//!     json!({ "tag": "failure", "data": null, "error": "whoops", "validationError": null })
//! );
//!
//! // documents breaking the one-populated-field rule are rejected
//! let forged = json!({ "tag": "success", "data": 1, "error": "x", "validationError": null });
//! assert!(serde_json::from_value::<SubmissionState<u32, String>>(forged).is_err());
//! # Ok::<(), serde_json::Error>(())
//! ```

use crate::error_tree::ErrorTree;
use crate::field_error::{resolve_opt, FieldError};
use serde::de::{Error as _, IntoDeserializer};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Discriminant of a [`SubmissionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateTag {
    /// No submission completed yet
    Initial,
    /// The payload or bound arguments failed validation
    Invalid,
    /// The handler failed and the failure was transformed
    Failure,
    /// The handler succeeded
    Success,
}

impl StateTag {
    /// The tag as serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Invalid => "invalid",
            Self::Failure => "failure",
            Self::Success => "success",
        }
    }
}

impl fmt::Display for StateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of a submission cycle.
///
/// `D` is the success data (also the caller-supplied initial value) and `E`
/// the transformed handler error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState<D, E> {
    /// Before any submission; carries the caller's default data.
    Initial(D),
    /// Validation failed.
    Invalid(ErrorTree),
    /// The handler failed; carries the transformed error.
    Failure(E),
    /// The handler returned data.
    Success(D),
}

impl<D, E> SubmissionState<D, E> {
    /// Initial state with caller-supplied default data.
    #[must_use]
    pub const fn initial(data: D) -> Self {
        Self::Initial(data)
    }

    /// Validation failure.
    #[must_use]
    pub const fn invalid(validation_error: ErrorTree) -> Self {
        Self::Invalid(validation_error)
    }

    /// Transformed handler failure.
    #[must_use]
    pub const fn failure(error: E) -> Self {
        Self::Failure(error)
    }

    /// Handler success.
    #[must_use]
    pub const fn success(data: D) -> Self {
        Self::Success(data)
    }

    /// The active tag.
    #[must_use]
    pub const fn tag(&self) -> StateTag {
        match self {
            Self::Initial(_) => StateTag::Initial,
            Self::Invalid(_) => StateTag::Invalid,
            Self::Failure(_) => StateTag::Failure,
            Self::Success(_) => StateTag::Success,
        }
    }

    /// Data of an initial or success state.
    #[must_use]
    pub const fn data(&self) -> Option<&D> {
        match self {
            Self::Initial(data) | Self::Success(data) => Some(data),
            Self::Invalid(_) | Self::Failure(_) => None,
        }
    }

    /// Error of a failure state.
    #[must_use]
    pub const fn error(&self) -> Option<&E> {
        match self {
            Self::Failure(error) => Some(error),
            _ => None,
        }
    }

    /// Error tree of an invalid state.
    #[must_use]
    pub const fn validation_error(&self) -> Option<&ErrorTree> {
        match self {
            Self::Invalid(tree) => Some(tree),
            _ => None,
        }
    }

    /// Whether this is the initial state.
    #[must_use]
    pub const fn is_initial(&self) -> bool {
        matches!(self, Self::Initial(_))
    }

    /// Whether validation failed.
    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// Whether the handler failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Whether the handler succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The four mutually exclusive tag flags.
    #[must_use]
    pub const fn flags(&self) -> StatusFlags {
        StatusFlags::from_tag(self.tag())
    }

    /// Messages for a dot-separated field name; empty unless invalid.
    #[must_use]
    pub fn field_error<'s, 'n>(&'s self, name: &'n str) -> FieldError<'s, 'n> {
        resolve_opt(self.validation_error(), name)
    }

    /// Presentation snapshot with the given in-flight flag.
    #[must_use]
    pub const fn view(self, is_pending: bool) -> ActionView<D, E> {
        ActionView {
            state: self,
            is_pending,
        }
    }
}

impl<D: Default, E> Default for SubmissionState<D, E> {
    fn default() -> Self {
        Self::Initial(D::default())
    }
}

impl<D: Serialize, E: Serialize> Serialize for SubmissionState<D, E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut record = serializer.serialize_struct("SubmissionState", 4)?;
        write_state_fields::<S, D, E>(&mut record, self)?;
        record.end()
    }
}

fn write_state_fields<S, D, E>(
    record: &mut S::SerializeStruct,
    state: &SubmissionState<D, E>,
) -> Result<(), S::Error>
where
    S: Serializer,
    D: Serialize,
    E: Serialize,
{
    record.serialize_field("tag", &state.tag())?;
    record.serialize_field("data", &state.data())?;
    record.serialize_field("error", &state.error())?;
    record.serialize_field("validationError", &state.validation_error())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateRecord<D, E> {
    tag: StateTag,
    data: Option<D>,
    error: Option<E>,
    validation_error: Option<ErrorTree>,
}

impl<'de, D, E> Deserialize<'de> for SubmissionState<D, E>
where
    D: Deserialize<'de>,
    E: Deserialize<'de>,
{
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        let record = StateRecord::<D, E>::deserialize(deserializer)?;

        let inactive = |field: &'static str, present: bool| {
            if present {
                Err(De::Error::custom(format_args!(
                    "`{field}` must be null in a `{}` state",
                    record.tag
                )))
            } else {
                Ok(())
            }
        };

        match record.tag {
            StateTag::Initial | StateTag::Success => {
                inactive("error", record.error.is_some())?;
                inactive("validationError", record.validation_error.is_some())?;
            }
            StateTag::Invalid => {
                inactive("data", record.data.is_some())?;
                inactive("error", record.error.is_some())?;
            }
            StateTag::Failure => {
                inactive("data", record.data.is_some())?;
                inactive("validationError", record.validation_error.is_some())?;
            }
        }

        Ok(match record.tag {
            StateTag::Initial => Self::Initial(active(record.data, "data")?),
            StateTag::Success => Self::Success(active(record.data, "data")?),
            StateTag::Failure => Self::Failure(active(record.error, "error")?),
            StateTag::Invalid => Self::Invalid(
                record
                    .validation_error
                    .ok_or_else(|| De::Error::missing_field("validationError"))?,
            ),
        })
    }
}

/// The value of the active field. A `null` is accepted when the field's
/// type itself deserializes from nothing (unit, `Option`).
fn active<'de, T, Er>(value: Option<T>, field: &'static str) -> Result<T, Er>
where
    T: Deserialize<'de>,
    Er: serde::de::Error,
{
    match value {
        Some(value) => Ok(value),
        None => T::deserialize(().into_deserializer())
            .map_err(|_: Er| Er::custom(format_args!("`{field}` must not be null"))),
    }
}

/// Flags derived from a [`StateTag`]; exactly one is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct StatusFlags {
    /// Tag is `initial`
    pub is_initial: bool,
    /// Tag is `invalid`
    pub is_invalid: bool,
    /// Tag is `failure`
    pub is_failure: bool,
    /// Tag is `success`
    pub is_success: bool,
}

impl StatusFlags {
    /// Project a tag onto its flags.
    #[must_use]
    pub const fn from_tag(tag: StateTag) -> Self {
        Self {
            is_initial: matches!(tag, StateTag::Initial),
            is_invalid: matches!(tag, StateTag::Invalid),
            is_failure: matches!(tag, StateTag::Failure),
            is_success: matches!(tag, StateTag::Success),
        }
    }
}

/// What a presentation layer reads back: the current state, its derived
/// flags and whether a submission is in flight.
///
/// While pending, the state shown is the previous cycle's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionView<D, E> {
    /// The latest completed state
    pub state: SubmissionState<D, E>,
    /// Whether a submission is in flight
    pub is_pending: bool,
}

impl<D, E> ActionView<D, E> {
    /// The tag flags of the current state.
    #[must_use]
    pub const fn flags(&self) -> StatusFlags {
        self.state.flags()
    }
}

impl<D: Serialize, E: Serialize> Serialize for ActionView<D, E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let flags = self.flags();
        let mut record = serializer.serialize_struct("ActionView", 9)?;
        write_state_fields::<S, D, E>(&mut record, &self.state)?;
        record.serialize_field("isInitial", &flags.is_initial)?;
        record.serialize_field("isInvalid", &flags.is_invalid)?;
        record.serialize_field("isFailure", &flags.is_failure)?;
        record.serialize_field("isSuccess", &flags.is_success)?;
        record.serialize_field("isPending", &self.is_pending)?;
        record.end()
    }
}

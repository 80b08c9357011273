//! Input and argument schemas.
//!
//! Schemas validate a submitted [`FormData`] payload into a JSON value,
//! reporting failures as an [`ErrorTree`]. Field schemas ([`Schema`]) are
//! composed into [`ObjectSchema`]s; cross-field rules turn an object schema
//! into a [`RefinedSchema`]. Positional action arguments are validated by an
//! [`ArgsSchema`].
//!
//! # Example
//!
//! ```
//! use form_action_core::payload::FormData;
//! use form_action_core::schema::{self, InputSchema};
//! use serde_json::json;
//!
//! let signup = schema::object()
//!     .field("user", schema::object().field("email", schema::email()))
//!     .field("password", schema::string().min_length(8))
//!     .field("confirm", schema::string())
//!     .refine_at(
//!         "confirm",
//!         |v| v["password"] == v["confirm"],
//!         "Passwords don't match",
//!     );
//!
//! let payload = FormData::new()
//!     .with("user.email", "ann@example.com")
//!     .with("password", "nbusr123")
//!     .with("confirm", "nbusr123");
//!
//! assert_eq!(
//!     signup.safe_parse(&payload),
//!     Ok(json!({
//!         "user": { "email": "ann@example.com" },
//!         "password": "nbusr123",
//!         "confirm": "nbusr123"
//!     }))
//! );
//! ```

mod args;
mod object;
mod value;

pub use args::ArgsSchema;
pub use object::{ObjectSchema, RefinedSchema};
pub use value::{Predicate, Schema};
pub(crate) use value::type_name;

use crate::error_tree::ErrorTree;
use crate::payload::FormData;
use serde_json::Value;

/// A schema that can validate a whole form payload.
pub trait InputSchema: Clone + Send + Sync + 'static {
    /// Validate the payload, returning the parsed value or every failure.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorTree`] describing each invalid field.
    fn safe_parse(&self, payload: &FormData) -> Result<Value, ErrorTree>;

    /// Whether the schema carries cross-field refinements, which rule out
    /// merging further object schemas into it.
    fn has_effects(&self) -> bool;
}

/// The absence of an input schema: every payload validates to `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoInput;

impl InputSchema for NoInput {
    fn safe_parse(&self, _payload: &FormData) -> Result<Value, ErrorTree> {
        Ok(Value::Null)
    }

    fn has_effects(&self) -> bool {
        false
    }
}

/// An empty object schema.
#[must_use]
pub const fn object() -> ObjectSchema {
    ObjectSchema::new()
}

/// Any value, unchecked.
#[must_use]
pub const fn any() -> Schema {
    Schema::any()
}

/// A string.
#[must_use]
pub const fn string() -> Schema {
    Schema::string()
}

/// A string holding an e-mail address.
#[must_use]
pub fn email() -> Schema {
    Schema::string().email()
}

/// A JSON number; text is rejected.
#[must_use]
pub const fn number() -> Schema {
    Schema::number(false)
}

/// A number, coercing submitted text. Blank text counts as absent.
#[must_use]
pub const fn numeric() -> Schema {
    Schema::number(true)
}

/// A JSON boolean.
#[must_use]
pub const fn boolean() -> Schema {
    Schema::boolean()
}

/// An HTML checkbox: `"on"` is `true`, absent is `false`.
#[must_use]
pub const fn checkbox() -> Schema {
    Schema::checkbox()
}

/// Exactly `value`.
#[must_use]
pub fn literal(value: impl Into<Value>) -> Schema {
    Schema::literal(value.into())
}

/// An uploaded file.
#[must_use]
pub const fn file() -> Schema {
    Schema::file()
}

/// A list of `item`; a single submitted value is read as a one-element list.
#[must_use]
pub fn array(item: Schema) -> Schema {
    Schema::array(item)
}

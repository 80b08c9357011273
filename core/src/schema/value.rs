//! Value schemas: the per-field building blocks.

use super::object::ObjectSchema;
use crate::error_tree::ErrorTree;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, LazyLock};

pub(crate) const REQUIRED: &str = "Required";
pub(crate) const INVALID_INPUT: &str = "Invalid input";

#[allow(clippy::expect_used)] // literal pattern
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@.]+$").expect("email pattern should compile")
});

/// Predicate over a parsed value.
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Debug, Clone)]
enum Kind {
    Any,
    String,
    Number { coerce: bool },
    Boolean,
    Checkbox,
    Literal(Value),
    File,
    Array(Box<Schema>),
    Object(ObjectSchema),
}

#[derive(Clone)]
enum Check {
    MinLength(usize),
    MaxLength(usize),
    Email,
    Min(f64),
    Max(f64),
    Custom { predicate: Predicate, message: String },
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinLength(n) => f.debug_tuple("MinLength").field(n).finish(),
            Self::MaxLength(n) => f.debug_tuple("MaxLength").field(n).finish(),
            Self::Email => f.write_str("Email"),
            Self::Min(n) => f.debug_tuple("Min").field(n).finish(),
            Self::Max(n) => f.debug_tuple("Max").field(n).finish(),
            Self::Custom { message, .. } => f
                .debug_struct("Custom")
                .field("message", message)
                .finish_non_exhaustive(),
        }
    }
}

impl Check {
    fn violation(&self, value: &Value) -> Option<String> {
        match self {
            Self::MinLength(min) => match value {
                Value::String(s) if s.chars().count() < *min => Some(format!(
                    "String must contain at least {min} character(s)"
                )),
                Value::Array(items) if items.len() < *min => Some(format!(
                    "Array must contain at least {min} element(s)"
                )),
                _ => None,
            },
            Self::MaxLength(max) => match value {
                Value::String(s) if s.chars().count() > *max => Some(format!(
                    "String must contain at most {max} character(s)"
                )),
                Value::Array(items) if items.len() > *max => Some(format!(
                    "Array must contain at most {max} element(s)"
                )),
                _ => None,
            },
            Self::Email => value
                .as_str()
                .filter(|s| !EMAIL.is_match(s))
                .map(|_| "Invalid email".to_string()),
            Self::Min(min) => value
                .as_f64()
                .filter(|n| n < min)
                .map(|_| format!("Number must be greater than or equal to {min}")),
            Self::Max(max) => value
                .as_f64()
                .filter(|n| n > max)
                .map(|_| format!("Number must be less than or equal to {max}")),
            Self::Custom { predicate, message } => {
                (!predicate(value)).then(|| message.clone())
            }
        }
    }
}

/// Schema for a single value.
///
/// Built with the constructors in [`crate::schema`] and refined with the
/// chainable checks below. Absent values fail with `"Required"` unless the
/// schema is [`Schema::optional`].
#[derive(Debug, Clone)]
pub struct Schema {
    kind: Kind,
    checks: Vec<Check>,
    optional: bool,
}

impl Schema {
    const fn of(kind: Kind) -> Self {
        Self {
            kind,
            checks: Vec::new(),
            optional: false,
        }
    }

    pub(crate) const fn any() -> Self {
        Self::of(Kind::Any)
    }

    pub(crate) const fn string() -> Self {
        Self::of(Kind::String)
    }

    pub(crate) const fn number(coerce: bool) -> Self {
        Self::of(Kind::Number { coerce })
    }

    pub(crate) const fn boolean() -> Self {
        Self::of(Kind::Boolean)
    }

    pub(crate) const fn checkbox() -> Self {
        Self::of(Kind::Checkbox)
    }

    pub(crate) const fn literal(value: Value) -> Self {
        Self::of(Kind::Literal(value))
    }

    pub(crate) const fn file() -> Self {
        Self::of(Kind::File)
    }

    pub(crate) fn array(item: Self) -> Self {
        Self::of(Kind::Array(Box::new(item)))
    }

    /// Require at least `min` characters (strings) or elements (arrays).
    #[must_use]
    pub fn min_length(mut self, min: usize) -> Self {
        self.checks.push(Check::MinLength(min));
        self
    }

    /// Allow at most `max` characters (strings) or elements (arrays).
    #[must_use]
    pub fn max_length(mut self, max: usize) -> Self {
        self.checks.push(Check::MaxLength(max));
        self
    }

    /// Require an e-mail address.
    #[must_use]
    pub fn email(mut self) -> Self {
        self.checks.push(Check::Email);
        self
    }

    /// Require a number greater than or equal to `min`.
    #[must_use]
    pub fn min(mut self, min: f64) -> Self {
        self.checks.push(Check::Min(min));
        self
    }

    /// Require a number less than or equal to `max`.
    #[must_use]
    pub fn max(mut self, max: f64) -> Self {
        self.checks.push(Check::Max(max));
        self
    }

    /// Add a custom check; `message` is reported when `predicate` is false.
    #[must_use]
    pub fn check<F>(mut self, predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.checks.push(Check::Custom {
            predicate: Arc::new(predicate),
            message: message.into(),
        });
        self
    }

    /// Accept an absent value, producing `null`.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Whether absent values are accepted.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Validate one value; `None` means the value was not submitted.
    ///
    /// # Errors
    ///
    /// Returns the [`ErrorTree`] rooted at this value when it does not match.
    pub fn parse(&self, value: Option<&Value>) -> Result<Value, ErrorTree> {
        let Some(value) = value.filter(|v| !self.is_blank(v)) else {
            return match self.kind {
                Kind::Checkbox => Ok(Value::Bool(false)),
                _ if self.optional => Ok(Value::Null),
                _ => Err(ErrorTree::with_error(REQUIRED)),
            };
        };

        let parsed = self.parse_kind(value)?;

        let mut tree = ErrorTree::new();
        for check in &self.checks {
            if let Some(message) = check.violation(&parsed) {
                tree.push(message);
            }
        }

        if tree.is_empty() { Ok(parsed) } else { Err(tree) }
    }

    /// `null`, blank text for coerced numbers and an unselected file input
    /// count as not submitted.
    fn is_blank(&self, value: &Value) -> bool {
        match (&self.kind, value) {
            (_, Value::Null) => true,
            (Kind::Number { coerce: true }, Value::String(s)) => s.trim().is_empty(),
            (Kind::File, _) => file_metadata(value) == Some(("", 0)),
            _ => false,
        }
    }

    fn parse_kind(&self, value: &Value) -> Result<Value, ErrorTree> {
        match (&self.kind, value) {
            (Kind::Any, _)
            | (Kind::String, Value::String(_))
            | (Kind::Number { .. }, Value::Number(_))
            | (Kind::Boolean, Value::Bool(_)) => Ok(value.clone()),

            (Kind::Number { coerce: true }, Value::String(s)) => coerce_number(s.trim())
                .ok_or_else(|| ErrorTree::with_error("Expected number, received nan")),

            (Kind::Checkbox, Value::String(s)) if s == "on" => Ok(Value::Bool(true)),
            (Kind::Checkbox, Value::Bool(b)) => Ok(Value::Bool(*b)),
            (Kind::Checkbox, _) => Err(ErrorTree::with_error(INVALID_INPUT)),

            (Kind::Literal(expected), _) => {
                if value == expected {
                    Ok(value.clone())
                } else {
                    Err(ErrorTree::with_error(format!(
                        "Invalid literal value, expected {expected}"
                    )))
                }
            }

            (Kind::File, _) if file_metadata(value).is_some() => Ok(value.clone()),

            (Kind::Array(item), Value::Array(elements)) => parse_elements(item, elements),
            // a single submitted value is a one-element list
            (Kind::Array(item), single) => parse_elements(item, std::slice::from_ref(single)),

            (Kind::Object(object), _) => object.parse_value(value),

            (kind, _) => Err(ErrorTree::with_error(format!(
                "Expected {}, received {}",
                kind_name(kind),
                type_name(value)
            ))),
        }
    }
}

impl From<ObjectSchema> for Schema {
    fn from(value: ObjectSchema) -> Self {
        Self::of(Kind::Object(value))
    }
}

/// Name and size of expanded [`FormFile`](crate::payload::FormFile)
/// metadata. Text fields only ever expand to strings, so a numeric `size`
/// cannot be forged through dotted field names.
fn file_metadata(value: &Value) -> Option<(&str, u64)> {
    let meta = value.as_object()?;
    let name = meta.get("name")?.as_str()?;
    let size = meta.get("size")?.as_u64()?;
    Some((name, size))
}

fn parse_elements(item: &Schema, elements: &[Value]) -> Result<Value, ErrorTree> {
    let mut tree = ErrorTree::new();
    let mut parsed = Vec::with_capacity(elements.len());

    for (index, element) in elements.iter().enumerate() {
        match item.parse(Some(element)) {
            Ok(value) => parsed.push(value),
            Err(subtree) => tree.insert_item(index, subtree),
        }
    }

    if tree.is_empty() { Ok(Value::Array(parsed)) } else { Err(tree) }
}

fn coerce_number(text: &str) -> Option<Value> {
    if let Ok(integer) = text.parse::<i64>() {
        return Some(Value::from(integer));
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

const fn kind_name(kind: &Kind) -> &'static str {
    match kind {
        Kind::Any => "any",
        Kind::String => "string",
        Kind::Number { .. } => "number",
        Kind::Boolean | Kind::Checkbox => "boolean",
        Kind::Literal(_) => "literal",
        Kind::File => "file",
        Kind::Array(_) => "array",
        Kind::Object(_) => "object",
    }
}

/// Name of a JSON value's type, as used in mismatch messages.
pub(crate) const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic
mod tests {
    use super::*;
    use serde_json::json;

    fn messages(result: Result<Value, ErrorTree>) -> Vec<String> {
        result.err().map(|tree| tree.errors).unwrap_or_default()
    }

    #[test]
    fn test_required_and_optional() {
        assert_eq!(messages(Schema::string().parse(None)), [REQUIRED]);
        assert_eq!(Schema::string().optional().parse(None), Ok(Value::Null));
    }

    #[test]
    fn test_type_mismatch_message() {
        assert_eq!(
            messages(Schema::string().parse(Some(&json!(1)))),
            ["Expected string, received number"]
        );
        assert_eq!(
            messages(Schema::number(false).parse(Some(&json!("42")))),
            ["Expected number, received string"]
        );
    }

    #[test]
    fn test_numeric_coercion() {
        let numeric = Schema::number(true);
        assert_eq!(numeric.parse(Some(&json!("42"))), Ok(json!(42)));
        assert_eq!(numeric.parse(Some(&json!(" 1.5 "))), Ok(json!(1.5)));
        assert_eq!(messages(numeric.parse(Some(&json!("")))), [REQUIRED]);
        assert_eq!(
            messages(numeric.parse(Some(&json!("abc")))),
            ["Expected number, received nan"]
        );
    }

    #[test]
    fn test_checkbox() {
        let checkbox = Schema::checkbox();
        assert_eq!(checkbox.parse(Some(&json!("on"))), Ok(json!(true)));
        assert_eq!(checkbox.parse(None), Ok(json!(false)));
        assert_eq!(messages(checkbox.parse(Some(&json!("9")))), [INVALID_INPUT]);
    }

    #[test]
    fn test_string_checks_accumulate() {
        let schema = Schema::string().min_length(8).email();
        assert_eq!(
            messages(schema.parse(Some(&json!("a@b")))),
            ["String must contain at least 8 character(s)", "Invalid email"]
        );
        assert!(schema.parse(Some(&json!("ann@example.com"))).is_ok());
    }

    #[test]
    fn test_number_bounds() {
        let schema = Schema::number(false).min(1.0).max(10.0);
        assert_eq!(
            messages(schema.parse(Some(&json!(0)))),
            ["Number must be greater than or equal to 1"]
        );
        assert_eq!(
            messages(schema.parse(Some(&json!(11)))),
            ["Number must be less than or equal to 10"]
        );
    }

    #[test]
    fn test_custom_check() {
        let schema = Schema::number(false).check(|v| v == &json!(9), "Unknown user");
        assert!(schema.parse(Some(&json!(9))).is_ok());
        assert_eq!(messages(schema.parse(Some(&json!(123)))), ["Unknown user"]);
    }

    #[test]
    fn test_literal() {
        let schema = Schema::literal(json!("yes"));
        assert!(schema.parse(Some(&json!("yes"))).is_ok());
        assert_eq!(
            messages(schema.parse(Some(&json!("no")))),
            ["Invalid literal value, expected \"yes\""]
        );
    }

    #[test]
    fn test_array_reports_per_element() {
        let schema = Schema::array(Schema::number(true));
        assert_eq!(schema.parse(Some(&json!(["1", "2"]))), Ok(json!([1, 2])));
        assert_eq!(schema.parse(Some(&json!("3"))), Ok(json!([3])));

        let Err(tree) = schema.parse(Some(&json!(["1", "x"]))) else {
            panic!("expected element error");
        };
        assert_eq!(tree.items[&1].errors, ["Expected number, received nan"]);
    }

    #[test]
    fn test_file() {
        let meta = json!({ "name": "a.txt", "type": null, "size": 1 });
        assert!(Schema::file().parse(Some(&meta)).is_ok());
        assert_eq!(
            messages(Schema::file().parse(Some(&json!("a.txt")))),
            ["Expected file, received string"]
        );
    }

    #[test]
    fn test_file_rejects_text_metadata() {
        let forged = json!({ "name": "evil.exe", "size": "999999" });
        assert_eq!(
            messages(Schema::file().parse(Some(&forged))),
            ["Expected file, received object"]
        );
    }

    #[test]
    fn test_unselected_file_is_absent() {
        let empty = json!({ "name": "", "type": "application/octet-stream", "size": 0 });
        assert_eq!(messages(Schema::file().parse(Some(&empty))), [REQUIRED]);
        assert_eq!(Schema::file().optional().parse(Some(&empty)), Ok(Value::Null));

        let empty_named = json!({ "name": "blank.txt", "type": null, "size": 0 });
        assert!(Schema::file().parse(Some(&empty_named)).is_ok());
    }
}

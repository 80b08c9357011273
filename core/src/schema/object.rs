//! Object schemas and whole-object refinements.

use super::value::{type_name, Predicate, Schema};
use super::InputSchema;
use crate::error_tree::{parse_path, ErrorTree, PathSegment};
use crate::payload::FormData;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Schema for an object with named fields.
///
/// Unknown keys are dropped from the parsed output. Two object schemas can
/// be merged; once refined (see [`ObjectSchema::refine`]) the result is a
/// [`RefinedSchema`], which can no longer be merged.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    fields: Vec<(String, Schema)>,
}

impl ObjectSchema {
    /// An object schema without fields.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Add a field, replacing any earlier field of the same name.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        let name = name.into();
        let schema = schema.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = schema,
            None => self.fields.push((name, schema)),
        }
        self
    }

    /// Union of both field sets; on a name clash `other` wins.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        other
            .fields
            .iter()
            .cloned()
            .fold(self.clone(), |merged, (name, schema)| merged.field(name, schema))
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Add a whole-object check reporting at the object's root.
    #[must_use]
    pub fn refine<F>(self, predicate: F, message: impl Into<String>) -> RefinedSchema
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        RefinedSchema::from(self).refine(predicate, message)
    }

    /// Add a whole-object check reporting at the dot-separated `path`.
    #[must_use]
    pub fn refine_at<F>(self, path: &str, predicate: F, message: impl Into<String>) -> RefinedSchema
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        RefinedSchema::from(self).refine_at(path, predicate, message)
    }

    /// Validate a JSON value against this schema.
    ///
    /// # Errors
    ///
    /// Returns the [`ErrorTree`] of every failing field.
    pub fn parse_value(&self, value: &Value) -> Result<Value, ErrorTree> {
        let Value::Object(input) = value else {
            return Err(ErrorTree::with_error(format!(
                "Expected object, received {}",
                type_name(value)
            )));
        };

        let mut output = Map::new();
        let mut tree = ErrorTree::new();

        for (name, schema) in &self.fields {
            match schema.parse(input.get(name)) {
                Ok(parsed) => {
                    output.insert(name.clone(), parsed);
                }
                Err(subtree) => tree.insert_property(name.clone(), subtree),
            }
        }

        if tree.is_empty() {
            Ok(Value::Object(output))
        } else {
            Err(tree)
        }
    }
}

impl InputSchema for ObjectSchema {
    fn safe_parse(&self, payload: &FormData) -> Result<Value, ErrorTree> {
        self.parse_value(&payload.to_value())
    }

    fn has_effects(&self) -> bool {
        false
    }
}

#[derive(Clone)]
struct Refinement {
    predicate: Predicate,
    message: String,
    path: Vec<PathSegment>,
}

impl fmt::Debug for Refinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refinement")
            .field("message", &self.message)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// An object schema carrying cross-field refinements.
///
/// Refinements run only once every field has parsed, in the order they
/// were added; each failing one reports its message at its own path.
#[derive(Debug, Clone)]
pub struct RefinedSchema {
    base: ObjectSchema,
    refinements: Vec<Refinement>,
}

impl RefinedSchema {
    /// Add another check reporting at the object's root.
    #[must_use]
    pub fn refine<F>(self, predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.refine_at("", predicate, message)
    }

    /// Add another check reporting at the dot-separated `path`.
    #[must_use]
    pub fn refine_at<F>(mut self, path: &str, predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.refinements.push(Refinement {
            predicate: Arc::new(predicate),
            message: message.into(),
            path: parse_path(path),
        });
        self
    }

    /// The underlying field schema.
    #[must_use]
    pub const fn base(&self) -> &ObjectSchema {
        &self.base
    }

    /// Validate a JSON value: fields first, then refinements.
    ///
    /// # Errors
    ///
    /// Returns the field errors, or the messages of the failed refinements.
    pub fn parse_value(&self, value: &Value) -> Result<Value, ErrorTree> {
        let parsed = self.base.parse_value(value)?;

        let mut tree = ErrorTree::new();
        for refinement in &self.refinements {
            if !(refinement.predicate)(&parsed) {
                tree.push_at(&refinement.path, refinement.message.clone());
            }
        }

        if tree.is_empty() { Ok(parsed) } else { Err(tree) }
    }
}

impl From<ObjectSchema> for RefinedSchema {
    fn from(base: ObjectSchema) -> Self {
        Self {
            base,
            refinements: Vec::new(),
        }
    }
}

impl InputSchema for RefinedSchema {
    fn safe_parse(&self, payload: &FormData) -> Result<Value, ErrorTree> {
        self.parse_value(&payload.to_value())
    }

    fn has_effects(&self) -> bool {
        true
    }
}

//! Structured, path-addressable validation errors.
//!
//! An [`ErrorTree`] mirrors the shape of the validated input: every node holds
//! the messages attached to that node itself (`errors`), the subtrees of its
//! named fields (`properties`) and the subtrees of its positional elements
//! (`items`). Input schemas report under `properties`; positional argument
//! schemas report under `items`, so the two never collide.

use crate::payload::PATH_SEPARATOR;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The shared "no error" node.
///
/// Lookups of absent paths resolve to this value, so a missing field and a
/// field without errors look the same.
pub static NO_ERROR: ErrorTree = ErrorTree::new();

/// One step of a path into an [`ErrorTree`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A named field
    Key(String),
    /// A positional element
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        Self::Key(value.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

/// Split a dot-separated field name into key segments.
///
/// The empty string is the root path.
#[must_use]
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    if path.is_empty() {
        return Vec::new();
    }
    path.split(PATH_SEPARATOR).map(PathSegment::from).collect()
}

/// Nested validation errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorTree {
    /// Messages attached to this node itself
    #[serde(default)]
    pub errors: Vec<String>,
    /// Subtrees of named fields
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, ErrorTree>,
    /// Subtrees of positional elements
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub items: BTreeMap<usize, ErrorTree>,
}

impl ErrorTree {
    /// An empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            errors: Vec::new(),
            properties: BTreeMap::new(),
            items: BTreeMap::new(),
        }
    }

    /// A tree with a single root-level message.
    #[must_use]
    pub fn with_error(message: impl Into<String>) -> Self {
        let mut tree = Self::new();
        tree.errors.push(message.into());
        tree
    }

    /// Whether no message is attached anywhere in the tree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
            && self.properties.values().all(Self::is_empty)
            && self.items.values().all(Self::is_empty)
    }

    /// Attach a message to this node.
    pub fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Attach a message at `path` below this node, creating nodes as needed.
    pub fn push_at(&mut self, path: &[PathSegment], message: impl Into<String>) {
        let mut node = self;
        for segment in path {
            node = match segment {
                PathSegment::Key(key) => node.properties.entry(key.clone()).or_default(),
                PathSegment::Index(index) => node.items.entry(*index).or_default(),
            };
        }
        node.push(message);
    }

    /// Attach a non-empty subtree under a named field.
    pub fn insert_property(&mut self, key: impl Into<String>, subtree: Self) {
        if !subtree.is_empty() {
            self.properties.entry(key.into()).or_default().merge(subtree);
        }
    }

    /// Attach a non-empty subtree under a positional element.
    pub fn insert_item(&mut self, index: usize, subtree: Self) {
        if !subtree.is_empty() {
            self.items.entry(index).or_default().merge(subtree);
        }
    }

    /// Merge another tree into this one, concatenating messages node by node.
    pub fn merge(&mut self, other: Self) {
        self.errors.extend(other.errors);
        for (key, subtree) in other.properties {
            self.properties.entry(key).or_default().merge(subtree);
        }
        for (index, subtree) in other.items {
            self.items.entry(index).or_default().merge(subtree);
        }
    }

    /// Resolve a dot-separated field name; see [`crate::field_error::resolve`].
    #[must_use]
    pub fn field<'t, 'n>(&'t self, name: &'n str) -> crate::field_error::FieldError<'t, 'n> {
        crate::field_error::resolve(self, name)
    }

    /// Flatten into root messages plus per-field messages keyed by dot path.
    #[must_use]
    pub fn flatten(&self) -> FlattenedErrors {
        let mut flattened = FlattenedErrors {
            form_errors: self.errors.clone(),
            field_errors: BTreeMap::new(),
        };
        let mut path = Vec::new();
        self.collect_children(&mut path, &mut flattened.field_errors);
        flattened
    }

    fn collect_children(&self, path: &mut Vec<String>, out: &mut BTreeMap<String, Vec<String>>) {
        let children = self
            .properties
            .iter()
            .map(|(key, tree)| (key.clone(), tree))
            .chain(self.items.iter().map(|(index, tree)| (index.to_string(), tree)));

        for (segment, tree) in children {
            path.push(segment);
            if !tree.errors.is_empty() {
                out.entry(path.join(&PATH_SEPARATOR.to_string()))
                    .or_default()
                    .extend(tree.errors.iter().cloned());
            }
            tree.collect_children(path, out);
            path.pop();
        }
    }
}

/// Form-level and field-level messages with dot-path keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenedErrors {
    /// Messages attached to the root
    pub form_errors: Vec<String>,
    /// Messages attached to fields, keyed by dot path
    pub field_errors: BTreeMap<String, Vec<String>>,
}

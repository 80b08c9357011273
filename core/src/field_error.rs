//! Per-field lookup of validation messages.
//!
//! ```
//! use form_action_core::error_tree::{parse_path, ErrorTree};
//! use form_action_core::field_error::resolve;
//!
//! let mut tree = ErrorTree::new();
//! tree.push_at(&parse_path("exp.year"), "Required");
//!
//! assert_eq!(resolve(&tree, "exp.year").error, Some("Required"));
//! assert!(resolve(&tree, "exp.month").errors.is_empty());
//! assert!(resolve(&tree, "no.such.field").error.is_none());
//! ```

use crate::error_tree::{ErrorTree, NO_ERROR};
use crate::payload::PATH_SEPARATOR;
use serde::Serialize;

/// Messages resolved for one field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldError<'t, 'n> {
    /// The queried field name (empty for the root)
    pub name: &'n str,
    /// First message, if any
    pub error: Option<&'t str>,
    /// All messages, empty when the field has none
    pub errors: &'t [String],
}

impl FieldError<'_, '_> {
    /// Whether the field has at least one message.
    #[must_use]
    pub const fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Find the node addressed by a dot-separated field name.
///
/// Each segment is looked up among the node's named fields first, then,
/// if it parses as an index, among its positional elements. Any missing
/// segment yields [`NO_ERROR`].
#[must_use]
pub fn lookup<'t>(tree: &'t ErrorTree, name: &str) -> &'t ErrorTree {
    if name.is_empty() {
        return tree;
    }

    let mut node = tree;
    for segment in name.split(PATH_SEPARATOR) {
        let next = node.properties.get(segment).or_else(|| {
            segment
                .parse::<usize>()
                .ok()
                .and_then(|index| node.items.get(&index))
        });

        match next {
            Some(child) => node = child,
            None => return &NO_ERROR,
        }
    }
    node
}

/// Resolve the messages for `name`; the empty name selects root messages.
///
/// Never fails: absent fields resolve to no messages.
#[must_use]
pub fn resolve<'t, 'n>(tree: &'t ErrorTree, name: &'n str) -> FieldError<'t, 'n> {
    let node = lookup(tree, name);
    FieldError {
        name,
        error: node.errors.first().map(String::as_str),
        errors: &node.errors,
    }
}

/// Like [`resolve`], for callers holding an optional tree (no tree means
/// no messages).
#[must_use]
pub fn resolve_opt<'t, 'n>(tree: Option<&'t ErrorTree>, name: &'n str) -> FieldError<'t, 'n> {
    resolve(tree.unwrap_or(&NO_ERROR), name)
}

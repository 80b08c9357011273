//! Positional argument schemas.

use super::value::Schema;
use crate::error_tree::ErrorTree;
use serde_json::Value;

/// Schemas for the positional arguments bound to an action.
///
/// Failures are reported under [`ErrorTree::items`], keyed by position.
#[derive(Debug, Clone, Default)]
pub struct ArgsSchema {
    positions: Vec<Schema>,
}

impl ArgsSchema {
    /// Create a schema from one [`Schema`] per position.
    #[must_use]
    pub const fn new(positions: Vec<Schema>) -> Self {
        Self { positions }
    }

    /// Number of declared positions.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.positions.len()
    }

    /// Validate `args` position by position.
    ///
    /// Missing trailing arguments are treated as absent values, so optional
    /// positions may be left out. Extra arguments are rejected.
    ///
    /// # Errors
    ///
    /// Returns the [`ErrorTree`] of every failing position.
    pub fn validate(&self, args: &[Value]) -> Result<Vec<Value>, ErrorTree> {
        let mut tree = ErrorTree::new();

        if args.len() > self.positions.len() {
            tree.push(format!(
                "Expected {} argument(s), received {}",
                self.positions.len(),
                args.len()
            ));
        }

        let mut parsed = Vec::with_capacity(self.positions.len());
        for (index, schema) in self.positions.iter().enumerate() {
            match schema.parse(args.get(index)) {
                Ok(value) => parsed.push(value),
                Err(subtree) => tree.insert_item(index, subtree),
            }
        }

        if tree.is_empty() { Ok(parsed) } else { Err(tree) }
    }
}

impl<const N: usize> From<[Schema; N]> for ArgsSchema {
    fn from(positions: [Schema; N]) -> Self {
        Self::new(positions.into())
    }
}

impl From<Vec<Schema>> for ArgsSchema {
    fn from(positions: Vec<Schema>) -> Self {
        Self::new(positions)
    }
}

//! In-memory subscriber registry shared by the demo actions.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Emails that have already signed up.
///
/// Cloning is cheap; clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct Subscribers {
    emails: Arc<RwLock<HashSet<String>>>,
}

impl Subscribers {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `email`. Returns `false` if it was already registered.
    pub async fn insert(&self, email: &str) -> bool {
        self.emails.write().await.insert(email.to_string())
    }

    /// Whether `email` is registered.
    pub async fn contains(&self, email: &str) -> bool {
        self.emails.read().await.contains(email)
    }

    /// Number of registered emails.
    pub async fn len(&self) -> usize {
        self.emails.read().await.len()
    }

    /// Whether nobody is registered.
    pub async fn is_empty(&self) -> bool {
        self.emails.read().await.is_empty()
    }
}

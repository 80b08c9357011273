//! Per-submission context built by folding middleware.
//!
//! Every submission starts with a [`Context`] holding only the submitted
//! payload under [`FORM_DATA_KEY`]. Middleware run strictly in registration
//! order; each receives the context accumulated so far and returns an
//! object whose fields are merged into it, later fields replacing earlier
//! ones of the same name.
//!
//! # Example
//!
//! ```
//! use form_action_core::context::{build_context, Context, Middleware};
//! use form_action_core::payload::FormData;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let steps: Vec<Arc<dyn Middleware>> = vec![
//!     Arc::new(|_ctx: Context| async { anyhow::Ok(json!({ "a": 1 })) }),
//!     Arc::new(|ctx: Context| async move {
//!         let a: i64 = ctx.get_as("a")?;
//!         anyhow::Ok(json!({ "b": a * 3 }))
//!     }),
//! ];
//!
//! let ctx = build_context(Arc::new(FormData::new()), &steps).await?;
//! assert_eq!(ctx.to_value(), json!({ "a": 1, "b": 3, "formData": {} }));
//! # Ok::<(), form_action_core::error::ContextError>(())
//! # });
//! ```

use crate::error::ContextError;
use crate::payload::FormData;
use crate::schema::type_name;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;

/// Context key holding the submitted payload.
pub const FORM_DATA_KEY: &str = "formData";

/// Fields accumulated for one submission.
#[derive(Debug, Clone)]
pub struct Context {
    form_data: Arc<FormData>,
    values: Map<String, Value>,
}

impl Context {
    /// A context holding only the payload.
    #[must_use]
    pub fn new(form_data: Arc<FormData>) -> Self {
        Self {
            form_data,
            values: Map::new(),
        }
    }

    /// The submitted payload.
    #[must_use]
    pub fn form_data(&self) -> &FormData {
        &self.form_data
    }

    /// A field contributed by middleware.
    ///
    /// The payload is not one of them: [`FORM_DATA_KEY`] always yields
    /// `None` here. Read it through [`Context::form_data`] instead.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// A field contributed by middleware, deserialized into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::MissingKey`] when no middleware contributed
    /// `key`, or [`ContextError::KeyType`] when it does not fit `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, ContextError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ContextError::MissingKey(key.to_string()))?;
        T::deserialize(value).map_err(|source| ContextError::KeyType {
            key: key.to_string(),
            source,
        })
    }

    /// Whether a middleware contributed `key`. Always `false` for
    /// [`FORM_DATA_KEY`].
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Names of the fields contributed by middleware, without
    /// [`FORM_DATA_KEY`].
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// The whole context as JSON, payload included under [`FORM_DATA_KEY`].
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = self.values.clone();
        map.insert(
            FORM_DATA_KEY.to_string(),
            serde_json::to_value(&*self.form_data).unwrap_or_default(),
        );
        Value::Object(map)
    }

    fn apply(&mut self, index: usize, patch: Value) -> Result<(), ContextError> {
        match patch {
            Value::Null => Ok(()),
            Value::Object(fields) if fields.contains_key(FORM_DATA_KEY) => {
                Err(ContextError::ReservedKey {
                    index,
                    key: FORM_DATA_KEY,
                })
            }
            Value::Object(fields) => {
                self.values.extend(fields);
                Ok(())
            }
            other => Err(ContextError::NotAnObject {
                index,
                found: type_name(&other),
            }),
        }
    }
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// One context-building step.
///
/// Implemented for every `Fn(Context) -> impl Future<Output = anyhow::Result<T>>`
/// where `T` serializes to an object (or to `null` for no contribution).
pub trait Middleware: Send + Sync + 'static {
    /// Compute the fields to merge into `ctx`.
    fn call(&self, ctx: Context) -> BoxFuture<'static, anyhow::Result<Value>>;
}

impl<F, Fut, T> Middleware for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    T: Serialize + Send + 'static,
{
    fn call(&self, ctx: Context) -> BoxFuture<'static, anyhow::Result<Value>> {
        let step = self(ctx);
        Box::pin(async move {
            let patch = step.await?;
            Ok(serde_json::to_value(patch)?)
        })
    }
}

/// Run `middleware` in order over a fresh context for `form_data`.
///
/// Each step sees the fields of every step before it.
///
/// # Errors
///
/// Stops at the first failing step, returning a [`ContextError`] that
/// names its position.
#[tracing::instrument(skip_all, fields(steps = middleware.len()))]
pub async fn build_context(
    form_data: Arc<FormData>,
    middleware: &[Arc<dyn Middleware>],
) -> Result<Context, ContextError> {
    let mut ctx = Context::new(form_data);

    for (index, step) in middleware.iter().enumerate() {
        let patch = step
            .call(ctx.clone())
            .await
            .map_err(|source| ContextError::Middleware { index, source })?;
        ctx.apply(index, patch)?;
        tracing::debug!(index, "middleware applied");
    }

    Ok(ctx)
}

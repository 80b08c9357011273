//! Form actions and the chainable action builder.
//!
//! A [`FormAction`] is a callable taking a [`Submission`] (bound positional
//! arguments, the previous state and the submitted payload) and resolving
//! to the next [`SubmissionState`]. Actions are usually assembled with
//! [`form_action`]:
//!
//! ```
//! use form_action_core::action::{form_action, ActionCall};
//! use form_action_core::payload::FormData;
//! use form_action_core::schema;
//! use form_action_core::state::SubmissionState;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Subscribe {
//!     email: String,
//! }
//!
//! let subscribe = form_action()
//!     .input(schema::object().field("email", schema::email()))
//!     .error(|error, _ctx| error.to_string())
//!     .run(|call: ActionCall<Subscribe>| async move {
//!         anyhow::ensure!(call.input.email != "taken@example.com", "Already subscribed!");
//!         Ok(call.input.email)
//!     });
//!
//! # tokio_test::block_on(async {
//! let state = subscribe
//!     .submit(SubmissionState::initial(String::new()), FormData::new().with("email", "ann@example.com"))
//!     .await?;
//! assert_eq!(state, SubmissionState::success("ann@example.com".to_string()));
//!
//! let state = subscribe
//!     .submit(state, FormData::new().with("email", "taken@example.com"))
//!     .await?;
//! assert_eq!(state, SubmissionState::failure("Already subscribed!".to_string()));
//! # Ok::<(), form_action_core::error::ActionError>(())
//! # });
//! ```
//!
//! # Pipeline
//!
//! For every submission the produced action:
//!
//! 1. builds the [`Context`] by running the middleware in order;
//! 2. validates the bound arguments, returning `invalid` on failure;
//! 3. validates the payload, returning `invalid` on failure;
//! 4. calls the handler with `{ args, ctx, input }`;
//! 5. wraps a returned value in `success`;
//! 6. converts a handler error with the error transform into `failure`,
//!    or propagates it as [`ActionError::Handler`] when none is installed.
//!
//! Middleware errors are never converted; they propagate as
//! [`ActionError::Context`].

use crate::context::{build_context, Context, Middleware};
use crate::error::{ActionError, ArgError};
use crate::payload::FormData;
use crate::schema::{ArgsSchema, InputSchema, NoInput, ObjectSchema};
use crate::state::SubmissionState;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Future returned by a [`FormAction`].
pub type StateFuture<D, E> = BoxFuture<'static, Result<SubmissionState<D, E>, ActionError>>;

type ActionFn<D, E> = dyn Fn(Submission<D, E>) -> StateFuture<D, E> + Send + Sync;

type ErrorTransform<E> = Arc<dyn Fn(anyhow::Error, &Context) -> E + Send + Sync>;

/// Everything an action is invoked with.
///
/// Positional arguments precede the previous state, which precedes the
/// payload.
#[derive(Debug, Clone)]
pub struct Submission<D, E> {
    /// Arguments bound ahead of the submission
    pub bound_args: Vec<Value>,
    /// Result of the previous cycle
    pub previous_state: SubmissionState<D, E>,
    /// Submitted form fields
    pub payload: FormData,
}

/// A server-executed form handler.
///
/// Cloning is cheap; clones share the same handler.
pub struct FormAction<D, E> {
    inner: Arc<ActionFn<D, E>>,
}

impl<D, E> Clone for FormAction<D, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D, E> fmt::Debug for FormAction<D, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormAction").finish_non_exhaustive()
    }
}

impl<D, E> FormAction<D, E>
where
    D: Send + 'static,
    E: Send + 'static,
{
    /// Build an action directly from an async function of the submission.
    ///
    /// The function decides the next state itself; an error it returns
    /// propagates as [`ActionError::Handler`].
    ///
    /// ```
    /// use form_action_core::action::FormAction;
    /// use form_action_core::payload::FormData;
    /// use form_action_core::state::SubmissionState;
    ///
    /// let greet = FormAction::<String, ()>::new(|submission| async move {
    ///     anyhow::Ok(match submission.payload.get_text("name") {
    ///         Some(name) => SubmissionState::success(format!("Hello, {name}!")),
    ///         None => SubmissionState::failure(()),
    ///     })
    /// });
    ///
    /// # tokio_test::block_on(async {
    /// let state = greet.submit(SubmissionState::initial(String::new()), FormData::new().with("name", "Ann")).await?;
    /// assert_eq!(state.data().map(String::as_str), Some("Hello, Ann!"));
    /// # Ok::<(), form_action_core::error::ActionError>(())
    /// # });
    /// ```
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Submission<D, E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<SubmissionState<D, E>>> + Send + 'static,
    {
        Self::from_fn(move |submission| {
            let step = f(submission);
            Box::pin(async move { step.await.map_err(ActionError::Handler) })
        })
    }

    fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Submission<D, E>) -> StateFuture<D, E> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Invoke the action.
    pub fn call(&self, submission: Submission<D, E>) -> StateFuture<D, E> {
        (self.inner)(submission)
    }

    /// Invoke the action without bound arguments.
    pub fn submit(&self, previous_state: SubmissionState<D, E>, payload: FormData) -> StateFuture<D, E> {
        self.call(Submission {
            bound_args: Vec::new(),
            previous_state,
            payload,
        })
    }

    /// Bind positional arguments ahead of the submission.
    #[must_use]
    pub fn bind<I>(&self, args: I) -> BoundAction<D, E>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        BoundAction {
            action: self.clone(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// A [`FormAction`] with its positional arguments already supplied.
pub struct BoundAction<D, E> {
    action: FormAction<D, E>,
    args: Vec<Value>,
}

impl<D, E> Clone for BoundAction<D, E> {
    fn clone(&self) -> Self {
        Self {
            action: self.action.clone(),
            args: self.args.clone(),
        }
    }
}

impl<D, E> fmt::Debug for BoundAction<D, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundAction")
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

impl<D, E> BoundAction<D, E>
where
    D: Send + 'static,
    E: Send + 'static,
{
    /// The bound arguments.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Invoke the action with the bound arguments.
    pub fn submit(&self, previous_state: SubmissionState<D, E>, payload: FormData) -> StateFuture<D, E> {
        self.action.call(Submission {
            bound_args: self.args.clone(),
            previous_state,
            payload,
        })
    }
}

/// Positional arguments as seen by a handler, after validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Vec<Value>);

impl Args {
    /// The argument at `index`, deserialized into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ArgError`] when the argument is absent or has another type.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, ArgError> {
        let value = self.0.get(index).ok_or(ArgError::Missing(index))?;
        T::deserialize(value).map_err(|source| ArgError::Type { index, source })
    }

    /// All arguments deserialized into `T` (a tuple or a `Vec`).
    ///
    /// # Errors
    ///
    /// Returns [`ArgError::Type`] (at index 0) when the list does not fit `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ArgError> {
        T::deserialize(Value::Array(self.0.clone()))
            .map_err(|source| ArgError::Type { index: 0, source })
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw argument values.
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }
}

/// What a handler receives.
#[derive(Debug, Clone)]
pub struct ActionCall<I = ()> {
    /// Validated positional arguments
    pub args: Args,
    /// Context built by the middleware
    pub ctx: Context,
    /// Validated input; `()` when no input schema is configured
    pub input: I,
}

/// Immutable action configuration.
///
/// Every method returns a new builder and leaves the receiver untouched, so
/// a partially configured builder can be shared by several actions.
///
/// `S` is the input schema and `E` the error type produced by the error
/// transform. An object schema can be extended by further
/// [`ActionBuilder::input`] calls; a builder holding a refined schema has
/// no `input` method, so refined schemas can never be merged.
pub struct ActionBuilder<S = NoInput, E = ()> {
    input: S,
    args: Option<ArgsSchema>,
    middleware: Vec<Arc<dyn Middleware>>,
    on_error: Option<ErrorTransform<E>>,
}

/// Start an action builder with no schema, no middleware and no error
/// transform.
#[must_use]
pub const fn form_action() -> ActionBuilder {
    ActionBuilder {
        input: NoInput,
        args: None,
        middleware: Vec::new(),
        on_error: None,
    }
}

impl<S: Clone, E> Clone for ActionBuilder<S, E> {
    fn clone(&self) -> Self {
        Self {
            input: self.input.clone(),
            args: self.args.clone(),
            middleware: self.middleware.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<S: fmt::Debug, E> fmt::Debug for ActionBuilder<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionBuilder")
            .field("input", &self.input)
            .field("args", &self.args)
            .field("middleware", &self.middleware.len())
            .field("has_error_transform", &self.on_error.is_some())
            .finish()
    }
}

impl<E> ActionBuilder<NoInput, E> {
    /// Attach the input schema.
    #[must_use]
    pub fn input<S: InputSchema>(&self, schema: S) -> ActionBuilder<S, E> {
        ActionBuilder {
            input: schema,
            args: self.args.clone(),
            middleware: self.middleware.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<E> ActionBuilder<ObjectSchema, E> {
    /// Merge another object schema into the current one; on a field name
    /// clash the new schema wins.
    #[must_use]
    pub fn input(&self, schema: ObjectSchema) -> Self {
        Self {
            input: self.input.merge(&schema),
            ..self.clone()
        }
    }
}

impl<S: InputSchema, E> ActionBuilder<S, E> {
    /// Attach the positional argument schemas, replacing earlier ones.
    #[must_use]
    pub fn args(&self, schema: impl Into<ArgsSchema>) -> Self {
        Self {
            args: Some(schema.into()),
            ..self.clone()
        }
    }

    /// Append a middleware step (the `use` step of the chain).
    #[must_use]
    pub fn middleware<M: Middleware>(&self, middleware: M) -> Self {
        let mut next = self.clone();
        next.middleware.push(Arc::new(middleware));
        next
    }

    /// Install the error transform, replacing any earlier one.
    ///
    /// The transform receives the handler's error, which may be downcast to
    /// the concrete type the handler raised, and the submission's context.
    #[must_use]
    pub fn error<E2, F>(&self, transform: F) -> ActionBuilder<S, E2>
    where
        F: Fn(anyhow::Error, &Context) -> E2 + Send + Sync + 'static,
    {
        ActionBuilder {
            input: self.input.clone(),
            args: self.args.clone(),
            middleware: self.middleware.clone(),
            on_error: Some(Arc::new(transform)),
        }
    }

    /// Finish the chain, producing the action.
    ///
    /// `I` is the type the validated input is deserialized into; use
    /// [`serde_json::Value`] to receive it untyped.
    #[must_use]
    pub fn run<D, I, H, Fut>(&self, handler: H) -> FormAction<D, E>
    where
        D: Send + 'static,
        E: Send + 'static,
        I: DeserializeOwned + Send + 'static,
        H: Fn(ActionCall<I>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<D>> + Send + 'static,
    {
        let config = Arc::new(self.clone());
        let handler = Arc::new(handler);

        FormAction::from_fn(move |submission| {
            let config = Arc::clone(&config);
            let handler = Arc::clone(&handler);
            Box::pin(async move { config.execute(submission, handler.as_ref()).await })
        })
    }

    #[tracing::instrument(
        name = "form_action",
        skip_all,
        fields(args = submission.bound_args.len(), fields = submission.payload.len())
    )]
    async fn execute<D, I, H, Fut>(
        &self,
        submission: Submission<D, E>,
        handler: &H,
    ) -> Result<SubmissionState<D, E>, ActionError>
    where
        I: DeserializeOwned,
        H: Fn(ActionCall<I>) -> Fut,
        Fut: Future<Output = anyhow::Result<D>>,
    {
        let Submission {
            bound_args, payload, ..
        } = submission;
        let payload = Arc::new(payload);

        let ctx = build_context(Arc::clone(&payload), &self.middleware)
            .await
            .inspect_err(|error| tracing::warn!(%error, "middleware failed"))?;

        let args = match &self.args {
            Some(schema) => match schema.validate(&bound_args) {
                Ok(args) => args,
                Err(tree) => {
                    tracing::debug!("arguments rejected");
                    return Ok(SubmissionState::invalid(tree));
                }
            },
            None => bound_args,
        };

        let input = match self.input.safe_parse(&payload) {
            Ok(input) => input,
            Err(tree) => {
                tracing::debug!("input rejected");
                return Ok(SubmissionState::invalid(tree));
            }
        };
        let input = I::deserialize(input).map_err(ActionError::InputMismatch)?;

        let call = ActionCall {
            args: Args(args),
            ctx: ctx.clone(),
            input,
        };

        match handler(call).await {
            Ok(data) => {
                tracing::debug!("handler succeeded");
                Ok(SubmissionState::success(data))
            }
            Err(error) => match &self.on_error {
                Some(transform) => {
                    tracing::debug!(%error, "handler failed, transformed");
                    Ok(SubmissionState::failure(transform(error, &ctx)))
                }
                None => {
                    tracing::warn!(%error, "handler failed without an error transform");
                    Err(ActionError::Handler(error))
                }
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic
mod tests {
    use super::*;
    use crate::error::ContextError;
    use crate::schema::{checkbox, email, number, numeric, object, string};
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type State = SubmissionState<Value, String>;

    fn initial() -> State {
        SubmissionState::initial(Value::Null)
    }

    #[tokio::test]
    async fn test_success_without_schema() {
        let action = form_action().run(|_: ActionCall| async { anyhow::Ok(json!({ "ok": true })) });
        let state: SubmissionState<Value, ()> = action
            .submit(SubmissionState::initial(Value::Null), FormData::new())
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(state, SubmissionState::success(json!({ "ok": true })));
    }

    #[tokio::test]
    async fn test_invalid_input_short_circuits_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let action = form_action()
            .input(object().field("user", object().field("email", email())))
            .error(|e, _| e.to_string())
            .run(move |_: ActionCall<Value>| {
                seen.fetch_add(1, Ordering::SeqCst);
                async { anyhow::Ok(Value::Null) }
            });

        let state = action
            .submit(initial(), FormData::new().with("user.email", "nope"))
            .await
            .unwrap_or_else(|e| panic!("{e}"));

        assert!(state.is_invalid());
        assert_eq!(state.field_error("user.email").error, Some("Invalid email"));
        assert!(state.field_error("").errors.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handler_error_is_transformed() {
        let action = form_action()
            .error(|e, _| e.to_string())
            .run(|_: ActionCall| async { Err::<Value, _>(anyhow::anyhow!("whoops")) });

        let state = action
            .submit(initial(), FormData::new())
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(state, SubmissionState::failure("whoops".to_string()));
    }

    #[tokio::test]
    async fn test_handler_error_without_transform_propagates() {
        let action = form_action().run(|_: ActionCall| async { Err::<Value, _>(anyhow::anyhow!("whoops")) });

        let result: Result<SubmissionState<Value, ()>, _> =
            action.submit(SubmissionState::initial(Value::Null), FormData::new()).await;
        assert!(matches!(result, Err(ActionError::Handler(ref e)) if e.to_string() == "whoops"));
    }

    #[tokio::test]
    async fn test_middleware_error_bypasses_transform() {
        let action = form_action()
            .middleware(|_: Context| async { Err::<Value, _>(anyhow::anyhow!("no session store")) })
            .error(|e, _| e.to_string())
            .run(|_: ActionCall| async { anyhow::Ok(Value::Null) });

        let result = action.submit(initial(), FormData::new()).await;
        assert!(matches!(
            result,
            Err(ActionError::Context(ContextError::Middleware { index: 0, .. }))
        ));
    }

    #[tokio::test]
    async fn test_transform_sees_context() {
        let action = form_action()
            .middleware(|_: Context| async { anyhow::Ok(json!({ "authorized": false })) })
            .error(|e, ctx| {
                let authorized = ctx.get_as::<bool>("authorized").unwrap_or_default();
                if authorized { e.to_string() } else { "Unauthorized".to_string() }
            })
            .run(|_: ActionCall| async { Err::<Value, _>(anyhow::anyhow!("boom")) });

        let state = action
            .submit(initial(), FormData::new())
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(state.error().map(String::as_str), Some("Unauthorized"));
    }

    #[tokio::test]
    async fn test_error_replaces_earlier_transform() {
        let action = form_action()
            .error(|_, _| "first".to_string())
            .error(|_, _| "second".to_string())
            .run(|_: ActionCall| async { Err::<Value, _>(anyhow::anyhow!("x")) });

        let state = action
            .submit(initial(), FormData::new())
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(state.error().map(String::as_str), Some("second"));
    }

    #[tokio::test]
    async fn test_merged_inputs() {
        #[derive(Deserialize)]
        struct Input {
            allright: bool,
            age: f64,
        }

        let action = form_action()
            .input(object().field("allright", checkbox()))
            .input(object().field("age", numeric()))
            .error(|e, _| e.to_string())
            .run(|call: ActionCall<Input>| async move {
                anyhow::Ok(json!({ "allright": call.input.allright, "age": call.input.age }))
            });

        let state = action
            .submit(initial(), FormData::new().with("allright", "on").with("age", "42"))
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(state.data(), Some(&json!({ "allright": true, "age": 42.0 })));
    }

    #[tokio::test]
    async fn test_args_are_validated_before_input() {
        let action = form_action()
            .input(object().field("name", string()))
            .args([number()])
            .error(|e, _| e.to_string())
            .run(|call: ActionCall<Value>| async move {
                let id: u64 = call.args.get(0)?;
                anyhow::Ok(json!(id))
            });

        let state = action
            .bind([json!("9")])
            .submit(initial(), FormData::new())
            .await
            .unwrap_or_else(|e| panic!("{e}"));

        let Some(tree) = state.validation_error() else {
            panic!("expected invalid, got {:?}", state.tag());
        };
        assert_eq!(tree.items[&0].errors, ["Expected number, received string"]);
        assert!(tree.properties.is_empty());

        let state = action
            .bind([9])
            .submit(initial(), FormData::new().with("name", "Ann"))
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(state, SubmissionState::success(json!(9)));
    }

    #[tokio::test]
    async fn test_input_type_mismatch() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Input {
            missing: String,
        }

        let action = form_action()
            .input(object().field("name", string()))
            .error(|e, _| e.to_string())
            .run(|_: ActionCall<Input>| async { anyhow::Ok(Value::Null) });

        let result = action.submit(initial(), FormData::new().with("name", "Ann")).await;
        assert!(matches!(result, Err(ActionError::InputMismatch(_))));
    }

    #[tokio::test]
    async fn test_builder_is_not_mutated() {
        let base = form_action()
            .middleware(|_: Context| async { anyhow::Ok(json!({ "a": 1 })) })
            .error(|e, _| e.to_string());
        let extended = base.middleware(|_: Context| async { anyhow::Ok(json!({ "b": 2 })) });

        let keys = |call: ActionCall| async move { anyhow::Ok(json!(call.ctx.keys().collect::<Vec<_>>())) };
        let from_base = base.run(keys).submit(initial(), FormData::new()).await;
        let from_extended = extended.run(keys).submit(initial(), FormData::new()).await;

        assert_eq!(from_base.ok(), Some(SubmissionState::success(json!(["a"]))));
        assert_eq!(from_extended.ok(), Some(SubmissionState::success(json!(["a", "b"]))));
    }

    #[test]
    fn test_args_accessors() {
        let args = Args(vec![json!(9), json!("x")]);
        assert_eq!(args.get::<u32>(0).ok(), Some(9));
        assert!(matches!(args.get::<u32>(1), Err(ArgError::Type { index: 1, .. })));
        assert!(matches!(args.get::<u32>(2), Err(ArgError::Missing(2))));
        assert_eq!(args.parse::<(u32, String)>().ok(), Some((9, "x".to_string())));
        assert_eq!(args.len(), 2);
    }
}

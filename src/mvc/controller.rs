//! Controllers and their action methods.
//!
//! # Responsibilities
//! - Describe a controller as a table of action methods plus a default action
//! - Carry per-method metadata: action tag, verb affinities, declared
//!   parameter names and the consumer chain
//! - Resolve an action name and verb to exactly one method
//!
//! # Design Decisions
//! - Controllers are values built by a factory per request, never shared
//! - An untagged method accepts every verb; a tagged one only its verbs
//! - One action name may map to several methods with disjoint verbs
//! - Both calling conventions (async result, completion callback) end up
//!   as the same boxed future

use std::sync::Arc;

use axum::http::Method;
use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::http::{HttpContext, HttpError, Params};
use crate::mvc::consumer::Consumer;
use crate::mvc::naming::camelize;
use crate::results::ActionResult;

/// What an action body returns.
pub type ActionFuture<'a> = BoxFuture<'a, Result<ActionResult, HttpError>>;

type ActionFn = Arc<dyn for<'a> Fn(&'a mut HttpContext, Args) -> ActionFuture<'a> + Send + Sync>;

fn action_fn<F>(f: F) -> ActionFn
where
    F: for<'a> Fn(&'a mut HttpContext, Args) -> ActionFuture<'a> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Arguments bound from the request parameters, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: Vec<(String, Value)>,
}

impl Args {
    /// Bind each declared name to the same-named request parameter.
    /// Missing parameters bind to `null`.
    pub fn bind(names: &[String], params: &Params) -> Self {
        let values = names
            .iter()
            .map(|name| {
                let value = params.get_ignore_case(name).cloned().unwrap_or(Value::Null);
                (name.clone(), value)
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .filter(|v| !v.is_null())
    }

    pub fn get_str(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Deserialize one argument. Strings holding numbers or booleans are
    /// accepted for numeric and boolean targets.
    pub fn parse<T: DeserializeOwned>(&self, name: &str) -> Result<T, HttpError> {
        let value = self.get(name).cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<T>(value.clone()) {
            Ok(parsed) => Ok(parsed),
            Err(first) => {
                if let Value::String(s) = &value {
                    if let Ok(coerced) = serde_json::from_str::<Value>(s) {
                        if let Ok(parsed) = serde_json::from_value::<T>(coerced) {
                            return Ok(parsed);
                        }
                    }
                }
                Err(HttpError::BadRequest(format!("Invalid value for {}: {}", name, first)))
            }
        }
    }

    /// Value at declaration position `index`.
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.values.get(index).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Completion handle for callback-style actions.
///
/// Dropping it without calling [`ResultCallback::done`] fails the request
/// with a server error.
#[derive(Debug)]
pub struct ResultCallback {
    tx: oneshot::Sender<Result<ActionResult, HttpError>>,
}

impl ResultCallback {
    fn channel() -> (Self, oneshot::Receiver<Result<ActionResult, HttpError>>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub fn done(self, result: Result<ActionResult, HttpError>) {
        // The receiver is gone only if the request was already abandoned.
        let _ = self.tx.send(result);
    }
}

/// One invocable method on a controller.
#[derive(Clone)]
pub struct ActionMethod {
    name: String,
    http_action: Option<String>,
    verbs: Vec<Method>,
    params: Vec<String>,
    consumers: Vec<Arc<dyn Consumer>>,
    body: ActionFn,
}

impl std::fmt::Debug for ActionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionMethod")
            .field("name", &self.name)
            .field("http_action", &self.http_action)
            .field("verbs", &self.verbs)
            .field("params", &self.params)
            .field("consumers", &self.consumers.iter().map(|c| c.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl ActionMethod {
    /// An action returning its result asynchronously.
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: for<'a> Fn(&'a mut HttpContext, Args) -> ActionFuture<'a> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            http_action: None,
            verbs: Vec::new(),
            params: Vec::new(),
            consumers: Vec::new(),
            body: action_fn(body),
        }
    }

    /// An action that reports through a completion callback.
    pub fn with_callback<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&HttpContext, Args, ResultCallback) + Send + Sync + 'static,
    {
        let body = Arc::new(body);
        Self::new(name, move |ctx, args| {
            let body = body.clone();
            Box::pin(async move {
                let (callback, rx) = ResultCallback::channel();
                body(ctx, args, callback);
                rx.await.unwrap_or_else(|_| {
                    Err(HttpError::Server("Action completed without a result".into()))
                })
            })
        })
    }

    /// Tag this method as implementing `action`.
    pub fn http_action(mut self, action: impl Into<String>) -> Self {
        self.http_action = Some(action.into());
        self
    }

    pub fn verb(mut self, method: Method) -> Self {
        if !self.verbs.contains(&method) {
            self.verbs.push(method);
        }
        self
    }

    pub fn get(self) -> Self {
        self.verb(Method::GET)
    }

    pub fn post(self) -> Self {
        self.verb(Method::POST)
    }

    pub fn put(self) -> Self {
        self.verb(Method::PUT)
    }

    pub fn patch(self) -> Self {
        self.verb(Method::PATCH)
    }

    pub fn delete(self) -> Self {
        self.verb(Method::DELETE)
    }

    pub fn options(self) -> Self {
        self.verb(Method::OPTIONS)
    }

    pub fn head(self) -> Self {
        self.verb(Method::HEAD)
    }

    /// Every common verb.
    pub fn any(self) -> Self {
        [
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
            Method::HEAD,
        ]
        .into_iter()
        .fold(self, Self::verb)
    }

    /// Declared parameter names, bound from request params in this order.
    pub fn params(mut self, names: &[&str]) -> Self {
        self.params = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Append a consumer; consumers run in the order they are added.
    pub fn consume(mut self, consumer: Arc<dyn Consumer>) -> Self {
        self.consumers.push(consumer);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        self.http_action.as_deref()
    }

    pub fn declared_params(&self) -> &[String] {
        &self.params
    }

    pub fn consumers(&self) -> &[Arc<dyn Consumer>] {
        &self.consumers
    }

    /// Whether this method may serve `method`.
    pub fn accepts(&self, method: &Method) -> bool {
        self.verbs.is_empty() || self.verbs.contains(method)
    }

    pub async fn invoke(&self, ctx: &mut HttpContext, args: Args) -> Result<ActionResult, HttpError> {
        (self.body)(ctx, args).await
    }
}

/// A controller instance: its action methods and the fallback action.
#[derive(Debug, Clone)]
pub struct Controller {
    name: String,
    methods: Vec<ActionMethod>,
    default_action: Option<ActionMethod>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    /// A controller whose default action renders the view named after the
    /// action, with the request parameters as data.
    pub fn new() -> Self {
        let default_action = ActionMethod::new("action", |ctx, _args| {
            Box::pin(async move { Ok(ActionResult::view(ctx.params.to_value())) })
        });
        Self {
            name: String::new(),
            methods: Vec::new(),
            default_action: Some(default_action),
        }
    }

    pub fn action(mut self, method: ActionMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn default_action(mut self, method: ActionMethod) -> Self {
        self.default_action = Some(method);
        self
    }

    /// Unknown actions are NotFound instead of falling back.
    pub fn without_default_action(mut self) -> Self {
        self.default_action = None;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn methods(&self) -> &[ActionMethod] {
        &self.methods
    }

    /// Pick the method serving `action` for `verb`.
    ///
    /// Order: exact method name, camel-cased name, methods tagged with
    /// `action`, then the default action. A name that exists only with
    /// other verbs is MethodNotAllowed rather than falling back.
    pub fn resolve(&self, action: &str, verb: &Method) -> Result<&ActionMethod, HttpError> {
        let camel = camelize(action);
        let mut named = false;

        let by_name = self
            .methods
            .iter()
            .filter(|m| m.name == action)
            .chain(self.methods.iter().filter(|m| camel != action && m.name == camel));
        for method in by_name {
            named = true;
            if method.accepts(verb) {
                return Ok(method);
            }
        }

        for method in self.methods.iter().filter(|m| m.tag() == Some(action)) {
            named = true;
            if method.accepts(verb) {
                return Ok(method);
            }
        }

        if named {
            tracing::debug!(controller = %self.name, action = %action, method = %verb, "Action does not accept verb");
            return Err(HttpError::method_not_allowed());
        }

        self.default_action
            .as_ref()
            .filter(|m| m.accepts(verb))
            .ok_or_else(|| {
                tracing::debug!(controller = %self.name, action = %action, "Action not found");
                HttpError::not_found()
            })
    }
}

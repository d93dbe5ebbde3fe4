//! Chain layers. Each wraps an inner [`Method`] and can be composed by hand
//! as well as through the [`Endpoint`](super::Endpoint) builder.

use async_trait::async_trait;
use http::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use super::{Invocation, Method, MethodResult, Predicate};
use crate::error::{ErrorKind, HandlerError, LambdaError};
use crate::transport::ProxyEvent;
use crate::validation::{Schema, ValidationMessages};

/// Where a request layer reads its payload from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestSource {
    /// JSON object in the event body
    Json,
    /// Query string parameters
    Query,
}

impl RequestSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Query => "query",
        }
    }

    fn extract(&self, event: &ProxyEvent, kind: ErrorKind) -> Result<Map<String, Value>, LambdaError> {
        match self {
            Self::Json => body_object(event.body.as_deref(), kind),
            Self::Query => Ok(query_object(event)),
        }
    }
}

fn body_object(body: Option<&str>, kind: ErrorKind) -> Result<Map<String, Value>, LambdaError> {
    let body = match body {
        Some(body) if !body.trim().is_empty() => body,
        _ => return Ok(Map::new()),
    };

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(object)) => Ok(object),
        _ => Err(kind.build(StatusCode::BAD_REQUEST, "Request body must be a JSON object")),
    }
}

fn query_object(event: &ProxyEvent) -> Map<String, Value> {
    event
        .query_string_parameters
        .iter()
        .flatten()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect()
}

/// Extracts the request object, validates it and stores it on the invocation.
pub struct RequestParser<M> {
    source: RequestSource,
    schema: Schema,
    messages: ValidationMessages,
    inner: M,
}

impl<M> RequestParser<M> {
    pub fn new(source: RequestSource, schema: Schema, inner: M) -> Self {
        Self {
            source,
            schema,
            messages: ValidationMessages::default(),
            inner,
        }
    }

    /// Replace the validation message templates.
    pub fn with_messages(mut self, messages: ValidationMessages) -> Self {
        self.messages = messages;
        self
    }
}

#[async_trait]
impl<C, M> Method<C> for RequestParser<M>
where
    C: Send + Sync + 'static,
    M: Method<C>,
{
    async fn call(&self, controller: Arc<C>, mut invocation: Invocation) -> MethodResult {
        let kind = invocation.error_kind();
        let request = self.source.extract(&invocation.event, kind)?;

        if let Err(error) = self.schema.validate(&request) {
            debug!(source = self.source.as_str(), code = error.code(), "Request rejected: {error}");
            return Err(error.render(&self.messages, kind).into());
        }

        invocation.request = Some(request);
        self.inner.call(controller, invocation).await
    }
}

/// Encodes the inner result as a JSON string.
pub struct ResponseSerializer<M> {
    inner: M,
}

impl<M> ResponseSerializer<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C, M> Method<C> for ResponseSerializer<M>
where
    C: Send + Sync + 'static,
    M: Method<C>,
{
    async fn call(&self, controller: Arc<C>, invocation: Invocation) -> MethodResult {
        let value = self.inner.call(controller, invocation).await?;
        let body = serde_json::to_string(&value).map_err(HandlerError::unexpected)?;
        Ok(Value::String(body))
    }
}

/// Rejects invocations failing a predicate.
pub struct Guard<M> {
    predicate: Predicate,
    error: Option<LambdaError>,
    inner: M,
}

impl<M> Guard<M> {
    pub fn new<P>(predicate: P, inner: M) -> Self
    where
        P: Fn(&Invocation) -> bool + Send + Sync + 'static,
    {
        Self::from_predicate(Arc::new(predicate), inner)
    }

    pub(super) fn from_predicate(predicate: Predicate, inner: M) -> Self {
        Self {
            predicate,
            error: None,
            inner,
        }
    }

    /// Error returned on rejection instead of the error kind's default.
    pub fn with_error(mut self, error: LambdaError) -> Self {
        self.error = Some(error);
        self
    }
}

#[async_trait]
impl<C, M> Method<C> for Guard<M>
where
    C: Send + Sync + 'static,
    M: Method<C>,
{
    async fn call(&self, controller: Arc<C>, invocation: Invocation) -> MethodResult {
        if !(self.predicate)(&invocation) {
            let error = match &self.error {
                Some(error) => error.clone(),
                None => invocation
                    .error_kind()
                    .build(StatusCode::BAD_REQUEST, "Validation failed"),
            };
            debug!(status = error.status_code().as_u16(), "Guard rejected request");
            return Err(error.into());
        }

        self.inner.call(controller, invocation).await
    }
}

/// Business method taking a deserialized request.
pub struct TypedMethod<F, Req> {
    handler: F,
    _request: PhantomData<fn() -> Req>,
}

impl<F, Req> TypedMethod<F, Req> {
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _request: PhantomData,
        }
    }
}

#[async_trait]
impl<C, F, Fut, Req, Resp> Method<C> for TypedMethod<F, Req>
where
    C: Send + Sync + 'static,
    F: Fn(Arc<C>, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, HandlerError>> + Send + 'static,
    Req: DeserializeOwned + Send + 'static,
    Resp: Serialize + Send + 'static,
{
    async fn call(&self, controller: Arc<C>, invocation: Invocation) -> MethodResult {
        let kind = invocation.error_kind();
        let payload = match invocation.request {
            Some(request) => Value::Object(request),
            None => serde_json::to_value(&invocation.event).map_err(HandlerError::unexpected)?,
        };

        let request: Req = serde_json::from_value(payload).map_err(|error| {
            debug!(error = %error, "Request does not match handler input");
            kind.build(StatusCode::BAD_REQUEST, "Invalid request")
        })?;

        let response = (self.handler)(controller, request).await?;
        serde_json::to_value(response).map_err(HandlerError::unexpected)
    }
}

/// Business method taking the whole invocation.
pub struct RawMethod<F> {
    handler: F,
}

impl<F> RawMethod<F> {
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<C, F, Fut> Method<C> for RawMethod<F>
where
    C: Send + Sync + 'static,
    F: Fn(Arc<C>, Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MethodResult> + Send + 'static,
{
    async fn call(&self, controller: Arc<C>, invocation: Invocation) -> MethodResult {
        (self.handler)(controller, invocation).await
    }
}

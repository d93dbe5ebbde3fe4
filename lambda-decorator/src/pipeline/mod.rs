//! Handler Pipeline
//!
//! Every endpoint method is a chain of [`Method`] implementations. The
//! business method sits at the bottom; request parsing, response
//! serialization and guards wrap it; the [`Route`] envelope is always the
//! outermost layer and turns the chain's outcome into a [`ProxyResponse`].
//!
//! Chains are assembled with the [`Endpoint`] builder. Layers declared first
//! run first:
//!
//! ```rust,ignore
//! let route = Endpoint::post()
//!     .json_request(Schema::new().field("type", PrimitiveType::String))
//!     .json_response()
//!     .with_error(ErrorKind::JSON)
//!     .validate(|invocation| invocation.field_str("type") == Some("list"))
//!     .handler(|controller: Arc<TodoController>, request: CreateRequest| async move {
//!         controller.create(request).await
//!     });
//! ```

mod layers;

pub use layers::{Guard, RawMethod, RequestParser, RequestSource, ResponseSerializer, TypedMethod};

use async_trait::async_trait;
use futures::FutureExt;
use http::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::future::Future;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, instrument, warn};

use crate::endpoint::{default_headers, EndpointDescriptor, HttpMethod};
use crate::error::{ErrorKind, HandlerError, LambdaError};
use crate::metadata::{MetadataField, MethodMetadata};
use crate::transport::{InvocationContext, ProxyEvent, ProxyResponse};
use crate::validation::{PrimitiveType, Schema, ValidationMessages};

/// Outcome of one layer.
pub type MethodResult = Result<Value, HandlerError>;

/// Body sent for failures that are not [`LambdaError`]s.
pub const UNEXPECTED_ERROR_BODY: &str = "Unexpected server error";

/// A single call through a handler chain.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Raw transport event
    pub event: ProxyEvent,

    /// Runtime context
    pub context: InvocationContext,

    /// Metadata of the method being invoked, read at call time
    pub metadata: Arc<MethodMetadata>,

    /// Validated request object, once a request layer has run
    pub request: Option<Map<String, Value>>,
}

impl Invocation {
    pub fn new(event: ProxyEvent, context: InvocationContext, metadata: Arc<MethodMetadata>) -> Self {
        Self {
            event,
            context,
            metadata,
            request: None,
        }
    }

    /// Error kind for errors raised on the method's behalf.
    pub fn error_kind(&self) -> ErrorKind {
        self.metadata.error_kind_or_default()
    }

    /// Field of the validated request.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.request.as_ref().and_then(|request| request.get(name))
    }

    /// String field of the validated request.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }
}

/// One layer of a handler chain, bound to a controller type `C`.
#[async_trait]
pub trait Method<C>: Send + Sync
where
    C: Send + Sync + 'static,
{
    /// Run this layer and everything below it.
    async fn call(&self, controller: Arc<C>, invocation: Invocation) -> MethodResult;
}

#[async_trait]
impl<C> Method<C> for Box<dyn Method<C>>
where
    C: Send + Sync + 'static,
{
    async fn call(&self, controller: Arc<C>, invocation: Invocation) -> MethodResult {
        (**self).call(controller, invocation).await
    }
}

#[async_trait]
impl<C> Method<C> for Arc<dyn Method<C>>
where
    C: Send + Sync + 'static,
{
    async fn call(&self, controller: Arc<C>, invocation: Invocation) -> MethodResult {
        (**self).call(controller, invocation).await
    }
}

type Predicate = Arc<dyn Fn(&Invocation) -> bool + Send + Sync>;

enum LayerSpec {
    Response,
    Request {
        source: RequestSource,
        schema: Schema,
        messages: ValidationMessages,
    },
    Guard {
        predicate: Predicate,
        error: Option<LambdaError>,
    },
}

/// Builder for one endpoint method.
pub struct Endpoint<C> {
    http_method: HttpMethod,
    path: Option<String>,
    headers: Option<BTreeMap<String, String>>,
    error_kind: Option<ErrorKind>,
    layers: Vec<LayerSpec>,
    _controller: PhantomData<fn(C)>,
}

impl<C> Endpoint<C>
where
    C: Send + Sync + 'static,
{
    /// Start an endpoint answering `http_method`.
    pub fn new(http_method: HttpMethod) -> Self {
        Self {
            http_method,
            path: None,
            headers: None,
            error_kind: None,
            layers: Vec::new(),
            _controller: PhantomData,
        }
    }

    pub fn get() -> Self {
        Self::new(HttpMethod::Get)
    }

    pub fn post() -> Self {
        Self::new(HttpMethod::Post)
    }

    pub fn put() -> Self {
        Self::new(HttpMethod::Put)
    }

    pub fn patch() -> Self {
        Self::new(HttpMethod::Patch)
    }

    pub fn delete() -> Self {
        Self::new(HttpMethod::Delete)
    }

    /// Override the resource path. Defaults to the method name.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Override the response headers.
    pub fn headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Serialize the method's result to a JSON string.
    pub fn json_response(mut self) -> Self {
        self.layers.push(LayerSpec::Response);
        self
    }

    /// Parse and validate the JSON body.
    pub fn json_request(self, schema: Schema) -> Self {
        self.json_request_with_messages(schema, ValidationMessages::default())
    }

    pub fn json_request_with_messages(self, schema: Schema, messages: ValidationMessages) -> Self {
        self.request(RequestSource::Json, schema, messages)
    }

    /// Validate the query string.
    pub fn query_request(self, schema: Schema) -> Self {
        self.query_request_with_messages(schema, ValidationMessages::default())
    }

    pub fn query_request_with_messages(self, schema: Schema, messages: ValidationMessages) -> Self {
        self.request(RequestSource::Query, schema, messages)
    }

    fn request(mut self, source: RequestSource, schema: Schema, messages: ValidationMessages) -> Self {
        self.layers.push(LayerSpec::Request {
            source,
            schema,
            messages,
        });
        self
    }

    /// Reject calls for which `predicate` is false with the error kind's
    /// `400 "Validation failed"`.
    pub fn validate<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&Invocation) -> bool + Send + Sync + 'static,
    {
        self.layers.push(LayerSpec::Guard {
            predicate: Arc::new(predicate),
            error: None,
        });
        self
    }

    /// Reject calls for which `predicate` is false with `error`.
    pub fn validate_or<P>(mut self, predicate: P, error: LambdaError) -> Self
    where
        P: Fn(&Invocation) -> bool + Send + Sync + 'static,
    {
        self.layers.push(LayerSpec::Guard {
            predicate: Arc::new(predicate),
            error: Some(error),
        });
        self
    }

    /// Error kind used for validation and guard failures of this method.
    pub fn with_error(mut self, kind: ErrorKind) -> Self {
        self.error_kind = Some(kind);
        self
    }

    /// Finish with a typed business method.
    ///
    /// `Req` is deserialized from the validated request, or from the raw
    /// event when no request layer was declared.
    pub fn handler<F, Fut, Req, Resp>(self, handler: F) -> Route<C>
    where
        F: Fn(Arc<C>, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, HandlerError>> + Send + 'static,
        Req: DeserializeOwned + Send + 'static,
        Resp: Serialize + Send + 'static,
    {
        self.wrap(TypedMethod::new(handler))
    }

    /// Finish with a method that receives the whole [`Invocation`].
    pub fn raw_handler<F, Fut>(self, handler: F) -> Route<C>
    where
        F: Fn(Arc<C>, Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MethodResult> + Send + 'static,
    {
        self.wrap(RawMethod::new(handler))
    }

    /// Finish with an arbitrary innermost [`Method`].
    pub fn wrap<M>(self, method: M) -> Route<C>
    where
        M: Method<C> + 'static,
    {
        let mut extensions = Vec::new();
        let mut chain: Box<dyn Method<C>> = Box::new(method);

        for layer in self.layers.into_iter().rev() {
            chain = match layer {
                LayerSpec::Response => Box::new(ResponseSerializer::new(chain)),
                LayerSpec::Request {
                    source,
                    schema,
                    messages,
                } => {
                    // Recorded innermost first, so the outermost request layer wins.
                    extensions.push(("request".to_string(), Value::from(source.as_str())));
                    extensions.push(("schema".to_string(), schema.to_json()));
                    Box::new(RequestParser::new(source, schema, chain).with_messages(messages))
                }
                LayerSpec::Guard { predicate, error } => {
                    let guard = Guard::from_predicate(predicate, chain);
                    match error {
                        Some(error) => Box::new(guard.with_error(error)),
                        None => Box::new(guard),
                    }
                }
            };
        }

        Route {
            http_method: self.http_method,
            path: self.path,
            headers: self.headers,
            error_kind: self.error_kind,
            extensions,
            method: Arc::from(chain),
        }
    }
}

/// A finished endpoint method: its HTTP binding plus the composed chain.
pub struct Route<C>
where
    C: Send + Sync + 'static,
{
    http_method: HttpMethod,
    path: Option<String>,
    headers: Option<BTreeMap<String, String>>,
    error_kind: Option<ErrorKind>,
    extensions: Vec<(String, Value)>,
    method: Arc<dyn Method<C>>,
}

impl<C> Clone for Route<C>
where
    C: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            http_method: self.http_method,
            path: self.path.clone(),
            headers: self.headers.clone(),
            error_kind: self.error_kind,
            extensions: self.extensions.clone(),
            method: Arc::clone(&self.method),
        }
    }
}

impl<C> Route<C>
where
    C: Send + Sync + 'static,
{
    /// Endpoint descriptor for this route registered as `method_name`.
    pub fn descriptor(&self, method_name: &str) -> EndpointDescriptor {
        let path = self.path.clone().unwrap_or_else(|| method_name.to_string());
        EndpointDescriptor::new(path, self.http_method)
            .with_headers(self.headers.clone().unwrap_or_else(default_headers))
    }

    /// Metadata fields this route contributes to the registry.
    pub fn metadata_fields(&self, method_name: &str) -> Vec<MetadataField> {
        let mut fields = vec![MetadataField::Endpoint(self.descriptor(method_name))];
        if let Some(kind) = self.error_kind {
            fields.push(MetadataField::ErrorKind(kind));
        }
        fields.extend(
            self.extensions
                .iter()
                .map(|(name, value)| MetadataField::Extension(name.clone(), value.clone())),
        );
        fields
    }

    /// The composed chain, without the envelope.
    pub fn method(&self) -> &Arc<dyn Method<C>> {
        &self.method
    }

    /// Run the chain and render its outcome as a transport response.
    ///
    /// Never fails: declared errors keep their status and body, anything else
    /// (including a panic) becomes an opaque 500.
    #[instrument(
        name = "route.invoke",
        skip_all,
        fields(
            endpoint = metadata.endpoint().map(|e| e.path.as_str()).unwrap_or_default(),
            request_id = %context.request_id,
        )
    )]
    pub async fn invoke(
        &self,
        controller: Arc<C>,
        metadata: Arc<MethodMetadata>,
        event: ProxyEvent,
        context: InvocationContext,
    ) -> ProxyResponse {
        let headers = metadata
            .endpoint()
            .map(|endpoint| endpoint.response_headers.clone())
            .unwrap_or_else(default_headers);

        let invocation = Invocation::new(event, context, metadata);
        let outcome = AssertUnwindSafe(self.method.call(controller, invocation))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(Value::String(body))) => ProxyResponse::new(StatusCode::OK.as_u16(), headers, body),
            Ok(Ok(other)) => {
                let kind = PrimitiveType::of(&other);
                warn!(body_type = %kind, "Handler returned a non-string body");
                let error = LambdaError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Invalid body, expected type 'string' and got '{kind}'"),
                );
                ProxyResponse::new(error.status_code().as_u16(), headers, error.body())
            }
            Ok(Err(HandlerError::Lambda(error))) => {
                ProxyResponse::new(error.status_code().as_u16(), headers, error.body())
            }
            Ok(Err(HandlerError::Unexpected(cause))) => {
                error!(error = %cause, "Unexpected error in handler");
                unexpected_response(headers)
            }
            Err(panic) => {
                let cause = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic payload".to_string());
                error!(panic = %cause, "Handler panicked");
                unexpected_response(headers)
            }
        }
    }
}

fn unexpected_response(headers: BTreeMap<String, String>) -> ProxyResponse {
    ProxyResponse::new(
        StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        headers,
        UNEXPECTED_ERROR_BODY,
    )
}

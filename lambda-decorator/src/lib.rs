//! Lambda Decorator
//!
//! Declarative request handling for serverless function endpoints. Controller
//! methods are declared once with an [`Endpoint`] builder that stacks
//! request validation, response serialization, guards and error shaping on top
//! of a plain async business method. The [`ExportBuilder`] turns a set of
//! controllers into a [`HandlerExportTable`] a runtime host dispatches on.
//!
//! # Usage
//!
//! ```rust,ignore
//! use lambda_decorator::prelude::*;
//!
//! impl Controller for TodoController {
//!     const NAME: &'static str = "TodoController";
//!
//!     fn register(methods: &mut MethodRegistrar<'_, Self>) -> Result<(), RegistryError> {
//!         methods.add(
//!             "get",
//!             Endpoint::get()
//!                 .query_request(Schema::new().field("type", PrimitiveType::String))
//!                 .json_response()
//!                 .with_error(ErrorKind::JSON)
//!                 .handler(|todo: Arc<Self>, request: GetRequest| async move { todo.get(request).await }),
//!         )?;
//!         Ok(())
//!     }
//! }
//!
//! let exports = ExportBuilder::new().controller(TodoController::new(store))?.build()?;
//! let response = exports.invoke("getHandler", event, context).await;
//! ```
//!
//! # Modules
//!
//! - [`transport`]: Inbound event, outbound result and invocation context
//! - [`error`]: Structured errors and error kinds
//! - [`endpoint`]: HTTP bindings
//! - [`validation`]: Field-type schemas and validation errors
//! - [`metadata`]: Per-method metadata registry
//! - [`pipeline`]: Layers, the endpoint builder and the response envelope
//! - [`controller`]: Controller trait and method registration
//! - [`exports`]: Handler export table

pub mod controller;
pub mod endpoint;
pub mod error;
pub mod exports;
pub mod metadata;
pub mod pipeline;
pub mod transport;
pub mod validation;

pub use controller::{Controller, MethodRegistrar};
pub use endpoint::{EndpointDescriptor, HttpMethod, HANDLER_SUFFIX};
pub use error::{ErrorKind, HandlerError, LambdaError};
pub use exports::{ExportBuilder, ExportError, HandlerExportTable, LambdaHandler, RouteDescriptor};
pub use metadata::{MetadataField, MetadataRegistry, MethodKey, MethodMetadata, RegistryError};
pub use pipeline::{Endpoint, Invocation, Method, MethodResult, Route};
pub use transport::{InvocationContext, ProxyEvent, ProxyResponse, QueryParameters};
pub use validation::{PrimitiveType, Schema, ValidationError, ValidationMessages};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything needed to declare a controller.
pub mod prelude {
    pub use crate::{
        Controller, Endpoint, ErrorKind, HandlerError, Invocation, LambdaError, MethodRegistrar,
        PrimitiveType, RegistryError, Schema,
    };
    pub use http::StatusCode;
    pub use std::sync::Arc;
}

//! Handler Export Table
//!
//! Builds the name → handler map a runtime host dispatches on. Every
//! endpoint method of every registered controller is exported under
//! `"<endpoint>Handler"`, bound to its controller instance and to its frozen
//! metadata.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::controller::{Controller, MethodRegistrar};
use crate::endpoint::HttpMethod;
use crate::metadata::{FrozenRegistry, MetadataRegistry, MethodKey, MethodMetadata, RegistryError};
use crate::pipeline::Route;
use crate::transport::{InvocationContext, ProxyEvent, ProxyResponse};

/// An exported handler entry point.
#[async_trait]
pub trait LambdaHandler: Send + Sync {
    /// Handle one transport event. Never fails; failures become responses.
    async fn handle(&self, event: ProxyEvent, context: InvocationContext) -> ProxyResponse;
}

/// Registration-time description of one exported handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    /// Resource path
    pub endpoint: String,

    /// HTTP verb
    pub http_method: HttpMethod,

    /// Name in the export table
    pub handler_export_name: String,
}

/// Export builder errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Controller '{0}' is registered more than once")]
    DuplicateController(&'static str),

    #[error("Couldn't find any lambda in provided classes")]
    NoHandlers,
}

struct BoundHandler<C>
where
    C: Send + Sync + 'static,
{
    controller: Arc<C>,
    route: Route<C>,
    metadata: Arc<MethodMetadata>,
}

#[async_trait]
impl<C> LambdaHandler for BoundHandler<C>
where
    C: Send + Sync + 'static,
{
    async fn handle(&self, event: ProxyEvent, context: InvocationContext) -> ProxyResponse {
        self.route
            .invoke(Arc::clone(&self.controller), Arc::clone(&self.metadata), event, context)
            .await
    }
}

struct Binding {
    descriptor: RouteDescriptor,
    handler: Arc<dyn LambdaHandler>,
}

trait PendingController: Send {
    fn bind(self: Box<Self>, registry: &FrozenRegistry) -> Vec<Binding>;
}

struct Pending<C>
where
    C: Controller,
{
    controller: Arc<C>,
    routes: Vec<(MethodKey, Route<C>)>,
}

impl<C> PendingController for Pending<C>
where
    C: Controller,
{
    /// Walk the controller's recorded keys and bind every one carrying an
    /// endpoint to its route.
    fn bind(self: Box<Self>, registry: &FrozenRegistry) -> Vec<Binding> {
        let Pending { controller, routes } = *self;
        let mut routes: HashMap<MethodKey, Route<C>> = routes.into_iter().collect();

        registry
            .keys(C::NAME)
            .filter_map(|key| {
                let metadata = registry.read(key)?;
                let endpoint = metadata.endpoint()?;
                let Some(route) = routes.remove(key) else {
                    warn!(method = %key, endpoint = %endpoint.path, "Endpoint recorded without a route, skipping");
                    return None;
                };
                let descriptor = RouteDescriptor {
                    endpoint: endpoint.path.clone(),
                    http_method: endpoint.http_method,
                    handler_export_name: endpoint.export_name(),
                };
                let handler: Arc<dyn LambdaHandler> = Arc::new(BoundHandler {
                    controller: Arc::clone(&controller),
                    route,
                    metadata,
                });
                Some(Binding { descriptor, handler })
            })
            .collect()
    }
}

/// Registers controllers and produces a [`HandlerExportTable`].
#[derive(Default)]
pub struct ExportBuilder {
    registry: MetadataRegistry,
    controllers: Vec<&'static str>,
    pending: Vec<Box<dyn PendingController>>,
}

impl ExportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller instance.
    pub fn controller<C>(self, controller: C) -> Result<Self, ExportError>
    where
        C: Controller,
    {
        self.shared(Arc::new(controller))
    }

    /// Register a controller instance that is shared elsewhere.
    pub fn shared<C>(mut self, controller: Arc<C>) -> Result<Self, ExportError>
    where
        C: Controller,
    {
        if self.controllers.contains(&C::NAME) {
            return Err(ExportError::DuplicateController(C::NAME));
        }

        let mut registrar = MethodRegistrar::<C>::new(&mut self.registry);
        C::register(&mut registrar)?;
        let routes = registrar.into_routes();

        debug!(controller = C::NAME, routes = routes.len(), "Controller registered");

        self.controllers.push(C::NAME);
        self.pending.push(Box::new(Pending { controller, routes }));
        Ok(self)
    }

    /// Freeze the metadata and bind every endpoint method.
    pub fn build(self) -> Result<HandlerExportTable, ExportError> {
        let registry = self.registry.freeze()?;

        let bindings: Vec<Binding> = self
            .pending
            .into_iter()
            .flat_map(|pending| pending.bind(&registry))
            .collect();

        if bindings.is_empty() {
            return Err(ExportError::NoHandlers);
        }

        let mut handlers = BTreeMap::new();
        let mut routes = Vec::with_capacity(bindings.len());
        for binding in bindings {
            info!(
                endpoint = %binding.descriptor.endpoint,
                method = %binding.descriptor.http_method,
                export = %binding.descriptor.handler_export_name,
                "Registered handler"
            );
            handlers.insert(binding.descriptor.handler_export_name.clone(), binding.handler);
            routes.push(binding.descriptor);
        }

        Ok(HandlerExportTable {
            handlers: Arc::new(handlers),
            routes: Arc::new(routes),
        })
    }
}

/// Immutable map from export name to handler.
#[derive(Clone)]
pub struct HandlerExportTable {
    handlers: Arc<BTreeMap<String, Arc<dyn LambdaHandler>>>,
    routes: Arc<Vec<RouteDescriptor>>,
}

impl HandlerExportTable {
    /// Handler exported as `name`.
    pub fn get(&self, name: &str) -> Option<Arc<dyn LambdaHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Invoke the handler exported as `name`, if any.
    pub async fn invoke(
        &self,
        name: &str,
        event: ProxyEvent,
        context: InvocationContext,
    ) -> Option<ProxyResponse> {
        let handler = self.get(name)?;
        Some(handler.handle(event, context).await)
    }

    /// Export names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Registration output, in registration order.
    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    /// Route declared for `endpoint`.
    pub fn route(&self, endpoint: &str) -> Option<&RouteDescriptor> {
        self.routes.iter().find(|route| route.endpoint == endpoint)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerExportTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerExportTable")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("routes", &self.routes)
            .finish()
    }
}

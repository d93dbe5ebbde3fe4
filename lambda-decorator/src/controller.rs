//! Controllers
//!
//! A controller is a capability struct (holding its store, clients, ...)
//! whose endpoint methods are declared once, statically, in
//! [`Controller::register`].

use tracing::trace;

use crate::metadata::{MetadataField, MetadataRegistry, MethodKey, RegistryError};
use crate::pipeline::Route;

/// A set of endpoint methods sharing one instance.
pub trait Controller: Send + Sync + Sized + 'static {
    /// Name used in method keys and diagnostics.
    const NAME: &'static str;

    /// Declare the controller's methods.
    fn register(methods: &mut MethodRegistrar<'_, Self>) -> Result<(), RegistryError>;
}

/// Collects the routes of one controller and records their metadata.
pub struct MethodRegistrar<'a, C>
where
    C: Controller,
{
    registry: &'a mut MetadataRegistry,
    routes: Vec<(MethodKey, Route<C>)>,
}

impl<'a, C> MethodRegistrar<'a, C>
where
    C: Controller,
{
    pub fn new(registry: &'a mut MetadataRegistry) -> Self {
        Self {
            registry,
            routes: Vec::new(),
        }
    }

    /// Register `route` as method `name`.
    pub fn add(&mut self, name: &str, route: Route<C>) -> Result<&mut Self, RegistryError> {
        let key = MethodKey::new(C::NAME, name);
        if self.routes.iter().any(|(existing, _)| *existing == key) {
            return Err(RegistryError::DuplicateMethod(key.to_string()));
        }

        for field in route.metadata_fields(name) {
            self.registry.record(&key, field)?;
        }

        trace!(method = %key, "Method registered");
        self.routes.push((key, route));
        Ok(self)
    }

    /// Record metadata on a method that is not an endpoint.
    pub fn annotate(&mut self, name: &str, field: MetadataField) -> Result<&mut Self, RegistryError> {
        self.registry.record(&MethodKey::new(C::NAME, name), field)?;
        Ok(self)
    }

    /// Routes registered so far, in registration order.
    pub fn into_routes(self) -> Vec<(MethodKey, Route<C>)> {
        self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::HttpMethod;
    use crate::error::ErrorKind;
    use crate::pipeline::Endpoint;
    use serde_json::Value;

    struct Pinger;

    impl Controller for Pinger {
        const NAME: &'static str = "Pinger";

        fn register(methods: &mut MethodRegistrar<'_, Self>) -> Result<(), RegistryError> {
            methods
                .add("ping", Endpoint::get().raw_handler(|_, _| async { Ok(Value::String("pong".into())) }))?
                .annotate("helper", MetadataField::ErrorKind(ErrorKind::JSON))?;
            Ok(())
        }
    }

    #[test]
    fn test_register_records_endpoints() {
        let mut registry = MetadataRegistry::new();
        let mut registrar = MethodRegistrar::<Pinger>::new(&mut registry);
        Pinger::register(&mut registrar).unwrap();
        let routes = registrar.into_routes();

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].0.to_string(), "Pinger.ping");

        let ping = registry.read(&MethodKey::new("Pinger", "ping")).unwrap();
        assert_eq!(ping.endpoint().unwrap().http_method, HttpMethod::Get);

        let helper = registry.read(&MethodKey::new("Pinger", "helper")).unwrap();
        assert!(helper.endpoint().is_none());
    }

    #[test]
    fn test_method_names_are_unique() {
        let mut registry = MetadataRegistry::new();
        let mut registrar = MethodRegistrar::<Pinger>::new(&mut registry);
        let route = || Endpoint::<Pinger>::get().raw_handler(|_, _| async { Ok(Value::String(String::new())) });

        registrar.add("ping", route()).unwrap();
        let result = registrar.add("ping", route());
        assert!(matches!(result, Err(RegistryError::DuplicateMethod(_))));
    }

    #[test]
    fn test_invalid_path_fails_registration() {
        let mut registry = MetadataRegistry::new();
        let mut registrar = MethodRegistrar::<Pinger>::new(&mut registry);
        let route = Endpoint::<Pinger>::get()
            .path("a/b")
            .raw_handler(|_, _| async { Ok(Value::String(String::new())) });

        assert!(matches!(
            registrar.add("ping", route),
            Err(RegistryError::InvalidEndpoint { .. })
        ));
    }
}

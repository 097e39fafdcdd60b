use super::scope::ExposureScope;
use super::EndpointDescriptor;
use crate::documentation::{DocumentationPackage, DocumentedMethod};
use crate::error::{ExposureError, Result};
use crate::reflect::ServiceType;
use indexmap::IndexMap;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

type MethodTable = HashMap<String, Arc<EndpointDescriptor>>;

/// Collects descriptors during startup; [`freeze`](Self::freeze) turns it into the
/// read-only [`EndpointRegistry`] served to request handlers.
#[derive(Debug, Default)]
pub struct EndpointRegistryBuilder {
    routes: HashMap<String, MethodTable>,
    descriptors: Vec<Arc<EndpointDescriptor>>,
}

impl EndpointRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor under every one of its route names.
    ///
    /// # Errors
    ///
    /// Returns [`ExposureError::DuplicateEndpoint`] if any route already has a method
    /// of the same name; nothing is registered in that case.
    pub fn register(&mut self, descriptor: EndpointDescriptor) -> Result<()> {
        for route in descriptor.names() {
            let taken = self
                .routes
                .get(route)
                .is_some_and(|methods| methods.contains_key(descriptor.method_name()));
            if taken {
                return Err(ExposureError::DuplicateEndpoint {
                    route: route.clone(),
                    method: descriptor.method_name().to_string(),
                });
            }
        }

        let descriptor = Arc::new(descriptor);
        for route in descriptor.names() {
            debug!("Registering {} -> {}", route, descriptor.method_name());
            self.routes
                .entry(route.clone())
                .or_default()
                .insert(descriptor.method_name().to_string(), descriptor.clone());
        }
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Resolves a service in `scope` and registers every descriptor, returning how
    /// many were added.
    pub fn expose(&mut self, service: &ServiceType, scope: &ExposureScope) -> Result<usize> {
        let mut count = 0;
        for descriptor in scope.resolve(service)? {
            self.register(descriptor?)?;
            count += 1;
        }
        Ok(count)
    }

    pub fn freeze(self) -> EndpointRegistry {
        debug!(
            "Freezing registry with {} endpoints on {} routes",
            self.descriptors.len(),
            self.routes.len()
        );
        EndpointRegistry {
            routes: Arc::new(self.routes),
            descriptors: self.descriptors.into(),
        }
    }
}

/// Immutable route → method → descriptor map.
///
/// Cloning is cheap and clones share the same tables, so lookups from any number of
/// threads need no locking.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    routes: Arc<HashMap<String, MethodTable>>,
    descriptors: Arc<[Arc<EndpointDescriptor>]>,
}

impl EndpointRegistry {
    pub fn get(&self, route: &str, method: &str) -> Option<&Arc<EndpointDescriptor>> {
        self.routes.get(route)?.get(method)
    }

    /// Descriptors reachable under a route, in no particular order.
    pub fn route(&self, route: &str) -> impl Iterator<Item = &Arc<EndpointDescriptor>> {
        self.routes.get(route).into_iter().flat_map(|methods| methods.values())
    }

    pub fn contains_route(&self, route: &str) -> bool {
        self.routes.contains_key(route)
    }

    /// Every registered descriptor, in registration order.
    pub fn descriptors(&self) -> &[Arc<EndpointDescriptor>] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Groups descriptors per service, in registration order.
    pub fn packages(&self) -> Vec<DocumentationPackage> {
        let mut packages: IndexMap<&str, DocumentationPackage> = IndexMap::new();

        for descriptor in self.descriptors.iter() {
            let package = packages
                .entry(descriptor.service())
                .or_insert_with(|| DocumentationPackage {
                    service: descriptor.service().to_string(),
                    routes: Vec::new(),
                    methods: Vec::new(),
                });
            for route in descriptor.names() {
                if !package.routes.contains(route) {
                    package.routes.push(route.clone());
                }
            }
            package.methods.push(DocumentedMethod {
                name: descriptor.method_name().to_string(),
                endpoint: descriptor.clone(),
            });
        }

        packages.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposure::scope::ApiConfiguration;
    use crate::reflect::MethodInfo;

    fn service(name: &str, methods: &[&str]) -> ServiceType {
        methods.iter().fold(ServiceType::new(name), |service, method| {
            service.with_method(MethodInfo::new(name, method))
        })
    }

    fn registry_for(services: &[(ServiceType, ExposureScope)]) -> EndpointRegistry {
        let mut builder = EndpointRegistryBuilder::new();
        for (service, scope) in services {
            builder.expose(service, scope).unwrap();
        }
        builder.freeze()
    }

    fn plain_scope() -> ExposureScope {
        ExposureScope::new(ApiConfiguration::builder().build())
    }

    #[test]
    fn test_lookup_by_route_and_method() {
        let registry = registry_for(&[(service("app::IntMath", &["add", "sub"]), plain_scope())]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("IntMath", "add").unwrap().method_name(), "add");
        assert!(registry.get("IntMath", "mul").is_none());
        assert!(registry.get("Missing", "add").is_none());
        assert_eq!(registry.route("IntMath").count(), 2);
        assert!(registry.contains_route("IntMath"));
    }

    #[test]
    fn test_every_name_routes_to_the_same_descriptor() {
        let configuration = ApiConfiguration::builder()
            .prefix(|_| vec!["a/".to_string(), "b/".to_string()])
            .build();
        let registry = registry_for(&[(
            service("app::IntMath", &["add"]),
            ExposureScope::new(configuration),
        )]);

        let a = registry.get("a/IntMath", "add").unwrap();
        let b = registry.get("b/IntMath", "add").unwrap();
        assert!(Arc::ptr_eq(a, b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_endpoint_is_rejected() {
        let mut builder = EndpointRegistryBuilder::new();
        builder
            .expose(&service("app::IntMath", &["add"]), &plain_scope())
            .unwrap();

        let other = service("other::IntMath", &["add"]);
        let err = builder.expose(&other, &plain_scope()).unwrap_err();
        assert_eq!(
            err,
            ExposureError::DuplicateEndpoint {
                route: "IntMath".to_string(),
                method: "add".to_string(),
            }
        );

        let renamed = ExposureScope::builder(ApiConfiguration::builder().build())
            .as_name("OtherMath")
            .build();
        assert_eq!(builder.expose(&other, &renamed).unwrap(), 1);
        assert_eq!(builder.freeze().len(), 2);
    }

    #[test]
    fn test_packages_group_per_service() {
        let registry = registry_for(&[
            (service("app::IntMath", &["add", "sub"]), plain_scope()),
            (service("app::Strings", &["concat"]), plain_scope()),
            (
                service("app::IntMath", &["mul"]),
                ExposureScope::builder(ApiConfiguration::builder().build())
                    .as_name("math")
                    .build(),
            ),
        ]);

        let packages = registry.packages();
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].service, "app::IntMath");
        assert_eq!(packages[0].routes, vec!["IntMath".to_string(), "math".to_string()]);
        let names: Vec<&str> = packages[0].methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["add", "sub", "mul"]);
        assert_eq!(packages[1].service, "app::Strings");
    }

    #[test]
    fn test_concurrent_lookups() {
        let registry = registry_for(&[(service("app::IntMath", &["add", "sub", "mul"]), plain_scope())]);

        std::thread::scope(|s| {
            for _ in 0..4 {
                let registry = registry.clone();
                s.spawn(move || {
                    for _ in 0..100 {
                        for method in ["add", "sub", "mul"] {
                            assert!(registry.get("IntMath", method).is_some());
                        }
                    }
                });
            }
        });
    }

    #[test]
    fn test_registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EndpointRegistry>();
    }
}

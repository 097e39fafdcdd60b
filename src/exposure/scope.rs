use super::naming::NamingConventions;
use super::resolver::{resolve, ExposedMethods};
use super::{AuthorizationRequirement, FilterFactory};
use crate::error::{ExposureError, Result};
use crate::reflect::{MethodInfo, ServiceType};
use std::fmt;
use std::sync::{Arc, OnceLock};

pub type PrefixFn = dyn Fn(&ServiceType) -> Vec<String> + Send + Sync;
pub type AuthorizationFn = dyn Fn(&ServiceType) -> Vec<AuthorizationRequirement> + Send + Sync;
pub type MethodPredicate = dyn Fn(&MethodInfo) -> bool + Send + Sync;
pub type FilterGenerator = dyn Fn(&MethodInfo) -> Option<FilterFactory> + Send + Sync;

/// Configuration in effect for every service exposed under it.
///
/// Immutable once built; nested scopes are derived with [`ApiConfiguration::nested`].
#[derive(Clone, Default)]
pub struct ApiConfiguration {
    prefixes: Vec<Arc<PrefixFn>>,
    authorizations: Vec<Arc<AuthorizationFn>>,
    method_filters: Vec<Arc<MethodPredicate>>,
    filters: Vec<Arc<FilterGenerator>>,
    naming: NamingConventions,
    response_compression: bool,
}

impl ApiConfiguration {
    pub fn builder() -> ApiConfigurationBuilder {
        ApiConfigurationBuilder::default()
    }

    /// A builder starting from this configuration; everything added to it applies on
    /// top of what is inherited.
    pub fn nested(&self) -> ApiConfigurationBuilder {
        ApiConfigurationBuilder {
            configuration: self.clone(),
        }
    }

    /// Results of every prefix generator, in registration order.
    pub fn prefixes(&self, service: &ServiceType) -> Vec<String> {
        self.prefixes.iter().flat_map(|prefix| prefix(service)).collect()
    }

    /// Results of every authorization generator, in registration order.
    pub fn authorizations(&self, service: &ServiceType) -> Vec<AuthorizationRequirement> {
        self.authorizations
            .iter()
            .flat_map(|generate| generate(service))
            .collect()
    }

    /// Whether every registered predicate accepts the method.
    pub fn is_method_eligible(&self, method: &MethodInfo) -> bool {
        self.method_filters.iter().all(|accepts| accepts(method))
    }

    pub fn filters_for(&self, method: &MethodInfo) -> Vec<FilterFactory> {
        self.filters.iter().filter_map(|generate| generate(method)).collect()
    }

    pub fn naming(&self) -> &NamingConventions {
        &self.naming
    }

    pub fn supports_compression(&self) -> bool {
        self.response_compression
    }
}

impl fmt::Debug for ApiConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfiguration")
            .field("prefixes", &self.prefixes.len())
            .field("authorizations", &self.authorizations.len())
            .field("method_filters", &self.method_filters.len())
            .field("filters", &self.filters.len())
            .field("response_compression", &self.response_compression)
            .finish()
    }
}

/// Append-only builder for [`ApiConfiguration`].
#[derive(Default)]
pub struct ApiConfigurationBuilder {
    configuration: ApiConfiguration,
}

impl ApiConfigurationBuilder {
    pub fn prefix<F>(mut self, generate: F) -> Self
    where
        F: Fn(&ServiceType) -> Vec<String> + Send + Sync + 'static,
    {
        self.configuration.prefixes.push(Arc::new(generate));
        self
    }

    /// A constant prefix for every service.
    pub fn prefix_str(self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix(move |_| vec![prefix.clone()])
    }

    /// A constant requirement for every service.
    pub fn authorize(self, requirement: AuthorizationRequirement) -> Self {
        self.authorize_with(move |_| vec![requirement.clone()])
    }

    pub fn authorize_with<F>(mut self, generate: F) -> Self
    where
        F: Fn(&ServiceType) -> Vec<AuthorizationRequirement> + Send + Sync + 'static,
    {
        self.configuration.authorizations.push(Arc::new(generate));
        self
    }

    pub fn method_filter<F>(mut self, accepts: F) -> Self
    where
        F: Fn(&MethodInfo) -> bool + Send + Sync + 'static,
    {
        self.configuration.method_filters.push(Arc::new(accepts));
        self
    }

    pub fn filter<F>(mut self, generate: F) -> Self
    where
        F: Fn(&MethodInfo) -> Option<FilterFactory> + Send + Sync + 'static,
    {
        self.configuration.filters.push(Arc::new(generate));
        self
    }

    pub fn naming(mut self, naming: NamingConventions) -> Self {
        self.configuration.naming = naming;
        self
    }

    pub fn response_compression(mut self, enabled: bool) -> Self {
        self.configuration.response_compression = enabled;
        self
    }

    pub fn build(self) -> Arc<ApiConfiguration> {
        Arc::new(self.configuration)
    }
}

/// One registration of a service type: the configuration it is exposed under plus
/// the registration's own names, authorizations, method filter and obsolescence note.
///
/// Route names are seeded once from the naming convention and cached, so resolving
/// the same scope again never calls the convention a second time.
pub struct ExposureScope {
    configuration: Arc<ApiConfiguration>,
    names: OnceLock<Arc<[String]>>,
    authorizations: Vec<AuthorizationRequirement>,
    method_filter: Option<Arc<MethodPredicate>>,
    obsolete: Option<String>,
}

impl ExposureScope {
    pub fn new(configuration: Arc<ApiConfiguration>) -> Self {
        ExposureScope {
            configuration,
            names: OnceLock::new(),
            authorizations: Vec::new(),
            method_filter: None,
            obsolete: None,
        }
    }

    pub fn builder(configuration: Arc<ApiConfiguration>) -> ExposureScopeBuilder {
        ExposureScopeBuilder {
            scope: Self::new(configuration),
            names: Vec::new(),
        }
    }

    pub fn configuration(&self) -> &ApiConfiguration {
        &self.configuration
    }

    /// Base route names, seeded from the naming convention on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ExposureError::NoRouteNames`] when the convention yields no names;
    /// nothing is cached in that case.
    pub fn base_names(&self, service: &ServiceType) -> Result<Arc<[String]>> {
        if let Some(names) = self.names.get() {
            return Ok(names.clone());
        }

        let names = self.configuration.naming().route_names(service);
        if names.is_empty() {
            return Err(ExposureError::NoRouteNames {
                service: service.qualified_name.clone(),
            });
        }
        Ok(self.names.get_or_init(|| Arc::from(names)).clone())
    }

    /// Names seeded so far, if any.
    pub fn seeded_names(&self) -> Option<&[String]> {
        self.names.get().map(|names| &names[..])
    }

    /// Requirements declared for this registration, placed before generated ones.
    pub fn authorizations(&self) -> &[AuthorizationRequirement] {
        &self.authorizations
    }

    pub fn method_filter(&self) -> Option<&MethodPredicate> {
        self.method_filter.as_deref()
    }

    pub fn obsolete(&self) -> Option<&str> {
        self.obsolete.as_deref()
    }

    /// Resolves the service with this registration's own method filter and
    /// obsolescence override.
    pub fn resolve<'a>(&'a self, service: &'a ServiceType) -> Result<ExposedMethods<'a>> {
        resolve(service, self, self.method_filter(), self.obsolete())
    }
}

impl fmt::Debug for ExposureScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExposureScope")
            .field("names", &self.names.get())
            .field("authorizations", &self.authorizations)
            .field("method_filter", &self.method_filter.is_some())
            .field("obsolete", &self.obsolete)
            .finish()
    }
}

pub struct ExposureScopeBuilder {
    scope: ExposureScope,
    names: Vec<String>,
}

impl ExposureScopeBuilder {
    /// Exposes the service under an explicit name; the naming convention is then
    /// never consulted.
    pub fn as_name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    /// Requires a policy when given, else the roles, else an authenticated user.
    pub fn authorize(mut self, role: Option<&str>, policy: Option<&str>) -> Self {
        self.scope
            .authorizations
            .push(AuthorizationRequirement::from_parts(role, policy));
        self
    }

    pub fn methods<F>(mut self, accepts: F) -> Self
    where
        F: Fn(&MethodInfo) -> bool + Send + Sync + 'static,
    {
        self.scope.method_filter = Some(Arc::new(accepts));
        self
    }

    pub fn obsolete(mut self, message: impl Into<String>) -> Self {
        self.scope.obsolete = Some(message.into());
        self
    }

    pub fn build(self) -> ExposureScope {
        let scope = self.scope;
        if !self.names.is_empty() {
            let _ = scope.names.set(Arc::from(self.names));
        }
        scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_names_are_seeded_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let configuration = ApiConfiguration::builder()
            .naming(NamingConventions::new(
                move |service| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    vec![service.name.clone()]
                },
                |method| method.name.clone(),
            ))
            .build();
        let scope = ExposureScope::new(configuration);
        let service = ServiceType::new("app::IntMath");

        assert_eq!(scope.seeded_names(), None);
        assert_eq!(&*scope.base_names(&service).unwrap(), ["IntMath".to_string()]);
        assert_eq!(&*scope.base_names(&service).unwrap(), ["IntMath".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_explicit_names_skip_the_convention() {
        let configuration = ApiConfiguration::builder()
            .naming(NamingConventions::new(
                |_| panic!("naming convention must not be called"),
                |method| method.name.clone(),
            ))
            .build();
        let scope = ExposureScope::builder(configuration).as_name("math").build();

        let names = scope.base_names(&ServiceType::new("app::IntMath")).unwrap();
        assert_eq!(&*names, ["math".to_string()]);
    }

    #[test]
    fn test_empty_convention_is_an_error() {
        let configuration = ApiConfiguration::builder()
            .naming(NamingConventions::new(|_| Vec::new(), |method| method.name.clone()))
            .build();
        let scope = ExposureScope::new(configuration);

        assert_eq!(
            scope.base_names(&ServiceType::new("app::IntMath")).unwrap_err(),
            ExposureError::NoRouteNames {
                service: "app::IntMath".to_string()
            }
        );
        assert_eq!(scope.seeded_names(), None);
    }

    #[test]
    fn test_nested_configuration_extends_parent() {
        let parent = ApiConfiguration::builder()
            .prefix_str("api/")
            .authorize(AuthorizationRequirement::AuthenticatedUser)
            .method_filter(|method| method.name != "internal")
            .build();
        let child = parent
            .nested()
            .prefix_str("v2/")
            .authorize(AuthorizationRequirement::role("admin"))
            .response_compression(true)
            .build();
        let service = ServiceType::new("app::IntMath");

        assert_eq!(parent.prefixes(&service), vec!["api/".to_string()]);
        assert_eq!(
            child.prefixes(&service),
            vec!["api/".to_string(), "v2/".to_string()]
        );
        assert_eq!(
            child.authorizations(&service),
            vec![
                AuthorizationRequirement::AuthenticatedUser,
                AuthorizationRequirement::role("admin"),
            ]
        );
        assert!(!child.is_method_eligible(&MethodInfo::new("app::IntMath", "internal")));
        assert!(child.supports_compression());
        assert!(!parent.supports_compression());
    }

    #[test]
    fn test_filter_generators_skip_none() {
        let configuration = ApiConfiguration::builder()
            .filter(|method| {
                method
                    .name
                    .starts_with("add")
                    .then(|| FilterFactory::declared("filters::audit"))
            })
            .filter(|_| Some(FilterFactory::declared("filters::timing")))
            .build();

        let names = |method: &str| -> Vec<String> {
            configuration
                .filters_for(&MethodInfo::new("app::IntMath", method))
                .iter()
                .map(|f| f.name().to_string())
                .collect()
        };
        assert_eq!(names("add"), vec!["filters::audit", "filters::timing"]);
        assert_eq!(names("sub"), vec!["filters::timing"]);
    }

    #[test]
    fn test_scope_builder() {
        let scope = ExposureScope::builder(ApiConfiguration::builder().build())
            .authorize(Some("admin"), None)
            .authorize(None, Some("staff"))
            .methods(|method| method.name == "add")
            .obsolete("use v2")
            .build();

        assert_eq!(
            scope.authorizations(),
            [
                AuthorizationRequirement::role("admin"),
                AuthorizationRequirement::policy("staff"),
            ]
        );
        assert_eq!(scope.obsolete(), Some("use v2"));
        let accepts = scope.method_filter().unwrap();
        assert!(accepts(&MethodInfo::new("app::IntMath", "add")));
        assert!(!accepts(&MethodInfo::new("app::IntMath", "sub")));
    }
}

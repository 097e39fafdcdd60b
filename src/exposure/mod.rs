//! Method exposure: turning the public methods of a service type into endpoint
//! descriptors.
//!
//! A service is exposed within an [`ExposureScope`], which carries the enclosing
//! [`ApiConfiguration`] (naming conventions, prefixes, authorization generators,
//! method predicates and filter generators). [`resolve`] walks the service's methods
//! and lazily yields one [`EndpointDescriptor`] per eligible method; the descriptors
//! are then collected into an [`EndpointRegistry`] that the transport layer reads.

pub mod declarations;
pub mod naming;
pub mod registry;
pub mod resolver;
pub mod scope;

pub use declarations::DeclaredFacts;
pub use naming::{apply_prefixes, NamingConventions, NamingStyle};
pub use registry::{EndpointRegistry, EndpointRegistryBuilder};
pub use resolver::{resolve, ExposedMethods};
pub use scope::{ApiConfiguration, ApiConfigurationBuilder, ExposureScope, ExposureScopeBuilder};

use crate::reflect::MethodInfo;
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Message used for `#[deprecated]` markers without a note.
pub const DEFAULT_OBSOLETE_MESSAGE: &str = "This method is obsolete";

/// A precondition that must hold before a call executes.
///
/// A list of requirements means all of them must hold. Enforcement happens in the
/// transport layer; only the requirement itself is computed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthorizationRequirement {
    Policy { name: String },
    Role { roles: Vec<String> },
    AuthenticatedUser,
}

impl AuthorizationRequirement {
    pub fn policy(name: impl Into<String>) -> Self {
        AuthorizationRequirement::Policy { name: name.into() }
    }

    /// A role requirement from a comma separated role list.
    pub fn role(roles: &str) -> Self {
        AuthorizationRequirement::Role {
            roles: roles
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Picks the requirement a role/policy pair stands for: the policy when present,
    /// else the roles, else any authenticated user.
    pub fn from_parts(role: Option<&str>, policy: Option<&str>) -> Self {
        match (policy, role) {
            (Some(policy), _) => Self::policy(policy),
            (None, Some(role)) => Self::role(role),
            (None, None) => AuthorizationRequirement::AuthenticatedUser,
        }
    }
}

/// Route and method of the call a filter is realized for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExecutionContext {
    pub route: String,
    pub method: String,
}

/// Intercepts calls to an endpoint.
pub trait CallFilter: Send + Sync {
    fn before_execute(&self, _context: &CallExecutionContext) {}

    fn after_execute(&self, _context: &CallExecutionContext) {}
}

pub type FilterFn = dyn Fn(&CallExecutionContext) -> Vec<Box<dyn CallFilter>> + Send + Sync;

/// A deferred producer of call filters, realized when a call executes.
#[derive(Clone)]
pub enum FilterFactory {
    /// Factory named by a `#[rpc_filter(path)]` marker; the transport resolves the path
    Declared { path: String },
    /// Factory registered in code
    Function { name: String, produce: Arc<FilterFn> },
}

impl FilterFactory {
    pub fn declared(path: impl Into<String>) -> Self {
        FilterFactory::Declared { path: path.into() }
    }

    pub fn function<F>(name: impl Into<String>, produce: F) -> Self
    where
        F: Fn(&CallExecutionContext) -> Vec<Box<dyn CallFilter>> + Send + Sync + 'static,
    {
        FilterFactory::Function {
            name: name.into(),
            produce: Arc::new(produce),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FilterFactory::Declared { path } => path,
            FilterFactory::Function { name, .. } => name,
        }
    }

    /// Produces the filters for one call. Declared factories produce nothing here;
    /// they are resolved by path in the transport layer.
    pub fn realize(&self, context: &CallExecutionContext) -> Vec<Box<dyn CallFilter>> {
        match self {
            FilterFactory::Declared { .. } => Vec::new(),
            FilterFactory::Function { produce, .. } => produce(context),
        }
    }
}

impl fmt::Debug for FilterFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterFactory::Declared { path } => f.debug_tuple("Declared").field(path).finish(),
            FilterFactory::Function { name, .. } => f.debug_tuple("Function").field(name).finish(),
        }
    }
}

impl PartialEq for FilterFactory {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FilterFactory::Declared { path: a }, FilterFactory::Declared { path: b }) => a == b,
            (
                FilterFactory::Function { name: a, produce: pa },
                FilterFactory::Function { name: b, produce: pb },
            ) => a == b && Arc::ptr_eq(pa, pb),
            _ => false,
        }
    }
}

/// Immutable metadata describing one remotely callable method.
///
/// Identity is the owning service plus the method signature.
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    service: String,
    names: Arc<[String]>,
    method_name: String,
    method: Arc<MethodInfo>,
    authorizations: Box<[AuthorizationRequirement]>,
    filters: Box<[FilterFactory]>,
    supports_compression: bool,
    obsolete_message: Option<String>,
}

impl EndpointDescriptor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        service: String,
        names: Arc<[String]>,
        method_name: String,
        method: Arc<MethodInfo>,
        authorizations: Vec<AuthorizationRequirement>,
        filters: Vec<FilterFactory>,
        supports_compression: bool,
        obsolete_message: Option<String>,
    ) -> Self {
        EndpointDescriptor {
            service,
            names,
            method_name,
            method,
            authorizations: authorizations.into_boxed_slice(),
            filters: filters.into_boxed_slice(),
            supports_compression,
            obsolete_message,
        }
    }

    /// Qualified name of the exposed service type.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Final route names, never empty.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Identifier the method is called by.
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn method(&self) -> &MethodInfo {
        &self.method
    }

    pub fn authorizations(&self) -> &[AuthorizationRequirement] {
        &self.authorizations
    }

    pub fn filters(&self) -> &[FilterFactory] {
        &self.filters
    }

    pub fn supports_compression(&self) -> bool {
        self.supports_compression
    }

    pub fn obsolete_message(&self) -> Option<&str> {
        self.obsolete_message.as_deref()
    }

    pub fn is_obsolete(&self) -> bool {
        self.obsolete_message.is_some()
    }
}

impl PartialEq for EndpointDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.service == other.service && self.method.signature() == other.method.signature()
    }
}

impl Eq for EndpointDescriptor {}

impl Hash for EndpointDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.service.hash(state);
        self.method.signature().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_role_requirement_splits_role_list() {
        assert_eq!(
            AuthorizationRequirement::role("admin, auditor,,"),
            AuthorizationRequirement::Role {
                roles: vec!["admin".to_string(), "auditor".to_string()]
            }
        );
    }

    #[test]
    fn test_requirement_from_parts_prefers_policy() {
        assert_eq!(
            AuthorizationRequirement::from_parts(Some("admin"), Some("staff")),
            AuthorizationRequirement::policy("staff")
        );
        assert_eq!(
            AuthorizationRequirement::from_parts(Some("admin"), None),
            AuthorizationRequirement::role("admin")
        );
        assert_eq!(
            AuthorizationRequirement::from_parts(None, None),
            AuthorizationRequirement::AuthenticatedUser
        );
    }

    #[test]
    fn test_requirement_serialization() {
        let json = serde_json::to_value(AuthorizationRequirement::role("admin")).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "role", "roles": ["admin"] }));
    }

    struct CountingFilter(Arc<AtomicUsize>);

    impl CallFilter for CountingFilter {
        fn before_execute(&self, _context: &CallExecutionContext) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_function_filter_is_realized_per_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let factory = FilterFactory::function("audit", move |_| {
            vec![Box::new(CountingFilter(counter.clone())) as Box<dyn CallFilter>]
        });
        let context = CallExecutionContext {
            route: "IntMath".to_string(),
            method: "add".to_string(),
        };

        for filter in factory.realize(&context) {
            filter.before_execute(&context);
            filter.after_execute(&context);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(factory.name(), "audit");
        assert!(FilterFactory::declared("filters::audit").realize(&context).is_empty());
    }

    #[test]
    fn test_descriptor_identity_is_service_and_signature() {
        let method = Arc::new(MethodInfo::new("app::IntMath", "add"));
        let first = EndpointDescriptor::new(
            "app::IntMath".to_string(),
            Arc::from(vec!["IntMath".to_string()]),
            "add".to_string(),
            method.clone(),
            Vec::new(),
            Vec::new(),
            false,
            None,
        );
        let renamed = EndpointDescriptor::new(
            "app::IntMath".to_string(),
            Arc::from(vec!["math".to_string()]),
            "Add".to_string(),
            method,
            vec![AuthorizationRequirement::AuthenticatedUser],
            Vec::new(),
            true,
            None,
        );

        assert_eq!(first, renamed);
        assert!(first.authorizations().is_empty());
        assert!(!first.is_obsolete());
    }
}

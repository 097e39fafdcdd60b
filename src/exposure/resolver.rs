use super::declarations::DeclaredFacts;
use super::naming::apply_prefixes;
use super::scope::{ExposureScope, MethodPredicate};
use super::{AuthorizationRequirement, EndpointDescriptor};
use crate::error::Result;
use crate::reflect::{MethodInfo, ServiceType};
use log::debug;
use std::sync::Arc;

/// Resolves the endpoints a service exposes within `scope`.
///
/// Route names and scope-level authorizations are computed up front; descriptors are
/// produced lazily as the returned iterator is consumed. Only public instance methods
/// not inherited from the std object traits are exposed, and only when every
/// predicate of the configuration and the optional `method_filter` accept them.
///
/// `obsolete` overrides whatever obsolescence the markers declare. When the prefix
/// generators yield nothing, the base names are used unprefixed.
///
/// # Errors
///
/// Fails with [`crate::error::ExposureError::NoRouteNames`] when no names can be
/// seeded. Malformed markers surface as errors from the iterator.
pub fn resolve<'a>(
    service: &'a ServiceType,
    scope: &'a ExposureScope,
    method_filter: Option<&'a MethodPredicate>,
    obsolete: Option<&'a str>,
) -> Result<ExposedMethods<'a>> {
    let configuration = scope.configuration();
    let base_names = scope.base_names(service)?;
    let prefixes = configuration.prefixes(service);
    let names: Arc<[String]> = if prefixes.is_empty() {
        base_names
    } else {
        Arc::from(apply_prefixes(&prefixes, &base_names))
    };

    let mut authorizations = scope.authorizations().to_vec();
    authorizations.extend(configuration.authorizations(service));

    debug!(
        "Resolving {} as {:?} with {} scope authorizations",
        service.qualified_name,
        names,
        authorizations.len()
    );

    Ok(ExposedMethods {
        service,
        scope,
        method_filter,
        obsolete,
        names,
        authorizations,
        methods: service.methods.iter(),
    })
}

/// Lazily produced endpoint descriptors of one service.
///
/// A clone continues from the same position. Calling [`resolve`] again starts over and
/// yields the same descriptors.
#[derive(Clone)]
pub struct ExposedMethods<'a> {
    service: &'a ServiceType,
    scope: &'a ExposureScope,
    method_filter: Option<&'a MethodPredicate>,
    obsolete: Option<&'a str>,
    names: Arc<[String]>,
    authorizations: Vec<AuthorizationRequirement>,
    methods: std::slice::Iter<'a, Arc<MethodInfo>>,
}

impl ExposedMethods<'_> {
    /// Final route names shared by every descriptor.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn is_exposed(&self, method: &MethodInfo) -> bool {
        method.is_public
            && !method.is_static()
            && !method.is_declared_on_object()
            && self.scope.configuration().is_method_eligible(method)
            && self.method_filter.map_or(true, |accepts| accepts(method))
    }

    fn describe(&self, method: &Arc<MethodInfo>) -> Result<EndpointDescriptor> {
        let configuration = self.scope.configuration();
        let facts = DeclaredFacts::for_method(method, self.service)?;

        let mut authorizations = self.authorizations.clone();
        authorizations.extend(facts.authorizations);

        let mut filters = configuration.filters_for(method);
        filters.extend(facts.filters);

        let obsolete_message = self
            .obsolete
            .map(str::to_string)
            .or(facts.obsolete_message);

        Ok(EndpointDescriptor::new(
            self.service.qualified_name.clone(),
            self.names.clone(),
            configuration.naming().method_name(method),
            method.clone(),
            authorizations,
            filters,
            configuration.supports_compression(),
            obsolete_message,
        ))
    }
}

impl Iterator for ExposedMethods<'_> {
    type Item = Result<EndpointDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let method = self.methods.next()?;
            if !self.is_exposed(method) {
                debug!("Skipping {}", method.signature());
                continue;
            }
            debug!("Exposing {}", method.signature());
            return Some(self.describe(method));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.methods.size_hint().1)
    }
}

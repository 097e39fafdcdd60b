use super::{AuthorizationRequirement, FilterFactory, DEFAULT_OBSOLETE_MESSAGE};
use crate::error::{ExposureError, Result};
use crate::reflect::marker::{Marker, MarkerArgs, MarkerValue};
use crate::reflect::{MethodInfo, ServiceType};

/// Facts declared by markers on a method, its type or its crate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclaredFacts {
    pub authorizations: Vec<AuthorizationRequirement>,
    pub filters: Vec<FilterFactory>,
    pub obsolete_message: Option<String>,
}

impl DeclaredFacts {
    /// Reads `#[authorize]`, `#[deprecated]` and `#[rpc_filter]` markers.
    ///
    /// `owner` names the marked item in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ExposureError::MalformedMarker`] when one of these
    /// markers has arguments it does not accept.
    pub fn extract(markers: &[Marker], owner: &str) -> Result<Self> {
        let mut facts = DeclaredFacts::default();

        for marker in markers {
            match marker.name() {
                "authorize" => facts.authorizations.push(authorization(marker, owner)?),
                "rpc_filter" => facts.filters.extend(filters(marker, owner)?),
                "deprecated" => {
                    let message = obsolete_message(marker, owner)?;
                    facts.obsolete_message.get_or_insert(message);
                }
                _ => {}
            }
        }

        Ok(facts)
    }

    /// Facts of a method merged with its type's and crate's, in that order.
    ///
    /// Authorizations and filters accumulate; the innermost obsolescence message wins.
    pub fn for_method(method: &MethodInfo, service: &ServiceType) -> Result<Self> {
        let mut facts = Self::extract(&method.markers, &format!("method `{}`", method.name))?;
        facts.merge(Self::extract(
            &service.markers,
            &format!("type `{}`", service.qualified_name),
        )?);
        facts.merge(Self::extract(
            &service.assembly.markers,
            &format!("crate `{}`", service.assembly.name),
        )?);
        Ok(facts)
    }

    fn merge(&mut self, outer: DeclaredFacts) {
        self.authorizations.extend(outer.authorizations);
        self.filters.extend(outer.filters);
        if self.obsolete_message.is_none() {
            self.obsolete_message = outer.obsolete_message;
        }
    }
}

fn authorization(marker: &Marker, owner: &str) -> Result<AuthorizationRequirement> {
    let args = match &marker.args {
        MarkerArgs::None => return Ok(AuthorizationRequirement::AuthenticatedUser),
        MarkerArgs::List(args) => args,
        _ => return Err(ExposureError::malformed(&marker.path, owner, "expected `policy` or `roles` arguments")),
    };

    let mut role = None;
    let mut policy = None;
    for arg in args {
        let value = match &arg.value {
            Some(MarkerValue::Str(value)) => value.as_str(),
            _ => {
                return Err(ExposureError::malformed(
                    &marker.path,
                    owner,
                    &format!("`{}` must be a string literal", arg.key),
                ))
            }
        };
        match arg.key.as_str() {
            "policy" => policy = Some(value),
            "roles" | "role" => role = Some(value),
            other => return Err(ExposureError::malformed(&marker.path, owner, &format!("unknown argument `{}`", other))),
        }
    }

    let requirement = AuthorizationRequirement::from_parts(role, policy);
    if matches!(&requirement, AuthorizationRequirement::Role { roles } if roles.is_empty()) {
        return Err(ExposureError::malformed(&marker.path, owner, "`roles` names no role"));
    }
    Ok(requirement)
}

fn obsolete_message(marker: &Marker, owner: &str) -> Result<String> {
    match &marker.args {
        MarkerArgs::None => Ok(DEFAULT_OBSOLETE_MESSAGE.to_string()),
        MarkerArgs::Value(MarkerValue::Str(note)) => Ok(note.clone()),
        MarkerArgs::List(args) => {
            let mut note = None;
            for arg in args {
                match (arg.key.as_str(), &arg.value) {
                    ("note", Some(MarkerValue::Str(value))) => note = Some(value.clone()),
                    ("since", Some(MarkerValue::Str(_))) => {}
                    (key, _) => {
                        return Err(ExposureError::malformed(
                            &marker.path,
                            owner,
                            &format!("unexpected argument `{}`", key),
                        ))
                    }
                }
            }
            Ok(note.unwrap_or_else(|| DEFAULT_OBSOLETE_MESSAGE.to_string()))
        }
        _ => Err(ExposureError::malformed(&marker.path, owner, "expected a string note")),
    }
}

fn filters(marker: &Marker, owner: &str) -> Result<Vec<FilterFactory>> {
    match &marker.args {
        MarkerArgs::Value(MarkerValue::Str(path) | MarkerValue::Path(path)) => {
            Ok(vec![FilterFactory::declared(path.clone())])
        }
        MarkerArgs::List(args) if !args.is_empty() => args
            .iter()
            .map(|arg| match arg.value {
                None => Ok(FilterFactory::declared(arg.key.clone())),
                Some(_) => Err(ExposureError::malformed(
                    &marker.path,
                    owner,
                    &format!("`{}` must be a filter factory path", arg.key),
                )),
            })
            .collect(),
        _ => Err(ExposureError::malformed(&marker.path, owner, "expected filter factory paths")),
    }
}

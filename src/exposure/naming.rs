use crate::reflect::{MethodInfo, ServiceType};
use clap::ValueEnum;
use heck::{ToKebabCase, ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub type RouteNamer = dyn Fn(&ServiceType) -> Vec<String> + Send + Sync;
pub type MethodNamer = dyn Fn(&MethodInfo) -> String + Send + Sync;

/// Case style applied to type and method names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum NamingStyle {
    /// Keep names as declared
    #[default]
    #[serde(rename = "as-is")]
    #[value(name = "as-is")]
    AsIs,
    #[serde(rename = "snake_case")]
    #[value(name = "snake_case")]
    SnakeCase,
    #[serde(rename = "kebab-case")]
    #[value(name = "kebab-case")]
    KebabCase,
    #[serde(rename = "lowerCamelCase")]
    #[value(name = "lowerCamelCase")]
    LowerCamelCase,
    #[serde(rename = "UpperCamelCase")]
    #[value(name = "UpperCamelCase")]
    UpperCamelCase,
}

impl NamingStyle {
    pub fn apply(self, name: &str) -> String {
        match self {
            NamingStyle::AsIs => name.to_string(),
            NamingStyle::SnakeCase => name.to_snake_case(),
            NamingStyle::KebabCase => name.to_kebab_case(),
            NamingStyle::LowerCamelCase => name.to_lower_camel_case(),
            NamingStyle::UpperCamelCase => name.to_upper_camel_case(),
        }
    }
}

/// The functions naming routes after service types and calls after methods.
#[derive(Clone)]
pub struct NamingConventions {
    route_names: Arc<RouteNamer>,
    method_name: Arc<MethodNamer>,
}

impl NamingConventions {
    pub fn new<R, M>(route_names: R, method_name: M) -> Self
    where
        R: Fn(&ServiceType) -> Vec<String> + Send + Sync + 'static,
        M: Fn(&MethodInfo) -> String + Send + Sync + 'static,
    {
        NamingConventions {
            route_names: Arc::new(route_names),
            method_name: Arc::new(method_name),
        }
    }

    /// Routes named after the type's simple name, calls after the method name.
    pub fn styled(route_style: NamingStyle, method_style: NamingStyle) -> Self {
        Self::new(
            move |service| vec![route_style.apply(&service.name)],
            move |method| method_style.apply(&method.name),
        )
    }

    pub fn route_names(&self, service: &ServiceType) -> Vec<String> {
        (self.route_names)(service)
    }

    pub fn method_name(&self, method: &MethodInfo) -> String {
        (self.method_name)(method)
    }
}

impl Default for NamingConventions {
    fn default() -> Self {
        Self::styled(NamingStyle::AsIs, NamingStyle::AsIs)
    }
}

impl fmt::Debug for NamingConventions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamingConventions").finish_non_exhaustive()
    }
}

/// Every prefix joined with every name, prefix-major; names are returned unchanged
/// when there are no prefixes.
pub fn apply_prefixes(prefixes: &[String], names: &[String]) -> Vec<String> {
    if prefixes.is_empty() {
        return names.to_vec();
    }

    prefixes
        .iter()
        .flat_map(|prefix| names.iter().map(move |name| format!("{}{}", prefix, name)))
        .collect()
}

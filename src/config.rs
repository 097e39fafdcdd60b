//! TOML configuration describing which services to expose and how.
//!
//! ```toml
//! title = "Math API"
//! naming = "kebab-case"
//! prefixes = ["api/"]
//! exclude_methods = ["internal_reset"]
//!
//! [[authorize]]
//! role = "user"
//!
//! [[expose]]
//! type = "services::IntMath"
//! as = ["math"]
//! methods = ["add", "sub"]
//! authorize = [{ policy = "calculators" }]
//! ```

use crate::exposure::{
    ApiConfiguration, AuthorizationRequirement, ExposureScope, NamingConventions, NamingStyle,
};
use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_TITLE: &str = "RPC API";
pub const DEFAULT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExposureConfig {
    pub title: Option<String>,
    pub version: Option<String>,
    /// Case style of route names derived from type names
    pub naming: NamingStyle,
    /// Case style of method identifiers
    pub method_naming: NamingStyle,
    pub response_compression: bool,
    pub prefixes: Vec<String>,
    /// Method names never exposed by any service
    pub exclude_methods: Vec<String>,
    /// Requirements applied to every service
    pub authorize: Vec<AuthorizeConfig>,
    pub expose: Vec<ExposeConfig>,
}

/// A policy requirement when `policy` is set, else a role requirement when `role` is
/// set, else any authenticated user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorizeConfig {
    pub role: Option<String>,
    pub policy: Option<String>,
}

impl AuthorizeConfig {
    pub fn requirement(&self) -> AuthorizationRequirement {
        AuthorizationRequirement::from_parts(self.role.as_deref(), self.policy.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExposeConfig {
    /// Path of the service type, e.g. `IntMath` or `services::IntMath`
    #[serde(rename = "type")]
    pub type_path: String,
    /// Explicit route names replacing the naming convention
    #[serde(rename = "as", default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub authorize: Vec<AuthorizeConfig>,
    /// Only these methods are exposed when non-empty
    #[serde(default)]
    pub methods: Vec<String>,
    pub obsolete: Option<String>,
}

impl ExposeConfig {
    pub fn new(type_path: impl Into<String>) -> Self {
        ExposeConfig {
            type_path: type_path.into(),
            names: Vec::new(),
            authorize: Vec::new(),
            methods: Vec::new(),
            obsolete: None,
        }
    }

    /// The exposure scope of this registration under `configuration`.
    pub fn scope(&self, configuration: Arc<ApiConfiguration>) -> ExposureScope {
        let mut builder = ExposureScope::builder(configuration);
        for name in &self.names {
            builder = builder.as_name(name.clone());
        }
        for authorize in &self.authorize {
            builder = builder.authorize(authorize.role.as_deref(), authorize.policy.as_deref());
        }
        if !self.methods.is_empty() {
            let methods = self.methods.clone();
            builder = builder.methods(move |method| methods.contains(&method.name));
        }
        if let Some(message) = &self.obsolete {
            builder = builder.obsolete(message.clone());
        }
        builder.build()
    }
}

impl ExposureConfig {
    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid configuration.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_VERSION)
    }

    /// The configuration shared by every exposed service.
    pub fn api_configuration(&self) -> Arc<ApiConfiguration> {
        let mut builder = ApiConfiguration::builder()
            .naming(NamingConventions::styled(self.naming, self.method_naming))
            .response_compression(self.response_compression);

        for prefix in &self.prefixes {
            builder = builder.prefix_str(prefix.clone());
        }
        for authorize in &self.authorize {
            builder = builder.authorize(authorize.requirement());
        }
        if !self.exclude_methods.is_empty() {
            let excluded = self.exclude_methods.clone();
            builder = builder.method_filter(move |method| !excluded.contains(&method.name));
        }

        builder.build()
    }
}

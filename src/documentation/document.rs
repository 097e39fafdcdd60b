use super::type_graph::{reference, TypeGraphBuilder};
use super::{DocumentationPackage, TypeDefinition, TypeReference};
use crate::exposure::{AuthorizationRequirement, FilterFactory};
use crate::reflect::catalog::TypeCatalog;
use log::debug;
use serde::Serialize;

/// Documentation of every exposed service plus the type definitions their methods use.
#[derive(Debug, Clone, Serialize)]
pub struct ApiDocument {
    pub info: Info,
    pub services: Vec<ServiceDocument>,
    pub definitions: Vec<TypeDefinition>,
}

/// Document metadata
#[derive(Debug, Clone, Serialize)]
pub struct Info {
    pub title: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceDocument {
    /// Qualified name of the service type
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub routes: Vec<String>,
    pub methods: Vec<MethodDocument>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodDocument {
    /// Identifier the method is called by
    pub name: String,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Vec<ParameterDocument>,
    pub returns: TypeReference,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authorization: Vec<AuthorizationRequirement>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obsolete: Option<String>,
    pub response_compression: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeReference,
}

impl ApiDocument {
    /// Documents the packages and builds the type definition graph they reference.
    pub fn build(
        title: &str,
        version: &str,
        packages: &[DocumentationPackage],
        catalog: &TypeCatalog,
    ) -> Self {
        debug!("Building API document for {} services", packages.len());

        let services = packages
            .iter()
            .map(|package| ServiceDocument {
                service: package.service.clone(),
                description: catalog
                    .find_by_path(&package.service)
                    .and_then(|decl| decl.description.clone()),
                routes: package.routes.clone(),
                methods: package
                    .methods
                    .iter()
                    .map(|documented| {
                        let endpoint = &documented.endpoint;
                        let method = endpoint.method();
                        MethodDocument {
                            name: documented.name.clone(),
                            signature: method.signature(),
                            description: method.description.clone(),
                            parameters: method
                                .parameters
                                .iter()
                                .map(|parameter| ParameterDocument {
                                    name: parameter.name.clone(),
                                    ty: reference(&parameter.ty, catalog),
                                })
                                .collect(),
                            returns: reference(&method.return_type, catalog),
                            authorization: endpoint.authorizations().to_vec(),
                            filters: endpoint
                                .filters()
                                .iter()
                                .map(FilterFactory::name)
                                .map(str::to_string)
                                .collect(),
                            obsolete: endpoint.obsolete_message().map(str::to_string),
                            response_compression: endpoint.supports_compression(),
                        }
                    })
                    .collect(),
            })
            .collect();

        ApiDocument {
            info: Info {
                title: title.to_string(),
                version: version.to_string(),
            },
            services,
            definitions: TypeGraphBuilder::new(catalog).build(packages),
        }
    }
}

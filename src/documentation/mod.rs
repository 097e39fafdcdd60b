//! Documentation of exposed endpoints: the type definition graph reachable from their
//! signatures and the API document combining it with the endpoint metadata.

pub mod document;
pub mod shape;
pub mod type_graph;

pub use document::ApiDocument;
pub use shape::{classify, Shape};
pub use type_graph::TypeGraphBuilder;

use crate::exposure::EndpointDescriptor;
use crate::reflect::catalog::EnumConstant;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Identity of a described data shape: the qualified type name plus instantiation
/// arguments for generic types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TypeKey(String);

impl TypeKey {
    pub fn new(key: impl Into<String>) -> Self {
        TypeKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A described data shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDefinition {
    Enum(EnumDefinition),
    Object(ObjectDefinition),
}

impl TypeDefinition {
    pub fn name(&self) -> &str {
        match self {
            TypeDefinition::Enum(definition) => &definition.name,
            TypeDefinition::Object(definition) => &definition.name,
        }
    }

    pub fn key(&self) -> &TypeKey {
        match self {
            TypeDefinition::Enum(definition) => &definition.full_name,
            TypeDefinition::Object(definition) => &definition.full_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDefinition {
    pub name: String,
    pub full_name: TypeKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub values: Vec<EnumValueDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumValueDefinition {
    pub name: String,
    pub value: EnumConstant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectDefinition {
    pub name: String,
    pub full_name: TypeKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub properties: Vec<PropertyDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeReference,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// How a property, parameter or return value refers to its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeReference {
    Scalar { name: String },
    Definition { id: TypeKey },
    Array { items: Box<TypeReference> },
    Optional { inner: Box<TypeReference> },
}

impl TypeReference {
    pub fn scalar(name: &str) -> Self {
        TypeReference::Scalar {
            name: name.to_string(),
        }
    }

    pub fn definition(key: &str) -> Self {
        TypeReference::Definition {
            id: TypeKey::new(key),
        }
    }
}

/// Endpoints of one service, as handed to the documentation builders.
#[derive(Debug, Clone)]
pub struct DocumentationPackage {
    /// Qualified name of the service type
    pub service: String,
    pub routes: Vec<String>,
    pub methods: Vec<DocumentedMethod>,
}

#[derive(Debug, Clone)]
pub struct DocumentedMethod {
    pub name: String,
    pub endpoint: Arc<EndpointDescriptor>,
}

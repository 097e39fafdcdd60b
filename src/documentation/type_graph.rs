use super::shape::{bindings, classify, Composite, Shape, WrapperKind};
use super::{
    DocumentationPackage, EnumDefinition, EnumValueDefinition, ObjectDefinition,
    PropertyDefinition, TypeDefinition, TypeKey, TypeReference,
};
use crate::reflect::catalog::{DeclKind, FieldDecl, TypeCatalog, TypeDecl, VariantFields};
use crate::reflect::marker::Marker;
use crate::reflect::TypeRef;
use indexmap::IndexMap;
use log::debug;
use std::collections::HashMap;

/// Builds the deduplicated set of type definitions reachable from endpoint signatures.
///
/// The registry doubles as the visited set: a composite is registered before its
/// properties are walked, so self- and mutually-referential types terminate. Traversal
/// runs on an explicit work stack, so arbitrarily long chains of types cost no call
/// stack.
pub struct TypeGraphBuilder<'c> {
    catalog: &'c TypeCatalog,
    registry: IndexMap<TypeKey, TypeDefinition>,
    pending: Vec<TypeRef>,
}

impl<'c> TypeGraphBuilder<'c> {
    pub fn new(catalog: &'c TypeCatalog) -> Self {
        TypeGraphBuilder {
            catalog,
            registry: IndexMap::new(),
            pending: Vec::new(),
        }
    }

    /// Resolves the return and parameter types of every endpoint in every package and
    /// returns the definitions in first-seen order.
    pub fn build(mut self, packages: &[DocumentationPackage]) -> Vec<TypeDefinition> {
        for package in packages {
            debug!("Building type graph for {}", package.service);
            for documented in &package.methods {
                let method = documented.endpoint.method();
                self.resolve(&method.return_type);
                for parameter in &method.parameters {
                    self.resolve(&parameter.ty);
                }
            }
        }

        debug!("Type graph contains {} definitions", self.registry.len());
        self.registry.into_values().collect()
    }

    /// Registers the definitions a type needs.
    ///
    /// Properties are visited depth-first in declaration order, so definitions appear
    /// in the order their types are first reached.
    pub fn resolve(&mut self, ty: &TypeRef) {
        self.pending.push(ty.clone());
        while let Some(next) = self.pending.pop() {
            self.visit(&next);
        }
    }

    fn visit(&mut self, ty: &TypeRef) {
        match classify(ty, self.catalog) {
            Shape::Scalar(_) => {}
            // Containers are transparent
            Shape::Sequence(item) | Shape::Wrapper(_, item) => self.pending.push(item),
            Shape::Enum(decl) => {
                let key = TypeKey::new(&decl.qualified_name);
                if self.registry.contains_key(&key) {
                    return;
                }
                debug!("Registering enum {}", key);
                self.registry.insert(key, TypeDefinition::Enum(enum_definition(decl)));
            }
            Shape::Composite(composite) => {
                let key = composite.key(self.catalog);
                if self.registry.contains_key(&key) {
                    return;
                }

                let members = members(&composite);
                let properties = members
                    .iter()
                    .map(|member| PropertyDefinition {
                        name: member.name.clone(),
                        ty: reference(&member.ty, self.catalog),
                        required: member.required,
                        description: member.description.clone(),
                    })
                    .collect();

                // Register before descending so cycles end here
                debug!("Registering object {}", key);
                let description = match &composite {
                    Composite::Declared { decl, .. } => decl.description.clone(),
                    _ => None,
                };
                self.registry.insert(
                    key.clone(),
                    TypeDefinition::Object(ObjectDefinition {
                        name: composite.name(),
                        full_name: key,
                        description,
                        properties,
                    }),
                );

                self.pending
                    .extend(members.into_iter().rev().map(|member| member.ty));
            }
        }
    }

    /// Definitions registered so far.
    pub fn definitions(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.registry.values()
    }
}

/// How a property, parameter or return value of type `ty` refers to it.
pub fn reference(ty: &TypeRef, catalog: &TypeCatalog) -> TypeReference {
    match classify(ty, catalog) {
        Shape::Scalar(name) => TypeReference::Scalar { name },
        Shape::Enum(decl) => TypeReference::definition(&decl.qualified_name),
        Shape::Sequence(item) => TypeReference::Array {
            items: Box::new(reference(&item, catalog)),
        },
        Shape::Wrapper(WrapperKind::Optional, inner) => TypeReference::Optional {
            inner: Box::new(reference(&inner, catalog)),
        },
        Shape::Wrapper(_, inner) => reference(&inner, catalog),
        Shape::Composite(composite) => TypeReference::Definition {
            id: composite.key(catalog),
        },
    }
}

fn enum_definition(decl: &TypeDecl) -> EnumDefinition {
    let values = match &decl.kind {
        DeclKind::Enum(variants) => variants
            .iter()
            .map(|variant| EnumValueDefinition {
                name: serde_name(&variant.markers).unwrap_or_else(|| variant.name.clone()),
                value: variant.value.clone(),
                description: variant.description.clone(),
            })
            .collect(),
        _ => Vec::new(),
    };

    EnumDefinition {
        name: decl.name.clone(),
        full_name: TypeKey::new(&decl.qualified_name),
        description: decl.description.clone(),
        values,
    }
}

/// A property of a composite before it is turned into a definition.
struct Member {
    name: String,
    ty: TypeRef,
    required: bool,
    description: Option<String>,
}

fn members(composite: &Composite<'_>) -> Vec<Member> {
    match composite {
        Composite::Declared { decl, args } => {
            let bindings = bindings(decl, args);
            match &decl.kind {
                DeclKind::Struct(fields) => struct_members(fields, &bindings),
                DeclKind::Enum(variants) => variants
                    .iter()
                    .filter(|variant| !serde_skip(&variant.markers))
                    .map(|variant| {
                        // Externally tagged: each variant is an optional property
                        let ty = match &variant.fields {
                            VariantFields::Unit => TypeRef::unit(),
                            VariantFields::Tuple(types) if types.len() == 1 => types[0].clone(),
                            VariantFields::Tuple(types) => TypeRef::Tuple(types.clone()),
                            VariantFields::Named(fields) => {
                                TypeRef::Tuple(fields.iter().map(|f| f.ty.clone()).collect())
                            }
                        };
                        Member {
                            name: serde_name(&variant.markers).unwrap_or_else(|| variant.name.clone()),
                            ty: ty.substitute(&bindings),
                            required: false,
                            description: variant.description.clone(),
                        }
                    })
                    .collect(),
                // Aliases are resolved away by classification
                DeclKind::Alias(_) => Vec::new(),
            }
        }
        Composite::Tuple(elems) => elems
            .iter()
            .enumerate()
            .map(|(index, ty)| Member {
                name: index.to_string(),
                ty: ty.clone(),
                required: true,
                description: None,
            })
            .collect(),
        Composite::External(_) => Vec::new(),
    }
}

fn struct_members(fields: &[FieldDecl], bindings: &HashMap<String, TypeRef>) -> Vec<Member> {
    fields
        .iter()
        .filter(|field| field.is_public && !serde_skip(&field.markers))
        .map(|field| Member {
            name: serde_name(&field.markers).unwrap_or_else(|| field.name.clone()),
            ty: field.ty.substitute(bindings),
            required: is_required(&field.markers),
            description: field.description.clone(),
        })
        .collect()
}

fn is_required(markers: &[Marker]) -> bool {
    markers
        .iter()
        .any(|m| m.is("required") || (m.is("validate") && m.has_flag("required")))
}

fn serde_skip(markers: &[Marker]) -> bool {
    markers
        .iter()
        .any(|m| m.is("serde") && (m.has_flag("skip") || m.has_flag("skip_serializing")))
}

fn serde_name(markers: &[Marker]) -> Option<String> {
    markers
        .iter()
        .filter(|m| m.is("serde"))
        .find_map(|m| m.get("rename").and_then(|v| v.as_str()))
        .map(str::to_string)
}

//! Owned model of the services and data types declared in a Rust project.
//!
//! The model is what the exposure resolver and the type graph builder walk. It is
//! produced from parsed sources by [`catalog::TypeCatalog`], but every type here can
//! also be constructed directly, which is how most unit tests drive the resolver.
//!
//! All model types are `Send + Sync`, so endpoint descriptors holding them can be
//! shared with request-handling threads.

pub mod catalog;
pub mod marker;
pub mod syntax;

use marker::Marker;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Traits every type gets from the standard library; their methods are never exposed.
pub const UNIVERSAL_TRAITS: &[&str] = &[
    "Clone",
    "Debug",
    "Default",
    "Display",
    "Drop",
    "Eq",
    "Hash",
    "Ord",
    "PartialEq",
    "PartialOrd",
    "ToString",
];

/// A type expression as written in a signature or field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A path type; `args` are the type arguments of the last segment
    Path {
        segments: Vec<String>,
        args: Vec<TypeRef>,
    },
    /// `[T]`
    Slice(Box<TypeRef>),
    /// `[T; N]`
    Array(Box<TypeRef>),
    /// `(A, B)`; the empty tuple is the unit type
    Tuple(Vec<TypeRef>),
    /// A future resolving to the inner type (`async fn`, `impl Future<Output = T>`)
    Future(Box<TypeRef>),
    /// Function pointers, macros and other types with no data shape
    Opaque(String),
}

impl TypeRef {
    /// A non-generic path type, e.g. `TypeRef::named("models::User")`.
    pub fn named(path: &str) -> Self {
        Self::generic(path, Vec::new())
    }

    pub fn generic(path: &str, args: Vec<TypeRef>) -> Self {
        TypeRef::Path {
            segments: path.split("::").map(str::to_string).collect(),
            args,
        }
    }

    pub fn unit() -> Self {
        TypeRef::Tuple(Vec::new())
    }

    pub fn future(output: TypeRef) -> Self {
        TypeRef::Future(Box::new(output))
    }

    /// Last path segment for path types.
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeRef::Path { segments, .. } => segments.last().map(String::as_str),
            _ => None,
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, TypeRef::Tuple(elems) if elems.is_empty())
    }

    /// Replaces generic parameters by their bound arguments.
    pub fn substitute(&self, bindings: &HashMap<String, TypeRef>) -> TypeRef {
        if bindings.is_empty() {
            return self.clone();
        }
        match self {
            TypeRef::Path { segments, args } => {
                if segments.len() == 1 && args.is_empty() {
                    if let Some(bound) = bindings.get(&segments[0]) {
                        return bound.clone();
                    }
                }
                TypeRef::Path {
                    segments: segments.clone(),
                    args: args.iter().map(|a| a.substitute(bindings)).collect(),
                }
            }
            TypeRef::Slice(inner) => TypeRef::Slice(Box::new(inner.substitute(bindings))),
            TypeRef::Array(inner) => TypeRef::Array(Box::new(inner.substitute(bindings))),
            TypeRef::Future(inner) => TypeRef::Future(Box::new(inner.substitute(bindings))),
            TypeRef::Tuple(elems) => {
                TypeRef::Tuple(elems.iter().map(|e| e.substitute(bindings)).collect())
            }
            TypeRef::Opaque(raw) => TypeRef::Opaque(raw.clone()),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Path { segments, args } => {
                write!(f, "{}", segments.join("::"))?;
                if !args.is_empty() {
                    write!(f, "<{}>", join(args))?;
                }
                Ok(())
            }
            TypeRef::Slice(inner) => write!(f, "[{}]", inner),
            TypeRef::Array(inner) => write!(f, "[{}; _]", inner),
            TypeRef::Tuple(elems) if elems.len() == 1 => write!(f, "({},)", elems[0]),
            TypeRef::Tuple(elems) => write!(f, "({})", join(elems)),
            TypeRef::Future(inner) => write!(f, "impl Future<Output = {}>", inner),
            TypeRef::Opaque(raw) => write!(f, "{}", raw),
        }
    }
}

fn join(types: &[TypeRef]) -> String {
    types
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A crate and its crate-level declarations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assembly {
    pub name: String,
    /// Inner attributes of the crate root
    pub markers: Vec<Marker>,
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    pub name: String,
    pub ty: TypeRef,
}

/// A method declared in an `impl` block of a service type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    pub name: String,
    /// Fully-qualified name of the type the `impl` block targets
    pub declaring_type: String,
    /// Trait name for methods of trait impls
    pub trait_name: Option<String>,
    /// Whether the method takes `self` in any form
    pub has_receiver: bool,
    pub is_public: bool,
    pub is_async: bool,
    /// Parameters after the receiver
    pub parameters: Vec<ParameterInfo>,
    /// Return type; `async fn` returns are wrapped in [`TypeRef::Future`]
    pub return_type: TypeRef,
    pub markers: Vec<Marker>,
    pub description: Option<String>,
}

impl MethodInfo {
    /// A public `&self` method returning unit, declared on `declaring_type`.
    pub fn new(declaring_type: &str, name: &str) -> Self {
        MethodInfo {
            name: name.to_string(),
            declaring_type: declaring_type.to_string(),
            trait_name: None,
            has_receiver: true,
            is_public: true,
            is_async: false,
            parameters: Vec::new(),
            return_type: TypeRef::unit(),
            markers: Vec::new(),
            description: None,
        }
    }

    pub fn with_parameter(mut self, name: &str, ty: TypeRef) -> Self {
        self.parameters.push(ParameterInfo {
            name: name.to_string(),
            ty,
        });
        self
    }

    pub fn with_return(mut self, ty: TypeRef) -> Self {
        self.return_type = ty;
        self
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn is_static(&self) -> bool {
        !self.has_receiver
    }

    /// Methods every type inherits through the std "object" traits.
    pub fn is_declared_on_object(&self) -> bool {
        self.trait_name
            .as_deref()
            .is_some_and(|t| UNIVERSAL_TRAITS.contains(&t))
    }

    /// Signature text identifying the method within its type.
    pub fn signature(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|p| p.ty.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let owner = match &self.trait_name {
            Some(t) => format!("<{} as {}>", self.declaring_type, t),
            None => self.declaring_type.clone(),
        };
        format!("{}::{}({}) -> {}", owner, self.name, params, self.return_type)
    }
}

/// A type whose methods are being exposed.
#[derive(Debug, Clone)]
pub struct ServiceType {
    pub name: String,
    pub qualified_name: String,
    pub markers: Vec<Marker>,
    pub assembly: Arc<Assembly>,
    /// Methods of every `impl` block targeting the type, in declaration order
    pub methods: Vec<Arc<MethodInfo>>,
    pub description: Option<String>,
}

impl ServiceType {
    /// An empty service in an assembly without crate-level markers.
    pub fn new(qualified_name: &str) -> Self {
        let name = qualified_name.rsplit("::").next().unwrap_or(qualified_name);
        let crate_name = qualified_name.split("::").next().unwrap_or(qualified_name);
        ServiceType {
            name: name.to_string(),
            qualified_name: qualified_name.to_string(),
            markers: Vec::new(),
            assembly: Arc::new(Assembly {
                name: crate_name.to_string(),
                markers: Vec::new(),
            }),
            methods: Vec::new(),
            description: None,
        }
    }

    pub fn with_method(mut self, method: MethodInfo) -> Self {
        self.methods.push(Arc::new(method));
        self
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn with_assembly(mut self, assembly: Assembly) -> Self {
        self.assembly = Arc::new(assembly);
        self
    }
}

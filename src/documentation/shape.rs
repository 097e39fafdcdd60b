use super::TypeKey;
use crate::reflect::catalog::{DeclKind, TypeCatalog, TypeDecl};
use crate::reflect::TypeRef;
use std::collections::HashMap;

/// Types described by name only, never materialized as definitions.
pub const SCALARS: &[&str] = &[
    "bool", "char", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64",
    "u128", "usize", "f32", "f64", "String", "str", "!", "SystemTime", "DateTime",
    "NaiveDate", "NaiveDateTime", "NaiveTime", "OffsetDateTime", "PrimitiveDateTime",
    "Timestamp",
];

const SEQUENCES: &[&str] = &[
    "Vec", "VecDeque", "LinkedList", "HashSet", "BTreeSet", "BinaryHeap", "IndexSet",
];

const MAPS: &[&str] = &["HashMap", "BTreeMap", "IndexMap"];

/// Names of the wrappers the classifier unwraps.
const WRAPPERS: &[&str] = &[
    "Option", "BoxFuture", "LocalBoxFuture", "ResponseMessage", "Json", "Result", "Box", "Arc",
    "Rc", "Cow", "Pin",
];

/// Alias chains longer than this are treated as unresolvable.
const MAX_ALIAS_DEPTH: usize = 32;

/// Type arguments nested deeper than this are elided from keys, which bounds the keys
/// of generic types that instantiate themselves with ever larger arguments.
const MAX_KEY_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperKind {
    Optional,
    Async,
    Envelope,
    Pointer,
}

/// The shape category of a type.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape<'c> {
    Scalar(String),
    Enum(&'c TypeDecl),
    /// A collection; maps are collections of `(key, value)` tuples
    Sequence(TypeRef),
    Wrapper(WrapperKind, TypeRef),
    Composite(Composite<'c>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Composite<'c> {
    /// A declared struct or data-carrying enum with its instantiation arguments
    Declared { decl: &'c TypeDecl, args: Vec<TypeRef> },
    Tuple(Vec<TypeRef>),
    /// A type the catalog does not declare
    External(TypeRef),
}

impl Composite<'_> {
    pub fn key(&self, catalog: &TypeCatalog) -> TypeKey {
        TypeKey::new(match self {
            Composite::Declared { decl, args } => instantiated(&decl.qualified_name, args, catalog, 0),
            Composite::Tuple(elems) => render(&TypeRef::Tuple(elems.clone()), catalog),
            Composite::External(ty) => render(ty, catalog),
        })
    }

    /// Short display name.
    pub fn name(&self) -> String {
        match self {
            Composite::Declared { decl, args } if args.is_empty() => decl.name.clone(),
            Composite::Declared { decl, args } => {
                let args: Vec<String> = args.iter().map(|arg| short(arg).to_string()).collect();
                format!("{}<{}>", decl.name, args.join(", "))
            }
            Composite::Tuple(elems) => short(&TypeRef::Tuple(elems.clone())).to_string(),
            Composite::External(ty) => short(ty).to_string(),
        }
    }
}

/// Classifies a type into the closed set of shapes the graph builder handles.
///
/// Declared types are looked up in the catalog first; only paths naming no declaration
/// are recognized as scalars, wrappers or collections by name. Aliases resolve to
/// their target, types implementing
/// `IntoIterator` become sequences and field-less enums become enums. Anything else,
/// including unrecognized multi-argument generics, is a composite.
pub fn classify<'c>(ty: &TypeRef, catalog: &'c TypeCatalog) -> Shape<'c> {
    classify_at(ty, catalog, 0)
}

fn classify_at<'c>(ty: &TypeRef, catalog: &'c TypeCatalog, depth: usize) -> Shape<'c> {
    let (segments, args) = match ty {
        TypeRef::Tuple(elems) if elems.is_empty() => return Shape::Scalar("()".to_string()),
        TypeRef::Tuple(elems) => return Shape::Composite(Composite::Tuple(elems.clone())),
        TypeRef::Slice(item) | TypeRef::Array(item) => return Shape::Sequence((**item).clone()),
        TypeRef::Future(output) => return Shape::Wrapper(WrapperKind::Async, (**output).clone()),
        TypeRef::Opaque(_) => return Shape::Composite(Composite::External(ty.clone())),
        TypeRef::Path { segments, args } => (segments, args),
    };

    let Some(decl) = lookup(ty, catalog) else {
        let name = segments.last().map(String::as_str).unwrap_or_default();
        if SCALARS.contains(&name) {
            return Shape::Scalar(name.to_string());
        }
        return builtin_shape(name, args)
            .unwrap_or_else(|| Shape::Composite(Composite::External(ty.clone())));
    };
    let bindings = bindings(decl, args);

    if let DeclKind::Alias(target) = &decl.kind {
        if depth >= MAX_ALIAS_DEPTH {
            return Shape::Composite(Composite::External(ty.clone()));
        }
        return classify_at(&target.substitute(&bindings), catalog, depth + 1);
    }
    if let Some(item) = catalog.sequence_item(decl) {
        return Shape::Sequence(item.substitute(&bindings));
    }
    if decl.is_c_like_enum() {
        return Shape::Enum(decl);
    }

    Shape::Composite(Composite::Declared {
        decl,
        args: args.clone(),
    })
}

/// The declaration a path names.
///
/// A fully-qualified path naming a declaration always wins, so a project's own
/// `Timestamp` or `Result` is documented as declared. Otherwise well-known std and
/// ecosystem names are never matched against the catalog, and other partial paths are
/// matched by suffix.
fn lookup<'c>(ty: &TypeRef, catalog: &'c TypeCatalog) -> Option<&'c TypeDecl> {
    catalog.find_declared(ty).or_else(|| match ty.name() {
        Some(name) if is_builtin(name) => None,
        _ => catalog.find_type(ty),
    })
}

fn is_builtin(name: &str) -> bool {
    [SCALARS, SEQUENCES, MAPS, WRAPPERS]
        .iter()
        .any(|names| names.contains(&name))
}

fn builtin_shape<'c>(name: &str, args: &[TypeRef]) -> Option<Shape<'c>> {
    let shape = match (name, args) {
        ("Option", [inner]) => Shape::Wrapper(WrapperKind::Optional, inner.clone()),
        ("BoxFuture" | "LocalBoxFuture", [inner]) => Shape::Wrapper(WrapperKind::Async, inner.clone()),
        ("ResponseMessage" | "Json", [inner]) => Shape::Wrapper(WrapperKind::Envelope, inner.clone()),
        ("Result", [inner, ..]) => Shape::Wrapper(WrapperKind::Envelope, inner.clone()),
        ("Box" | "Arc" | "Rc" | "Cow" | "Pin", [inner]) => {
            Shape::Wrapper(WrapperKind::Pointer, inner.clone())
        }
        (collection, [item]) if SEQUENCES.contains(&collection) => Shape::Sequence(item.clone()),
        (map, [key, value]) if MAPS.contains(&map) => {
            Shape::Sequence(TypeRef::Tuple(vec![key.clone(), value.clone()]))
        }
        _ => return None,
    };
    Some(shape)
}

/// Generic parameters of a declaration bound to instantiation arguments.
pub fn bindings(decl: &TypeDecl, args: &[TypeRef]) -> HashMap<String, TypeRef> {
    decl.generics
        .iter()
        .cloned()
        .zip(args.iter().cloned())
        .collect()
}

fn instantiated(name: &str, args: &[TypeRef], catalog: &TypeCatalog, depth: usize) -> String {
    if args.is_empty() {
        return name.to_string();
    }
    if depth >= MAX_KEY_DEPTH {
        return format!("{}<..>", name);
    }
    let args: Vec<String> = args.iter().map(|arg| render_at(arg, catalog, depth + 1)).collect();
    format!("{}<{}>", name, args.join(", "))
}

/// Renders a type with declared paths replaced by their qualified names, so that
/// `Page<User>` and `Page<models::User>` get the same key.
pub fn render(ty: &TypeRef, catalog: &TypeCatalog) -> String {
    render_at(ty, catalog, 0)
}

fn render_at(ty: &TypeRef, catalog: &TypeCatalog, depth: usize) -> String {
    let nested = |ty: &TypeRef| render_at(ty, catalog, depth + 1);
    match ty {
        TypeRef::Path { segments, args } => match lookup(ty, catalog) {
            Some(decl) => instantiated(&decl.qualified_name, args, catalog, depth),
            None => instantiated(&segments.join("::"), args, catalog, depth),
        },
        _ if depth >= MAX_KEY_DEPTH => "..".to_string(),
        TypeRef::Tuple(elems) if elems.len() == 1 => format!("({},)", nested(&elems[0])),
        TypeRef::Tuple(elems) => {
            let elems: Vec<String> = elems.iter().map(nested).collect();
            format!("({})", elems.join(", "))
        }
        TypeRef::Slice(item) => format!("[{}]", nested(item)),
        TypeRef::Array(item) => format!("[{}; _]", nested(item)),
        TypeRef::Future(output) => format!("impl Future<Output = {}>", nested(output)),
        TypeRef::Opaque(raw) => raw.clone(),
    }
}

/// Drops module paths, keeping type arguments.
fn short(ty: &TypeRef) -> TypeRef {
    match ty {
        TypeRef::Path { segments, args } => TypeRef::Path {
            segments: segments.last().cloned().into_iter().collect(),
            args: args.iter().map(short).collect(),
        },
        TypeRef::Tuple(elems) => TypeRef::Tuple(elems.iter().map(short).collect()),
        TypeRef::Slice(item) => TypeRef::Slice(Box::new(short(item))),
        TypeRef::Array(item) => TypeRef::Array(Box::new(short(item))),
        TypeRef::Future(output) => TypeRef::Future(Box::new(short(output))),
        TypeRef::Opaque(raw) => TypeRef::Opaque(raw.clone()),
    }
}

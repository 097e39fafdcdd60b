use super::marker::{doc_text, lower_attributes, lower_expr, Marker, MarkerValue};
use super::syntax::lower_type;
use super::{Assembly, MethodInfo, ParameterInfo, ServiceType, TypeRef};
use crate::error::{ExposureError, Result};
use crate::parser::ParsedFile;
use indexmap::IndexMap;
use log::debug;
use quote::ToTokens;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use syn::visit::Visit;
use syn::{Fields, FnArg, ImplItem, Pat, ReturnType, Visibility};

/// Index of every type, impl block and crate declared in a set of parsed files.
///
/// The catalog is the type system the exposure resolver and the type graph builder
/// query. Lookups go by simple name or by (partially) qualified path; when a simple
/// name is declared in several modules the first declaration in file order wins.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    assemblies: IndexMap<String, Arc<Assembly>>,
    declarations: Vec<TypeDecl>,
    by_name: HashMap<String, Vec<usize>>,
    /// Methods keyed by the qualified name of the type their impl block targets
    methods: HashMap<String, Vec<Arc<MethodInfo>>>,
    /// `type Item` of `IntoIterator`/`Iterator` impls, keyed by qualified name
    sequence_items: HashMap<String, TypeRef>,
    imports: HashMap<ModuleKey, Imports>,
}

/// A declared struct, enum or type alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    pub qualified_name: String,
    pub crate_name: String,
    pub module_path: Vec<String>,
    /// Names of the type parameters, in declaration order
    pub generics: Vec<String>,
    pub markers: Vec<Marker>,
    pub description: Option<String>,
    pub kind: DeclKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind {
    Struct(Vec<FieldDecl>),
    Enum(Vec<VariantDecl>),
    Alias(TypeRef),
}

/// A struct field; tuple struct fields are named by their position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
    pub is_public: bool,
    pub markers: Vec<Marker>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDecl {
    pub name: String,
    pub fields: VariantFields,
    /// Explicit discriminant, or the previous one plus one
    pub value: EnumConstant,
    pub markers: Vec<Marker>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantFields {
    Unit,
    Tuple(Vec<TypeRef>),
    Named(Vec<FieldDecl>),
}

/// Raw constant value of an enum variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EnumConstant {
    Int(i64),
    /// A discriminant expression that is not an integer literal
    Expr(String),
}

impl EnumConstant {
    fn successor(&self) -> EnumConstant {
        match self {
            EnumConstant::Int(v) => v
                .checked_add(1)
                .map(EnumConstant::Int)
                .unwrap_or_else(|| EnumConstant::Expr(format!("{} + 1", v))),
            EnumConstant::Expr(expr) => EnumConstant::Expr(format!("{} + 1", expr)),
        }
    }
}

impl TypeDecl {
    /// `[crate, modules..., name]`
    fn full_segments(&self) -> Vec<&str> {
        std::iter::once(self.crate_name.as_str())
            .chain(self.module_path.iter().map(String::as_str))
            .chain(std::iter::once(self.name.as_str()))
            .collect()
    }

    /// True for enums whose variants all lack fields.
    pub fn is_c_like_enum(&self) -> bool {
        match &self.kind {
            DeclKind::Enum(variants) => variants
                .iter()
                .all(|v| matches!(v.fields, VariantFields::Unit)),
            _ => false,
        }
    }
}

struct PendingImpl {
    crate_name: String,
    module_path: Vec<String>,
    /// Type parameters of the impl block and its methods
    generics: Vec<String>,
    self_ty: TypeRef,
    methods: Vec<MethodInfo>,
    iterator_item: Option<TypeRef>,
}

/// `(crate, module path)` of a module.
type ModuleKey = (String, Vec<String>);

/// Names brought into a module by `use` items.
#[derive(Debug, Default)]
struct Imports {
    /// Local name -> path as written
    names: HashMap<String, Vec<String>>,
    /// Paths imported with `::*`
    globs: Vec<Vec<String>>,
}

/// Where a type expression is written.
struct Context<'a> {
    crate_name: &'a str,
    module_path: &'a [String],
    generics: &'a [String],
}

/// Bound on `use` indirections followed while resolving one path.
const MAX_IMPORT_HOPS: usize = 8;

impl TypeCatalog {
    /// Builds the catalog from parsed files.
    ///
    /// Impl blocks may target types declared in other files, so targets are resolved
    /// once every declaration is known. Type expressions in fields, aliases and method
    /// signatures are then rewritten to the qualified path of the declaration they
    /// name, following the `use` items of the module they are written in.
    pub fn new(parsed_files: &[ParsedFile]) -> Self {
        debug!("Building type catalog from {} files", parsed_files.len());

        let mut assemblies: IndexMap<String, Assembly> = IndexMap::new();
        let mut declarations = Vec::new();
        let mut pending = Vec::new();
        let mut imports = HashMap::new();

        for file in parsed_files {
            let assembly = assemblies
                .entry(file.crate_name.clone())
                .or_insert_with(|| Assembly {
                    name: file.crate_name.clone(),
                    markers: Vec::new(),
                });
            if file.is_crate_root {
                assembly.markers = lower_attributes(&file.syntax_tree.attrs);
            }

            let mut visitor = CatalogVisitor {
                crate_name: &file.crate_name,
                module_path: file.module_path.clone(),
                declarations: &mut declarations,
                impls: &mut pending,
                imports: &mut imports,
            };
            visitor.visit_file(&file.syntax_tree);
        }

        let mut catalog = TypeCatalog {
            assemblies: assemblies
                .into_iter()
                .map(|(name, assembly)| (name, Arc::new(assembly)))
                .collect(),
            declarations,
            imports,
            ..Default::default()
        };

        for (index, decl) in catalog.declarations.iter().enumerate() {
            catalog
                .by_name
                .entry(decl.name.clone())
                .or_default()
                .push(index);
        }

        for index in 0..catalog.declarations.len() {
            let kind = catalog.qualify_decl(&catalog.declarations[index]);
            catalog.declarations[index].kind = kind;
        }

        for block in pending {
            catalog.attach_impl(block);
        }

        debug!(
            "Catalog contains {} types in {} crates",
            catalog.declarations.len(),
            catalog.assemblies.len()
        );
        catalog
    }

    fn qualify_decl(&self, decl: &TypeDecl) -> DeclKind {
        let context = Context {
            crate_name: &decl.crate_name,
            module_path: &decl.module_path,
            generics: &decl.generics,
        };
        let qualify_fields = |fields: &[FieldDecl]| -> Vec<FieldDecl> {
            fields
                .iter()
                .map(|field| FieldDecl {
                    ty: self.qualify(&field.ty, &context),
                    ..field.clone()
                })
                .collect()
        };

        match &decl.kind {
            DeclKind::Struct(fields) => DeclKind::Struct(qualify_fields(fields)),
            DeclKind::Enum(variants) => DeclKind::Enum(
                variants
                    .iter()
                    .map(|variant| VariantDecl {
                        fields: match &variant.fields {
                            VariantFields::Unit => VariantFields::Unit,
                            VariantFields::Tuple(types) => VariantFields::Tuple(
                                types.iter().map(|ty| self.qualify(ty, &context)).collect(),
                            ),
                            VariantFields::Named(fields) => {
                                VariantFields::Named(qualify_fields(fields))
                            }
                        },
                        ..variant.clone()
                    })
                    .collect(),
            ),
            DeclKind::Alias(target) => DeclKind::Alias(self.qualify(target, &context)),
        }
    }

    fn attach_impl(&mut self, block: PendingImpl) {
        let context = Context {
            crate_name: &block.crate_name,
            module_path: &block.module_path,
            generics: &block.generics,
        };
        let TypeRef::Path { segments, .. } = &block.self_ty else {
            debug!("Ignoring impl for non-path type {}", block.self_ty);
            return;
        };
        let Some(index) = self.resolve_path(segments, &context, MAX_IMPORT_HOPS) else {
            debug!("Ignoring impl for undeclared type {}", block.self_ty);
            return;
        };

        let qualified = self.declarations[index].qualified_name.clone();
        let bindings = HashMap::from([("Self".to_string(), TypeRef::named(&qualified))]);
        let lower = |ty: &TypeRef| self.qualify(ty, &context).substitute(&bindings);

        let iterator_item = block.iterator_item.as_ref().map(&lower);
        let methods: Vec<Arc<MethodInfo>> = block
            .methods
            .iter()
            .map(|method| {
                let mut method = method.clone();
                method.declaring_type = qualified.clone();
                for parameter in &mut method.parameters {
                    parameter.ty = lower(&parameter.ty);
                }
                method.return_type = lower(&method.return_type);
                Arc::new(method)
            })
            .collect();

        if let Some(item) = iterator_item {
            self.sequence_items.insert(qualified.clone(), item);
        }
        self.methods.entry(qualified).or_default().extend(methods);
    }

    /// Rewrites every path naming a declared type to that type's qualified path.
    ///
    /// Generic parameters and paths that name nothing declared are kept as written.
    fn qualify(&self, ty: &TypeRef, context: &Context<'_>) -> TypeRef {
        match ty {
            TypeRef::Path { segments, args } => {
                let args = args.iter().map(|arg| self.qualify(arg, context)).collect();
                let is_parameter = segments.len() == 1
                    && (segments[0] == "Self" || context.generics.contains(&segments[0]));
                let segments = if is_parameter {
                    segments.clone()
                } else {
                    match self.resolve_path(segments, context, MAX_IMPORT_HOPS) {
                        Some(index) => self.declarations[index]
                            .full_segments()
                            .into_iter()
                            .map(str::to_string)
                            .collect(),
                        None => self.expand_import(segments, context),
                    }
                };
                TypeRef::Path { segments, args }
            }
            TypeRef::Slice(item) => TypeRef::Slice(Box::new(self.qualify(item, context))),
            TypeRef::Array(item) => TypeRef::Array(Box::new(self.qualify(item, context))),
            TypeRef::Future(output) => TypeRef::Future(Box::new(self.qualify(output, context))),
            TypeRef::Tuple(elems) => {
                TypeRef::Tuple(elems.iter().map(|e| self.qualify(e, context)).collect())
            }
            TypeRef::Opaque(raw) => TypeRef::Opaque(raw.clone()),
        }
    }

    /// Spells out a path whose first segment is imported from outside the project, so
    /// `Value` after `use serde_json::Value` stays distinct from a declared `Value`.
    fn expand_import(&self, segments: &[String], context: &Context<'_>) -> Vec<String> {
        let imported = segments.split_first().and_then(|(first, rest)| {
            let imports = self
                .imports
                .get(&(context.crate_name.to_string(), context.module_path.to_vec()))?;
            let path = imports.names.get(first)?;
            Some(path.iter().chain(rest).cloned().collect())
        });
        imported.unwrap_or_else(|| segments.to_vec())
    }

    /// Resolves a path written in `context` the way name lookup in that module would:
    /// declarations of the module itself, then its `use` items (following re-exports),
    /// then `crate`/`self`/`super`-relative and absolute paths, then glob imports.
    fn resolve_path(&self, segments: &[String], context: &Context<'_>, hops: usize) -> Option<usize> {
        let (first, rest) = segments.split_first()?;
        if hops == 0 {
            return None;
        }

        if rest.is_empty() {
            let local = module_item(context.crate_name, context.module_path, first);
            if let Some(index) = self.exact(&local) {
                return Some(index);
            }
        }

        let imports = self
            .imports
            .get(&(context.crate_name.to_string(), context.module_path.to_vec()));

        if let Some(imported) = imports.and_then(|imports| imports.names.get(first)) {
            let expanded: Vec<String> = imported.iter().chain(rest).cloned().collect();
            if let Some(index) = self.resolve_absolute(&expanded, context, hops) {
                return Some(index);
            }
        }

        if let Some(index) = self.resolve_absolute(segments, context, hops) {
            return Some(index);
        }

        imports
            .into_iter()
            .flat_map(|imports| &imports.globs)
            .find_map(|glob| {
                let expanded: Vec<String> = glob.iter().chain(segments).cloned().collect();
                self.resolve_absolute(&expanded, context, hops)
            })
    }

    /// Resolves a path that is not a local name: each absolute reading of it either
    /// names a declaration or an item re-exported by the module it points into.
    fn resolve_absolute(&self, segments: &[String], context: &Context<'_>, hops: usize) -> Option<usize> {
        for candidate in absolute_candidates(segments, context) {
            if let Some(index) = self.exact(&candidate) {
                return Some(index);
            }
            if candidate.len() < 2 {
                continue;
            }
            let (name, module) = candidate[1..].split_last()?;
            let target = Context {
                crate_name: &candidate[0],
                module_path: module,
                generics: &[],
            };
            let is_same_module =
                target.crate_name == context.crate_name && target.module_path == context.module_path;
            if !is_same_module && self.imports.contains_key(&(candidate[0].clone(), module.to_vec())) {
                if let Some(index) = self.resolve_path(std::slice::from_ref(name), &target, hops - 1) {
                    return Some(index);
                }
            }
        }
        None
    }

    /// The declaration whose full path is exactly `segments`.
    fn exact(&self, segments: &[String]) -> Option<usize> {
        let name = segments.last()?;
        self.by_name.get(name)?.iter().copied().find(|&i| {
            let full = self.declarations[i].full_segments();
            full.len() == segments.len() && full.iter().zip(segments).all(|(a, b)| *a == b.as_str())
        })
    }

    /// Resolves a path by suffix: leading `crate`, `self` and `super` segments are
    /// ignored and the rest must be a suffix of a declaration's qualified path. The
    /// first declaration in file order wins.
    fn resolve_suffix(&self, segments: &[String]) -> Option<usize> {
        let name = segments.last()?;
        let wanted: Vec<&str> = segments
            .iter()
            .map(String::as_str)
            .skip_while(|s| matches!(*s, "crate" | "self" | "super"))
            .collect();

        self.by_name
            .get(name)?
            .iter()
            .copied()
            .find(|&i| self.declarations[i].full_segments().ends_with(&wanted))
    }

    /// Finds the declaration a fully-qualified path type names.
    pub fn find_declared(&self, ty: &TypeRef) -> Option<&TypeDecl> {
        match ty {
            TypeRef::Path { segments, .. } => self.exact(segments).map(|i| &self.declarations[i]),
            _ => None,
        }
    }

    /// Finds the declaration a path type refers to, matching partial paths by suffix.
    pub fn find_type(&self, ty: &TypeRef) -> Option<&TypeDecl> {
        match ty {
            TypeRef::Path { segments, .. } => self
                .exact(segments)
                .or_else(|| self.resolve_suffix(segments))
                .map(|i| &self.declarations[i]),
            _ => None,
        }
    }

    /// Finds a declaration by a path such as `IntMath` or `services::IntMath`.
    pub fn find_by_path(&self, path: &str) -> Option<&TypeDecl> {
        self.find_type(&TypeRef::named(path))
    }

    pub fn declarations(&self) -> &[TypeDecl] {
        &self.declarations
    }

    pub fn assembly(&self, crate_name: &str) -> Option<&Arc<Assembly>> {
        self.assemblies.get(crate_name)
    }

    /// Methods of every impl block targeting the declaration.
    pub fn methods_of(&self, decl: &TypeDecl) -> &[Arc<MethodInfo>] {
        self.methods
            .get(&decl.qualified_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Element type of a declared type that implements `IntoIterator` or `Iterator`.
    pub fn sequence_item(&self, decl: &TypeDecl) -> Option<&TypeRef> {
        self.sequence_items.get(&decl.qualified_name)
    }

    /// Builds the service view of a declared type.
    ///
    /// # Arguments
    ///
    /// * `path` - Simple or partially qualified type path, e.g. `IntMath` or `services::IntMath`
    ///
    /// # Errors
    ///
    /// Returns [`ExposureError::UnknownType`] if no declaration matches `path`.
    pub fn service(&self, path: &str) -> Result<ServiceType> {
        let decl = self
            .find_by_path(path)
            .ok_or_else(|| ExposureError::UnknownType(path.to_string()))?;

        Ok(ServiceType {
            name: decl.name.clone(),
            qualified_name: decl.qualified_name.clone(),
            markers: decl.markers.clone(),
            assembly: self.assembly(&decl.crate_name).cloned().unwrap_or_default(),
            methods: self.methods_of(decl).to_vec(),
            description: decl.description.clone(),
        })
    }
}

fn module_item(crate_name: &str, module_path: &[String], name: &str) -> Vec<String> {
    std::iter::once(crate_name.to_string())
        .chain(module_path.iter().cloned())
        .chain(std::iter::once(name.to_string()))
        .collect()
}

/// Full paths (starting with a crate name) a path written in `context` may denote.
fn absolute_candidates(segments: &[String], context: &Context<'_>) -> Vec<Vec<String>> {
    let crate_root = || vec![context.crate_name.to_string()];
    let Some(first) = segments.first() else {
        return Vec::new();
    };

    match first.as_str() {
        "crate" => vec![crate_root().into_iter().chain(segments[1..].iter().cloned()).collect()],
        "self" | "super" => {
            let mut module = context.module_path.to_vec();
            let mut rest = segments;
            while let Some((head, tail)) = rest.split_first() {
                match head.as_str() {
                    "self" => {}
                    "super" => {
                        module.pop();
                    }
                    _ => break,
                }
                rest = tail;
            }
            vec![crate_root()
                .into_iter()
                .chain(module)
                .chain(rest.iter().cloned())
                .collect()]
        }
        _ => vec![
            // Relative to the current module
            crate_root()
                .into_iter()
                .chain(context.module_path.iter().cloned())
                .chain(segments.iter().cloned())
                .collect(),
            // Another crate of the project, or this one by name
            segments.to_vec(),
        ],
    }
}

/// Walks a file, tracking the inline module path.
struct CatalogVisitor<'a> {
    crate_name: &'a str,
    module_path: Vec<String>,
    declarations: &'a mut Vec<TypeDecl>,
    impls: &'a mut Vec<PendingImpl>,
    imports: &'a mut HashMap<ModuleKey, Imports>,
}

impl CatalogVisitor<'_> {
    fn declare(&mut self, ident: &syn::Ident, generics: &syn::Generics, attrs: &[syn::Attribute], kind: DeclKind) {
        let name = ident.to_string();
        let qualified_name = std::iter::once(self.crate_name.to_string())
            .chain(self.module_path.iter().cloned())
            .chain(std::iter::once(name.clone()))
            .collect::<Vec<_>>()
            .join("::");
        let markers = lower_attributes(attrs);

        debug!("Found type {}", qualified_name);
        self.declarations.push(TypeDecl {
            name,
            qualified_name,
            crate_name: self.crate_name.to_string(),
            module_path: self.module_path.clone(),
            generics: generics.type_params().map(|p| p.ident.to_string()).collect(),
            description: doc_text(&markers),
            markers,
            kind,
        });
    }

    fn module_imports(&mut self) -> &mut Imports {
        self.imports
            .entry((self.crate_name.to_string(), self.module_path.clone()))
            .or_default()
    }

    fn import(&mut self, prefix: &mut Vec<String>, tree: &syn::UseTree) {
        match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.import(prefix, &path.tree);
                prefix.pop();
            }
            syn::UseTree::Name(name) => {
                let (local, path) = imported(prefix, &name.ident);
                self.module_imports().names.insert(local, path);
            }
            syn::UseTree::Rename(rename) => {
                if rename.rename != "_" {
                    let (_, path) = imported(prefix, &rename.ident);
                    self.module_imports().names.insert(rename.rename.to_string(), path);
                }
            }
            syn::UseTree::Glob(_) => {
                let glob = prefix.clone();
                self.module_imports().globs.push(glob);
            }
            syn::UseTree::Group(group) => {
                for tree in &group.items {
                    self.import(prefix, tree);
                }
            }
        }
    }
}

/// Local name and full path of `prefix::ident`, where `self` names the prefix itself.
fn imported(prefix: &[String], ident: &syn::Ident) -> (String, Vec<String>) {
    if ident == "self" {
        let local = prefix.last().cloned().unwrap_or_default();
        (local, prefix.to_vec())
    } else {
        let path = prefix.iter().cloned().chain(std::iter::once(ident.to_string())).collect();
        (ident.to_string(), path)
    }
}

impl<'ast> Visit<'ast> for CatalogVisitor<'_> {
    fn visit_item_mod(&mut self, item: &'ast syn::ItemMod) {
        if let Some((_, items)) = &item.content {
            self.module_path.push(item.ident.to_string());
            for nested in items {
                self.visit_item(nested);
            }
            self.module_path.pop();
        }
    }

    fn visit_item_use(&mut self, item: &'ast syn::ItemUse) {
        self.import(&mut Vec::new(), &item.tree);
    }

    // Function bodies are not part of the API surface.
    fn visit_item_fn(&mut self, _item: &'ast syn::ItemFn) {}

    fn visit_item_struct(&mut self, item: &'ast syn::ItemStruct) {
        let fields = lower_fields(&item.fields);
        self.declare(&item.ident, &item.generics, &item.attrs, DeclKind::Struct(fields));
    }

    fn visit_item_enum(&mut self, item: &'ast syn::ItemEnum) {
        let mut next = EnumConstant::Int(0);
        let mut variants = Vec::new();

        for variant in &item.variants {
            let value = match &variant.discriminant {
                Some((_, expr)) => match lower_expr(expr) {
                    MarkerValue::Int(v) => i64::try_from(v)
                        .map(EnumConstant::Int)
                        .unwrap_or_else(|_| EnumConstant::Expr(v.to_string())),
                    _ => EnumConstant::Expr(expr.to_token_stream().to_string()),
                },
                None => next.clone(),
            };
            next = value.successor();

            let fields = match &variant.fields {
                Fields::Unit => VariantFields::Unit,
                Fields::Unnamed(unnamed) => {
                    VariantFields::Tuple(unnamed.unnamed.iter().map(|f| lower_type(&f.ty)).collect())
                }
                named @ Fields::Named(_) => VariantFields::Named(lower_fields(named)),
            };
            let markers = lower_attributes(&variant.attrs);
            variants.push(VariantDecl {
                name: variant.ident.to_string(),
                fields,
                value,
                description: doc_text(&markers),
                markers,
            });
        }

        self.declare(&item.ident, &item.generics, &item.attrs, DeclKind::Enum(variants));
    }

    fn visit_item_type(&mut self, item: &'ast syn::ItemType) {
        let target = lower_type(&item.ty);
        self.declare(&item.ident, &item.generics, &item.attrs, DeclKind::Alias(target));
    }

    fn visit_item_impl(&mut self, item: &'ast syn::ItemImpl) {
        let trait_name = item
            .trait_
            .as_ref()
            .and_then(|(_, path, _)| path.segments.last())
            .map(|s| s.ident.to_string());

        let mut methods = Vec::new();
        let mut iterator_item = None;
        let mut generics: Vec<String> =
            item.generics.type_params().map(|p| p.ident.to_string()).collect();

        for impl_item in &item.items {
            match impl_item {
                ImplItem::Fn(function) => {
                    generics.extend(function.sig.generics.type_params().map(|p| p.ident.to_string()));
                    methods.push(lower_method(function, trait_name.as_deref()));
                }
                ImplItem::Type(assoc)
                    if assoc.ident == "Item"
                        && matches!(trait_name.as_deref(), Some("IntoIterator" | "Iterator")) =>
                {
                    iterator_item = Some(lower_type(&assoc.ty));
                }
                _ => {}
            }
        }

        self.impls.push(PendingImpl {
            crate_name: self.crate_name.to_string(),
            module_path: self.module_path.clone(),
            generics,
            self_ty: lower_type(&item.self_ty),
            methods,
            iterator_item,
        });
    }
}

fn lower_fields(fields: &Fields) -> Vec<FieldDecl> {
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let markers = lower_attributes(&field.attrs);
            FieldDecl {
                name: field
                    .ident
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| index.to_string()),
                ty: lower_type(&field.ty),
                is_public: matches!(field.vis, Visibility::Public(_)),
                description: doc_text(&markers),
                markers,
            }
        })
        .collect()
}

/// Lowers a method of an impl block; the declaring type is filled in once the impl
/// target is resolved.
fn lower_method(function: &syn::ImplItemFn, trait_name: Option<&str>) -> MethodInfo {
    let sig = &function.sig;
    let mut has_receiver = false;
    let mut parameters = Vec::new();

    for (index, input) in sig.inputs.iter().enumerate() {
        match input {
            FnArg::Receiver(_) => has_receiver = true,
            FnArg::Typed(pat_type) => {
                let name = match &*pat_type.pat {
                    Pat::Ident(pat_ident) => pat_ident.ident.to_string(),
                    _ => format!("arg{}", index),
                };
                parameters.push(ParameterInfo {
                    name,
                    ty: lower_type(&pat_type.ty),
                });
            }
        }
    }

    let output = match &sig.output {
        ReturnType::Default => TypeRef::unit(),
        ReturnType::Type(_, ty) => lower_type(ty),
    };
    let is_async = sig.asyncness.is_some();
    let markers = lower_attributes(&function.attrs);

    MethodInfo {
        name: sig.ident.to_string(),
        declaring_type: String::new(),
        trait_name: trait_name.map(str::to_string),
        has_receiver,
        // trait methods are as visible as the trait
        is_public: trait_name.is_some() || matches!(function.vis, Visibility::Public(_)),
        is_async,
        parameters,
        return_type: if is_async { TypeRef::future(output) } else { output },
        description: doc_text(&markers),
        markers,
    }
}

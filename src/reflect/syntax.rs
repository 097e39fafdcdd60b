use super::TypeRef;
use quote::ToTokens;
use syn::punctuated::Punctuated;
use syn::{GenericArgument, PathArguments, Type, TypeParamBound};

/// Lowers a `syn` type into a [`TypeRef`].
///
/// References and parentheses are dropped since they carry no data shape. Lifetime and
/// const arguments are ignored, so `Cow<'a, str>` becomes a single-argument `Cow<str>`.
pub fn lower_type(ty: &Type) -> TypeRef {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => lower_path(&type_path.path),
        Type::Reference(reference) => lower_type(&reference.elem),
        Type::Paren(paren) => lower_type(&paren.elem),
        Type::Group(group) => lower_type(&group.elem),
        Type::Slice(slice) => TypeRef::Slice(Box::new(lower_type(&slice.elem))),
        Type::Array(array) => TypeRef::Array(Box::new(lower_type(&array.elem))),
        Type::Tuple(tuple) => TypeRef::Tuple(tuple.elems.iter().map(lower_type).collect()),
        Type::ImplTrait(impl_trait) => lower_bounds(&impl_trait.bounds, ty),
        Type::TraitObject(trait_object) => lower_bounds(&trait_object.bounds, ty),
        Type::Never(_) => TypeRef::named("!"),
        other => TypeRef::Opaque(other.to_token_stream().to_string()),
    }
}

/// Lowers a path, keeping the type arguments of its last segment.
pub fn lower_path(path: &syn::Path) -> TypeRef {
    let segments = path.segments.iter().map(|s| s.ident.to_string()).collect();
    let args = path
        .segments
        .last()
        .map(|last| match &last.arguments {
            PathArguments::AngleBracketed(bracketed) => bracketed
                .args
                .iter()
                .filter_map(|arg| match arg {
                    GenericArgument::Type(inner) => Some(lower_type(inner)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        })
        .unwrap_or_default();

    TypeRef::Path { segments, args }
}

/// `impl Future<Output = T>` and `dyn Future<Output = T>` become futures; other
/// trait types have no data shape.
fn lower_bounds(bounds: &Punctuated<TypeParamBound, syn::Token![+]>, original: &Type) -> TypeRef {
    for bound in bounds {
        let TypeParamBound::Trait(trait_bound) = bound else {
            continue;
        };
        let Some(last) = trait_bound.path.segments.last() else {
            continue;
        };
        if last.ident != "Future" {
            continue;
        }

        let output = match &last.arguments {
            PathArguments::AngleBracketed(bracketed) => {
                bracketed.args.iter().find_map(|arg| match arg {
                    GenericArgument::AssocType(assoc) if assoc.ident == "Output" => {
                        Some(lower_type(&assoc.ty))
                    }
                    _ => None,
                })
            }
            _ => None,
        };
        return TypeRef::future(output.unwrap_or_else(TypeRef::unit));
    }

    TypeRef::Opaque(original.to_token_stream().to_string())
}

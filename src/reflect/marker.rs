//! Owned, thread-safe form of Rust attributes.
//!
//! `syn` attributes hold spans and token streams that cannot leave the parsing thread.
//! Everything the exposure and documentation passes need from an attribute is lowered
//! into a [`Marker`] when the catalog is built.

use quote::ToTokens;
use syn::{Attribute, Expr, Lit, Meta, UnOp};

/// A declarative marker (attribute) attached to a crate, type, method or field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Attribute path as written, e.g. `authorize` or `rpc::authorize`
    pub path: String,
    /// Arguments following the path
    pub args: MarkerArgs,
}

/// Arguments of a marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerArgs {
    /// `#[marker]`
    None,
    /// `#[marker = value]`
    Value(MarkerValue),
    /// `#[marker(key, key = value, ...)]`
    List(Vec<MarkerArg>),
    /// A list whose tokens are not `key[= value]` pairs
    Unparsed(String),
}

/// One `key` or `key = value` entry of a marker list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerArg {
    pub key: String,
    pub value: Option<MarkerValue>,
}

/// A literal or path appearing as a marker value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerValue {
    Str(String),
    Int(i128),
    Bool(bool),
    Path(String),
    /// Anything else, kept as its token text
    Tokens(String),
}

impl MarkerValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MarkerValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl Marker {
    /// Creates a marker without arguments.
    pub fn flag(path: &str) -> Self {
        Marker {
            path: path.to_string(),
            args: MarkerArgs::None,
        }
    }

    /// Lowers a `syn` attribute.
    pub fn from_attribute(attr: &Attribute) -> Self {
        let path = path_to_string(attr.path());
        let args = match &attr.meta {
            Meta::Path(_) => MarkerArgs::None,
            Meta::NameValue(name_value) => MarkerArgs::Value(lower_expr(&name_value.value)),
            Meta::List(list) => {
                let mut args = Vec::new();
                let parsed = list.parse_nested_meta(|meta| {
                    let key = path_to_string(&meta.path);
                    if meta.input.peek(syn::Token![=]) {
                        let expr: Expr = meta.value()?.parse()?;
                        args.push(MarkerArg {
                            key,
                            value: Some(lower_expr(&expr)),
                        });
                    } else if meta.input.peek(syn::token::Paren) {
                        let content;
                        syn::parenthesized!(content in meta.input);
                        let tokens: proc_macro2::TokenStream = content.parse()?;
                        args.push(MarkerArg {
                            key,
                            value: Some(MarkerValue::Tokens(tokens.to_string())),
                        });
                    } else {
                        args.push(MarkerArg { key, value: None });
                    }
                    Ok(())
                });
                match parsed {
                    Ok(()) => MarkerArgs::List(args),
                    Err(_) => MarkerArgs::Unparsed(list.tokens.to_string()),
                }
            }
        };

        Marker { path, args }
    }

    /// Last path segment, so `rpc::authorize` and `authorize` match alike.
    pub fn name(&self) -> &str {
        self.path.rsplit("::").next().unwrap_or(&self.path)
    }

    pub fn is(&self, name: &str) -> bool {
        self.name() == name
    }

    /// Whether the list contains a bare `key` entry.
    pub fn has_flag(&self, key: &str) -> bool {
        match &self.args {
            MarkerArgs::List(args) => args.iter().any(|a| a.key == key && a.value.is_none()),
            _ => false,
        }
    }

    /// Value of a `key = value` entry.
    pub fn get(&self, key: &str) -> Option<&MarkerValue> {
        match &self.args {
            MarkerArgs::List(args) => args
                .iter()
                .find(|a| a.key == key)
                .and_then(|a| a.value.as_ref()),
            _ => None,
        }
    }
}

/// Lowers every attribute in declaration order.
pub fn lower_attributes(attrs: &[Attribute]) -> Vec<Marker> {
    attrs.iter().map(Marker::from_attribute).collect()
}

/// Joins `///` doc lines into a description.
pub fn doc_text(markers: &[Marker]) -> Option<String> {
    let lines: Vec<&str> = markers
        .iter()
        .filter(|m| m.path == "doc")
        .filter_map(|m| match &m.args {
            MarkerArgs::Value(MarkerValue::Str(line)) => Some(line.trim()),
            _ => None,
        })
        .collect();

    let text = lines.join("\n").trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub(crate) fn path_to_string(path: &syn::Path) -> String {
    path.segments
        .iter()
        .map(|s| s.ident.to_string())
        .collect::<Vec<_>>()
        .join("::")
}

pub(crate) fn lower_expr(expr: &Expr) -> MarkerValue {
    match expr {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            Lit::Str(s) => MarkerValue::Str(s.value()),
            Lit::Bool(b) => MarkerValue::Bool(b.value),
            Lit::Int(i) => i
                .base10_parse::<i128>()
                .map(MarkerValue::Int)
                .unwrap_or_else(|_| MarkerValue::Tokens(i.to_string())),
            other => MarkerValue::Tokens(other.to_token_stream().to_string()),
        },
        Expr::Unary(unary) if matches!(unary.op, UnOp::Neg(_)) => match lower_expr(&unary.expr) {
            MarkerValue::Int(v) => MarkerValue::Int(-v),
            _ => MarkerValue::Tokens(expr.to_token_stream().to_string()),
        },
        Expr::Path(expr_path) => MarkerValue::Path(path_to_string(&expr_path.path)),
        _ => MarkerValue::Tokens(expr.to_token_stream().to_string()),
    }
}

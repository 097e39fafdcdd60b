use crate::scanner::SourceFile;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::PathBuf;

/// AST (Abstract Syntax Tree) parser for Rust source files.
///
/// The `AstParser` uses the `syn` crate to parse the sources of a scanned crate. The
/// resulting trees are what the type catalog reads services, methods and data types from.
pub struct AstParser;

/// A successfully parsed Rust file together with its crate position.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// Crate the file belongs to
    pub crate_name: String,
    /// Module path inside the crate
    pub module_path: Vec<String>,
    /// Whether inner attributes of this file are crate-level declarations
    pub is_crate_root: bool,
    /// The parsed abstract syntax tree
    pub syntax_tree: syn::File,
}

impl ParsedFile {
    /// Parses in-memory source code as if it lived at `module_path` inside `crate_name`.
    ///
    /// An empty module path marks the crate root.
    pub fn from_source(
        path: impl Into<PathBuf>,
        crate_name: &str,
        module_path: &[&str],
        code: &str,
    ) -> Result<Self> {
        let path = path.into();
        let syntax_tree = syn::parse_file(code)
            .with_context(|| format!("Failed to parse Rust syntax in file: {}", path.display()))?;

        Ok(ParsedFile {
            path,
            crate_name: crate_name.to_string(),
            module_path: module_path.iter().map(|s| s.to_string()).collect(),
            is_crate_root: module_path.is_empty(),
            syntax_tree,
        })
    }
}

impl AstParser {
    /// Parses a single scanned source file into an AST.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file contains invalid Rust syntax
    pub fn parse_file(source: &SourceFile) -> Result<ParsedFile> {
        debug!("Parsing file: {}", source.path.display());

        let content = fs::read_to_string(&source.path)
            .with_context(|| format!("Failed to read file: {}", source.path.display()))?;

        let syntax_tree = syn::parse_file(&content).with_context(|| {
            format!("Failed to parse Rust syntax in file: {}", source.path.display())
        })?;

        Ok(ParsedFile {
            path: source.path.clone(),
            crate_name: source.crate_name.clone(),
            module_path: source.module_path.clone(),
            is_crate_root: source.is_crate_root,
            syntax_tree,
        })
    }

    /// Parses multiple source files, continuing even if some fail.
    ///
    /// Files that fail to parse are logged as warnings so the remaining services can
    /// still be documented.
    pub fn parse_files(sources: &[SourceFile]) -> Vec<Result<ParsedFile>> {
        debug!("Parsing {} files", sources.len());

        let results: Vec<Result<ParsedFile>> = sources
            .iter()
            .map(|source| {
                Self::parse_file(source).inspect_err(|e| {
                    warn!("Failed to parse {}: {:#}", source.path.display(), e);
                })
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }
}

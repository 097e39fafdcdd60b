use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &["target", "tests", "benches", "examples"];

/// Project scanner that discovers crates and their source files.
///
/// The `FileScanner` walks a project directory, finds every crate by its `Cargo.toml`
/// and maps each `.rs` file below a crate's `src/` directory to the crate and module it
/// belongs to. Build output, hidden directories and test/bench/example targets are
/// skipped since they never contribute exposed services.
///
/// # Example
///
/// ```no_run
/// use rpc_exposure::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-service"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} source files", result.sources.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// A Rust source file and its position inside a crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path to the file on disk
    pub path: PathBuf,
    /// Crate name with `-` normalized to `_`
    pub crate_name: String,
    /// Module path inside the crate (empty for the crate root)
    pub module_path: Vec<String>,
    /// Whether this file is `src/lib.rs` or `src/main.rs`
    pub is_crate_root: bool,
}

/// Result of a project scan.
pub struct ScanResult {
    /// Discovered source files in file-name order
    pub sources: Vec<SourceFile>,
    /// Warning messages for entries that could not be read
    pub warnings: Vec<String>,
}

struct CrateDir {
    name: String,
    src: PathBuf,
}

impl FileScanner {
    /// Creates a new `FileScanner` for the specified project directory.
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the project and returns every crate source file.
    ///
    /// Traversal is sorted by file name so repeated scans yield the same order. When no
    /// `Cargo.toml` declaring a `[package]` exists, the root directory itself is treated
    /// as the source directory of a single crate named after the directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be accessed.
    pub fn scan(&self) -> Result<ScanResult> {
        fs::metadata(&self.root_path).with_context(|| {
            format!("Failed to access project path: {}", self.root_path.display())
        })?;

        let mut rust_files = Vec::new();
        let mut manifests = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.path() == self.root_path {
                    return true;
                }
                let file_name = e.file_name().to_string_lossy();
                let skipped_dir =
                    e.file_type().is_dir() && SKIPPED_DIRS.contains(&file_name.as_ref());
                !file_name.starts_with('.') && !skipped_dir
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    if entry.file_name() == "Cargo.toml" {
                        manifests.push(path.to_path_buf());
                    } else if path.extension().and_then(|s| s.to_str()) == Some("rs") {
                        rust_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        let mut crates = Vec::new();
        for manifest in &manifests {
            match read_package_name(manifest) {
                Ok(Some(name)) => {
                    let dir = manifest.parent().unwrap_or(&self.root_path);
                    debug!("Found crate {} at {}", name, dir.display());
                    crates.push(CrateDir {
                        name,
                        src: dir.join("src"),
                    });
                }
                Ok(None) => debug!("Skipping manifest without [package]: {}", manifest.display()),
                Err(e) => {
                    let warning = format!("Failed to read manifest {}: {:#}", manifest.display(), e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        if crates.is_empty() {
            let name = directory_crate_name(&self.root_path);
            debug!("No crate manifest found, treating root as crate {}", name);
            crates.push(CrateDir {
                name,
                src: self.root_path.clone(),
            });
        }

        // Deepest source directory wins for nested crates.
        crates.sort_by_key(|c| std::cmp::Reverse(c.src.components().count()));

        let mut sources = Vec::new();
        for path in rust_files {
            let Some(krate) = crates.iter().find(|c| path.starts_with(&c.src)) else {
                debug!("Skipping file outside any crate source dir: {}", path.display());
                continue;
            };
            let Ok(relative) = path.strip_prefix(&krate.src) else {
                continue;
            };
            let (module_path, is_crate_root) = module_path_for(relative);
            sources.push(SourceFile {
                path,
                crate_name: krate.name.clone(),
                module_path,
                is_crate_root,
            });
        }

        Ok(ScanResult { sources, warnings })
    }
}

fn read_package_name(manifest: &Path) -> Result<Option<String>> {
    let content = fs::read_to_string(manifest)
        .with_context(|| format!("Failed to read file: {}", manifest.display()))?;
    let table: toml::Table = content
        .parse()
        .with_context(|| format!("Failed to parse TOML in file: {}", manifest.display()))?;

    Ok(table
        .get("package")
        .and_then(|package| package.get("name"))
        .and_then(|name| name.as_str())
        .map(normalize_crate_name))
}

fn directory_crate_name(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .map(|n| normalize_crate_name(n.trim_start_matches('.')))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "crate".to_string())
}

fn normalize_crate_name(name: &str) -> String {
    name.replace('-', "_")
}

/// Maps a path relative to `src/` to its module path.
///
/// `lib.rs` and `main.rs` directly under `src/` are the crate root; `mod.rs` names its
/// parent directory.
pub fn module_path_for(relative: &Path) -> (Vec<String>, bool) {
    let mut segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();

    let Some(file_name) = segments.pop() else {
        return (Vec::new(), false);
    };
    let stem = file_name.trim_end_matches(".rs").to_string();

    if segments.is_empty() && (stem == "lib" || stem == "main") {
        return (Vec::new(), true);
    }
    if stem != "mod" {
        segments.push(stem);
    }
    (segments, false)
}

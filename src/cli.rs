use crate::config::{ExposeConfig, ExposureConfig};
use crate::exposure::NamingStyle;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// RPC Exposure - Resolve the RPC endpoints of Rust service types and document them
#[derive(Parser, Debug)]
#[command(name = "rpc-exposure")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the Rust project directory
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// TOML file describing the exposed services
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_path: Option<PathBuf>,

    /// Service type to expose (repeatable), e.g. `IntMath` or `services::IntMath`
    #[arg(short = 'e', long = "expose", value_name = "TYPE")]
    pub expose: Vec<String>,

    /// Route prefix applied to every service (repeatable)
    #[arg(short = 'p', long = "prefix", value_name = "PREFIX")]
    pub prefixes: Vec<String>,

    /// Case style of route names
    #[arg(long = "naming", value_enum)]
    pub naming: Option<NamingStyle>,

    /// Case style of method identifiers
    #[arg(long = "method-naming", value_enum)]
    pub method_naming: Option<NamingStyle>,

    /// Mark every endpoint as supporting response compression
    #[arg(long = "compression")]
    pub compression: bool,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parse command line arguments
///
/// # Returns
///
/// Returns the validated arguments.
///
/// # Errors
///
/// Returns an error if the project path or the config file does not exist.
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
///
/// # Arguments
///
/// * `args` - Arguments as parsed by clap
///
/// # Returns
///
/// Returns `args` unchanged once the project directory and the optional config file
/// are known to exist.
///
/// # Errors
///
/// Returns an error if the project path is missing or is not a directory, or if the
/// config file does not exist.
///
/// # Example
///
/// ```no_run
/// use clap::Parser;
/// use rpc_exposure::cli::{parse_args_from_parsed, CliArgs};
///
/// let args = CliArgs::parse_from(["rpc-exposure", ".", "-e", "IntMath"]);
/// let args = parse_args_from_parsed(args).unwrap();
/// assert_eq!(args.expose, vec!["IntMath".to_string()]);
/// ```
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.exists() {
        anyhow::bail!(
            "Project path does not exist: {}",
            args.project_path.display()
        );
    }

    if !args.project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            args.project_path.display()
        );
    }

    if let Some(ref config) = args.config_path {
        if !config.is_file() {
            anyhow::bail!("Config file does not exist: {}", config.display());
        }
    }

    info!("Project path: {}", args.project_path.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

impl CliArgs {
    /// Loads the configuration file, if any, and layers the command line on top.
    ///
    /// Exposed types and prefixes extend the file; naming styles and the
    /// compression flag override it.
    ///
    /// # Returns
    ///
    /// Returns the merged configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or is not valid TOML.
    pub fn configuration(&self) -> Result<ExposureConfig> {
        let mut config = match &self.config_path {
            Some(path) => ExposureConfig::load(path)?,
            None => ExposureConfig::default(),
        };

        config.prefixes.extend(self.prefixes.iter().cloned());
        config
            .expose
            .extend(self.expose.iter().map(|type_path| ExposeConfig::new(type_path.as_str())));
        if let Some(naming) = self.naming {
            config.naming = naming;
        }
        if let Some(method_naming) = self.method_naming {
            config.method_naming = method_naming;
        }
        if self.compression {
            config.response_compression = true;
        }

        Ok(config)
    }
}

/// Run the main workflow
///
/// Scans and parses the project, resolves the endpoints of every exposed service,
/// documents them and writes the document to the output file or stdout.
///
/// # Arguments
///
/// * `args` - Validated command line arguments
///
/// # Errors
///
/// Returns an error if nothing is exposed, no source can be parsed, an exposed type
/// is not declared, endpoints collide, or the output cannot be written.
///
/// # Example
///
/// ```no_run
/// use clap::Parser;
/// use rpc_exposure::cli::{run, CliArgs};
///
/// let args = CliArgs::parse_from(["rpc-exposure", "./my-service", "-e", "IntMath", "-f", "json"]);
/// run(args).unwrap();
/// ```
pub fn run(args: CliArgs) -> Result<()> {
    use crate::documentation::ApiDocument;
    use crate::exposure::EndpointRegistryBuilder;
    use crate::parser::{AstParser, ParsedFile};
    use crate::reflect::catalog::TypeCatalog;
    use crate::scanner::FileScanner;
    use crate::serializer::{serialize_json, serialize_yaml, write_to_file};

    info!("Starting endpoint resolution...");

    let config = args.configuration()?;
    if config.expose.is_empty() {
        anyhow::bail!(
            "No service types to expose. Name them with --expose or in an [[expose]] table of the config file"
        );
    }

    // Step 1: Scan directory for crates and their sources
    info!("Scanning project directory...");
    let scanner = FileScanner::new(args.project_path.clone());
    let scan_result = scanner.scan()?;

    info!("Found {} Rust files", scan_result.sources.len());
    for warning in &scan_result.warnings {
        warn!("{}", warning);
    }

    if scan_result.sources.is_empty() {
        anyhow::bail!("No Rust files found in the project directory");
    }

    // Step 2: Parse files into AST
    info!("Parsing Rust files...");
    let parsed_files: Vec<ParsedFile> = AstParser::parse_files(&scan_result.sources)
        .into_iter()
        .filter_map(|result| match result {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("Skipping file due to parse error: {:#}", e);
                None
            }
        })
        .collect();

    info!("Successfully parsed {} files", parsed_files.len());

    if parsed_files.is_empty() {
        anyhow::bail!("No files could be parsed successfully");
    }

    // Step 3: Index declared types, impls and crate attributes
    info!("Building type catalog...");
    let catalog = TypeCatalog::new(&parsed_files);
    debug!("Catalog holds {} declarations", catalog.declarations().len());

    // Step 4: Resolve and register the endpoints of every exposed service
    info!("Resolving endpoints...");
    let configuration = config.api_configuration();
    let mut builder = EndpointRegistryBuilder::new();

    for expose in &config.expose {
        let service = catalog
            .service(&expose.type_path)
            .with_context(|| format!("Cannot expose `{}`", expose.type_path))?;
        let scope = expose.scope(configuration.clone());
        let count = builder
            .expose(&service, &scope)
            .with_context(|| format!("Failed to resolve endpoints of `{}`", service.qualified_name))?;

        info!("Exposed {} methods of {}", count, service.qualified_name);
        if count == 0 {
            warn!("No eligible methods found on {}", service.qualified_name);
        }
    }

    let registry = builder.freeze();

    // Step 5: Document the services and the types they reference
    info!("Building API document...");
    let packages = registry.packages();
    let document = ApiDocument::build(config.title(), config.version(), &packages, &catalog);

    // Step 6: Serialize to requested format
    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    // Step 7: Output to file or stdout
    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote API document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    info!("Resolution complete!");
    info!("Summary:");
    info!("  - Files scanned: {}", scan_result.sources.len());
    info!("  - Files parsed: {}", parsed_files.len());
    info!("  - Services exposed: {}", packages.len());
    info!("  - Endpoints registered: {}", registry.len());
    info!("  - Type definitions: {}", document.definitions.len());

    Ok(())
}

//! RPC Exposure - Endpoint resolution and type documentation for Rust service types.
//!
//! This library decides which methods of a service type are reachable as RPC endpoints and
//! under which names, and collects the definitions of every data type those endpoints
//! accept or return. Everything is derived by static analysis of the service's Rust sources.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Discovers the crates of a project and their source files
//! 2. [`parser`] - Parses Rust source files into Abstract Syntax Trees (AST)
//! 3. [`reflect`] - Indexes declared types, impl blocks and attribute markers
//! 4. [`exposure`] - Resolves endpoint descriptors and freezes them into a registry
//! 5. [`documentation`] - Builds the type definition graph and the API document
//! 6. [`serializer`] - Serializes the document to YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use rpc_exposure::{
//!     documentation::ApiDocument,
//!     exposure::{ApiConfiguration, EndpointRegistryBuilder, ExposureScope},
//!     parser::AstParser,
//!     reflect::catalog::TypeCatalog,
//!     scanner::FileScanner,
//!     serializer::serialize_yaml,
//! };
//! use std::path::PathBuf;
//!
//! let scan_result = FileScanner::new(PathBuf::from("./my-service")).scan().unwrap();
//! let parsed_files: Vec<_> = AstParser::parse_files(&scan_result.sources)
//!     .into_iter()
//!     .filter_map(Result::ok)
//!     .collect();
//! let catalog = TypeCatalog::new(&parsed_files);
//!
//! let configuration = ApiConfiguration::builder().prefix_str("api/").build();
//! let mut builder = EndpointRegistryBuilder::new();
//! let service = catalog.service("IntMath").unwrap();
//! builder.expose(&service, &ExposureScope::new(configuration)).unwrap();
//! let registry = builder.freeze();
//!
//! let document = ApiDocument::build("Math API", "1.0.0", &registry.packages(), &catalog);
//! println!("{}", serialize_yaml(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete CLI application.

pub mod cli;
pub mod config;
pub mod documentation;
pub mod error;
pub mod exposure;
pub mod parser;
pub mod reflect;
pub mod scanner;
pub mod serializer;

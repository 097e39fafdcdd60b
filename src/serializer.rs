//! Serialization of API documents to YAML or JSON and writing them to disk.

use crate::documentation::ApiDocument;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes an API document to YAML.
///
/// Services come first, followed by the type definitions in the order they were
/// first reached.
///
/// # Arguments
///
/// * `doc` - The API document to serialize
///
/// # Returns
///
/// Returns the YAML string representation of the document.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Example
///
/// ```
/// use rpc_exposure::documentation::ApiDocument;
/// use rpc_exposure::reflect::catalog::TypeCatalog;
/// use rpc_exposure::serializer::serialize_yaml;
///
/// let catalog = TypeCatalog::new(&[]);
/// let doc = ApiDocument::build("Math API", "1.0.0", &[], &catalog);
/// println!("{}", serialize_yaml(&doc).unwrap());
/// ```
pub fn serialize_yaml(doc: &ApiDocument) -> Result<String> {
    debug!("Serializing API document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize API document to YAML")
}

/// Serializes an API document to pretty-printed JSON.
///
/// # Arguments
///
/// * `doc` - The API document to serialize
///
/// # Returns
///
/// Returns the JSON string representation of the document, indented for reading.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Example
///
/// ```
/// use rpc_exposure::documentation::ApiDocument;
/// use rpc_exposure::reflect::catalog::TypeCatalog;
/// use rpc_exposure::serializer::serialize_json;
///
/// let catalog = TypeCatalog::new(&[]);
/// let doc = ApiDocument::build("Math API", "1.0.0", &[], &catalog);
/// let json = serialize_json(&doc).unwrap();
/// assert!(json.contains("\"title\": \"Math API\""));
/// ```
pub fn serialize_json(doc: &ApiDocument) -> Result<String> {
    debug!("Serializing API document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize API document to JSON")
}

/// Writes string content to a file, creating parent directories as needed and
/// overwriting any existing file.
///
/// # Arguments
///
/// * `content` - The serialized document
/// * `path` - Destination file
///
/// # Errors
///
/// Returns an error if a directory or the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposure::{ApiConfiguration, EndpointRegistryBuilder, ExposureScope};
    use crate::parser::ParsedFile;
    use crate::reflect::catalog::TypeCatalog;
    use tempfile::TempDir;

    fn create_test_document() -> ApiDocument {
        let parsed = ParsedFile::from_source(
            "src/users.rs",
            "app",
            &["users"],
            r#"
                pub struct User { pub id: u32, pub name: String }
                pub struct Users;
                impl Users {
                    pub fn get(&self, id: u32) -> Option<User> { None }
                }
            "#,
        )
        .unwrap();
        let catalog = TypeCatalog::new(&[parsed]);
        let service = catalog.service("Users").unwrap();

        let mut registry = EndpointRegistryBuilder::new();
        registry
            .expose(&service, &ExposureScope::new(ApiConfiguration::builder().build()))
            .unwrap();
        ApiDocument::build("Test API", "1.0.0", &registry.freeze().packages(), &catalog)
    }

    #[test]
    fn test_serialize_yaml() {
        let yaml = serialize_yaml(&create_test_document()).unwrap();

        assert!(yaml.contains("title: Test API"));
        assert!(yaml.contains("services:"));
        assert!(yaml.contains("service: app::users::Users"));
        assert!(yaml.contains("definitions:"));
        assert!(yaml.contains("full_name: app::users::User"));
    }

    #[test]
    fn test_serialize_json() {
        let json = serialize_json(&create_test_document()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["info"]["title"], "Test API");
        assert_eq!(parsed["services"][0]["routes"][0], "Users");
        assert_eq!(parsed["services"][0]["methods"][0]["name"], "get");
        assert_eq!(
            parsed["services"][0]["methods"][0]["returns"]["inner"]["id"],
            "app::users::User"
        );
        assert_eq!(parsed["definitions"][0]["properties"][1]["name"], "name");
    }

    #[test]
    fn test_serialize_json_pretty_format() {
        let json = serialize_json(&create_test_document()).unwrap();

        assert!(json.contains('\n'));
        assert!(json.contains("  "));
        assert!(json.lines().count() > 5, "Pretty printed JSON should have multiple lines");
    }

    #[test]
    fn test_write_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("api.yaml");

        write_to_file("test content", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "test content");
    }

    #[test]
    fn test_write_to_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("subdir").join("nested").join("api.yaml");

        write_to_file("test content", &file_path).unwrap();

        assert!(file_path.exists());
    }

    #[test]
    fn test_write_to_file_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("api.yaml");

        write_to_file("initial content", &file_path).unwrap();
        write_to_file("new content", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new content");
    }
}

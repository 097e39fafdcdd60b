use pretty_assertions::assert_eq;
use rpc_exposure::{
    documentation::{ApiDocument, TypeDefinition, TypeReference},
    error::ExposureError,
    exposure::{
        ApiConfiguration, AuthorizationRequirement, EndpointRegistry, EndpointRegistryBuilder,
        ExposureScope, NamingConventions, NamingStyle,
    },
    parser::{AstParser, ParsedFile},
    reflect::catalog::TypeCatalog,
    scanner::FileScanner,
};
use std::sync::Arc;
use tempfile::TempDir;

/// Helper function to create a temporary test project
fn create_test_project(files: Vec<(&str, &str)>) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    for (path, content) in files {
        let file_path = temp_dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&file_path, content).expect("Failed to write test file");
    }

    temp_dir
}

fn math_project() -> TempDir {
    create_test_project(vec![
        ("Cargo.toml", "[package]\nname = \"math-service\"\nversion = \"0.1.0\"\n"),
        ("src/lib.rs", include_str!("fixtures/math_service.rs")),
        ("src/strings.rs", include_str!("fixtures/strings.rs")),
    ])
}

fn catalog_of(project: &TempDir) -> TypeCatalog {
    let scan_result = FileScanner::new(project.path().to_path_buf())
        .scan()
        .expect("Failed to scan directory");
    let parsed_files: Vec<ParsedFile> = AstParser::parse_files(&scan_result.sources)
        .into_iter()
        .filter_map(Result::ok)
        .collect();
    assert_eq!(parsed_files.len(), 2, "Should parse both source files");

    TypeCatalog::new(&parsed_files)
}

fn registry_of(catalog: &TypeCatalog, configuration: Arc<ApiConfiguration>) -> EndpointRegistry {
    let mut builder = EndpointRegistryBuilder::new();
    for path in ["IntMath", "Strings"] {
        let service = catalog.service(path).expect("Service should be declared");
        builder
            .expose(&service, &ExposureScope::new(configuration.clone()))
            .expect("Service should resolve");
    }
    builder.freeze()
}

#[test]
fn test_scanned_project_resolves_endpoints() {
    let project = math_project();
    let catalog = catalog_of(&project);
    let configuration = ApiConfiguration::builder()
        .prefix_str("api/")
        .naming(NamingConventions::styled(NamingStyle::KebabCase, NamingStyle::AsIs))
        .build();

    let registry = registry_of(&catalog, configuration);

    let methods: Vec<&str> = registry.descriptors().iter().map(|d| d.method_name()).collect();
    assert_eq!(methods, vec!["add", "divide", "plus", "totals", "upper", "shout", "split"]);

    let add = registry.get("api/int-math", "add").expect("add should be routed");
    assert_eq!(add.service(), "math_service::IntMath");
    assert_eq!(add.authorizations(), [AuthorizationRequirement::role("user")]);
    assert!(!add.is_obsolete());

    let divide = registry.get("api/int-math", "divide").unwrap();
    assert_eq!(
        divide.authorizations(),
        [
            AuthorizationRequirement::policy("calculators"),
            AuthorizationRequirement::role("user"),
        ]
    );

    assert!(registry.get("api/int-math", "new").is_none());
    assert!(registry.get("api/int-math", "reset").is_none());
    assert!(registry.get("api/int-math", "clone").is_none());
    assert!(registry.contains_route("api/strings"));
}

#[test]
fn test_obsolescence_follows_innermost_declaration() {
    let project = math_project();
    let catalog = catalog_of(&project);
    let registry = registry_of(&catalog, ApiConfiguration::builder().build());

    let obsolete = |route: &str, method: &str| {
        registry
            .get(route, method)
            .and_then(|d| d.obsolete_message().map(str::to_string))
    };

    assert_eq!(obsolete("IntMath", "plus").as_deref(), Some("use add"));
    assert_eq!(obsolete("IntMath", "totals"), None);
    assert_eq!(obsolete("Strings", "shout").as_deref(), Some("use upper"));
    assert_eq!(
        obsolete("Strings", "upper").as_deref(),
        Some("moving to the text service")
    );
    assert_eq!(
        obsolete("Strings", "split").as_deref(),
        Some("moving to the text service")
    );
}

#[test]
fn test_scope_overrides_names_and_obsolescence() {
    let project = math_project();
    let catalog = catalog_of(&project);
    let service = catalog.service("IntMath").unwrap();
    let scope = ExposureScope::builder(ApiConfiguration::builder().prefix_str("v2/").build())
        .as_name("math")
        .as_name("calc")
        .authorize(None, Some("auditors"))
        .methods(|method| method.name != "totals")
        .obsolete("math is retired")
        .build();

    let mut builder = EndpointRegistryBuilder::new();
    assert_eq!(builder.expose(&service, &scope).unwrap(), 3);
    let registry = builder.freeze();

    let add = registry.get("v2/math", "add").unwrap();
    assert!(Arc::ptr_eq(add, registry.get("v2/calc", "add").unwrap()));
    assert_eq!(add.names(), ["v2/math".to_string(), "v2/calc".to_string()]);
    assert_eq!(add.obsolete_message(), Some("math is retired"));
    assert_eq!(
        registry.get("v2/calc", "plus").unwrap().obsolete_message(),
        Some("math is retired")
    );
    assert_eq!(
        add.authorizations(),
        [
            AuthorizationRequirement::policy("auditors"),
            AuthorizationRequirement::role("user"),
        ]
    );
    assert!(registry.get("v2/math", "totals").is_none());
}

#[test]
fn test_exposing_a_service_twice_is_rejected() {
    let project = math_project();
    let catalog = catalog_of(&project);
    let service = catalog.service("Strings").unwrap();
    let configuration = ApiConfiguration::builder().build();

    let mut builder = EndpointRegistryBuilder::new();
    builder
        .expose(&service, &ExposureScope::new(configuration.clone()))
        .unwrap();
    let err = builder
        .expose(&service, &ExposureScope::new(configuration))
        .unwrap_err();

    assert_eq!(
        err,
        ExposureError::DuplicateEndpoint {
            route: "Strings".to_string(),
            method: "upper".to_string(),
        }
    );
}

#[test]
fn test_unknown_service_is_reported() {
    let project = math_project();
    let catalog = catalog_of(&project);

    assert_eq!(
        catalog.service("FloatMath").unwrap_err(),
        ExposureError::UnknownType("FloatMath".to_string())
    );
}

#[test]
fn test_malformed_marker_aborts_resolution() {
    let parsed = ParsedFile::from_source(
        "src/lib.rs",
        "broken",
        &[],
        r#"
            pub struct Api;
            impl Api {
                #[authorize(group = "admins")]
                pub fn purge(&self) {}
            }
        "#,
    )
    .unwrap();
    let catalog = TypeCatalog::new(&[parsed]);
    let service = catalog.service("Api").unwrap();

    let mut builder = EndpointRegistryBuilder::new();
    let err = builder
        .expose(&service, &ExposureScope::new(ApiConfiguration::builder().build()))
        .unwrap_err();

    assert!(matches!(err, ExposureError::MalformedMarker { ref marker, .. } if marker == "authorize"));
}

#[test]
fn test_document_covers_every_reachable_type() {
    let project = math_project();
    let catalog = catalog_of(&project);
    let service = catalog.service("IntMath").unwrap();

    let mut builder = EndpointRegistryBuilder::new();
    builder
        .expose(&service, &ExposureScope::new(ApiConfiguration::builder().build()))
        .unwrap();
    let packages = builder.freeze().packages();
    let document = ApiDocument::build("Math API", "2.0.0", &packages, &catalog);

    let keys: Vec<&str> = document.definitions.iter().map(|d| d.key().as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "math_service::Outcome",
            "math_service::Rounding",
            "math_service::Operands",
            "(String, i64)",
        ]
    );

    let TypeDefinition::Object(outcome) = &document.definitions[0] else {
        panic!("Outcome should be an object");
    };
    let names: Vec<&str> = outcome.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["value", "rounding", "history"]);
    assert!(outcome.properties[0].required);
    assert!(!outcome.properties[1].required);
    assert_eq!(
        outcome.properties[2].ty,
        TypeReference::Array {
            items: Box::new(TypeReference::definition("math_service::Outcome"))
        }
    );

    let TypeDefinition::Enum(rounding) = &document.definitions[1] else {
        panic!("Rounding should be an enum");
    };
    let values: Vec<String> = rounding
        .values
        .iter()
        .map(|v| format!("{}={}", v.name, serde_json::to_value(&v.value).unwrap()))
        .collect();
    assert_eq!(values, vec!["Down=0", "Nearest=5", "Up=6"]);

    let TypeDefinition::Object(operands) = &document.definitions[2] else {
        panic!("Operands should be an object");
    };
    assert_eq!(operands.properties.len(), 2, "Skipped fields are not part of the shape");

    let service_doc = &document.services[0];
    assert_eq!(service_doc.description.as_deref(), Some("Integer arithmetic"));
    let divide = &service_doc.methods[1];
    assert_eq!(divide.returns, TypeReference::definition("math_service::Outcome"));
    assert_eq!(divide.parameters[1].ty, TypeReference::definition("math_service::Rounding"));
}

//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the fetchzip REST API using utoipa
//! for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the fetchzip REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation (if enabled)
#[derive(OpenApi)]
#[openapi(
    info(
        title = "fetchzip REST API",
        version = "0.1.0",
        description = "REST API for building ZIP archives from remote files and downloading them",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // Archive tasks
        crate::api::routes::create_archive,
        crate::api::routes::create_empty_archive,
        crate::api::routes::add_file,
        crate::api::routes::get_archive_status,
        crate::api::routes::download_archive,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::TaskId,
        crate::types::TaskStatus,
        crate::types::ArchiveTask,

        // Config types from config.rs
        crate::config::Config,
        crate::config::FetchConfig,
        crate::config::LimitsConfig,
        crate::config::StorageConfig,
        crate::config::ApiConfig,

        // API request/response types from routes
        crate::api::routes::CreateArchiveRequest,
        crate::api::routes::AddFileRequest,
        crate::api::routes::AddFileResponse,
        crate::api::routes::ArchiveResponse,
        crate::api::routes::HealthResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "archives", description = "Archive tasks - Create archives from URLs, add files, query status, download ZIPs"),
        (name = "system", description = "System endpoints - Health checks and OpenAPI spec"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security addon to add API key authentication scheme to OpenAPI spec
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "api_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-Api-Key"),
                    ),
                ),
            );
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_doc_generates() {
        let _spec = ApiDoc::openapi();
    }

    #[test]
    fn spec_documents_all_routes() {
        let spec = ApiDoc::openapi();

        for path in [
            "/archives",
            "/archives/empty",
            "/archives/{id}/files",
            "/archives/{id}",
            "/archives/{id}/download",
            "/health",
            "/openapi.json",
        ] {
            assert!(
                spec.paths.paths.contains_key(path),
                "OpenAPI spec should document {path}"
            );
        }
    }

    #[test]
    fn spec_has_schemas_and_tags() {
        let spec = ApiDoc::openapi();

        let components = spec.components.expect("spec should have components");
        for schema in ["ArchiveTask", "TaskStatus", "ArchiveResponse", "ApiError"] {
            assert!(
                components.schemas.contains_key(schema),
                "OpenAPI spec should contain schema: {schema}"
            );
        }

        let tags = spec.tags.expect("spec should have tags");
        let tag_names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert!(tag_names.contains(&"archives"));
        assert!(tag_names.contains(&"system"));
    }

    #[test]
    fn spec_has_api_key_security_scheme() {
        let spec = ApiDoc::openapi();
        let components = spec.components.expect("spec should have components");

        assert!(
            components.security_schemes.contains_key("api_key"),
            "Should have 'api_key' security scheme defined"
        );
    }

    #[test]
    fn spec_serializes_to_valid_json() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string(&spec).expect("Should serialize to JSON");
        let value: serde_json::Value =
            serde_json::from_str(&json).expect("Generated JSON should be valid");

        assert_eq!(value["info"]["title"], "fetchzip REST API");
        assert!(
            value["openapi"]
                .as_str()
                .expect("openapi version field")
                .starts_with("3."),
            "Should use OpenAPI 3.x"
        );
    }
}

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/v1/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Join a document session over WebSocket
#[utoipa::path(
    get,
    path = "/v1/ws",
    params(("docID" = String, Query, description = "Document session identifier")),
    responses(
        (status = 101, description = "Switching to the WebSocket protocol"),
        (status = 400, description = "docID parameter missing")
    )
)]
#[allow(dead_code)]
pub async fn ws_doc() {}

/// Register a user
#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 409, description = "Email or username taken", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn register_user_doc() {}

/// Create a bearer token
#[utoipa::path(
    post,
    path = "/v1/auth/token",
    request_body = CreateTokenRequest,
    responses(
        (status = 201, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn create_token_doc() {}

/// Create a document
#[utoipa::path(
    post,
    path = "/v1/document",
    request_body = CreateDocumentRequest,
    responses(
        (status = 201, description = "Document created", body = DocumentResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = []))
)]
#[allow(dead_code)]
pub async fn create_document_doc() {}

/// Get a document
#[utoipa::path(
    get,
    path = "/v1/document/{doc_id}",
    params(("doc_id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document content", body = DocumentResponse),
        (status = 404, description = "Unknown document", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[allow(dead_code)]
pub async fn get_document_doc() {}

/// Diagnostics
#[utoipa::path(
    get,
    path = "/v1/diagnostics",
    responses(
        (status = 200, description = "Room and process statistics", body = DiagnosticsResponse)
    ),
    security(("bearer" = []))
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ws_doc,
        register_user_doc,
        create_token_doc,
        create_document_doc,
        get_document_doc,
        diagnostics_doc,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            RegisterUserRequest,
            CreateTokenRequest,
            TokenResponse,
            UserResponse,
            CreateDocumentRequest,
            DocumentResponse,
            DiagnosticsResponse,
            RoomDiagnostics,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "api", description = "API endpoints")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

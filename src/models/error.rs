use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response for an error
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub code: u16,
    pub status: String,
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Build the `(status, body)` pair every handler returns on failure.
pub fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse {
        code: status.as_u16(),
        status: status.to_string(),
        error: error.into(),
    }))
}

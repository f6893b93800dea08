use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for registering a user
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request body for exchanging credentials for a token
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct CreateTokenRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// A user as exposed over the API (never includes the password hash)
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

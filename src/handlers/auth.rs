use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::{hash_password, verify_password};
use crate::db::{NewUser, StoreError};
use crate::models::{api_error, ApiError, CreateTokenRequest, RegisterUserRequest, TokenResponse, UserResponse};
use crate::state::AppState;

/// Register a new user
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let username = payload.username.trim();
    let email = payload.email.trim();
    if username.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "username, email and password are required"));
    }

    let password_hash = hash_password(&payload.password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to register user")
    })?;

    let user = state
        .storage
        .users
        .create_user(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(field) => {
                api_error(StatusCode::CONFLICT, format!("a user with that {} already exists", field))
            }
            other => {
                error!("Failed to create user: {}", other);
                api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to register user")
            }
        })?;

    info!("Registered user {}", user.id);
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }),
    ))
}

/// Exchange credentials for a bearer token
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateTokenRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let unauthorized = || api_error(StatusCode::UNAUTHORIZED, "invalid credentials");

    let user = match state.storage.users.get_user_by_email(payload.email.trim()).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            warn!("Token requested for unknown email");
            return Err(unauthorized());
        }
        Err(e) => {
            error!("Failed to load user: {}", e);
            return Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create token"));
        }
    };

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            warn!("Wrong password for user {}", user.id);
            return Err(unauthorized());
        }
        Err(e) => {
            error!("Stored password hash for user {} is unusable: {}", user.id, e);
            return Err(unauthorized());
        }
    }

    let token = state.authenticator.generate_token(user.id).map_err(|e| {
        error!("Failed to sign token for user {}: {}", user.id, e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create token")
    })?;

    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, error};

use crate::db::StoreError;
use crate::services::auth_service::get_auth_token;
use crate::state::AppState;

/// Require a valid bearer token and put the resolved `User` into the
/// request extensions for downstream handlers.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = match get_auth_token(&req) {
        Ok(token) => token,
        Err(e) => {
            debug!("Rejecting request without token: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    let claims = match state.authenticator.validate_token(&token) {
        Ok(claims) => claims,
        Err(e) => {
            error!("JWT validation failed: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    let user_id = claims.user_id().map_err(|e| {
        error!("JWT validation failed: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    let user = match state.users.get_or_fetch(user_id).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            error!("Token refers to unknown user {}", user_id);
            return Err(StatusCode::UNAUTHORIZED);
        }
        Err(e) => {
            error!("Failed to load user {}: {}", user_id, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

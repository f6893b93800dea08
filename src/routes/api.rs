use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers::{create_document, create_token, diagnostics, get_document, health_check, register_user, ws_handler};
use crate::routes::auth_middleware::auth_middleware;
use crate::state::AppState;

/// Create API routes
pub fn create_api_routes(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/document", post(create_document))
        .route("/document/:doc_id", get(get_document))
        .route("/diagnostics", get(diagnostics))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(ws_handler))
        .route("/auth/register", post(register_user))
        .route("/auth/token", post(create_token))
        .merge(protected)
        .with_state(state)
}

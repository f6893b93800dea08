use axum::{
    extract::{ws::WebSocketUpgrade, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::collab::accept_connection;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct WsQuery {
    #[serde(rename = "docID")]
    doc_id: Option<String>,
}

/// Upgrade to a WebSocket and join the room for `docID`.
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let doc_id = match query.doc_id.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()) {
        Some(doc_id) => doc_id,
        None => {
            warn!("WebSocket request without docID");
            return (StatusCode::BAD_REQUEST, "docID parameter missing").into_response();
        }
    };

    info!("New WebSocket connection attempt for document {}", doc_id);
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| accept_connection(hub, doc_id, socket))
}

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::db::{StoreError, User};
use crate::models::{api_error, ApiError, CreateDocumentRequest, DocumentResponse};
use crate::state::AppState;

/// Create a document with a fresh id
pub async fn create_document(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentResponse>), ApiError> {
    let doc_id = Uuid::new_v4().to_string();
    let documents = &state.storage.documents;

    if let Err(e) = documents.create_document(&doc_id, &payload.content).await {
        error!("Failed to create document {}: {}", doc_id, e);
        return Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create document"));
    }

    let doc = documents.get_document(&doc_id).await.map_err(|e| {
        error!("Failed to load created document {}: {}", doc_id, e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load created document")
    })?;

    info!("User {} created document {}", user.id, doc_id);
    Ok((
        StatusCode::CREATED,
        Json(DocumentResponse {
            doc_id: doc.doc_id,
            content: doc.content,
            updated_at: doc.updated_at,
            live: false,
        }),
    ))
}

/// Get a document, preferring the live text of a resident room
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(doc_id): Path<String>,
) -> Result<(StatusCode, Json<DocumentResponse>), ApiError> {
    // Try to get data from memory (Hub)
    if let Some(room) = state.hub.get(&doc_id) {
        if let Ok(snapshot) = room.inspect().await {
            return Ok((
                StatusCode::OK,
                Json(DocumentResponse {
                    doc_id,
                    content: snapshot.text,
                    updated_at: Utc::now(),
                    live: true,
                }),
            ));
        }
    }

    match state.storage.documents.get_document(&doc_id).await {
        Ok(doc) => Ok((
            StatusCode::OK,
            Json(DocumentResponse {
                doc_id: doc.doc_id,
                content: doc.content,
                updated_at: doc.updated_at,
                live: false,
            }),
        )),
        Err(StoreError::NotFound) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Document '{}' not found", doc_id),
        )),
        Err(e) => {
            error!("Error loading document '{}': {}", doc_id, e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error loading document '{}'", doc_id),
            ))
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for creating a document
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct CreateDocumentRequest {
    #[serde(default)]
    pub content: String,
}

/// A stored document
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct DocumentResponse {
    pub doc_id: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
    /// True when the content came from a resident room rather than the store
    pub live: bool,
}

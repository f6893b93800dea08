use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-room view in the diagnostics response
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct RoomDiagnostics {
    pub doc_id: String,
    pub members: u32,
    pub text_len: u32,
    pub revision: u64,
}

/// Response for diagnostics information
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct DiagnosticsResponse {
    pub n_conn: u32,
    pub n_rooms: u32,
    pub rooms: Vec<RoomDiagnostics>,
    pub n_cached_users: u64,
    pub cpu_usage: f32,
    pub memory_alloc: u64,
    pub memory_total: u64,
    pub memory_free: u64,
}

use axum::{extract::State, http::StatusCode, Json};
use std::sync::{Arc, Mutex, OnceLock};
use sysinfo::System;
use tracing::info;

use crate::models::{ApiError, DiagnosticsResponse, RoomDiagnostics};
use crate::state::AppState;

static SYSTEM_MONITOR: OnceLock<Mutex<System>> = OnceLock::new();

/// Room, connection and process statistics
pub async fn diagnostics(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<DiagnosticsResponse>), ApiError> {
    let stats = state.hub.stats().await;
    let n_rooms = stats.len() as u32;
    let n_conn: u32 = stats.iter().map(|s| s.members as u32).sum();
    let rooms = stats
        .into_iter()
        .map(|s| RoomDiagnostics {
            doc_id: s.doc_id,
            members: s.members as u32,
            text_len: s.text_len as u32,
            revision: s.revision,
        })
        .collect();

    // System stats
    let (cpu_usage, memory_alloc, memory_free, memory_total) = {
        let sys_lock = SYSTEM_MONITOR.get_or_init(|| Mutex::new(System::new_all()));
        match sys_lock.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu();
                sys.refresh_memory();
                (
                    sys.global_cpu_info().cpu_usage(),
                    sys.used_memory(),
                    sys.free_memory(),
                    sys.total_memory(),
                )
            }
            Err(_) => (0.0, 0, 0, 0),
        }
    };

    info!(
        "Diagnostics: CPU: {:.2}%, Mem: {}/{} MB (Free: {} MB), Conn: {}, Rooms: {}",
        cpu_usage,
        memory_alloc / 1024 / 1024,
        memory_total / 1024 / 1024,
        memory_free / 1024 / 1024,
        n_conn,
        n_rooms
    );

    Ok((
        StatusCode::OK,
        Json(DiagnosticsResponse {
            n_conn,
            n_rooms,
            rooms,
            n_cached_users: state.users.entry_count(),
            cpu_usage,
            memory_alloc,
            memory_total,
            memory_free,
        }),
    ))
}

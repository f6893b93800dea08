#![allow(dead_code)]

use doc_collab::config::Config;
use doc_collab::db::Storage;
use doc_collab::state::AppState;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

pub fn test_state() -> Arc<AppState> {
    let config = Config {
        auth_jwt_secret: Some("test-secret".to_string()),
        ..Config::default()
    };
    Arc::new(AppState::new(config, Storage::memory()))
}

/// Serve the application on an ephemeral port and return the port.
pub async fn start_test_server(state: Arc<AppState>) -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let app = doc_collab::app(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    // Give server time to start accepting
    sleep(Duration::from_millis(20)).await;
    port
}

use doc_collab::config::Config;
use doc_collab::db::{PgStore, Storage};
use doc_collab::state::AppState;
use std::panic;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "doc_collab=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting server...");

    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });

    let storage = match &config.db_url {
        Some(db_url) => match PgStore::connect(db_url, &config).await {
            Ok(store) => {
                info!("Database initialized successfully");
                Storage::postgres(store)
            }
            Err(e) => {
                error!("Failed to initialize database: {}", e);
                warn!("Falling back to in-memory storage, documents will not survive a restart");
                Storage::memory()
            }
        },
        None => {
            warn!("No database URL configured - using in-memory storage");
            Storage::memory()
        }
    };

    let address = config.server_address();
    let state = Arc::new(AppState::new(config, storage));
    let app = doc_collab::app(state);

    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", address, e);
            std::process::exit(1);
        }
    };

    info!("Server running on http://{}", address);
    info!("WebSocket available at ws://{}/v1/ws?docID=<id>", address);
    info!("Swagger UI available at http://{}/swagger", address);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}

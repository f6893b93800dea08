use std::sync::Arc;

use crate::auth::JwtAuthenticator;
use crate::collab::{Hub, RoomSettings};
use crate::config::Config;
use crate::db::Storage;
use crate::services::UserCache;

/// Shared state handed to every handler.
pub struct AppState {
    pub config: Config,
    pub hub: Arc<Hub>,
    pub storage: Storage,
    pub authenticator: JwtAuthenticator,
    pub users: UserCache,
}

impl AppState {
    pub fn new(config: Config, storage: Storage) -> Self {
        let settings = RoomSettings {
            mailbox_capacity: config.room_mailbox_capacity,
            outbound_capacity: config.outbound_capacity,
        };
        Self {
            hub: Arc::new(Hub::new(storage.documents.clone(), settings)),
            authenticator: JwtAuthenticator::from_config(&config),
            users: UserCache::new(storage.users.clone()),
            storage,
            config,
        }
    }
}

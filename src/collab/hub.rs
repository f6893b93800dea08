use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

use super::room::{self, RoomHandle, RoomSettings, RoomStats};
use crate::db::DocumentStore;

/// Registry of live rooms, keyed by document id.
///
/// Created once at startup and never cleared: a room stays resident after its
/// last member leaves so its text remains a hot copy of the latest value.
/// The lock covers the map only and is never held across an await.
pub struct Hub {
    rooms: Mutex<HashMap<String, RoomHandle>>,
    store: Arc<dyn DocumentStore>,
    settings: RoomSettings,
}

impl Hub {
    pub fn new(store: Arc<dyn DocumentStore>, settings: RoomSettings) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            store,
            settings,
        }
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<String, RoomHandle>> {
        // The map stays consistent even if a holder panicked; keep serving.
        self.rooms.lock().unwrap_or_else(|poisoned| {
            warn!("Room registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Return the room for `doc_id`, starting it on first use. Check and
    /// insert happen under one lock, so concurrent callers get the same room.
    pub fn get_or_create_room(&self, doc_id: &str) -> RoomHandle {
        let mut rooms = self.rooms();
        if let Some(handle) = rooms.get(doc_id) {
            return handle.clone();
        }

        let handle = room::spawn(doc_id, self.store.clone(), self.settings);
        rooms.insert(doc_id.to_string(), handle.clone());
        info!("Created room {}. Total rooms: {}", doc_id, rooms.len());
        handle
    }

    /// Existing room for `doc_id`, without creating one.
    pub fn get(&self, doc_id: &str) -> Option<RoomHandle> {
        self.rooms().get(doc_id).cloned()
    }

    pub fn room_count(&self) -> usize {
        self.rooms().len()
    }

    /// Stats for every resident room, sorted by document id.
    pub async fn stats(&self) -> Vec<RoomStats> {
        let handles: Vec<RoomHandle> = self.rooms().values().cloned().collect();

        let mut stats = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.inspect().await {
                Ok(snapshot) => stats.push(snapshot.stats),
                Err(e) => warn!("Could not inspect room {}: {}", handle.doc_id(), e),
            }
        }
        stats.sort_by(|a, b| a.doc_id.cmp(&b.doc_id));
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::connection::ConnectionId;
    use crate::db::MemoryStore;
    use tokio::sync::mpsc;

    fn hub() -> Arc<Hub> {
        Arc::new(Hub::new(Arc::new(MemoryStore::new()), RoomSettings::default()))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_lookups_share_one_room() {
        let hub = hub();
        let mut tasks = Vec::new();
        for _ in 0..32 {
            let hub = hub.clone();
            tasks.push(tokio::spawn(async move { hub.get_or_create_room("doc1") }));
        }

        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap());
        }

        assert_eq!(hub.room_count(), 1);
        let first = &handles[0];
        assert!(handles.iter().all(|h| h.same_room(first)));
    }

    #[tokio::test]
    async fn distinct_ids_get_distinct_rooms() {
        let hub = hub();
        let a = hub.get_or_create_room("a");
        let b = hub.get_or_create_room("b");
        assert!(!a.same_room(&b));
        assert!(hub.get("a").unwrap().same_room(&a));
        assert!(hub.get("missing").is_none());
        assert_eq!(hub.room_count(), 2);
    }

    #[tokio::test]
    async fn empty_rooms_stay_resident() {
        let hub = hub();
        let room = hub.get_or_create_room("doc1");
        let id = ConnectionId::new();
        let (tx, mut rx) = mpsc::channel(4);
        room.register(id, tx).await.unwrap();
        rx.recv().await.unwrap();
        room.unregister(id).await.unwrap();

        let stats = hub.stats().await;
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].doc_id, "doc1");
        assert_eq!(stats[0].members, 0);
        assert!(hub.get_or_create_room("doc1").same_room(&room));
    }
}

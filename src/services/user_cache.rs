use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::db::{StoreError, User, UserStore};

/// Users resolved from validated tokens, cached so authenticated requests
/// don't hit the store every time.
#[derive(Clone)]
pub struct UserCache {
    cache: Cache<i64, User>,
    users: Arc<dyn UserStore>,
}

impl UserCache {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(100_000)
                .time_to_idle(Duration::from_secs(5 * 60))
                .build(),
            users,
        }
    }

    pub async fn get_or_fetch(&self, user_id: i64) -> Result<User, StoreError> {
        if let Some(user) = self.cache.get(&user_id).await {
            return Ok(user);
        }

        debug!("User cache miss for {}. Loading from store.", user_id);
        let user = self.users.get_user_by_id(user_id).await?;
        self.cache.insert(user_id, user.clone()).await;
        Ok(user)
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, NewUser};

    #[tokio::test]
    async fn fetches_then_serves_from_cache() {
        let store = Arc::new(MemoryStore::new());
        let user = store
            .create_user(NewUser {
                username: "alice".to_string(),
                email: "a@x.test".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();

        let cache = UserCache::new(store);
        assert_eq!(cache.get_or_fetch(user.id).await.unwrap().username, "alice");
        assert_eq!(cache.get_or_fetch(user.id).await.unwrap().username, "alice");
        assert!(matches!(cache.get_or_fetch(999).await, Err(StoreError::NotFound)));
    }
}

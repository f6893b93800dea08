//! Persistence gateway.
//!
//! Rooms only ever talk to [`DocumentStore`]; the HTTP layer also uses
//! [`UserStore`]. Both are implemented by [`PgStore`] (Postgres through sqlx)
//! and [`MemoryStore`] (process memory, used when no database is configured
//! and in tests).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("a record with that {0} already exists")]
    Duplicate(&'static str),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Document row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: i64,
    pub doc_id: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

/// User row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a user; the id and timestamp come from the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(&self, doc_id: &str, content: &str) -> Result<(), StoreError>;

    /// `StoreError::NotFound` when no document has this id.
    async fn get_document(&self, doc_id: &str) -> Result<Document, StoreError>;

    /// Replace the stored text. `StoreError::NotFound` when no row was updated.
    async fn update_document(&self, doc_id: &str, content: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn get_user_by_id(&self, id: i64) -> Result<User, StoreError>;
    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError>;
}

/// The stores the application is wired with.
#[derive(Clone)]
pub struct Storage {
    pub documents: Arc<dyn DocumentStore>,
    pub users: Arc<dyn UserStore>,
}

impl Storage {
    pub fn postgres(store: PgStore) -> Self {
        let store = Arc::new(store);
        Self {
            documents: store.clone(),
            users: store,
        }
    }

    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            documents: store.clone(),
            users: store,
        }
    }
}

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{Document, DocumentStore, NewUser, StoreError, User, UserStore};

#[derive(Default)]
struct Tables {
    documents: HashMap<String, Document>,
    users: Vec<User>,
    next_document_id: i64,
}

/// Store that keeps everything in process memory. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_document(&self, doc_id: &str, content: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.documents.contains_key(doc_id) {
            return Err(StoreError::Duplicate("document id"));
        }
        tables.next_document_id += 1;
        let id = tables.next_document_id;
        tables.documents.insert(
            doc_id.to_string(),
            Document {
                id,
                doc_id: doc_id.to_string(),
                content: content.to_string(),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get_document(&self, doc_id: &str) -> Result<Document, StoreError> {
        self.tables
            .read()
            .await
            .documents
            .get(doc_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_document(&self, doc_id: &str, content: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let doc = tables.documents.get_mut(doc_id).ok_or(StoreError::NotFound)?;
        doc.content = content.to_string();
        doc.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email"));
        }
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate("username"));
        }
        let created = User {
            id: tables.users.len() as i64 + 1,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn get_user_by_id(&self, id: i64) -> Result<User, StoreError> {
        self.tables
            .read()
            .await
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.tables
            .read()
            .await
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn update_requires_existing_document() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.update_document("missing", "x").await,
            Err(StoreError::NotFound)
        ));

        store.create_document("doc1", "first").await.unwrap();
        store.update_document("doc1", "second").await.unwrap();
        assert_eq!(store.get_document("doc1").await.unwrap().content, "second");
    }

    #[tokio::test]
    async fn duplicate_document_ids_are_rejected() {
        let store = MemoryStore::new();
        store.create_document("doc1", "").await.unwrap();
        assert!(matches!(
            store.create_document("doc1", "").await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn users_are_unique_by_email_and_username() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice", "a@x.test")).await.unwrap();
        assert_eq!(store.get_user_by_id(alice.id).await.unwrap().email, "a@x.test");
        assert_eq!(store.get_user_by_email("a@x.test").await.unwrap().id, alice.id);

        assert!(matches!(
            store.create_user(new_user("other", "a@x.test")).await,
            Err(StoreError::Duplicate("email"))
        ));
        assert!(matches!(
            store.create_user(new_user("alice", "b@x.test")).await,
            Err(StoreError::Duplicate("username"))
        ));
    }
}

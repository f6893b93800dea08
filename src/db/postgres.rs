use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Error as SqlxError;
use std::time::Duration;
use tracing::{debug, error, info};

use super::{Document, DocumentStore, NewUser, StoreError, User, UserStore};
use crate::config::Config;

/// Per-query deadline, after which the store reports `Unavailable`.
const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        id BIGSERIAL PRIMARY KEY,
        doc_id TEXT NOT NULL UNIQUE,
        content TEXT NOT NULL DEFAULT '',
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// Postgres backed store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new database connection pool and make sure the tables exist.
    pub async fn connect(database_url: &str, config: &Config) -> Result<Self, SqlxError> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_open_conns)
            .min_connections(config.db_min_conns.min(config.db_max_open_conns))
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(config.db_max_idle_time())
            .max_lifetime(Duration::from_secs(1800))
            .connect(database_url)
            .await?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }

        info!("Database connection pool created successfully");
        Ok(Self { pool })
    }

    fn log_pool(&self, action: &str, key: &str) {
        let pool_idle = self.pool.num_idle() as u32;
        let pool_size = self.pool.size();
        debug!(
            "{} {}. Pool connections: {} idle, {} in use",
            action,
            key,
            pool_idle,
            pool_size.saturating_sub(pool_idle)
        );
    }
}

async fn with_timeout<T, F>(fut: F) -> Result<T, StoreError>
where
    F: std::future::Future<Output = Result<T, SqlxError>>,
{
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(res) => res.map_err(map_sqlx_error),
        Err(_) => Err(StoreError::Unavailable("query timed out".to_string())),
    }
}

fn map_sqlx_error(e: SqlxError) -> StoreError {
    if matches!(e, SqlxError::RowNotFound) {
        return StoreError::NotFound;
    }

    let duplicate = match &e {
        SqlxError::Database(db) if db.is_unique_violation() => match db.constraint() {
            Some(c) if c.contains("email") => Some("email"),
            Some(c) if c.contains("username") => Some("username"),
            Some(c) if c.contains("doc_id") => Some("document id"),
            _ => None,
        },
        _ => None,
    };

    match duplicate {
        Some(field) => StoreError::Duplicate(field),
        None => StoreError::Database(e),
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn create_document(&self, doc_id: &str, content: &str) -> Result<(), StoreError> {
        self.log_pool("Creating document", doc_id);
        let query_sql = r#"
            INSERT INTO documents (doc_id, content)
            VALUES ($1, $2)
        "#;
        with_timeout(
            sqlx::query(query_sql)
                .bind(doc_id)
                .bind(content)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn get_document(&self, doc_id: &str) -> Result<Document, StoreError> {
        self.log_pool("Loading document", doc_id);
        let query_sql = r#"
            SELECT id, doc_id, content, updated_at
            FROM documents
            WHERE doc_id = $1
        "#;
        with_timeout(
            sqlx::query_as::<_, Document>(query_sql)
                .bind(doc_id)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn update_document(&self, doc_id: &str, content: &str) -> Result<(), StoreError> {
        self.log_pool("Updating document", doc_id);
        let query_sql = r#"
            UPDATE documents
            SET content = $1, updated_at = NOW()
            WHERE doc_id = $2
        "#;
        let result = with_timeout(
            sqlx::query(query_sql)
                .bind(content)
                .bind(doc_id)
                .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            error!("Document not found for update: {}", doc_id);
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        self.log_pool("Creating user", &user.email);

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!(
                "Failed to acquire connection from pool: {}. Pool state: {} idle, {} total",
                e,
                self.pool.num_idle(),
                self.pool.size()
            );
            map_sqlx_error(e)
        })?;

        let query_sql = r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, created_at
        "#;
        let created = with_timeout(
            sqlx::query_as::<_, User>(query_sql)
                .bind(&user.username)
                .bind(&user.email)
                .bind(&user.password_hash)
                .fetch_one(&mut *tx),
        )
        .await?;

        tx.commit().await.map_err(map_sqlx_error)?;

        info!("User created: {}", created.id);
        Ok(created)
    }

    async fn get_user_by_id(&self, id: i64) -> Result<User, StoreError> {
        let query_sql = r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE id = $1
        "#;
        with_timeout(
            sqlx::query_as::<_, User>(query_sql)
                .bind(id)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        let query_sql = r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE email = $1
        "#;
        with_timeout(
            sqlx::query_as::<_, User>(query_sql)
                .bind(email)
                .fetch_one(&self.pool),
        )
        .await
    }
}

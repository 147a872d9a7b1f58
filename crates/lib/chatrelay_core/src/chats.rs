//! Chat persistence.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::chat::Chat;

/// Errors raised by a [`ChatStore`].
#[derive(Debug, Error)]
pub enum ChatStoreError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl ChatStoreError {
    /// Classify a driver error; pool exhaustion and I/O failures mean the
    /// database could not be reached at all.
    pub fn from_db(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                ChatStoreError::Unavailable(err.to_string())
            }
            other => ChatStoreError::Db(other),
        }
    }
}

/// Lookup and removal of chats.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Fetch a chat by ID. `Ok(None)` when no such chat exists.
    async fn get_chat_by_id(&self, id: &Uuid) -> Result<Option<Chat>, ChatStoreError>;

    /// Delete a chat by ID, returning the removed row.
    ///
    /// `Ok(None)` when the row was already gone.
    async fn delete_chat_by_id(&self, id: &Uuid) -> Result<Option<Chat>, ChatStoreError>;
}

/// PostgreSQL-backed [`ChatStore`].
#[derive(Clone)]
pub struct PgChatStore {
    pool: PgPool,
}

impl PgChatStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatStore for PgChatStore {
    async fn get_chat_by_id(&self, id: &Uuid) -> Result<Option<Chat>, ChatStoreError> {
        let row = sqlx::query_as::<_, Chat>(
            r#"
            SELECT id, user_id, title, visibility, created_at
            FROM chats
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(ChatStoreError::from_db)?;

        Ok(row)
    }

    async fn delete_chat_by_id(&self, id: &Uuid) -> Result<Option<Chat>, ChatStoreError> {
        let row = sqlx::query_as::<_, Chat>(
            r#"
            DELETE FROM chats
            WHERE id = $1
            RETURNING id, user_id, title, visibility, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(ChatStoreError::from_db)?;

        Ok(row)
    }
}

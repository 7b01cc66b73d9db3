//! Persistence of completed responses.

use async_trait::async_trait;

use crate::response::{Response, UserId};

pub mod sqlite;

pub use sqlite::{SqliteIdentity, SqliteStore};

#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid data: {0}")]
    Invalid(String),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store lock poisoned")]
    Poisoned,
    #[error("task join error: {0}")]
    Join(String),
    #[error("serialization error: {0}")]
    Serde(String),
}

impl CollaboratorError {
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        CollaboratorError::PermissionDenied(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        CollaboratorError::NotFound(msg.into())
    }
}

/// Shared collection of responses, one per owner.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Insert or replace the response owned by `response.user_id`.
    async fn upsert_response(&self, response: &Response) -> Result<(), CollaboratorError>;

    /// All responses in insertion order.
    async fn list_responses(&self) -> Result<Vec<Response>, CollaboratorError>;

    async fn delete_response(&self, id: &UserId) -> Result<(), CollaboratorError>;
}

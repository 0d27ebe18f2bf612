//! Infrastructure traits, used for DI on higher levels
//!
//! Every query is scoped by `user_id`. Listings are newest first; `limit: None` returns all.

use crate::infrastructure::entities;
use crate::infrastructure::repositories::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Append-only: messages are never updated or deleted.
    async fn insert_message(
        &self,
        message: entities::ChatMessage,
    ) -> Result<entities::ChatMessage, RepositoryError>;

    async fn recent_messages(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<entities::ChatMessage>, RepositoryError>;
}

#[async_trait]
pub trait MoodLogRepository: Send + Sync {
    async fn insert_mood_log(
        &self,
        log: entities::MoodLog,
    ) -> Result<entities::MoodLog, RepositoryError>;

    async fn recent_mood_logs(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<entities::MoodLog>, RepositoryError>;
}

#[async_trait]
pub trait JournalRepository: Send + Sync {
    async fn insert_entry(
        &self,
        entry: entities::JournalEntry,
    ) -> Result<entities::JournalEntry, RepositoryError>;

    async fn recent_entries(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<entities::JournalEntry>, RepositoryError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_profile(&self, user_id: Uuid)
    -> Result<Option<entities::Profile>, RepositoryError>;

    /// Creates the profile or overwrites its avatar fields wholesale.
    async fn upsert_avatar(
        &self,
        profile: entities::Profile,
    ) -> Result<entities::Profile, RepositoryError>;
}

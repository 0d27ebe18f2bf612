//! DB Repository abstractions

use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{ChatMessage, JournalEntry, MoodLog, Profile};
use crate::infrastructure::traits::{
    JournalRepository, MessageRepository, MoodLogRepository, ProfileRepository,
};
use async_trait::async_trait;
use di::{Ref, injectable};
use log::error;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored record is unreadable: {0}")]
    Corrupt(String),
}

fn logged(e: sqlx::Error) -> RepositoryError {
    error!("{e}");
    RepositoryError::Database(e)
}

// SQLite treats a negative LIMIT as "no limit".
fn sql_limit(limit: Option<u32>) -> i64 {
    limit.map(i64::from).unwrap_or(-1)
}

#[injectable(MessageRepository)]
pub struct DbMessageRepository {
    connection: Ref<DatabaseConnection>,
}

#[async_trait]
impl MessageRepository for DbMessageRepository {
    async fn insert_message(&self, message: ChatMessage) -> Result<ChatMessage, RepositoryError> {
        sqlx::query_as(
            "INSERT INTO chat_messages (id, user_id, role, content, detected_mood, created_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
        )
            .bind(message.id)
            .bind(message.user_id)
            .bind(message.role)
            .bind(message.content)
            .bind(message.detected_mood)
            .bind(message.created_at)
            .fetch_one(&**self.connection)
            .await
            .map_err(logged)
    }

    async fn recent_messages(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        sqlx::query_as(
            "SELECT * FROM chat_messages WHERE user_id = ? ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
            .bind(user_id)
            .bind(sql_limit(limit))
            .fetch_all(&**self.connection)
            .await
            .map_err(logged)
    }
}

#[injectable(MoodLogRepository)]
pub struct DbMoodLogRepository {
    connection: Ref<DatabaseConnection>,
}

#[async_trait]
impl MoodLogRepository for DbMoodLogRepository {
    async fn insert_mood_log(&self, log: MoodLog) -> Result<MoodLog, RepositoryError> {
        sqlx::query_as(
            "INSERT INTO mood_logs (id, user_id, mood, intensity, notes, created_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
        )
            .bind(log.id)
            .bind(log.user_id)
            .bind(log.mood)
            .bind(log.intensity)
            .bind(log.notes)
            .bind(log.created_at)
            .fetch_one(&**self.connection)
            .await
            .map_err(logged)
    }

    async fn recent_mood_logs(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<MoodLog>, RepositoryError> {
        sqlx::query_as(
            "SELECT * FROM mood_logs WHERE user_id = ? ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
            .bind(user_id)
            .bind(sql_limit(limit))
            .fetch_all(&**self.connection)
            .await
            .map_err(logged)
    }
}

#[injectable(JournalRepository)]
pub struct DbJournalRepository {
    connection: Ref<DatabaseConnection>,
}

#[async_trait]
impl JournalRepository for DbJournalRepository {
    async fn insert_entry(&self, entry: JournalEntry) -> Result<JournalEntry, RepositoryError> {
        sqlx::query_as(
            "INSERT INTO journal_entries (id, user_id, title, content, mood, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
            .bind(entry.id)
            .bind(entry.user_id)
            .bind(entry.title)
            .bind(entry.content)
            .bind(entry.mood)
            .bind(entry.created_at)
            .bind(entry.updated_at)
            .fetch_one(&**self.connection)
            .await
            .map_err(logged)
    }

    async fn recent_entries(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<JournalEntry>, RepositoryError> {
        sqlx::query_as(
            "SELECT * FROM journal_entries WHERE user_id = ? ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
            .bind(user_id)
            .bind(sql_limit(limit))
            .fetch_all(&**self.connection)
            .await
            .map_err(logged)
    }
}

#[injectable(ProfileRepository)]
pub struct DbProfileRepository {
    connection: Ref<DatabaseConnection>,
}

#[async_trait]
impl ProfileRepository for DbProfileRepository {
    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, RepositoryError> {
        sqlx::query_as("SELECT * FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&**self.connection)
            .await
            .map_err(logged)
    }

    async fn upsert_avatar(&self, profile: Profile) -> Result<Profile, RepositoryError> {
        sqlx::query_as(
            "INSERT INTO profiles (user_id, avatar_customization, avatar_url, created_at, updated_at) VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT (user_id) DO UPDATE SET avatar_customization = excluded.avatar_customization, avatar_url = excluded.avatar_url, updated_at = excluded.updated_at \
             RETURNING *",
        )
            .bind(profile.user_id)
            .bind(profile.avatar_customization)
            .bind(profile.avatar_url)
            .bind(profile.created_at)
            .bind(profile.updated_at)
            .fetch_one(&**self.connection)
            .await
            .map_err(logged)
    }
}

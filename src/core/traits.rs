//! DI "Interfaces"

use crate::core::avatar::AvatarProfile;
use crate::core::error::CompanionError;
use crate::core::mood::{Mood, MoodSummary};
use crate::core::proxy::{ChatReply, ChatRequest};
use crate::infrastructure::entities;
use async_trait::async_trait;
use uuid::Uuid;

/// Number of mood logs the dashboard summarises.
pub const MOOD_SUMMARY_WINDOW: u32 = 10;

/// Intensity recorded when a mood comes from a chat turn rather than the user.
pub const DEFAULT_MOOD_INTENSITY: u8 = 7;

#[async_trait]
pub trait ChatProxy: Send + Sync {
    /// Sends one message plus trailing history upstream and returns the cleaned reply.
    ///
    /// Stateless: nothing is persisted and failures are never retried.
    async fn complete(&self, request: ChatRequest) -> Result<ChatReply, CompanionError>;
}

/// Outcome of one chat turn.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub user_message: entities::ChatMessage,
    pub assistant_message: entities::ChatMessage,
    /// Label as reported by the model, possibly outside the closed set.
    pub detected_mood: String,
    pub mood: Mood,
    /// Persistence problems that did not stop the turn.
    pub warnings: Vec<String>,
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Stores the user message, asks the proxy for a reply, then stores the reply and a mood log.
    ///
    /// Returns `Err` for empty messages and proxy failures. Storage failures after
    /// validation only add to [`ChatTurn::warnings`].
    async fn send_message(&self, user_id: Uuid, message: String)
    -> Result<ChatTurn, CompanionError>;

    /// Stored messages in chronological order, the most recent `limit` of them.
    async fn list_messages(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<entities::ChatMessage>, CompanionError>;
}

#[derive(Debug, Clone)]
pub struct NewMoodLog {
    pub mood: Mood,
    pub intensity: Option<u8>,
    pub notes: Option<String>,
}

#[async_trait]
pub trait MoodService: Send + Sync {
    /// Returns `Err` if the intensity is outside 1..=10.
    async fn log_mood(
        &self,
        user_id: Uuid,
        log: NewMoodLog,
    ) -> Result<entities::MoodLog, CompanionError>;

    /// Newest first.
    async fn history(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<entities::MoodLog>, CompanionError>;

    /// Current mood and trend over the last [`MOOD_SUMMARY_WINDOW`] logs.
    async fn summary(&self, user_id: Uuid) -> Result<MoodSummary, CompanionError>;
}

#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    pub title: Option<String>,
    pub content: String,
    pub mood: Option<Mood>,
}

#[async_trait]
pub trait JournalService: Send + Sync {
    /// Returns `Err` if the content is blank. A blank title becomes "Untitled Entry".
    async fn create_entry(
        &self,
        user_id: Uuid,
        entry: NewJournalEntry,
    ) -> Result<entities::JournalEntry, CompanionError>;

    /// Newest first.
    async fn list_entries(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<entities::JournalEntry>, CompanionError>;
}

#[async_trait]
pub trait AvatarService: Send + Sync {
    /// The saved profile, or the default look if nothing was saved yet.
    async fn profile(&self, user_id: Uuid) -> Result<AvatarProfile, CompanionError>;

    /// Replaces the whole saved profile.
    async fn save_profile(
        &self,
        user_id: Uuid,
        profile: AvatarProfile,
    ) -> Result<AvatarProfile, CompanionError>;
}

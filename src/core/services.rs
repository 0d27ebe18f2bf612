//! Implementations for the service the app needs.
//!

use crate::core::avatar::{AvatarCustomization, AvatarProfile};
use crate::core::error::CompanionError;
use crate::core::mood::{Mood, MoodSummary};
use crate::core::prompt::{self, HISTORY_WINDOW};
use crate::core::proxy::ChatRequest;
use crate::core::traits::{
    AvatarService, ChatProxy, ChatService, ChatTurn, DEFAULT_MOOD_INTENSITY, JournalService,
    MOOD_SUMMARY_WINDOW, MoodService, NewJournalEntry, NewMoodLog,
};
use crate::infrastructure::entities::{self, MessageRole};
use crate::infrastructure::repositories::RepositoryError;
use crate::infrastructure::traits::{
    JournalRepository, MessageRepository, MoodLogRepository, ProfileRepository,
};
use async_trait::async_trait;
use chrono::Utc;
use di::{Ref, injectable};
use log::{info, warn};
use uuid::Uuid;

pub const UNTITLED_ENTRY: &str = "Untitled Entry";

#[injectable(ChatService)]
pub struct CompanionChatService {
    proxy: Ref<dyn ChatProxy>,
    messages: Ref<dyn MessageRepository>,
    moods: Ref<dyn MoodLogRepository>,
}

impl CompanionChatService {
    pub fn new(
        proxy: Ref<dyn ChatProxy>,
        messages: Ref<dyn MessageRepository>,
        moods: Ref<dyn MoodLogRepository>,
    ) -> Self {
        Self {
            proxy,
            messages,
            moods,
        }
    }

    async fn recent_history(
        &self,
        user_id: Uuid,
        warnings: &mut Vec<String>,
    ) -> Vec<prompt::ChatMessage> {
        match self
            .messages
            .recent_messages(user_id, Some(HISTORY_WINDOW as u32))
            .await
        {
            Ok(recent) => recent.into_iter().rev().map(prompt::ChatMessage::from).collect(),
            Err(e) => {
                warn!("continuing without history for {user_id}: {e}");
                warnings.push("Earlier messages could not be loaded.".to_owned());
                Vec::new()
            }
        }
    }

    async fn store_message(
        &self,
        message: entities::ChatMessage,
        warnings: &mut Vec<String>,
        warning: &str,
    ) -> entities::ChatMessage {
        match self.messages.insert_message(message.clone()).await {
            Ok(saved) => saved,
            Err(e) => {
                warn!("failed to store {:?} message {}: {e}", message.role, message.id);
                warnings.push(warning.to_owned());
                message
            }
        }
    }
}

fn new_message(
    user_id: Uuid,
    role: MessageRole,
    content: String,
    detected_mood: Option<Mood>,
) -> entities::ChatMessage {
    entities::ChatMessage {
        id: Uuid::new_v4(),
        user_id,
        role,
        content,
        detected_mood: detected_mood.map(|mood| mood.as_str().to_owned()),
        created_at: Utc::now(),
    }
}

#[async_trait]
impl ChatService for CompanionChatService {
    async fn send_message(
        &self,
        user_id: Uuid,
        message: String,
    ) -> Result<ChatTurn, CompanionError> {
        if message.trim().is_empty() {
            return Err(CompanionError::invalid("message must not be empty"));
        }

        let mut warnings = Vec::new();
        let history = self.recent_history(user_id, &mut warnings).await;

        let user_message = self
            .store_message(
                new_message(user_id, MessageRole::User, message.clone(), None),
                &mut warnings,
                "Your message could not be saved.",
            )
            .await;

        let reply = self.proxy.complete(ChatRequest { message, history }).await?;
        let mood = Mood::from_label(&reply.detected_mood);

        let assistant_message = self
            .store_message(
                new_message(user_id, MessageRole::Assistant, reply.response, Some(mood)),
                &mut warnings,
                "The reply could not be saved.",
            )
            .await;

        let log = entities::MoodLog {
            id: Uuid::new_v4(),
            user_id,
            mood: mood.as_str().to_owned(),
            intensity: i64::from(DEFAULT_MOOD_INTENSITY),
            notes: None,
            created_at: Utc::now(),
        };
        if let Err(e) = self.moods.insert_mood_log(log).await {
            warn!("failed to log mood {mood} for {user_id}: {e}");
            warnings.push("Your mood could not be logged.".to_owned());
        }

        Ok(ChatTurn {
            user_message,
            assistant_message,
            detected_mood: reply.detected_mood,
            mood,
            warnings,
        })
    }

    async fn list_messages(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<entities::ChatMessage>, CompanionError> {
        let mut messages = self.messages.recent_messages(user_id, limit).await?;
        messages.reverse();
        Ok(messages)
    }
}

#[injectable(MoodService)]
pub struct CompanionMoodService {
    moods: Ref<dyn MoodLogRepository>,
}

impl CompanionMoodService {
    pub fn new(moods: Ref<dyn MoodLogRepository>) -> Self {
        Self { moods }
    }
}

#[async_trait]
impl MoodService for CompanionMoodService {
    async fn log_mood(
        &self,
        user_id: Uuid,
        log: NewMoodLog,
    ) -> Result<entities::MoodLog, CompanionError> {
        let intensity = log.intensity.unwrap_or(DEFAULT_MOOD_INTENSITY);
        if !(1..=10).contains(&intensity) {
            return Err(CompanionError::invalid(
                "intensity must be between 1 and 10",
            ));
        }

        let saved = self
            .moods
            .insert_mood_log(entities::MoodLog {
                id: Uuid::new_v4(),
                user_id,
                mood: log.mood.as_str().to_owned(),
                intensity: i64::from(intensity),
                notes: log.notes.filter(|notes| !notes.trim().is_empty()),
                created_at: Utc::now(),
            })
            .await?;

        info!("logged mood {} for {user_id}", log.mood);
        Ok(saved)
    }

    async fn history(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<entities::MoodLog>, CompanionError> {
        Ok(self.moods.recent_mood_logs(user_id, limit).await?)
    }

    async fn summary(&self, user_id: Uuid) -> Result<MoodSummary, CompanionError> {
        let logs = self
            .moods
            .recent_mood_logs(user_id, Some(MOOD_SUMMARY_WINDOW))
            .await?;

        Ok(MoodSummary::from_logs(
            logs.iter().map(|log| Mood::from_label(&log.mood)),
        ))
    }
}

#[injectable(JournalService)]
pub struct CompanionJournalService {
    journal: Ref<dyn JournalRepository>,
}

impl CompanionJournalService {
    pub fn new(journal: Ref<dyn JournalRepository>) -> Self {
        Self { journal }
    }
}

#[async_trait]
impl JournalService for CompanionJournalService {
    async fn create_entry(
        &self,
        user_id: Uuid,
        entry: NewJournalEntry,
    ) -> Result<entities::JournalEntry, CompanionError> {
        if entry.content.trim().is_empty() {
            return Err(CompanionError::invalid("journal entry must not be empty"));
        }

        let title = entry
            .title
            .map(|title| title.trim().to_owned())
            .filter(|title| !title.is_empty())
            .unwrap_or(UNTITLED_ENTRY.to_owned());
        let now = Utc::now();

        Ok(self
            .journal
            .insert_entry(entities::JournalEntry {
                id: Uuid::new_v4(),
                user_id,
                title,
                content: entry.content,
                mood: entry.mood.map(|mood| mood.as_str().to_owned()),
                created_at: now,
                updated_at: now,
            })
            .await?)
    }

    async fn list_entries(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<entities::JournalEntry>, CompanionError> {
        Ok(self.journal.recent_entries(user_id, limit).await?)
    }
}

#[injectable(AvatarService)]
pub struct CompanionAvatarService {
    profiles: Ref<dyn ProfileRepository>,
}

impl CompanionAvatarService {
    pub fn new(profiles: Ref<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }
}

fn decode_profile(profile: entities::Profile) -> Result<AvatarProfile, CompanionError> {
    let customization = match profile.avatar_customization {
        Some(json) => serde_json::from_str::<AvatarCustomization>(&json).map_err(|e| {
            RepositoryError::Corrupt(format!(
                "avatar customization of {}: {e}",
                profile.user_id
            ))
        })?,
        None => AvatarCustomization::default(),
    };

    Ok(AvatarProfile {
        customization,
        model_url: profile.avatar_url,
    })
}

fn validate_model_url(url: &str) -> Result<(), CompanionError> {
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(CompanionError::invalid(format!(
            "model_url must be an http(s) URL, got `{url}`"
        ))),
    }
}

#[async_trait]
impl AvatarService for CompanionAvatarService {
    async fn profile(&self, user_id: Uuid) -> Result<AvatarProfile, CompanionError> {
        match self.profiles.find_profile(user_id).await? {
            Some(profile) => decode_profile(profile),
            None => Ok(AvatarProfile::default()),
        }
    }

    async fn save_profile(
        &self,
        user_id: Uuid,
        profile: AvatarProfile,
    ) -> Result<AvatarProfile, CompanionError> {
        if let Some(field) = profile.customization.invalid_color() {
            return Err(CompanionError::invalid(format!(
                "{field} must be a #rrggbb colour"
            )));
        }
        let model_url = profile
            .model_url
            .map(|url| url.trim().to_owned())
            .filter(|url| !url.is_empty());
        if let Some(url) = &model_url {
            validate_model_url(url)?;
        }

        let customization = serde_json::to_string(&profile.customization)
            .map_err(|e| CompanionError::Internal(format!("avatar customization: {e}")))?;
        let now = Utc::now();

        let saved = self
            .profiles
            .upsert_avatar(entities::Profile {
                user_id,
                avatar_customization: Some(customization),
                avatar_url: model_url,
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!("saved avatar for {user_id}");
        decode_profile(saved)
    }
}

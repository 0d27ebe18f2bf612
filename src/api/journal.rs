//! Journal endpoints

use crate::api::{ExtractUser, JsonBody, ListQuery, QueryParams};
use crate::core::error::CompanionError;
use crate::core::traits::{JournalService, NewJournalEntry};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new().route("/", get(list_entries).post(create_entry))
}

async fn list_entries(
    Inject(journal_service): Inject<dyn JournalService>,
    ExtractUser(current_user): ExtractUser,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Json<schemas::EntryList>, CompanionError> {
    let entries = journal_service
        .list_entries(current_user, query.limit)
        .await?;

    Ok(Json(schemas::EntryList {
        entries: entries.into_iter().map(schemas::Entry::from).collect(),
    }))
}

async fn create_entry(
    Inject(journal_service): Inject<dyn JournalService>,
    ExtractUser(current_user): ExtractUser,
    JsonBody(create): JsonBody<schemas::CreateEntry>,
) -> Result<(StatusCode, Json<schemas::Entry>), CompanionError> {
    let entry = journal_service
        .create_entry(
            current_user,
            NewJournalEntry {
                title: create.title,
                content: create.content,
                mood: create.mood,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(entry.into())))
}

pub mod schemas {
    use crate::core::mood::Mood;
    use crate::infrastructure::entities;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Deserialize, Debug)]
    pub struct CreateEntry {
        pub title: Option<String>,
        pub content: String,
        pub mood: Option<Mood>,
    }

    #[derive(Serialize, Debug)]
    pub struct Entry {
        pub id: Uuid,
        pub title: String,
        pub content: String,
        pub mood: Option<Mood>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    impl From<entities::JournalEntry> for Entry {
        fn from(entry: entities::JournalEntry) -> Self {
            Entry {
                id: entry.id,
                title: entry.title,
                content: entry.content,
                mood: entry.mood.as_deref().map(Mood::from_label),
                created_at: entry.created_at,
                updated_at: entry.updated_at,
            }
        }
    }

    #[derive(Serialize, Debug, Default)]
    pub struct EntryList {
        pub entries: Vec<Entry>,
    }
}

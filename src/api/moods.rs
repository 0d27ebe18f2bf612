//! Mood history endpoints

use crate::api::{ExtractUser, JsonBody, ListQuery, QueryParams};
use crate::core::error::CompanionError;
use crate::core::mood::MoodSummary;
use crate::core::traits::{MoodService, NewMoodLog};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new()
        .route("/", get(mood_history).post(log_mood))
        .route("/summary", get(mood_summary))
}

async fn mood_history(
    Inject(mood_service): Inject<dyn MoodService>,
    ExtractUser(current_user): ExtractUser,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Json<schemas::MoodLogList>, CompanionError> {
    let logs = mood_service.history(current_user, query.limit).await?;

    Ok(Json(schemas::MoodLogList {
        logs: logs.into_iter().map(schemas::MoodLog::from).collect(),
    }))
}

async fn log_mood(
    Inject(mood_service): Inject<dyn MoodService>,
    ExtractUser(current_user): ExtractUser,
    JsonBody(create): JsonBody<schemas::CreateMoodLog>,
) -> Result<(StatusCode, Json<schemas::MoodLog>), CompanionError> {
    let log = mood_service
        .log_mood(
            current_user,
            NewMoodLog {
                mood: create.mood,
                intensity: create.intensity,
                notes: create.notes,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(log.into())))
}

async fn mood_summary(
    Inject(mood_service): Inject<dyn MoodService>,
    ExtractUser(current_user): ExtractUser,
) -> Result<Json<MoodSummary>, CompanionError> {
    Ok(Json(mood_service.summary(current_user).await?))
}

pub mod schemas {
    use crate::core::mood::Mood;
    use crate::infrastructure::entities;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Deserialize, Debug)]
    pub struct CreateMoodLog {
        pub mood: Mood,
        pub intensity: Option<u8>,
        pub notes: Option<String>,
    }

    #[derive(Serialize, Debug)]
    pub struct MoodLog {
        pub id: Uuid,
        pub mood: Mood,
        pub intensity: i64,
        pub notes: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    impl From<entities::MoodLog> for MoodLog {
        fn from(log: entities::MoodLog) -> Self {
            MoodLog {
                id: log.id,
                mood: Mood::from_label(&log.mood),
                intensity: log.intensity,
                notes: log.notes,
                created_at: log.created_at,
            }
        }
    }

    #[derive(Serialize, Debug, Default)]
    pub struct MoodLogList {
        pub logs: Vec<MoodLog>,
    }
}

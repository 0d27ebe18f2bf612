//! Chat endpoints: the stateless mood proxy and the stored conversation.

use crate::api::{ExtractUser, JsonBody, ListQuery, QueryParams, error_response};
use crate::core::error::CompanionError;
use crate::core::proxy::ChatRequest;
use crate::core::traits::{ChatProxy, ChatService};
use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use di_axum::Inject;
use log::{error, warn};

pub fn router() -> Router {
    Router::new()
        .route("/chat-ai", post(chat_ai))
        .route("/chat/messages", get(list_messages).post(send_message))
}

/// Proxy contract: 200 with the reply, 429 and 402 for quota problems, 504 on timeout and
/// 500 for everything else, including unreadable or empty input.
async fn chat_ai(Inject(proxy): Inject<dyn ChatProxy>, body: Bytes) -> Response {
    let request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            return proxy_failure(CompanionError::invalid(format!(
                "invalid request body: {e}"
            )));
        }
    };

    match proxy.complete(request).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(e) => proxy_failure(e),
    }
}

fn proxy_failure(e: CompanionError) -> Response {
    let status = match e {
        CompanionError::InvalidInput(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ref other => other.status_code(),
    };
    if status.is_server_error() && !e.is_upstream() {
        error!("chat-ai failed with {status}: {e}");
    } else {
        warn!("chat-ai failed with {status}: {e}");
    }

    error_response(status, e.public_message())
}

async fn send_message(
    Inject(chat_service): Inject<dyn ChatService>,
    ExtractUser(current_user): ExtractUser,
    JsonBody(message): JsonBody<schemas::SendMessage>,
) -> Result<Json<schemas::ChatTurn>, CompanionError> {
    let turn = chat_service
        .send_message(current_user, message.message)
        .await?;

    Ok(Json(turn.into()))
}

async fn list_messages(
    Inject(chat_service): Inject<dyn ChatService>,
    ExtractUser(current_user): ExtractUser,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Json<schemas::MessagesList>, CompanionError> {
    let messages = chat_service
        .list_messages(current_user, query.limit)
        .await?;

    Ok(Json(schemas::MessagesList {
        messages: messages.into_iter().map(schemas::Message::from).collect(),
    }))
}

pub mod schemas {
    use crate::core::avatar::MoodPose;
    use crate::core::mood::Mood;
    use crate::core::traits;
    use crate::infrastructure::entities;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Deserialize, Debug)]
    pub struct SendMessage {
        pub message: String,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        User,
        Assistant,
    }

    impl From<entities::MessageRole> for Role {
        fn from(role: entities::MessageRole) -> Self {
            match role {
                entities::MessageRole::User => Role::User,
                entities::MessageRole::Assistant => Role::Assistant,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct Message {
        pub id: Uuid,
        pub role: Role,
        pub content: String,
        pub detected_mood: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    impl From<entities::ChatMessage> for Message {
        fn from(message: entities::ChatMessage) -> Self {
            Message {
                id: message.id,
                role: message.role.into(),
                content: message.content,
                detected_mood: message.detected_mood,
                created_at: message.created_at,
            }
        }
    }

    #[derive(Serialize, Debug, Default)]
    pub struct MessagesList {
        pub messages: Vec<Message>,
    }

    #[derive(Serialize, Debug)]
    pub struct ChatTurn {
        pub user_message: Message,
        pub assistant_message: Message,
        /// Label as the model reported it.
        pub detected_mood: String,
        /// Member of the closed set the avatar and dashboard render.
        pub mood: Mood,
        pub pose: MoodPose,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        pub warnings: Vec<String>,
    }

    impl From<traits::ChatTurn> for ChatTurn {
        fn from(turn: traits::ChatTurn) -> Self {
            ChatTurn {
                user_message: turn.user_message.into(),
                assistant_message: turn.assistant_message.into(),
                detected_mood: turn.detected_mood,
                mood: turn.mood,
                pose: MoodPose::for_mood(turn.mood),
                warnings: turn.warnings,
            }
        }
    }
}

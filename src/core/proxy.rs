//! Chat-mood proxy: one completion call per message, mood parsed out of the reply.
//!

use crate::config::GatewayConfig;
use crate::core::error::CompanionError;
use crate::core::mood::extract_mood;
use crate::core::prompt::{self, ChatMessage};
use crate::core::traits::ChatProxy;
use async_trait::async_trait;
use di::{Ref, inject, injectable};
use log::{debug, info, warn};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub detected_mood: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Maps a non-success gateway status onto the caller-facing failure kinds.
pub fn classify_status(status: StatusCode) -> CompanionError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => CompanionError::RateLimited,
        StatusCode::PAYMENT_REQUIRED => CompanionError::QuotaExhausted,
        other => CompanionError::Upstream(format!("AI Gateway error: {}", other.as_u16())),
    }
}

pub struct GatewayChatProxy {
    config: Ref<GatewayConfig>,
    client: reqwest::Client,
}

#[injectable(ChatProxy)]
impl GatewayChatProxy {
    #[inject]
    pub fn create(config: Ref<GatewayConfig>) -> GatewayChatProxy {
        GatewayChatProxy {
            config,
            client: reqwest::Client::new(),
        }
    }
}

impl GatewayChatProxy {
    pub fn new(config: GatewayConfig) -> GatewayChatProxy {
        Self::create(Ref::new(config))
    }

    async fn call_gateway(
        &self,
        api_key: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<String, CompanionError> {
        let body = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(api_key)
            .timeout(self.config.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("AI Gateway returned {status}");
            return Err(classify_status(status));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| self.transport_error(e))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(CompanionError::Upstream(
                "AI Gateway returned no completion".to_owned(),
            ))
    }

    fn transport_error(&self, e: reqwest::Error) -> CompanionError {
        if e.is_timeout() {
            warn!("AI Gateway timed out after {:?}", self.config.timeout);
            CompanionError::Timeout(self.config.timeout.as_secs())
        } else {
            warn!("AI Gateway request failed: {e}");
            CompanionError::Upstream(format!("AI Gateway request failed: {e}"))
        }
    }
}

#[async_trait]
impl ChatProxy for GatewayChatProxy {
    async fn complete(&self, request: ChatRequest) -> Result<ChatReply, CompanionError> {
        if request.message.trim().is_empty() {
            return Err(CompanionError::invalid("message must not be empty"));
        }

        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(CompanionError::Upstream(
                "LLM_GATEWAY_API_KEY not configured".to_owned(),
            ))?;

        let system_prompt = prompt::render_system_prompt()
            .map_err(|e| CompanionError::Internal(format!("system prompt: {e}")))?;
        let messages = prompt::compose(&system_prompt, &request.history, &request.message);
        debug!(
            "forwarding {} messages ({} history turns)",
            messages.len(),
            messages.len() - 2
        );

        let started = Instant::now();
        let completion = self.call_gateway(api_key, messages).await?;
        let extraction = extract_mood(&completion);

        info!(
            "completion received in {:.2}s, detected mood: {}",
            started.elapsed().as_secs_f32(),
            extraction.detected_mood
        );

        Ok(ChatReply {
            response: extraction.response,
            detected_mood: extraction.detected_mood,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_gateway_statuses() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            CompanionError::RateLimited
        ));
        assert!(matches!(
            classify_status(StatusCode::PAYMENT_REQUIRED),
            CompanionError::QuotaExhausted
        ));
        match classify_status(StatusCode::SERVICE_UNAVAILABLE) {
            CompanionError::Upstream(message) => assert_eq!(message, "AI Gateway error: 503"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn request_history_is_optional() {
        let request: ChatRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert_eq!(request.message, "hi");
        assert!(request.history.is_empty());
    }

    #[test]
    fn history_ignores_extra_fields() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"message": "hi", "history": [{"role": "assistant", "content": "hey", "mood": "happy"}]}"#,
        )
        .unwrap();
        assert_eq!(request.history.len(), 1);
    }

    #[tokio::test]
    async fn empty_message_never_reaches_gateway() {
        // unroutable gateway: any network attempt would fail with Upstream, not InvalidInput
        let proxy = GatewayChatProxy::new(GatewayConfig::for_endpoint(
            "http://127.0.0.1:9",
            Some("key".into()),
        ));

        let result = proxy
            .complete(ChatRequest {
                message: "   \n".into(),
                history: vec![],
            })
            .await;
        assert!(matches!(result, Err(CompanionError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn missing_api_key_is_a_generic_failure() {
        let proxy = GatewayChatProxy::new(GatewayConfig::for_endpoint("http://127.0.0.1:9", None));

        let result = proxy
            .complete(ChatRequest {
                message: "hello".into(),
                history: vec![],
            })
            .await;
        match result {
            Err(CompanionError::Upstream(message)) => {
                assert_eq!(message, "LLM_GATEWAY_API_KEY not configured")
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

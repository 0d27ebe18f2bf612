//! Outbound prompt composition for the mood companion.

use crate::core::mood::Mood;
use crate::infrastructure::entities;
use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};

/// Number of prior turns forwarded with each message. Older turns are dropped.
pub const HISTORY_WINDOW: usize = 5;

pub const MOOD_MARKER: &str = "DETECTED_MOOD:";

const PERSONA: &str = "MoodEmoji";

/// Order in which the prompt names the moods, most common first.
const PROMPT_MOODS: [Mood; 10] = [
    Mood::Happy,
    Mood::Sad,
    Mood::Angry,
    Mood::Anxious,
    Mood::Excited,
    Mood::Calm,
    Mood::Lonely,
    Mood::Joyful,
    Mood::Jealous,
    Mood::Neutral,
];

const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are {{ persona }}, an empathetic AI companion that responds to users' emotional states.

Guidelines:
- Detect the user's mood from their message ({{ moods | join(", ") }})
- Respond with empathy matching their emotional state
- Be supportive, warm, and caring
- Keep responses concise but meaningful
- Use appropriate emojis to match the mood
{% for mood, tone in tones %}
- If they're {{ mood }}: {{ tone }}
{% endfor %}

At the end of your response, add a line starting with "{{ marker }}" followed by the detected mood (lowercase, one word)."#;

const TONES: [(&str, &str); 4] = [
    ("happy", "be cheerful and enthusiastic"),
    ("sad", "be gentle and supportive"),
    ("angry", "be calming and understanding"),
    ("anxious", "be reassuring and comforting"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<entities::ChatMessage> for ChatMessage {
    fn from(m: entities::ChatMessage) -> Self {
        Self {
            content: m.content,
            role: match m.role {
                entities::MessageRole::User => Role::User,
                entities::MessageRole::Assistant => Role::Assistant,
            },
        }
    }
}

pub fn render_system_prompt() -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.add_template("system", SYSTEM_PROMPT_TEMPLATE)?;

    let moods: Vec<&str> = PROMPT_MOODS.iter().map(Mood::as_str).collect();
    env.get_template("system")?.render(context! {
        persona => PERSONA,
        moods => moods,
        tones => TONES.to_vec(),
        marker => MOOD_MARKER,
    })
}

/// The last [`HISTORY_WINDOW`] turns of `history`, in their original order.
pub fn truncate_history(history: &[ChatMessage]) -> &[ChatMessage] {
    history
        .get(history.len().saturating_sub(HISTORY_WINDOW)..)
        .unwrap_or_default()
}

/// `[system, ...last turns, user]`, the message list sent to the gateway.
pub fn compose(system_prompt: &str, history: &[ChatMessage], message: &str) -> Vec<ChatMessage> {
    let window = truncate_history(history);

    let mut messages = Vec::with_capacity(window.len() + 2);
    messages.push(ChatMessage::new(Role::System, system_prompt));
    messages.extend(window.iter().cloned());
    messages.push(ChatMessage::new(Role::User, message));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turns(count: usize) -> Vec<ChatMessage> {
        (0..count)
            .map(|i| {
                let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
                ChatMessage::new(role, format!("turn {i}"))
            })
            .collect()
    }

    #[test]
    fn system_prompt_lists_moods_and_marker() {
        let prompt = render_system_prompt().unwrap();
        assert!(prompt.starts_with("You are MoodEmoji"));
        assert!(prompt.contains(
            "(happy, sad, angry, anxious, excited, calm, lonely, joyful, jealous, neutral)"
        ));
        assert!(prompt.contains("- If they're anxious: be reassuring and comforting"));
        assert!(prompt.ends_with(
            "add a line starting with \"DETECTED_MOOD:\" followed by the detected mood (lowercase, one word)."
        ));
    }

    #[test]
    fn prompt_names_every_mood_once() {
        for mood in Mood::ALL {
            assert!(PROMPT_MOODS.contains(&mood), "{mood} missing from prompt");
        }
        assert_eq!(PROMPT_MOODS.len(), Mood::ALL.len());
    }

    #[test]
    fn short_history_is_kept_whole() {
        let history = turns(3);
        assert_eq!(truncate_history(&history), history.as_slice());
        assert!(truncate_history(&[]).is_empty());
    }

    #[test]
    fn long_history_keeps_exactly_the_last_five() {
        let history = turns(12);
        let window = truncate_history(&history);

        assert_eq!(window.len(), HISTORY_WINDOW);
        let contents: Vec<&str> = window.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["turn 7", "turn 8", "turn 9", "turn 10", "turn 11"]
        );
    }

    #[test]
    fn compose_wraps_window_with_system_and_user() {
        let messages = compose("system prompt", &turns(7), "how are you?");

        assert_eq!(messages.len(), HISTORY_WINDOW + 2);
        assert_eq!(messages[0], ChatMessage::new(Role::System, "system prompt"));
        assert_eq!(messages[1].content, "turn 2");
        assert_eq!(
            messages.last(),
            Some(&ChatMessage::new(Role::User, "how are you?"))
        );
    }

    #[test]
    fn converts_stored_messages() {
        let stored = entities::ChatMessage {
            id: uuid::Uuid::new_v4(),
            user_id: uuid::Uuid::new_v4(),
            role: entities::MessageRole::Assistant,
            content: "Hi there!".to_string(),
            detected_mood: Some("happy".to_string()),
            created_at: chrono::Utc::now(),
        };

        let message: ChatMessage = stored.into();
        assert_eq!(message, ChatMessage::new(Role::Assistant, "Hi there!"));
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_value(ChatMessage::new(Role::Assistant, "hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "hi"}));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ai::parse::{EventPreviewData, TitleHeadline};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: String,
    pub user_id: Option<String>,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(id: String, user_id: Option<String>, title: String) -> Self {
        let now = Utc::now();
        Self { id, user_id, title, created_at: now, updated_at: now }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "USER",
            MessageRole::Assistant => "ASSISTANT",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for MessageRole {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_uppercase().as_str() {
            "USER" => Ok(MessageRole::User),
            "ASSISTANT" => Ok(MessageRole::Assistant),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(conversation_id: String, role: MessageRole, content: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id,
            role,
            content,
            created_at: Utc::now(),
        }
    }
}

// ── Profile read model ────────────────────────────────────────────────────────

/// Profile context fed into prompt assembly. Owned by the profile subsystem;
/// this service only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfileContext {
    pub public: Option<PublicProfile>,
    pub private: Option<PrivateProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfile {
    pub first_name: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivateProfile {
    pub hobbies: Option<String>,
    pub preferences: Option<ProfilePreferences>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilePreferences {
    pub preferred_vibes: Option<Vec<String>>,
}

// ── Events ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub activity: String,
    /// Extra draft fields the assistant proposed, kept as a JSON document.
    pub details: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn new(
        title: String,
        activity: String,
        details: Option<String>,
        created_by: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            activity,
            details,
            created_by,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub created_by: Option<String>,
    #[serde(flatten)]
    pub draft: EventPreviewData,
}

// ── Chat API types ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub conversation_id: Option<String>,
    pub user_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub message: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_headline: Option<TitleHeadline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_draft: Option<EventPreviewData>,
}

// ── WebSocket protocol ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WsChatRequest {
    pub conversation_id: Option<String>,
    pub user_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsEvent {
    TurnStart {
        conversation_id: String,
    },
    Assistant {
        message: Message,
        #[serde(skip_serializing_if = "Option::is_none")]
        title_headline: Option<TitleHeadline>,
        #[serde(skip_serializing_if = "Option::is_none")]
        event_draft: Option<EventPreviewData>,
    },
    Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_storage_string() {
        let role = MessageRole::try_from("assistant".to_string()).unwrap();
        assert_eq!(role, MessageRole::Assistant);
        assert_eq!(role.as_str(), "ASSISTANT");
        assert!(MessageRole::try_from("moderator".to_string()).is_err());
    }

    #[test]
    fn create_event_request_collects_extra_draft_fields() {
        let json = r#"{
            "created_by": "user-1",
            "title": "Sunset hike",
            "activity": "hiking",
            "location": "Table Mountain"
        }"#;
        let request: CreateEventRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.created_by.as_deref(), Some("user-1"));
        assert_eq!(request.draft.title, "Sunset hike");
        assert_eq!(
            request.draft.extra.get("location").and_then(|v| v.as_str()),
            Some("Table Mountain")
        );
    }

    #[test]
    fn ws_events_serialize_with_type_tag() {
        let event = WsEvent::TurnStart { conversation_id: "c1".to_string() };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"turn_start","conversation_id":"c1"}"#);
    }
}

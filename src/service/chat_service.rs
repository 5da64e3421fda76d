use tracing::{error, warn};
use uuid::Uuid;

use crate::ai::extract::extract_text;
use crate::ai::parse::parse_response;
use crate::ai::prompt::build_prompt;
use crate::ai::OllamaAgentService;
use crate::db::conversation_repository::ConversationRepository;
use crate::db::event_repository::EventRepository;
use crate::db::message_repository::MessageRepository;
use crate::db::profile_repository::ProfileRepository;
use crate::errors::AppError;
use crate::models::{
    ChatRequest, ChatResponse, Conversation, CreateEventRequest, Event, Message, MessageRole,
    UserProfileContext,
};

const MAX_MESSAGE_LENGTH: usize = 8000;

/// Everything a chat turn needs once the user message is validated and
/// persisted, before the model call.
pub struct TurnContext {
    pub conversation_id: String,
    pub user_text: String,
    pub history: Vec<Message>,
    pub profile: Option<UserProfileContext>,
}

#[derive(Clone)]
pub struct ChatService {
    conversation_repo: ConversationRepository,
    message_repo: MessageRepository,
    profile_repo: ProfileRepository,
    event_repo: EventRepository,
    agent: OllamaAgentService,
}

impl ChatService {
    pub fn new(
        conversation_repo: ConversationRepository,
        message_repo: MessageRepository,
        profile_repo: ProfileRepository,
        event_repo: EventRepository,
        agent: OllamaAgentService,
    ) -> Self {
        Self { conversation_repo, message_repo, profile_repo, event_repo, agent }
    }

    pub async fn get_conversations(&self) -> Result<Vec<Conversation>, AppError> {
        self.conversation_repo.find_all().await
    }

    pub async fn get_messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Message>, AppError> {
        self.conversation_repo
            .find_by_id(conversation_id)
            .await?
            .ok_or_else(|| AppError::ConversationNotFound {
                id: conversation_id.to_string(),
            })?;
        self.message_repo.find_by_conversation_id(conversation_id).await
    }

    /// Runs one full chat turn.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AppError> {
        let ctx = self.prepare_chat(request).await?;
        self.complete_turn(ctx).await
    }

    /// First half of a turn: validate, resolve or create the conversation,
    /// persist the user message and gather history plus profile context.
    pub async fn prepare_chat(&self, request: ChatRequest) -> Result<TurnContext, AppError> {
        if request.message.trim().is_empty() {
            return Err(AppError::EmptyField { field_name: "message".to_string() });
        }
        if request.message.len() > MAX_MESSAGE_LENGTH {
            return Err(AppError::FieldTooLong {
                field_name: "message".to_string(),
                max_length: MAX_MESSAGE_LENGTH,
                actual_length: request.message.len(),
            });
        }

        let conversation_id = request
            .conversation_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let conversation = match self.conversation_repo.find_by_id(&conversation_id).await? {
            Some(c) => c,
            None => {
                let title = {
                    let t = request.message.trim();
                    if t.chars().count() > 60 {
                        format!("{}…", t.chars().take(60).collect::<String>())
                    } else {
                        t.to_string()
                    }
                };
                let conv =
                    Conversation::new(conversation_id.clone(), request.user_id.clone(), title);
                self.conversation_repo.save(&conv).await?
            }
        };

        let user_message = Message::new(
            conversation_id.clone(),
            MessageRole::User,
            request.message.clone(),
        );
        self.message_repo.save(&user_message).await?;

        // History for the prompt excludes the just-saved user message; the
        // builder appends the current text itself.
        let all_messages = self
            .message_repo
            .find_by_conversation_id(&conversation_id)
            .await?;
        let history: Vec<Message> = all_messages
            .into_iter()
            .filter(|m| m.id != user_message.id)
            .collect();

        let profile_user_id = request.user_id.or(conversation.user_id);
        let profile = match &profile_user_id {
            Some(user_id) => self.profile_repo.find_context(user_id).await?,
            None => None,
        };

        Ok(TurnContext {
            conversation_id,
            user_text: request.message,
            history,
            profile,
        })
    }

    /// Second half of a turn: prompt the model, extract and parse the reply,
    /// persist the assistant message and return the structured result.
    pub async fn complete_turn(&self, ctx: TurnContext) -> Result<ChatResponse, AppError> {
        let prompt = build_prompt(ctx.profile.as_ref(), &ctx.history, &ctx.user_text);

        let raw = self.agent.complete(&ctx.conversation_id, &prompt).await?;
        let text = extract_text(&raw);
        if text.is_empty() {
            warn!("assistant returned no text for conversation {}", ctx.conversation_id);
            return Err(AppError::InferenceError {
                message: "Assistant returned an empty reply".to_string(),
            });
        }

        let parsed = parse_response(&text);
        if parsed.cleaned_text.is_empty()
            && parsed.title_headline.is_none()
            && parsed.event_data.is_none()
        {
            return Err(AppError::InferenceError {
                message: "Assistant returned an empty reply".to_string(),
            });
        }

        let assistant_message = Message::new(
            ctx.conversation_id.clone(),
            MessageRole::Assistant,
            parsed.cleaned_text,
        );
        let assistant_message = self.message_repo.save(&assistant_message).await?;

        // Adopt the proposed title as the conversation name; losing the
        // rename is not worth failing the whole turn over.
        if let Some(title_headline) = &parsed.title_headline {
            if let Err(e) = self
                .conversation_repo
                .update_title(&ctx.conversation_id, &title_headline.title)
                .await
            {
                error!("Failed to adopt proposed conversation title: {e}");
            }
        } else if let Err(e) = self
            .conversation_repo
            .update_timestamp(&ctx.conversation_id)
            .await
        {
            error!("Failed to update conversation timestamp: {e}");
        }

        Ok(ChatResponse {
            conversation_id: ctx.conversation_id,
            message: assistant_message,
            title_headline: parsed.title_headline,
            event_draft: parsed.event_data,
        })
    }

    // ── Events ────────────────────────────────────────────────────────────────

    /// Creates an event from an assistant-proposed (and user-confirmed) draft.
    pub async fn create_event(&self, request: CreateEventRequest) -> Result<Event, AppError> {
        let draft = request.draft;
        if draft.title.trim().is_empty() {
            return Err(AppError::EmptyField { field_name: "title".to_string() });
        }
        if draft.activity.trim().is_empty() {
            return Err(AppError::EmptyField { field_name: "activity".to_string() });
        }

        let details = if draft.extra.is_empty() {
            None
        } else {
            Some(serde_json::Value::Object(draft.extra).to_string())
        };

        let event = Event::new(draft.title, draft.activity, details, request.created_by);
        self.event_repo.save(&event).await
    }

    pub async fn get_events(&self) -> Result<Vec<Event>, AppError> {
        self.event_repo.find_all().await
    }
}

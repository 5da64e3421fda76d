pub mod extract;
pub mod parse;
pub mod prompt;

use rig::client::Nothing;
use rig::completion::Chat;
use rig::message::Message as RigMessage;
use rig::prelude::CompletionClient;
use rig::providers::ollama;
use tracing::error;

use crate::ai::extract::RawAiResult;
use crate::errors::AppError;

const DEFAULT_MODEL: &str = "llama3.2";

/// Service that runs a single completion against a local Ollama model via
/// rig. The assembled prompt already carries the system prompt and the
/// replayed history, so each call is a bare single-message completion.
#[derive(Clone)]
pub struct OllamaAgentService {
    client: ollama::Client,
    base_url: String,
    model: String,
}

impl OllamaAgentService {
    pub fn new(base_url: &str, model: Option<String>) -> Self {
        let client = ollama::Client::builder()
            .api_key(Nothing)
            .base_url(base_url)
            .build()
            .expect("Failed to build Ollama client");
        Self {
            client,
            base_url: base_url.to_string(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    /// Sends one assembled prompt to the model and wraps the reply in the
    /// provider-shape-tolerant [`RawAiResult`].
    pub async fn complete(
        &self,
        conversation_id: &str,
        prompt: &str,
    ) -> Result<RawAiResult, AppError> {
        let agent = self.client.agent(&self.model).build();

        let content = agent
            .chat(prompt, Vec::<RigMessage>::new())
            .await
            .map_err(|e| {
                error!("Ollama inference failed for conversation {conversation_id}: {e}");
                let msg = e.to_string();
                if msg.contains("Connection refused") || msg.contains("connect") {
                    AppError::OllamaUnavailable { host: self.base_url.clone() }
                } else if msg.contains("model") {
                    AppError::ModelNotFound { model_name: self.model.clone() }
                } else {
                    AppError::InferenceError { message: msg }
                }
            })?;

        Ok(RawAiResult::from_text(content))
    }
}

// ABOUTME: AI assistant client generating automatic replies to visitor messages
// ABOUTME: Speaks the chat-completions wire shape; absent configuration means no auto-replies

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::config::environment::AssistantProviderConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{ChatMessage, MessageSender};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Conversation turns sent to the provider, newest last
const MAX_HISTORY_MESSAGES: usize = 20;

/// Reply length ceiling in completion tokens
const MAX_COMPLETION_TOKENS: u32 = 500;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct CompletionMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

/// Client for the AI assistant provider
pub struct AssistantClient {
    config: AssistantProviderConfig,
    http_client: reqwest::Client,
}

impl AssistantClient {
    /// Create a new assistant client
    #[must_use]
    pub fn new(config: AssistantProviderConfig, timeout_secs: u64) -> Self {
        Self {
            config,
            http_client: super::create_client_with_timeout(timeout_secs),
        }
    }

    /// Whether an API key is configured
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Generate a reply to the latest visitor message
    ///
    /// `history` must already contain that message as its final entry.
    /// Returns `None` when no provider is configured or the provider
    /// produced an empty reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the request or is
    /// unreachable
    pub async fn generate_reply(
        &self,
        instructions: Option<&str>,
        business_name: Option<&str>,
        history: &[ChatMessage],
    ) -> AppResult<Option<String>> {
        let Some(api_key) = &self.config.api_key else {
            debug!("Assistant provider not configured, skipping auto-reply");
            return Ok(None);
        };

        let request = CompletionRequest {
            model: &self.config.model,
            messages: Self::build_messages(instructions, business_name, history),
            max_tokens: MAX_COMPLETION_TOKENS,
            temperature: 0.7,
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::dependency("Assistant provider", e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::dependency(
                "Assistant provider",
                format!("Completion returned HTTP {status}: {body}"),
            ));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            AppError::dependency("Assistant provider", format!("Malformed completion: {e}"))
        })?;

        let reply = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_owned())
            .filter(|content| !content.is_empty());

        Ok(reply)
    }

    /// Map conversation history onto provider roles
    fn build_messages(
        instructions: Option<&str>,
        business_name: Option<&str>,
        history: &[ChatMessage],
    ) -> Vec<CompletionMessage> {
        let system_prompt = instructions
            .filter(|text| !text.trim().is_empty())
            .map_or_else(
                || {
                    let name = business_name.unwrap_or("this business");
                    format!(
                        "You are a friendly support assistant for {name}. Answer visitor \
                         questions briefly and helpfully. If you do not know the answer, say \
                         the owner will reply soon."
                    )
                },
                |text| text.trim().to_owned(),
            );

        let recent = history
            .iter()
            .skip(history.len().saturating_sub(MAX_HISTORY_MESSAGES));

        let mut messages = Vec::with_capacity(MAX_HISTORY_MESSAGES + 1);
        messages.push(CompletionMessage {
            role: "system".to_owned(),
            content: system_prompt,
        });
        for entry in recent {
            let role = match entry.sender {
                MessageSender::Visitor => "user",
                MessageSender::Owner | MessageSender::Ai => "assistant",
            };
            messages.push(CompletionMessage {
                role: role.to_owned(),
                content: entry.content.clone(),
            });
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn message(sender: MessageSender, content: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            sender,
            content: content.to_owned(),
            client_key: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_unconfigured_returns_none() {
        let client = AssistantClient::new(
            AssistantProviderConfig {
                base_url: "https://assistant.invalid/v1".to_owned(),
                api_key: None,
                model: "gpt-4o-mini".to_owned(),
            },
            2,
        );
        let reply = client
            .generate_reply(None, None, &[message(MessageSender::Visitor, "hi")])
            .await
            .unwrap();
        assert!(reply.is_none());
    }

    #[test]
    fn test_role_mapping_and_history_cap() {
        let mut history: Vec<ChatMessage> = (0..30)
            .map(|i| message(MessageSender::Visitor, &format!("msg {i}")))
            .collect();
        history.push(message(MessageSender::Owner, "owner here"));
        history.push(message(MessageSender::Ai, "bot here"));

        let messages = AssistantClient::build_messages(None, Some("Acme"), &history);

        assert_eq!(messages.len(), MAX_HISTORY_MESSAGES + 1);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("Acme"));
        let last = &messages[messages.len() - 1];
        assert_eq!(last.role, "assistant");
        assert_eq!(last.content, "bot here");
    }

    #[test]
    fn test_custom_instructions_win() {
        let history = vec![message(MessageSender::Visitor, "hi")];
        let messages =
            AssistantClient::build_messages(Some("Only answer about shoes."), None, &history);
        assert_eq!(messages[0].content, "Only answer about shoes.");
    }
}

//! Conversation model seam and the Gemini `generateContent` client.

use super::{ChatMessage, Role};
use crate::config::ChatSettings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("conversation model is not configured")]
    NotConfigured,
    #[error("request to conversation model failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("conversation model returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("conversation model returned no text")]
    EmptyReply,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError>;
}

/// Prompt for the next AI turn.
///
/// `history` is every earlier message; `message` is the user's new message.
pub fn build_prompt(analysis: &Value, history: &[ChatMessage], message: &str) -> String {
    let report = serde_json::to_string_pretty(analysis).unwrap_or_else(|_| analysis.to_string());
    let transcript = history
        .iter()
        .map(|m| {
            let speaker = match m.role {
                Role::User => "User",
                Role::Ai => "AI",
            };
            format!("{}: {}", speaker, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = String::new();
    prompt.push_str("You are an AI assistant for dermatologist conversing with a patient.\n\n");
    prompt.push_str("Here is the patient's previous skin analysis report in JSON:\n");
    prompt.push_str(&report);
    prompt.push_str("\n\nUse this report to inform any medical explanations or recommendations.\n");
    prompt.push_str(
        "DO NOT mention you are an AI language model. Keep tone professional yet friendly.\n\n",
    );
    prompt.push_str(
        "Do not respond to the topic or Subject line. Focus on the patient's concerns.\n\n",
    );
    if !transcript.is_empty() {
        prompt.push_str("Conversation so far:\n");
        prompt.push_str(&transcript);
        prompt.push_str("\n\n");
    }
    prompt.push_str(&format!("User: {}\nAI:", message));
    prompt
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

pub struct GeminiChatModel {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GeminiChatModel {
    pub fn new(client: reqwest::Client, settings: &ChatSettings) -> Self {
        Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        }
    }
}

#[async_trait]
impl ChatModel for GeminiChatModel {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        );
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: GenerateResponse = response.json().await?;
        reply_text(reply).ok_or(ChatError::EmptyReply)
    }
}

/// Concatenated text parts of every candidate, `None` if blank.
fn reply_text(reply: GenerateResponse) -> Option<String> {
    let text: String = reply
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_prompt_without_history() {
        let prompt = build_prompt(&json!({ "condition": { "name": "Acne" } }), &[], "Is it bad?");
        assert!(prompt.contains("\"name\": \"Acne\""));
        assert!(!prompt.contains("Conversation so far"));
        assert!(prompt.ends_with("User: Is it bad?\nAI:"));
    }

    #[test]
    fn test_prompt_includes_transcript() {
        let history = vec![
            ChatMessage {
                role: Role::User,
                content: "Hello".into(),
                timestamp: Utc::now(),
            },
            ChatMessage {
                role: Role::Ai,
                content: "Hi, how can I help?".into(),
                timestamp: Utc::now(),
            },
        ];
        let prompt = build_prompt(&json!({}), &history, "Will it scar?");
        assert!(prompt.contains("Conversation so far:\nUser: Hello\nAI: Hi, how can I help?\n\n"));
    }

    #[test]
    fn test_reply_text_joins_parts() {
        let reply: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Keep " }, { "text": "it clean." }] } }]
        }))
        .unwrap();
        assert_eq!(reply_text(reply).as_deref(), Some("Keep it clean."));
    }

    #[test]
    fn test_reply_text_blank_is_none() {
        let reply: GenerateResponse =
            serde_json::from_value(json!({ "candidates": [{ "finishReason": "SAFETY" }] })).unwrap();
        assert!(reply_text(reply).is_none());
    }
}

use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    services::providers::LlmClient,
};

/// HTTP adapter for a chat-completions style language-model service.
/// Requests force a JSON object response; the content is parsed but not
/// interpreted here — structural validation belongs to the caller.
#[derive(Clone)]
pub struct HttpLlmClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl HttpLlmClient {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            model,
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete_json(&self, system: &str, user: &str) -> AppResult<serde_json::Value> {
        let url = format!("{}/chat/completions", self.api_url);

        let body = json!({
            "model": self.model,
            "messages": [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.2,
        });

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::RateLimited(format!(
                "Language model rate limit: {}",
                body
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Llm(format!(
                "Language model returned status {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| AppError::Llm("Language model returned no choices".to_string()))?;

        serde_json::from_str(content)
            .map_err(|e| AppError::Llm(format!("Language model emitted malformed JSON: {}", e)))
    }

    fn name(&self) -> &'static str {
        "http_llm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_response_deserialization() {
        let json = r#"{
            "choices": [
                { "message": { "role": "assistant", "content": "{\"ok\": true}" } }
            ]
        }"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices.len(), 1);
        assert_eq!(parsed.choices[0].message.content, "{\"ok\": true}");
    }

    #[test]
    fn test_chat_response_rejects_missing_choices() {
        let parsed: Result<ChatResponse, _> = serde_json::from_str("{}");
        assert!(parsed.is_err());
    }
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http_client::HttpClientTrait;
use crate::domain::{
    DomainError, FinishReason, LlmProvider, LlmRequest, LlmResponse, Message, MessageRole, Usage,
};

/// Chat completions provider for any OpenAI-compatible endpoint (Groq, Ollama, vLLM)
#[derive(Debug)]
pub struct OpenAiProvider<C: HttpClientTrait> {
    client: C,
    name: String,
    auth_header: Option<String>,
    base_url: String,
}

impl<C: HttpClientTrait> OpenAiProvider<C> {
    /// `base_url` includes the version prefix, e.g. `https://api.groq.com/openai/v1`
    pub fn new(
        client: C,
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        let auth_header = api_key
            .filter(|key| !key.is_empty())
            .map(|key| format!("Bearer {}", key));
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            name: name.into(),
            auth_header,
            base_url,
        }
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request(&self, model: &str, request: &LlmRequest) -> serde_json::Value {
        let messages: Vec<OpenAiMessage> = request
            .messages
            .iter()
            .map(OpenAiMessage::from_domain)
            .collect();

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
            "stream": false,
        });

        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        let mut headers = vec![("Content-Type", "application/json")];

        if let Some(ref auth) = self.auth_header {
            headers.push(("Authorization", auth.as_str()));
        }

        headers
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<LlmResponse, DomainError> {
        let response: OpenAiResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider(&self.name, format!("Failed to parse response: {}", e))
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::provider(&self.name, "No choices in response"))?;

        let message = Message::assistant(choice.message.content.unwrap_or_default());

        let mut llm_response = LlmResponse::new(
            response.id.unwrap_or_default(),
            response.model.unwrap_or_default(),
            message,
        );

        if let Some(reason) = choice.finish_reason {
            llm_response = llm_response.with_finish_reason(FinishReason::parse(&reason));
        }

        if let Some(usage) = response.usage {
            llm_response =
                llm_response.with_usage(Usage::new(usage.prompt_tokens, usage.completion_tokens));
        }

        Ok(llm_response)
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for OpenAiProvider<C> {
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
        let url = self.chat_completions_url();
        let body = self.build_request(model, &request);
        let response = self
            .client
            .send_json(reqwest::Method::POST, &url, self.headers(), Some(&body))
            .await?
            .into_success(&self.name)?;

        self.parse_response(response)
    }

    fn provider_name(&self) -> &str {
        &self.name
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

impl OpenAiMessage {
    fn from_domain(message: &Message) -> Self {
        let role = match message.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };

        Self {
            role,
            content: message.content_text().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    id: Option<String>,
    model: Option<String>,
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;

    const GROQ_BASE: &str = "https://api.groq.com/openai/v1";
    const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-123",
            "model": "llama-3.3-70b-versatile",
            "choices": [{
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 8, "total_tokens": 18 }
        })
    }

    #[tokio::test]
    async fn test_chat() {
        let client = MockHttpClient::new().with_response(GROQ_URL, completion("SELECT 1"));
        let provider = OpenAiProvider::new(client, "groq", GROQ_BASE, Some("gsk-test".into()));

        let request = LlmRequest::prompt("jumlah nasabah").with_temperature(0.0);
        let response = provider
            .chat("llama-3.3-70b-versatile", request)
            .await
            .unwrap();

        assert_eq!(response.id, "chatcmpl-123");
        assert_eq!(response.content(), "SELECT 1");
        assert_eq!(response.finish_reason, Some(FinishReason::Stop));
        assert_eq!(response.usage.unwrap().total_tokens, 18);
    }

    #[tokio::test]
    async fn test_request_shape_and_auth() {
        let client = MockHttpClient::new().with_response(GROQ_URL, completion("SELECT 1"));
        let provider = OpenAiProvider::new(client, "groq", format!("{}/", GROQ_BASE), Some("gsk-test".into()));

        let request = LlmRequest::prompt("q").with_temperature(0.0);
        provider.chat("m", request).await.unwrap();

        let recorded = provider.client.requests();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].url, GROQ_URL);
        assert!(recorded[0]
            .headers
            .contains(&("Authorization".to_string(), "Bearer gsk-test".to_string())));

        let body = recorded[0].body.clone().unwrap();
        assert_eq!(body["model"], "m");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["temperature"], 0.0);
    }

    #[tokio::test]
    async fn test_local_provider_without_key() {
        let url = "http://localhost:11434/v1/chat/completions";
        let client = MockHttpClient::new().with_response(url, completion("SELECT 2"));
        let provider = OpenAiProvider::new(client, "local", "http://localhost:11434/v1", None);

        let response = provider
            .chat("qwen2.5-coder", LlmRequest::prompt("q"))
            .await
            .unwrap();

        assert_eq!(response.content(), "SELECT 2");
        assert!(provider
            .client
            .requests()[0]
            .headers
            .iter()
            .all(|(k, _)| k != "Authorization"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_error() {
        let client = MockHttpClient::new()
            .with_response(GROQ_URL, serde_json::json!({"id": "x", "model": "m", "choices": []}));
        let provider = OpenAiProvider::new(client, "groq", GROQ_BASE, Some("k".into()));

        let err = provider
            .chat("m", LlmRequest::prompt("q"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("No choices"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let client = MockHttpClient::new()
            .with_status(GROQ_URL, 429, serde_json::json!({"error": "rate limited"}));
        let provider = OpenAiProvider::new(client, "groq", GROQ_BASE, Some("k".into()));

        let err = provider
            .chat("m", LlmRequest::prompt("q"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("HTTP 429"));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let client = MockHttpClient::new().with_error(GROQ_URL, "connection refused");
        let provider = OpenAiProvider::new(client, "groq", GROQ_BASE, Some("k".into()));

        let result = provider
            .chat("m", LlmRequest::prompt("q"))
            .await;

        assert!(result.is_err());
    }
}

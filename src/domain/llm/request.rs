use super::Message;

/// A generation call: one prompt plus sampling limits
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(text)],
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Text of the prompt turn
    pub fn prompt_text(&self) -> &str {
        self.messages
            .first()
            .map(Message::content_text)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_request() {
        let request = LlmRequest::prompt("total saldo semua rekening")
            .with_temperature(0.0)
            .with_max_tokens(Some(512));

        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.prompt_text(), "total saldo semua rekening");
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.max_tokens, Some(512));
    }
}

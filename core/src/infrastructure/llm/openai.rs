// OpenAI Reasoning Provider Adapter
//
// Anti-Corruption Layer for the OpenAI Chat Completions API.
// Also works with OpenAI-compatible endpoints (LM Studio, vLLM, etc.)

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::reasoning::{ReasoningError, ReasoningOptions, ReasoningProvider, ReasoningReply};

const REASONING_TIMEOUT: Duration = Duration::from_secs(30);

pub struct OpenAIAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    cheap_model: Option<String>,
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: OpenAIUsage,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Deserialize)]
struct OpenAIUsage {
    total_tokens: u32,
}

impl OpenAIAdapter {
    pub fn new(endpoint: String, api_key: String, model: String, cheap_model: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
            cheap_model,
        }
    }
}

#[async_trait]
impl ReasoningProvider for OpenAIAdapter {
    async fn generate(
        &self,
        system: &str,
        user: &str,
        options: &ReasoningOptions,
    ) -> Result<ReasoningReply, ReasoningError> {
        let model = if options.cheap {
            self.cheap_model.clone().unwrap_or_else(|| self.model.clone())
        } else {
            self.model.clone()
        };
        let request = OpenAIRequest {
            model: model.clone(),
            messages: vec![
                OpenAIMessage { role: "system".to_string(), content: system.to_string() },
                OpenAIMessage { role: "user".to_string(), content: user.to_string() },
            ],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .timeout(REASONING_TIMEOUT)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ReasoningError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(if status == 401 || status == 403 {
                ReasoningError::Authentication(error_text)
            } else if status == 429 {
                ReasoningError::RateLimit
            } else if status == 404 {
                ReasoningError::ModelNotFound(model)
            } else {
                ReasoningError::Provider(format!("HTTP {status}: {error_text}"))
            });
        }

        let parsed: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| ReasoningError::Provider(format!("Failed to parse response: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ReasoningError::Provider("No response from model".into()))?;

        Ok(ReasoningReply {
            content: choice.message.content,
            tokens_used: parsed.usage.total_tokens,
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

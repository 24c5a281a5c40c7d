// Anthropic Reasoning Provider Adapter
//
// Anti-Corruption Layer for the Anthropic Messages API

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::reasoning::{ReasoningError, ReasoningOptions, ReasoningProvider, ReasoningReply};

const REASONING_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AnthropicAdapter {
    client: reqwest::Client,
    api_key: String,
    model: String,
    cheap_model: Option<String>,
}

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    system: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    usage: AnthropicUsage,
}

#[derive(Deserialize)]
struct AnthropicContent {
    text: String,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

impl AnthropicAdapter {
    pub fn new(api_key: String, model: String, cheap_model: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            cheap_model,
        }
    }

    fn model_for(&self, options: &ReasoningOptions) -> String {
        if options.cheap {
            self.cheap_model.clone().unwrap_or_else(|| self.model.clone())
        } else {
            self.model.clone()
        }
    }
}

#[async_trait]
impl ReasoningProvider for AnthropicAdapter {
    async fn generate(
        &self,
        system: &str,
        user: &str,
        options: &ReasoningOptions,
    ) -> Result<ReasoningReply, ReasoningError> {
        let model = self.model_for(options);
        let request = AnthropicRequest {
            model: model.clone(),
            system: system.to_string(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: user.to_string(),
            }],
            max_tokens: options.max_tokens.unwrap_or(1_024),
            temperature: options.temperature,
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .timeout(REASONING_TIMEOUT)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
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

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ReasoningError::Provider(format!("Failed to parse response: {e}")))?;

        Ok(ReasoningReply {
            content: parsed.content.first().map(|c| c.text.clone()).unwrap_or_default(),
            tokens_used: parsed.usage.input_tokens + parsed.usage.output_tokens,
        })
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

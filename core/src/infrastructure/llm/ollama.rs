// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Ollama Reasoning Provider Adapter
//
// Anti-Corruption Layer for Ollama local models.
// Supports air-gapped swarms with no cloud reasoning backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::reasoning::{ReasoningError, ReasoningOptions, ReasoningProvider, ReasoningReply};

const REASONING_TIMEOUT: Duration = Duration::from_secs(30);

pub struct OllamaAdapter {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    cheap_model: Option<String>,
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    system: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
    eval_count: Option<u32>,
    prompt_eval_count: Option<u32>,
}

impl OllamaAdapter {
    pub fn new(endpoint: String, model: String, cheap_model: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            model,
            cheap_model,
        }
    }
}

#[async_trait]
impl ReasoningProvider for OllamaAdapter {
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
        let request = OllamaRequest {
            model: model.clone(),
            system: system.to_string(),
            prompt: user.to_string(),
            stream: false,
            options: Some(OllamaOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens.map(|t| t as i32),
            }),
        };

        let url = format!("{}/api/generate", self.endpoint.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .timeout(REASONING_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| ReasoningError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(if status == 404 {
                ReasoningError::ModelNotFound(model)
            } else {
                ReasoningError::Provider(format!("HTTP {status}: {error_text}"))
            });
        }

        let parsed: OllamaResponse = response
            .json()
            .await
            .map_err(|e| ReasoningError::Provider(format!("Failed to parse response: {e}")))?;

        Ok(ReasoningReply {
            content: parsed.response,
            tokens_used: parsed.prompt_eval_count.unwrap_or(0) + parsed.eval_count.unwrap_or(0),
        })
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_skips_absent_options() {
        let request = OllamaRequest {
            model: "llama3.2".to_string(),
            system: "you are a swarm agent".to_string(),
            prompt: "report".to_string(),
            stream: false,
            options: Some(OllamaOptions { temperature: None, num_predict: Some(256) }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama3.2");
        assert_eq!(json["stream"], false);
        assert!(!json["options"].as_object().unwrap().contains_key("temperature"));
        assert_eq!(json["options"]["num_predict"], 256);
    }

    #[test]
    fn test_response_token_accounting() {
        let json = serde_json::json!({
            "response": "dense cluster detected",
            "done": true,
            "eval_count": 30,
            "prompt_eval_count": 15
        });
        let parsed: OllamaResponse = serde_json::from_value(json).unwrap();
        let total = parsed.prompt_eval_count.unwrap_or(0) + parsed.eval_count.unwrap_or(0);
        assert_eq!(total, 45);
    }
}

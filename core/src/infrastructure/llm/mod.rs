// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Reasoning Provider Adapters - Anti-Corruption Layer
//
// Each adapter translates the domain `ReasoningProvider` contract onto one
// vendor API. Provider choice comes from configuration; agents never see
// vendor types.

pub mod anthropic;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::config::HiveConfig;
use crate::domain::reasoning::ReasoningProvider;

use anthropic::AnthropicAdapter;
use ollama::OllamaAdapter;
use openai::OpenAIAdapter;

/// Build the configured reasoning provider, if any. An unknown provider
/// name disables deep mode rather than failing startup.
pub fn provider_from_config(config: &HiveConfig) -> Option<Arc<dyn ReasoningProvider>> {
    let kind = config.reasoning_provider.as_deref()?;
    let model = config
        .reasoning_model
        .clone()
        .unwrap_or_else(|| default_model(kind).to_string());
    let cheap_model = config.reasoning_model_cheap.clone();
    let api_key = config.reasoning_api_key.clone().unwrap_or_default();

    let provider: Arc<dyn ReasoningProvider> = match kind {
        "anthropic" => Arc::new(AnthropicAdapter::new(api_key, model, cheap_model)),
        "openai" | "openai-compatible" => {
            let endpoint = config
                .reasoning_api_url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string());
            Arc::new(OpenAIAdapter::new(endpoint, api_key, model, cheap_model))
        }
        "ollama" => {
            let endpoint = config
                .reasoning_api_url
                .clone()
                .unwrap_or_else(|| "http://localhost:11434".to_string());
            Arc::new(OllamaAdapter::new(endpoint, model, cheap_model))
        }
        other => {
            warn!("Unknown reasoning provider '{other}', deep mode disabled");
            return None;
        }
    };
    info!(provider = kind, "reasoning provider initialized");
    Some(provider)
}

fn default_model(kind: &str) -> &'static str {
    match kind {
        "anthropic" => "claude-sonnet-4-20250514",
        "ollama" => "llama3.2",
        _ => "gpt-4o-mini",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_provider_disables_deep_mode() {
        let config = HiveConfig::default();
        assert!(provider_from_config(&config).is_none());
    }

    #[test]
    fn test_known_providers_resolve() {
        for kind in ["anthropic", "openai", "openai-compatible", "ollama"] {
            let mut config = HiveConfig::default();
            config.reasoning_provider = Some(kind.to_string());
            assert!(provider_from_config(&config).is_some(), "{kind}");
        }

        let mut config = HiveConfig::default();
        config.reasoning_provider = Some("palmreader".to_string());
        assert!(provider_from_config(&config).is_none());
    }
}

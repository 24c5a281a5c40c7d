// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Reasoning backend domain interface (anti-corruption layer).
//!
//! Isolates agent logic from vendor APIs; adapters live under
//! `infrastructure/llm/`. The backend is interchangeable and is never
//! cryptographically verified.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Options for a reasoning call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Request the provider's cheaper model variant, if one is configured.
    /// Set by the credit governor in the `low_compute` tier.
    pub cheap: bool,
}

impl Default for ReasoningOptions {
    fn default() -> Self {
        Self {
            max_tokens: Some(1_024),
            temperature: Some(0.7),
            cheap: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReasoningReply {
    pub content: String,
    pub tokens_used: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ReasoningError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("rate limit exceeded")]
    RateLimit,

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("provider error: {0}")]
    Provider(String),
}

/// Domain interface for reasoning providers.
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    async fn generate(
        &self,
        system: &str,
        user: &str,
        options: &ReasoningOptions,
    ) -> Result<ReasoningReply, ReasoningError>;

    fn name(&self) -> &str;
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Reasoning wrapper: retries, and the credit-tier gate.
//!
//! The gate is applied here, inside the wrapper, so no caller can bypass it:
//! `critical`/`dead` tiers never reach the provider, `low_compute` requests
//! the cheaper model variant, and retry exhaustion degrades to an empty
//! reply with zero tokens rather than an error crossing the tick boundary.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::credits::CreditTier;
use crate::domain::reasoning::{ReasoningOptions, ReasoningProvider};

const MAX_RETRIES: u32 = 2;
const RETRY_BACKOFF_MS: u64 = 750;

/// Result of a gated reasoning call. `degraded` covers both the tier gate
/// and retry exhaustion; callers downgrade confidence accordingly.
#[derive(Debug, Clone)]
pub struct ReasoningOutcome {
    pub content: String,
    pub tokens_used: u32,
    pub degraded: bool,
}

impl ReasoningOutcome {
    fn empty() -> Self {
        Self {
            content: String::new(),
            tokens_used: 0,
            degraded: true,
        }
    }
}

#[derive(Clone)]
pub struct ReasoningService {
    provider: Option<Arc<dyn ReasoningProvider>>,
}

impl ReasoningService {
    pub fn new(provider: Option<Arc<dyn ReasoningProvider>>) -> Self {
        Self { provider }
    }

    pub fn disabled() -> Self {
        Self { provider: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Call the backend under the credit gate. Infallible by contract:
    /// every failure path reduces to a degraded outcome.
    pub async fn generate(
        &self,
        system: &str,
        user: &str,
        tier: CreditTier,
        mut options: ReasoningOptions,
    ) -> ReasoningOutcome {
        let provider = match &self.provider {
            Some(p) => p,
            None => return ReasoningOutcome::empty(),
        };

        if !tier.allows_reasoning() {
            debug!(?tier, "credit tier gates reasoning call");
            return ReasoningOutcome::empty();
        }
        options.cheap = tier == CreditTier::LowCompute;

        let mut attempt = 0;
        loop {
            match provider.generate(system, user, &options).await {
                Ok(reply) => {
                    return ReasoningOutcome {
                        content: reply.content,
                        tokens_used: reply.tokens_used,
                        degraded: false,
                    };
                }
                Err(e) if attempt < MAX_RETRIES => {
                    attempt += 1;
                    warn!(
                        provider = provider.name(),
                        attempt,
                        "reasoning call failed, retrying: {e}"
                    );
                    // Linear backoff between attempts.
                    tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS * attempt as u64)).await;
                }
                Err(e) => {
                    warn!(provider = provider.name(), "reasoning retries exhausted: {e}");
                    return ReasoningOutcome::empty();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reasoning::{ReasoningError, ReasoningReply};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingProvider {
        calls: AtomicU32,
        fail_first: u32,
    }

    #[async_trait]
    impl ReasoningProvider for CountingProvider {
        async fn generate(
            &self,
            _system: &str,
            _user: &str,
            options: &ReasoningOptions,
        ) -> Result<ReasoningReply, ReasoningError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                return Err(ReasoningError::RateLimit);
            }
            Ok(ReasoningReply {
                content: if options.cheap { "cheap".into() } else { "full".into() },
                tokens_used: 42,
            })
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_gated_tiers_never_reach_the_provider() {
        let provider = Arc::new(CountingProvider { calls: AtomicU32::new(0), fail_first: 0 });
        let service = ReasoningService::new(Some(provider.clone()));

        for tier in [CreditTier::Critical, CreditTier::Dead] {
            let out = service.generate("s", "u", tier, ReasoningOptions::default()).await;
            assert!(out.degraded);
            assert_eq!(out.tokens_used, 0);
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_low_compute_requests_cheap_variant() {
        let provider = Arc::new(CountingProvider { calls: AtomicU32::new(0), fail_first: 0 });
        let service = ReasoningService::new(Some(provider));
        let out = service
            .generate("s", "u", CreditTier::LowCompute, ReasoningOptions::default())
            .await;
        assert!(!out.degraded);
        assert_eq!(out.content, "cheap");
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let provider = Arc::new(CountingProvider { calls: AtomicU32::new(0), fail_first: 2 });
        let service = ReasoningService::new(Some(provider.clone()));
        let out = service
            .generate("s", "u", CreditTier::Normal, ReasoningOptions::default())
            .await;
        assert!(!out.degraded);
        assert_eq!(out.tokens_used, 42);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_degrades_to_empty() {
        let provider = Arc::new(CountingProvider { calls: AtomicU32::new(0), fail_first: 10 });
        let service = ReasoningService::new(Some(provider.clone()));
        let out = service
            .generate("s", "u", CreditTier::Normal, ReasoningOptions::default())
            .await;
        assert!(out.degraded);
        assert!(out.content.is_empty());
        assert_eq!(out.tokens_used, 0);
        // Initial attempt plus two retries.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }
}

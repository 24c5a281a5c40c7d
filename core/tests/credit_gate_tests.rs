// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Credit gating through the full deep step: a dead-tier agent completes
//! the step without spending a single token, and still appends the canned
//! low-confidence thought.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use hive_core::application::agent_loop::{SwarmAgent, SwarmAgentDeps};
use hive_core::application::reasoning_service::ReasoningService;
use hive_core::domain::config::HiveConfig;
use hive_core::domain::credits::CreditLedger;
use hive_core::domain::identity::AgentIdentity;
use hive_core::domain::reasoning::{
    ReasoningError, ReasoningOptions, ReasoningProvider, ReasoningReply,
};
use hive_core::infrastructure::data_source::StaticDataSource;
use hive_core::infrastructure::gossip::GossipClient;

struct CountingProvider {
    calls: AtomicU32,
}

#[async_trait]
impl ReasoningProvider for CountingProvider {
    async fn generate(
        &self,
        _system: &str,
        _user: &str,
        _options: &ReasoningOptions,
    ) -> Result<ReasoningReply, ReasoningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ReasoningReply {
            content: "Flux dips look periodic.\n- analyze exoplanets\nLikely a companion body."
                .to_string(),
            tokens_used: 500,
        })
    }

    fn name(&self) -> &str {
        "counting"
    }
}

fn agent_with_balance(balance: f64, provider: Arc<CountingProvider>) -> SwarmAgent {
    let config = Arc::new(HiveConfig::default());
    let deps = SwarmAgentDeps {
        reasoning: ReasoningService::new(Some(provider)),
        data_source: Arc::new(StaticDataSource),
        gossip: GossipClient::new(vec![]),
        dispersal: None,
        store: None,
    };
    let mut agent = SwarmAgent::new(config.clone(), Arc::new(AgentIdentity::generate()), deps);
    agent.override_credits(CreditLedger::new(
        balance,
        config.credit_normal_floor,
        config.credit_low_compute_floor,
    ));
    agent
}

#[tokio::test]
async fn test_dead_tier_deep_step_spends_nothing_and_appends_canned_thought() {
    let provider = Arc::new(CountingProvider { calls: AtomicU32::new(0) });
    let mut agent = agent_with_balance(-1.0, provider.clone());

    let tokens_before = agent.state().tokens_used;
    agent.deep_step().await;

    assert_eq!(agent.state().tokens_used, tokens_before, "no tokens may be spent");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0, "provider must not be called");

    let thought = agent.state().thoughts.last().expect("a thought is still appended");
    assert_eq!(thought.confidence, 0.2);
    assert!(thought.suggested_actions.is_empty());
}

#[tokio::test]
async fn test_normal_tier_deep_step_spends_and_debits_credits() {
    let provider = Arc::new(CountingProvider { calls: AtomicU32::new(0) });
    let mut agent = agent_with_balance(50_000.0, provider.clone());

    agent.deep_step().await;

    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(agent.state().tokens_used, 500);
    // Tokens debit credits 1:1; a successful emission earns some back.
    assert!(agent.state().credits.spent() >= 500.0);
}

#[tokio::test]
async fn test_budget_exhaustion_disables_deep_mode_silently() {
    let provider = Arc::new(CountingProvider { calls: AtomicU32::new(0) });
    let mut agent = agent_with_balance(50_000.0, provider.clone());

    // Drain the budget through repeated deep steps; the loop's own mode
    // gate refuses deep mode once tokens_used reaches the budget, and no
    // recorded decision may overrun it.
    for _ in 0..200 {
        agent.tick().await;
        if agent.state().tokens_used >= agent.state().token_budget {
            break;
        }
    }
    for decision in &agent.state().decisions {
        assert!(decision.token_estimate <= agent.state().token_budget);
    }
    assert!(agent.state().tokens_used <= agent.state().token_budget + 500);
}

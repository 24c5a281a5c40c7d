// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Collective synthesis: assembling a cross-agent report when the phase
//! transition fires.
//!
//! Works purely from the local view — the rich signals gossiped in plus the
//! agent's own thoughts. If the reasoning backend is unavailable, the
//! plaintext concatenation of contributors' conclusions becomes the primary
//! payload.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::reasoning_service::ReasoningService;
use crate::domain::agent::AgentState;
use crate::domain::collective::{CollectiveMemory, CollectiveReport, EvidenceEntry};
use crate::domain::credits::CreditTier;
use crate::domain::identity::AgentIdentity;
use crate::domain::reasoning::ReasoningOptions;
use crate::domain::signal::Signal;

/// Minimum vitality for a signal to count as synthesis evidence.
const RICH_STRENGTH: f64 = 0.3;

/// Minimum content length for a signal to count as synthesis evidence.
const RICH_CONTENT_LEN: usize = 40;

/// Contributors' conclusions kept in the plaintext fallback.
const FALLBACK_CONCLUSIONS: usize = 6;

/// Domains that are bookkeeping rather than findings.
const METADATA_DOMAINS: [&str; 2] = ["metadata", "distress"];

pub struct SynthesisResult {
    pub memory: CollectiveMemory,
    pub tokens_used: u32,
}

pub struct CollectiveSynthesizer {
    reasoning: ReasoningService,
}

impl CollectiveSynthesizer {
    pub fn new(reasoning: ReasoningService) -> Self {
        Self { reasoning }
    }

    /// Assemble a collective memory from the local view, or `None` when the
    /// evidence is too thin (fewer than two distinct contributors).
    pub async fn synthesize(
        &self,
        state: &AgentState,
        signals: &[Signal],
        identity: &AgentIdentity,
        tier: CreditTier,
    ) -> Option<SynthesisResult> {
        let rich: Vec<&Signal> = signals
            .iter()
            .filter(|s| {
                s.strength >= RICH_STRENGTH
                    && s.content.len() > RICH_CONTENT_LEN
                    && !METADATA_DOMAINS.contains(&s.domain.as_str())
            })
            .collect();
        if rich.is_empty() {
            debug!("synthesis skipped: no rich signals");
            return None;
        }

        // Densest domain wins; BTreeMap keeps the tie-break deterministic.
        let mut groups: BTreeMap<&str, Vec<&Signal>> = BTreeMap::new();
        for s in &rich {
            groups.entry(s.domain.as_str()).or_default().push(s);
        }
        let (topic, group) = groups
            .into_iter()
            .max_by_key(|(_, g)| g.len())?;

        let producers: HashSet<&str> = group.iter().map(|s| s.producer_id.as_str()).collect();
        if producers.len() < 2 {
            debug!(topic, "synthesis aborted: fewer than two contributors");
            return None;
        }

        let mut top_thoughts: Vec<_> = state.thoughts.iter().collect();
        top_thoughts.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        let evidence: Vec<EvidenceEntry> = top_thoughts
            .into_iter()
            .take(3)
            .map(|t| EvidenceEntry {
                producer_name: state.name.clone(),
                specialization: state.specialization.clone(),
                observation: t.observation.clone(),
                reasoning: t.reasoning.clone(),
                conclusion: t.conclusion.clone(),
                confidence: t.confidence,
            })
            .collect();

        let (report, tokens_used) = self
            .generate_report(topic, &evidence, &group, &state.topics_studied, tier)
            .await;

        let synthesis = group
            .iter()
            .take(FALLBACK_CONCLUSIONS)
            .map(|s| truncate(&s.content, 160))
            .collect::<Vec<_>>()
            .join(" | ");
        let confidence =
            group.iter().map(|s| s.confidence).sum::<f64>() / group.len() as f64;
        let created_at = Utc::now().timestamp_millis();
        let attestation = identity.attest(&synthesis, &state.id, created_at);

        let mut contributors: Vec<String> =
            producers.into_iter().map(str::to_string).collect();
        contributors.sort();

        let memory = CollectiveMemory {
            id: Uuid::new_v4().to_string(),
            topic: topic.to_string(),
            synthesis,
            contributors,
            signal_ids: group.iter().map(|s| s.id.clone()).collect(),
            confidence,
            attestation,
            created_at,
            report,
        };
        info!(
            topic = %memory.topic,
            contributors = memory.contributors.len(),
            "collective memory assembled"
        );
        Some(SynthesisResult { memory, tokens_used })
    }

    async fn generate_report(
        &self,
        topic: &str,
        evidence: &[EvidenceEntry],
        group: &[&Signal],
        topics_studied: &[String],
        tier: CreditTier,
    ) -> (Option<CollectiveReport>, u32) {
        let system = "You are the synthesis stage of a research swarm. Reply with a single JSON \
                      object with fields: overview, keyFindings (array), opinions, improvements \
                      (array), verdict.";
        let bundle = serde_json::json!({
            "topic": topic,
            "topicsStudied": topics_studied,
            "evidence": evidence,
            "signals": group.iter().map(|s| &s.content).collect::<Vec<_>>(),
        });
        let user = format!("Synthesize a collective report for this evidence bundle:\n{bundle}");

        let outcome = self
            .reasoning
            .generate(
                system,
                &user,
                tier,
                ReasoningOptions { max_tokens: Some(1_200), temperature: Some(0.4), cheap: false },
            )
            .await;
        if outcome.degraded {
            return (None, outcome.tokens_used);
        }
        let report = serde_json::from_str::<CollectiveReport>(strip_fences(&outcome.content))
            .map_err(|e| debug!("report parse failed: {e}"))
            .ok();
        (report, outcome.tokens_used)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &s[..end])
    }
}

/// Strip a leading/trailing markdown code fence if the backend wrapped its
/// JSON in one.
fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open.strip_suffix("```").unwrap_or(without_open).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::credits::CreditLedger;
    use crate::domain::personality::{AgentPersonality, AgentRole};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rich_signal(id: &str, producer: &str, domain: &str) -> Signal {
        Signal::new(
            producer,
            format!("{id}: a sixty-plus character finding about periodic flux variation in the data"),
            domain,
            0.8,
            0.6,
            vec![],
            0,
        )
    }

    fn agent_state() -> AgentState {
        let mut rng = StdRng::seed_from_u64(1);
        AgentState::new(
            "agent-0",
            "hive-scout-0",
            AgentRole::Scout.specialization(),
            AgentPersonality::seeded(AgentRole::Scout, &mut rng),
            50_000,
            CreditLedger::new(50_000.0, 10_000.0, 2_000.0),
            &mut rng,
        )
    }

    #[tokio::test]
    async fn test_synthesis_requires_two_contributors() {
        let synth = CollectiveSynthesizer::new(ReasoningService::disabled());
        let identity = AgentIdentity::from_seed([1u8; 32]);
        let state = agent_state();

        let solo = vec![rich_signal("a", "agent-0", "exoplanets")];
        assert!(synth
            .synthesize(&state, &solo, &identity, CreditTier::Normal)
            .await
            .is_none());

        let pair = vec![
            rich_signal("a", "agent-0", "exoplanets"),
            rich_signal("b", "agent-1", "exoplanets"),
        ];
        let result = synth
            .synthesize(&state, &pair, &identity, CreditTier::Normal)
            .await
            .expect("two contributors suffice");
        assert_eq!(result.memory.topic, "exoplanets");
        assert_eq!(result.memory.contributors.len(), 2);
        // No backend configured: fallback payload, no structured report.
        assert!(result.memory.report.is_none());
        assert!(!result.memory.synthesis.is_empty());
        assert_eq!(result.tokens_used, 0);
    }

    #[tokio::test]
    async fn test_densest_domain_becomes_topic() {
        let synth = CollectiveSynthesizer::new(ReasoningService::disabled());
        let identity = AgentIdentity::from_seed([2u8; 32]);
        let state = agent_state();

        let signals = vec![
            rich_signal("a", "agent-0", "solar_flares"),
            rich_signal("b", "agent-1", "solar_flares"),
            rich_signal("c", "agent-2", "solar_flares"),
            rich_signal("d", "agent-0", "mars_weather"),
            rich_signal("e", "agent-1", "mars_weather"),
        ];
        let result = synth
            .synthesize(&state, &signals, &identity, CreditTier::Normal)
            .await
            .unwrap();
        assert_eq!(result.memory.topic, "solar_flares");
        assert_eq!(result.memory.signal_ids.len(), 3);
    }

    #[tokio::test]
    async fn test_weak_and_metadata_signals_are_ignored() {
        let synth = CollectiveSynthesizer::new(ReasoningService::disabled());
        let identity = AgentIdentity::from_seed([3u8; 32]);
        let state = agent_state();

        let mut weak = rich_signal("a", "agent-0", "exoplanets");
        weak.strength = 0.1;
        let mut short = rich_signal("b", "agent-1", "exoplanets");
        short.content = "tiny".into();
        let distress = rich_signal("c", "agent-2", "distress");

        assert!(synth
            .synthesize(&state, &[weak, short, distress], &identity, CreditTier::Normal)
            .await
            .is_none());
    }

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("```\n{}\n```"), "{}");
    }

    #[test]
    fn test_memory_attestation_verifies() {
        let identity = AgentIdentity::from_seed([4u8; 32]);
        let synthesis = "joint conclusion";
        let created_at = 1_700_000_000_000i64;
        let att = identity.attest(synthesis, "agent-0", created_at);
        let check =
            crate::domain::identity::verify_attestation(&att, synthesis, "agent-0", created_at);
        assert!(check.valid);
    }
}

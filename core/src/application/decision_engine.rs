// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Candidate generation, scoring, and stochastic selection.
//!
//! Scoring combines the static action tables with budget headroom, novelty
//! against recent decisions, personality fit, and a post-transition bonus
//! for correlation work. Selection is softmax over priority; temperature 0
//! degenerates to argmax with first-candidate tie-break.

use rand::Rng;

use crate::domain::agent::AgentState;
use crate::domain::channel::SignalChannel;
use crate::domain::dataset::Dataset;
use crate::domain::decision::{
    normalize_topic, ActionKind, AgentAction, ScoredCandidate, CANONICAL_TOPICS,
};

/// Window of recent decisions consulted for the novelty term.
const NOVELTY_WINDOW: usize = 8;

/// Recent thoughts mined for suggested actions.
const THOUGHT_WINDOW: usize = 5;

/// Generate scored candidates for the current tick. Candidates whose token
/// estimate exceeds the remaining budget never appear.
pub fn generate_candidates(
    state: &AgentState,
    channel: &SignalChannel,
    datasets: &[Dataset],
    rng: &mut impl Rng,
) -> Vec<ScoredCandidate> {
    let mut actions: Vec<AgentAction> = Vec::new();
    let mut seen_topics: Vec<String> = Vec::new();

    // Topics suggested by recent thoughts, normalized to canonical names.
    for thought in state.thoughts.iter().rev().take(THOUGHT_WINDOW) {
        for suggestion in &thought.suggested_actions {
            if let Some(topic) = normalize_topic(suggestion) {
                if !state.topics_studied.iter().any(|t| t == topic)
                    && !seen_topics.iter().any(|t| t == topic)
                {
                    seen_topics.push(topic.to_string());
                    actions.push(AgentAction::AnalyzeDataset { topic: topic.to_string() });
                }
            }
        }
    }

    // Any canonical topic not yet analyzed.
    for topic in CANONICAL_TOPICS {
        if !state.topics_studied.iter().any(|t| t == topic)
            && !seen_topics.iter().any(|t| t == topic)
        {
            seen_topics.push(topic.to_string());
            actions.push(AgentAction::AnalyzeDataset { topic: topic.to_string() });
        }
    }

    // Occasionally revisit a cached dataset.
    if !datasets.is_empty() && rng.gen::<f64>() < 0.3 {
        let ds = &datasets[rng.gen_range(0..datasets.len())];
        actions.push(AgentAction::AnalyzeDataset { topic: ds.topic.clone() });
    }

    // Share the strongest finding when social enough and the channel is live.
    if !state.thoughts.is_empty() && state.personality.sociability > 0.4 && channel.len() > 2 {
        if let Some(best) = state
            .thoughts
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
        {
            actions.push(AgentAction::ShareFinding {
                finding: best.conclusion.clone(),
                topic: state.topics_studied.last().cloned(),
            });
        }
    }

    // Correlate two random datasets when curious enough.
    if datasets.len() >= 2 && state.personality.curiosity > 0.5 {
        let a = rng.gen_range(0..datasets.len());
        let mut b = rng.gen_range(0..datasets.len() - 1);
        if b >= a {
            b += 1;
        }
        actions.push(AgentAction::CorrelateFindings {
            topics: vec![datasets[a].topic.clone(), datasets[b].topic.clone()],
        });
    }

    // Fallback: explore something.
    if actions.is_empty() {
        let topic = state
            .current_target()
            .unwrap_or(CANONICAL_TOPICS[rng.gen_range(0..CANONICAL_TOPICS.len())]);
        actions.push(AgentAction::ExploreTopic { topic: topic.to_string() });
    }

    let remaining = state.remaining_budget();
    let recent: Vec<ActionKind> = state
        .decisions
        .iter()
        .rev()
        .take(NOVELTY_WINDOW)
        .map(|d| d.action.kind())
        .collect();

    actions
        .into_iter()
        .filter(|a| a.kind().token_estimate() <= remaining)
        .map(|action| {
            let priority = score(&action, state, channel, &recent, remaining);
            let token_estimate = action.kind().token_estimate();
            ScoredCandidate { action, priority, token_estimate }
        })
        .collect()
}

/// The priority formula. All weights sum to at most 1.0 with the swarm
/// bonus applied.
pub fn score(
    action: &AgentAction,
    state: &AgentState,
    channel: &SignalChannel,
    recent_kinds: &[ActionKind],
    remaining_budget: u32,
) -> f64 {
    let kind = action.kind();
    let base = kind.base_priority() * 0.25;

    let efficiency = if remaining_budget == 0 {
        0.0
    } else {
        (1.0 - kind.token_estimate() as f64 / remaining_budget as f64).max(0.0) * 0.25
    };

    let novelty = if recent_kinds.contains(&kind) { 0.0 } else { 0.15 };

    let p = &state.personality;
    let fit = match kind {
        ActionKind::Analyze | ActionKind::Explore => p.curiosity * 0.15,
        ActionKind::Share => p.sociability * 0.15,
        ActionKind::Correlate => (p.curiosity + p.diligence) / 2.0 * 0.15,
    };

    let swarm_bonus = if channel.phase_transition_occurred() && kind == ActionKind::Correlate {
        0.10
    } else {
        0.0
    };

    base + efficiency + novelty + fit + swarm_bonus
}

/// Softmax selection over candidate priorities. `temperature <= 0` is
/// deterministic argmax; ties resolve to the first candidate.
pub fn select_decision(
    candidates: &[ScoredCandidate],
    temperature: f64,
    rng: &mut impl Rng,
) -> Option<ScoredCandidate> {
    if candidates.is_empty() {
        return None;
    }
    if temperature <= 0.0 {
        let mut best = &candidates[0];
        for c in &candidates[1..] {
            if c.priority > best.priority {
                best = c;
            }
        }
        return Some(best.clone());
    }

    let max_p = candidates
        .iter()
        .map(|c| c.priority)
        .fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = candidates
        .iter()
        .map(|c| ((c.priority - max_p) / temperature).exp())
        .collect();
    let total: f64 = weights.iter().sum();

    let mut draw = rng.gen::<f64>() * total;
    for (c, w) in candidates.iter().zip(&weights) {
        draw -= w;
        if draw <= 0.0 {
            return Some(c.clone());
        }
    }
    Some(candidates[candidates.len() - 1].clone())
}

/// Whether the agent should abandon its current line of work.
pub fn should_switch(state: &AgentState, last_success: Option<bool>, rng: &mut impl Rng) -> bool {
    if state.tokens_used >= state.token_budget || state.current_decision.is_none() {
        return true;
    }
    let p = match last_success {
        Some(true) => 0.25,
        Some(false) => 0.7,
        None => 0.25,
    };
    rng.gen::<f64>() < p
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Thoughts produced by the deep step.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Confidence of the canned thought returned when reasoning is gated.
pub const GATED_CONFIDENCE: f64 = 0.2;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thought {
    pub id: String,
    pub producer_id: String,
    pub trigger: String,
    pub observation: String,
    pub reasoning: String,
    pub conclusion: String,
    #[serde(default)]
    pub suggested_actions: Vec<String>,
    pub confidence: f64,
    /// Unix milliseconds.
    pub timestamp: i64,
}

impl Thought {
    pub fn new(
        producer_id: impl Into<String>,
        trigger: impl Into<String>,
        observation: impl Into<String>,
        reasoning: impl Into<String>,
        conclusion: impl Into<String>,
        suggested_actions: Vec<String>,
        confidence: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            producer_id: producer_id.into(),
            trigger: trigger.into(),
            observation: observation.into(),
            reasoning: reasoning.into(),
            conclusion: conclusion.into(),
            suggested_actions,
            confidence: confidence.clamp(0.0, 1.0),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Low-confidence placeholder appended when the credit tier blocks the
    /// reasoning backend, or the backend exhausts its retries.
    pub fn canned(producer_id: impl Into<String>, trigger: impl Into<String>) -> Self {
        Self::new(
            producer_id,
            trigger,
            "reasoning unavailable",
            "reasoning call skipped",
            "insufficient compute to reason",
            Vec::new(),
            GATED_CONFIDENCE,
        )
    }

    /// Build a thought from free-form reasoning text: the last non-empty
    /// line becomes the conclusion, bullet lines become suggested actions.
    pub fn from_reasoning(
        producer_id: impl Into<String>,
        trigger: impl Into<String>,
        observation: impl Into<String>,
        content: &str,
        confidence: f64,
    ) -> Self {
        let conclusion = content
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("no conclusion")
            .to_string();
        let suggested_actions: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|l| l.starts_with("- ") || l.starts_with("* "))
            .map(|l| l[2..].trim().to_string())
            .take(4)
            .collect();
        Self::new(
            producer_id,
            trigger,
            observation,
            content,
            conclusion,
            suggested_actions,
            confidence,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canned_thought_is_low_confidence_with_no_actions() {
        let t = Thought::canned("agent-1", "deep step");
        assert_eq!(t.confidence, 0.2);
        assert!(t.suggested_actions.is_empty());
    }

    #[test]
    fn test_from_reasoning_extracts_conclusion_and_actions() {
        let content = "Flux dips repeat every 3.2 days.\n- analyze exoplanets\n- correlate with solar flares\nPeriodicity implies a companion body.";
        let t = Thought::from_reasoning("a", "trigger", "obs", content, 0.7);
        assert_eq!(t.conclusion, "Periodicity implies a companion body.");
        assert_eq!(t.suggested_actions.len(), 2);
        assert_eq!(t.suggested_actions[0], "analyze exoplanets");
    }
}

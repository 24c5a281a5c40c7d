// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Actions, decisions, and the static cost tables the decision engine
//! scores against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The five canonical topics the heuristic normalizer maps free text onto.
pub const CANONICAL_TOPICS: [&str; 5] = [
    "exoplanets",
    "mars_weather",
    "near_earth_objects",
    "solar_flares",
    "earth_imagery",
];

/// Everything an agent can decide to do. Exhaustively matched in the
/// executor and the decision engine; no reflective fallback exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentAction {
    AnalyzeDataset {
        topic: String,
    },
    ShareFinding {
        finding: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        topic: Option<String>,
    },
    CorrelateFindings {
        topics: Vec<String>,
    },
    ExploreTopic {
        topic: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Analyze,
    Share,
    Correlate,
    Explore,
}

impl AgentAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::AnalyzeDataset { .. } => ActionKind::Analyze,
            Self::ShareFinding { .. } => ActionKind::Share,
            Self::CorrelateFindings { .. } => ActionKind::Correlate,
            Self::ExploreTopic { .. } => ActionKind::Explore,
        }
    }
}

impl ActionKind {
    pub fn base_priority(&self) -> f64 {
        match self {
            Self::Analyze => 0.95,
            Self::Share => 0.85,
            Self::Correlate => 0.75,
            Self::Explore => 0.60,
        }
    }

    pub fn token_estimate(&self) -> u32 {
        match self {
            Self::Analyze => 2_500,
            Self::Share => 1_200,
            Self::Correlate => 3_500,
            Self::Explore => 2_000,
        }
    }

    pub fn time_estimate_ms(&self) -> u64 {
        match self {
            Self::Analyze => 12_000,
            Self::Share => 6_000,
            Self::Correlate => 18_000,
            Self::Explore => 10_000,
        }
    }
}

/// A candidate action with its computed priority, ready for softmax
/// selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub action: AgentAction,
    pub priority: f64,
    pub token_estimate: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Executing,
    Completed,
    Failed,
}

/// A selected action moving through execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub id: String,
    pub agent_id: String,
    pub action: AgentAction,
    pub priority: f64,
    pub token_estimate: u32,
    pub status: DecisionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

impl Decision {
    pub fn from_candidate(agent_id: &str, candidate: &ScoredCandidate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            agent_id: agent_id.to_string(),
            action: candidate.action.clone(),
            priority: candidate.priority,
            token_estimate: candidate.token_estimate,
            status: DecisionStatus::Executing,
            created_at: Utc::now(),
            completed_at: None,
            outcome: None,
        }
    }

    pub fn complete(&mut self, outcome: impl Into<String>) {
        self.status = DecisionStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.outcome = Some(outcome.into());
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = DecisionStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.outcome = Some(reason.into());
    }

    pub fn succeeded(&self) -> bool {
        self.status == DecisionStatus::Completed
    }
}

/// Map free-form topic text to one of the canonical topics.
pub fn normalize_topic(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    if lower.contains("exoplanet") || lower.contains("transit") || lower.contains("kepler") {
        Some("exoplanets")
    } else if lower.contains("mars") || lower.contains("insight") {
        Some("mars_weather")
    } else if lower.contains("asteroid") || lower.contains("neo") || lower.contains("near earth") || lower.contains("near_earth") {
        Some("near_earth_objects")
    } else if lower.contains("solar") || lower.contains("flare") || lower.contains("cme") {
        Some("solar_flares")
    } else if lower.contains("earth") || lower.contains("imagery") || lower.contains("epic") {
        Some("earth_imagery")
    } else {
        None
    }
}

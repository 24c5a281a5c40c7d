// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent personality scalars and role presets.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Jitter applied around each role preset at construction.
const JITTER: f64 = 0.04;

/// Four immutable scalars in `[0, 1]` weighting the decision engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AgentPersonality {
    pub curiosity: f64,
    pub diligence: f64,
    pub boldness: f64,
    pub sociability: f64,
}

impl AgentPersonality {
    /// Seed from a role preset, jittered by ±0.04 per axis.
    pub fn seeded(role: AgentRole, rng: &mut impl Rng) -> Self {
        let base = role.base_personality();
        let mut jitter = |v: f64| (v + rng.gen_range(-JITTER..=JITTER)).clamp(0.0, 1.0);
        Self {
            curiosity: jitter(base.curiosity),
            diligence: jitter(base.diligence),
            boldness: jitter(base.boldness),
            sociability: jitter(base.sociability),
        }
    }
}

/// Role presets cycled over the agent index at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Scout,
    Analyst,
    Synthesizer,
    Skeptic,
    Connector,
}

impl AgentRole {
    pub fn from_index(index: usize) -> Self {
        match index % 5 {
            0 => Self::Scout,
            1 => Self::Analyst,
            2 => Self::Synthesizer,
            3 => Self::Skeptic,
            _ => Self::Connector,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::Scout => "scout",
            Self::Analyst => "analyst",
            Self::Synthesizer => "synthesizer",
            Self::Skeptic => "skeptic",
            Self::Connector => "connector",
        }
    }

    pub fn specialization(&self) -> &'static str {
        match self {
            Self::Scout => "dataset reconnaissance",
            Self::Analyst => "quantitative analysis",
            Self::Synthesizer => "cross-domain synthesis",
            Self::Skeptic => "anomaly validation",
            Self::Connector => "finding propagation",
        }
    }

    fn base_personality(&self) -> AgentPersonality {
        match self {
            Self::Scout => AgentPersonality { curiosity: 0.9, diligence: 0.4, boldness: 0.8, sociability: 0.5 },
            Self::Analyst => AgentPersonality { curiosity: 0.6, diligence: 0.9, boldness: 0.3, sociability: 0.4 },
            Self::Synthesizer => AgentPersonality { curiosity: 0.7, diligence: 0.6, boldness: 0.5, sociability: 0.9 },
            Self::Skeptic => AgentPersonality { curiosity: 0.5, diligence: 0.8, boldness: 0.6, sociability: 0.3 },
            Self::Connector => AgentPersonality { curiosity: 0.5, diligence: 0.5, boldness: 0.4, sociability: 0.9 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_seeded_personality_stays_in_unit_range() {
        let mut rng = StdRng::seed_from_u64(11);
        for i in 0..32 {
            let p = AgentPersonality::seeded(AgentRole::from_index(i), &mut rng);
            for v in [p.curiosity, p.diligence, p.boldness, p.sociability] {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_jitter_stays_within_band() {
        let mut rng = StdRng::seed_from_u64(5);
        let base = AgentRole::Analyst.base_personality();
        for _ in 0..64 {
            let p = AgentPersonality::seeded(AgentRole::Analyst, &mut rng);
            assert!((p.diligence - base.diligence).abs() <= JITTER + 1e-12);
        }
    }

    #[test]
    fn test_roles_cycle_over_index() {
        assert_eq!(AgentRole::from_index(0), AgentRole::Scout);
        assert_eq!(AgentRole::from_index(5), AgentRole::Scout);
        assert_eq!(AgentRole::from_index(7), AgentRole::Synthesizer);
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The per-agent state aggregate. Each agent process exclusively owns one
//! `AgentState`; no cross-agent write path exists — gossip is the only edge
//! between agents.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::credits::CreditLedger;
use crate::domain::decision::{Decision, CANONICAL_TOPICS};
use crate::domain::personality::AgentPersonality;
use crate::domain::signal::Signal;
use crate::domain::thought::Thought;

/// World rectangle positions are clamped to.
pub const WORLD_WIDTH: f64 = 800.0;
pub const WORLD_HEIGHT: f64 = 600.0;

/// Velocity damping applied per tick on each axis.
const DAMPING: f64 = 0.85;

/// Minimum strength for a foreign signal to perturb movement.
const PERTURB_STRENGTH: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentState {
    pub id: String,
    pub name: String,
    pub specialization: String,
    pub personality: AgentPersonality,
    pub position: Vec2,
    pub velocity: Vec2,
    pub energy: f64,
    pub synchronized: bool,
    pub absorbed: HashSet<String>,
    /// Absorbed signals retained as working knowledge.
    pub knowledge: Vec<Signal>,
    pub thoughts: Vec<Thought>,
    pub decisions: Vec<Decision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_decision: Option<Decision>,
    pub topics_studied: Vec<String>,
    pub tokens_used: u32,
    pub token_budget: u32,
    pub credits: CreditLedger,
    pub step_count: u64,
    pub discoveries: u32,
    pub contributions_to_collective: u32,
}

impl AgentState {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        specialization: impl Into<String>,
        personality: AgentPersonality,
        token_budget: u32,
        credits: CreditLedger,
        rng: &mut impl Rng,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            specialization: specialization.into(),
            personality,
            position: Vec2 {
                x: rng.gen_range(0.0..WORLD_WIDTH),
                y: rng.gen_range(0.0..WORLD_HEIGHT),
            },
            velocity: Vec2::default(),
            energy: 0.6,
            synchronized: false,
            absorbed: HashSet::new(),
            knowledge: Vec::new(),
            thoughts: Vec::new(),
            decisions: Vec::new(),
            current_decision: None,
            topics_studied: Vec::new(),
            tokens_used: 0,
            token_budget,
            credits,
            step_count: 0,
            discoveries: 0,
            contributions_to_collective: 0,
        }
    }

    pub fn remaining_budget(&self) -> u32 {
        self.token_budget.saturating_sub(self.tokens_used)
    }

    /// Next canonical topic this agent has not studied yet, if any.
    pub fn current_target(&self) -> Option<&'static str> {
        CANONICAL_TOPICS
            .iter()
            .copied()
            .find(|t| !self.topics_studied.iter().any(|s| s == t))
    }

    /// One movement tick. Pre-transition: Brownian drift, kicked further by
    /// strong foreign, unabsorbed signals. Post-transition: pull toward the
    /// world center with a mild orbital tangent.
    pub fn drift(&mut self, signals: &[Signal], transitioned: bool, rng: &mut impl Rng) {
        if transitioned {
            let dx = WORLD_WIDTH / 2.0 - self.position.x;
            let dy = WORLD_HEIGHT / 2.0 - self.position.y;
            self.velocity.x += dx * 0.01 - dy * 0.004;
            self.velocity.y += dy * 0.01 + dx * 0.004;
        } else {
            let scale = 0.5 + self.personality.boldness;
            self.velocity.x += (rng.gen::<f64>() - 0.5) * scale;
            self.velocity.y += (rng.gen::<f64>() - 0.5) * scale;
            for s in signals {
                if s.strength > PERTURB_STRENGTH
                    && s.producer_id != self.id
                    && !self.absorbed.contains(&s.id)
                {
                    self.velocity.x += (rng.gen::<f64>() - 0.5) * s.strength * 0.6;
                    self.velocity.y += (rng.gen::<f64>() - 0.5) * s.strength * 0.6;
                }
            }
        }

        self.velocity.x *= DAMPING;
        self.velocity.y *= DAMPING;
        self.position.x = (self.position.x + self.velocity.x).clamp(0.0, WORLD_WIDTH);
        self.position.y = (self.position.y + self.velocity.y).clamp(0.0, WORLD_HEIGHT);
    }

    /// Agent-local synchronization: enough absorbed signals, enough energy,
    /// and the channel dense enough. Distinct from the channel-wide
    /// transition latch.
    pub fn check_sync(&mut self, density: f64, critical_threshold: f64) {
        if !self.synchronized
            && density >= critical_threshold
            && self.absorbed.len() >= 3
            && self.energy > 0.5
        {
            self.synchronized = true;
            self.energy = 1.0;
        }
    }

    /// Cycle reset of the agent-local flags after the post-transition
    /// cooldown. The channel is reset by the caller under the same tick.
    pub fn reset_cycle(&mut self, rng: &mut impl Rng) {
        self.synchronized = false;
        self.absorbed.clear();
        self.energy = rng.gen_range(0.3..=0.5);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::personality::AgentRole;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn state(rng: &mut StdRng) -> AgentState {
        let personality = AgentPersonality::seeded(AgentRole::Scout, rng);
        AgentState::new(
            "agent-0",
            "hive-scout-0",
            AgentRole::Scout.specialization(),
            personality,
            50_000,
            CreditLedger::new(50_000.0, 10_000.0, 2_000.0),
            rng,
        )
    }

    #[test]
    fn test_drift_keeps_position_in_world() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut s = state(&mut rng);
        for step in 0..200 {
            s.drift(&[], step > 100, &mut rng);
            assert!((0.0..=WORLD_WIDTH).contains(&s.position.x));
            assert!((0.0..=WORLD_HEIGHT).contains(&s.position.y));
        }
    }

    #[test]
    fn test_check_sync_requires_all_three_conditions() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut s = state(&mut rng);
        s.energy = 0.8;
        s.absorbed = (0..3).map(|i| format!("s{i}")).collect();

        s.check_sync(0.3, 0.55);
        assert!(!s.synchronized);

        s.check_sync(0.6, 0.55);
        assert!(s.synchronized);
        assert_eq!(s.energy, 1.0);
    }

    #[test]
    fn test_cycle_reset_reseeds_energy() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut s = state(&mut rng);
        s.synchronized = true;
        s.absorbed.insert("x".into());
        s.reset_cycle(&mut rng);
        assert!(!s.synchronized);
        assert!(s.absorbed.is_empty());
        assert!((0.3..=0.5).contains(&s.energy));
    }

    #[test]
    fn test_current_target_walks_canonical_topics() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut s = state(&mut rng);
        assert_eq!(s.current_target(), Some("exoplanets"));
        s.topics_studied.push("exoplanets".into());
        assert_eq!(s.current_target(), Some("mars_weather"));
        for t in CANONICAL_TOPICS {
            s.topics_studied.push(t.into());
        }
        assert_eq!(s.current_target(), None);
    }
}

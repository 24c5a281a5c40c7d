// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The credit governor: a per-agent soft currency reflecting productive
//! contribution. Purely local; a pure function of the balance decides the
//! tier, and the tier gates reasoning calls.

use serde::{Deserialize, Serialize};

/// Flat reward for contributing to a collective memory.
pub const COLLECTIVE_BONUS: f64 = 10.0;

/// Discrete credit state gating reasoning calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditTier {
    Normal,
    LowCompute,
    Critical,
    Dead,
}

impl CreditTier {
    /// Whether the reasoning backend may be called at all in this tier.
    pub fn allows_reasoning(&self) -> bool {
        matches!(self, Self::Normal | Self::LowCompute)
    }
}

/// Balance plus lifetime counters. Tokens charged by the reasoning backend
/// debit credits 1:1; emissions and collective contributions earn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditLedger {
    balance: f64,
    earned: f64,
    spent: f64,
    distress_emitted: bool,
    normal_floor: f64,
    low_compute_floor: f64,
}

impl CreditLedger {
    pub fn new(initial: f64, normal_floor: f64, low_compute_floor: f64) -> Self {
        Self {
            balance: initial,
            earned: 0.0,
            spent: 0.0,
            distress_emitted: false,
            normal_floor,
            low_compute_floor,
        }
    }

    pub fn tier(&self) -> CreditTier {
        if self.balance > self.normal_floor {
            CreditTier::Normal
        } else if self.balance > self.low_compute_floor {
            CreditTier::LowCompute
        } else if self.balance > 0.0 {
            CreditTier::Critical
        } else {
            CreditTier::Dead
        }
    }

    pub fn spend(&mut self, amount: f64) {
        if amount <= 0.0 {
            return;
        }
        self.balance -= amount;
        self.spent += amount;
    }

    pub fn earn(&mut self, amount: f64) {
        if amount <= 0.0 {
            return;
        }
        self.balance += amount;
        self.earned += amount;
    }

    /// Reward for a successful signal emission, scaled by confidence.
    pub fn earn_for_emission(&mut self, confidence: f64) {
        self.earn(emission_reward(confidence));
    }

    pub fn earn_collective_bonus(&mut self) {
        self.earn(COLLECTIVE_BONUS);
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn earned(&self) -> f64 {
        self.earned
    }

    pub fn spent(&self) -> f64 {
        self.spent
    }

    pub fn distress_emitted(&self) -> bool {
        self.distress_emitted
    }

    /// Latch the one-shot distress emission for this starvation episode.
    pub fn note_distress(&mut self) {
        self.distress_emitted = true;
    }

    /// Recovery to the normal tier re-arms the distress latch.
    pub fn refresh_distress_latch(&mut self) {
        if self.tier() == CreditTier::Normal {
            self.distress_emitted = false;
        }
    }
}

/// Emission reward: 2 credits at zero confidence, 10 at full.
pub fn emission_reward(confidence: f64) -> f64 {
    2.0 + 8.0 * confidence.clamp(0.0, 1.0)
}

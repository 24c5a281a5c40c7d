// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The per-process signal channel: deposit, decay, density, and the
//! phase-transition latch.
//!
//! Order of signals carries no meaning; it is preserved only for traces.
//! Deduplication by id is the single rejection rule at deposit — signature
//! verification is a separate, advisory concern.

use crate::domain::signal::{Signal, ACTIVE_STRENGTH, STRONG_STRENGTH};

/// Signals needed above [`STRONG_STRENGTH`] for the gossip-variant trigger.
const STRONG_QUORUM: usize = 3;

/// Saturation denominator per agent in the density formula.
const SATURATION_PER_AGENT: f64 = 8.0;

/// Per-process view over signals with a derived density scalar.
#[derive(Debug, Clone)]
pub struct SignalChannel {
    signals: Vec<Signal>,
    density: f64,
    critical_threshold: f64,
    decay_rate: f64,
    min_strength: f64,
    agent_count: usize,
    phase_transition_occurred: bool,
    transition_step: Option<u64>,
}

impl SignalChannel {
    pub fn new(critical_threshold: f64, decay_rate: f64, min_strength: f64, agent_count: usize) -> Self {
        Self {
            signals: Vec::new(),
            density: 0.0,
            critical_threshold,
            decay_rate,
            min_strength,
            agent_count: agent_count.max(1),
            phase_transition_occurred: false,
            transition_step: None,
        }
    }

    /// Append unless a signal with the same id is already present.
    /// Returns whether the signal was accepted.
    pub fn deposit(&mut self, signal: Signal) -> bool {
        if self.signals.iter().any(|s| s.id == signal.id) {
            return false;
        }
        self.signals.push(signal);
        true
    }

    /// One decay tick: every strength is multiplied by `1 - decay_rate`
    /// exactly once, then anything at or below `min_strength` is pruned.
    pub fn decay(&mut self) {
        let factor = 1.0 - self.decay_rate;
        for s in &mut self.signals {
            s.strength *= factor;
        }
        let floor = self.min_strength;
        self.signals.retain(|s| s.strength > floor);
    }

    /// Recompute the density scalar from the active signals.
    pub fn refresh_density(&mut self) {
        let active: Vec<&Signal> = self.signals.iter().filter(|s| s.strength > ACTIVE_STRENGTH).collect();
        if active.is_empty() {
            self.density = 0.0;
            return;
        }
        let avg_strength = active.iter().map(|s| s.strength).sum::<f64>() / active.len() as f64;
        let total_conn: usize = active.iter().map(|s| s.connections.len()).sum();
        let connectivity = total_conn as f64 / (active.len() * self.agent_count).max(1) as f64;
        let raw = (active.len() as f64 / (self.agent_count as f64 * SATURATION_PER_AGENT))
            * avg_strength
            * (1.0 + 2.0 * connectivity);
        self.density = raw.min(1.0);
    }

    /// Orchestrated trigger: density over threshold plus a synchronization
    /// quorum of at least half the agents.
    pub fn should_transition(&self, synced_count: usize, agent_count: usize) -> bool {
        !self.phase_transition_occurred
            && self.density >= self.critical_threshold
            && synced_count >= agent_count.div_ceil(2)
    }

    /// Gossip trigger: density over threshold plus at least three signals
    /// still above the strong mark, judged purely from the local view.
    pub fn should_transition_gossip(&self) -> bool {
        !self.phase_transition_occurred
            && self.density >= self.critical_threshold
            && self.signals.iter().filter(|s| s.strength > STRONG_STRENGTH).count() >= STRONG_QUORUM
    }

    /// Latch the transition. Idempotent within a cycle: the first call wins.
    pub fn mark_transition(&mut self, step: u64) {
        if !self.phase_transition_occurred {
            self.phase_transition_occurred = true;
            self.transition_step = Some(step);
        }
    }

    /// Cycle reset: clears signals, density, and the latch.
    pub fn reset(&mut self) {
        self.signals.clear();
        self.density = 0.0;
        self.phase_transition_occurred = false;
        self.transition_step = None;
    }

    /// Boost a signal's vitality (positive feedback on absorption).
    pub fn boost(&mut self, id: &str, amount: f64) {
        if let Some(s) = self.signals.iter_mut().find(|s| s.id == id) {
            s.strength = (s.strength + amount).min(1.0);
        }
    }

    pub fn set_da_commitment(&mut self, id: &str, commitment: &str) -> Option<Signal> {
        let s = self.signals.iter_mut().find(|s| s.id == id)?;
        s.da_commitment = Some(commitment.to_string());
        Some(s.clone())
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn snapshot(&self) -> Vec<Signal> {
        self.signals.clone()
    }

    pub fn get(&self, id: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.signals.iter().any(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn critical_threshold(&self) -> f64 {
        self.critical_threshold
    }

    pub fn phase_transition_occurred(&self) -> bool {
        self.phase_transition_occurred
    }

    pub fn transition_step(&self) -> Option<u64> {
        self.transition_step
    }

    pub fn agent_count(&self) -> usize {
        self.agent_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(id: &str, strength: f64, connections: usize) -> Signal {
        let mut s = Signal::new("producer", "content", "exoplanets", 0.8, strength, vec![], 0);
        s.id = id.to_string();
        s.connections = (0..connections).map(|i| format!("conn-{i}")).collect();
        s
    }

    #[test]
    fn test_deposit_dedups_by_id() {
        let mut ch = SignalChannel::new(0.55, 0.12, 0.05, 4);
        assert!(ch.deposit(signal("x", 0.5, 0)));
        assert!(!ch.deposit(signal("x", 0.9, 0)));
        assert_eq!(ch.len(), 1);
        assert_eq!(ch.get("x").unwrap().strength, 0.5);
    }

    #[test]
    fn test_solo_decay_halves_then_prunes() {
        // decayRate 0.5, one signal at 0.5: one tick leaves 0.25; three more
        // ticks take it to 0.03125, below the prune floor.
        let mut ch = SignalChannel::new(0.55, 0.5, 0.05, 1);
        ch.deposit(signal("x", 0.5, 0));

        ch.decay();
        assert_eq!(ch.len(), 1);
        assert!((ch.get("x").unwrap().strength - 0.25).abs() < 1e-12);

        ch.decay();
        ch.decay();
        ch.decay();
        assert!(ch.is_empty());
    }

    #[test]
    fn test_every_surviving_signal_stays_above_floor() {
        let mut ch = SignalChannel::new(0.55, 0.12, 0.05, 4);
        for i in 0..32 {
            ch.deposit(signal(&format!("s{i}"), 0.03 + 0.03 * i as f64, 0));
        }
        for _ in 0..10 {
            ch.decay();
            for s in ch.signals() {
                assert!(s.strength > 0.05 && s.strength <= 1.0);
            }
        }
    }

    #[test]
    fn test_density_zero_when_no_active_signals() {
        let mut ch = SignalChannel::new(0.55, 0.12, 0.05, 4);
        ch.deposit(signal("weak", 0.08, 0));
        ch.refresh_density();
        assert_eq!(ch.density(), 0.0);
    }

    #[test]
    fn test_density_monotone_in_active_count() {
        // Fixed strength and zero connectivity: density grows with |active|.
        let mut last = 0.0;
        for n in 1..=12 {
            let mut ch = SignalChannel::new(0.55, 0.12, 0.05, 6);
            for i in 0..n {
                ch.deposit(signal(&format!("s{i}"), 0.6, 0));
            }
            ch.refresh_density();
            assert!(ch.density() >= last);
            last = ch.density();
        }
    }

    #[test]
    fn test_connectivity_amplifies_density() {
        let mut plain = SignalChannel::new(0.55, 0.12, 0.05, 4);
        let mut linked = SignalChannel::new(0.55, 0.12, 0.05, 4);
        for i in 0..6 {
            plain.deposit(signal(&format!("p{i}"), 0.6, 0));
            linked.deposit(signal(&format!("l{i}"), 0.6, 2));
        }
        plain.refresh_density();
        linked.refresh_density();
        assert!(linked.density() > plain.density());
    }

    #[test]
    fn test_density_is_capped_at_one() {
        let mut ch = SignalChannel::new(0.55, 0.12, 0.05, 1);
        for i in 0..64 {
            ch.deposit(signal(&format!("s{i}"), 1.0, 8));
        }
        ch.refresh_density();
        assert_eq!(ch.density(), 1.0);
    }

    #[test]
    fn test_transition_latch_fires_once_per_cycle() {
        let mut ch = SignalChannel::new(0.1, 0.12, 0.05, 1);
        for i in 0..4 {
            ch.deposit(signal(&format!("s{i}"), 0.9, 1));
        }
        ch.refresh_density();
        assert!(ch.should_transition_gossip());
        ch.mark_transition(7);
        assert_eq!(ch.transition_step(), Some(7));
        assert!(!ch.should_transition_gossip());

        // A second mark cannot move the step.
        ch.mark_transition(9);
        assert_eq!(ch.transition_step(), Some(7));

        ch.reset();
        assert!(ch.is_empty());
        assert!(!ch.phase_transition_occurred());
        assert_eq!(ch.transition_step(), None);
        assert_eq!(ch.density(), 0.0);
    }

    #[test]
    fn test_orchestrated_trigger_requires_quorum() {
        let mut ch = SignalChannel::new(0.1, 0.12, 0.05, 1);
        ch.deposit(signal("s", 0.9, 1));
        ch.refresh_density();
        assert!(ch.density() >= 0.1);
        assert!(!ch.should_transition(2, 6));
        assert!(ch.should_transition(3, 6));
    }

    #[test]
    fn test_boost_caps_at_one() {
        let mut ch = SignalChannel::new(0.55, 0.12, 0.05, 4);
        ch.deposit(signal("x", 0.95, 0));
        ch.boost("x", 0.1);
        assert_eq!(ch.get("x").unwrap().strength, 1.0);
    }
}

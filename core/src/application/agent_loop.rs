// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The per-agent control loop: absorb → think → decide → execute → emit.
//!
//! One tick completes fully before the next begins. The channel is shared
//! with the HTTP layer behind a mutex; the loop and the inbound POST handler
//! are the only writers. Read endpoints serve a snapshot published at the
//! end of each tick, so what they return may be up to one tick stale.
//!
//! No error crosses a tick boundary: every fallible call inside a tick is
//! reduced to a degraded result.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::application::decision_engine::{generate_candidates, select_decision, should_switch};
use crate::application::reasoning_service::ReasoningService;
use crate::application::synthesis::CollectiveSynthesizer;
use crate::domain::agent::AgentState;
use crate::domain::channel::SignalChannel;
use crate::domain::collective::CollectiveMemory;
use crate::domain::config::HiveConfig;
use crate::domain::credits::{CreditLedger, CreditTier};
use crate::domain::dataset::{DataSource, Dataset};
use crate::domain::decision::{AgentAction, Decision, ScoredCandidate, CANONICAL_TOPICS};
use crate::domain::identity::{AgentIdentity, IdentityCard};
use crate::domain::personality::{AgentPersonality, AgentRole};
use crate::domain::reasoning::ReasoningOptions;
use crate::domain::signal::Signal;
use crate::domain::thought::Thought;
use crate::infrastructure::dispersal::DaClient;
use crate::infrastructure::gossip::GossipClient;
use crate::infrastructure::repositories::StateStore;

/// Softmax temperature for decision selection.
const DECISION_TEMPERATURE: f64 = 0.3;

/// Minimum strength for an absorption attempt.
const ABSORB_THRESHOLD: f64 = 0.2;

/// Ticks between best-effort persistence flushes.
const PERSIST_EVERY: u64 = 10;

/// External collaborators wired in at startup.
pub struct SwarmAgentDeps {
    pub reasoning: ReasoningService,
    pub data_source: Arc<dyn DataSource>,
    pub gossip: GossipClient,
    pub dispersal: Option<DaClient>,
    pub store: Option<StateStore>,
}

/// Read-model published at the end of every tick for the HTTP layer.
#[derive(Clone)]
pub struct AgentSnapshot {
    pub state: AgentState,
    pub density: f64,
    pub critical_threshold: f64,
    pub phase_transition_occurred: bool,
    pub transition_step: Option<u64>,
    pub signal_count: usize,
    pub latest_signal: Option<Signal>,
    pub collective: Vec<CollectiveMemory>,
    pub identity: IdentityCard,
    pub da_enabled: bool,
}

/// What an executed action hands back to the loop.
struct ExecOutcome {
    summary: String,
    emission: Option<EmissionDraft>,
}

struct EmissionDraft {
    content: String,
    domain: String,
    confidence: f64,
    strength: f64,
}

pub struct SwarmAgent {
    config: Arc<HiveConfig>,
    identity: Arc<AgentIdentity>,
    state: AgentState,
    channel: Arc<Mutex<SignalChannel>>,
    snapshot: Arc<RwLock<AgentSnapshot>>,
    deps: SwarmAgentDeps,
    synthesizer: CollectiveSynthesizer,
    datasets: Vec<Dataset>,
    collective: Vec<CollectiveMemory>,
    latest_signal: Option<Signal>,
    /// Retained action focus; cleared when `should_switch` fires.
    focus: Option<ScoredCandidate>,
    last_result: Option<bool>,
    last_step_deep: bool,
    rng: StdRng,
}

impl SwarmAgent {
    pub fn new(config: Arc<HiveConfig>, identity: Arc<AgentIdentity>, deps: SwarmAgentDeps) -> Self {
        let mut rng = StdRng::from_entropy();
        let role = AgentRole::from_index(config.agent_index);
        let personality = AgentPersonality::seeded(role, &mut rng);
        let agent_id = format!("agent-{}", config.agent_index);
        let name = format!("hive-{}-{}", role.slug(), config.agent_index);
        let credits = CreditLedger::new(
            config.initial_credits,
            config.credit_normal_floor,
            config.credit_low_compute_floor,
        );
        let state = AgentState::new(
            agent_id.clone(),
            name.clone(),
            role.specialization(),
            personality,
            config.token_budget_per_agent,
            credits,
            &mut rng,
        );
        let channel = Arc::new(Mutex::new(SignalChannel::new(
            config.critical_density,
            config.pheromone_decay,
            config.pheromone_min_strength,
            config.agent_count(),
        )));
        let snapshot = Arc::new(RwLock::new(AgentSnapshot {
            state: state.clone(),
            density: 0.0,
            critical_threshold: config.critical_density,
            phase_transition_occurred: false,
            transition_step: None,
            signal_count: 0,
            latest_signal: None,
            collective: Vec::new(),
            identity: identity.card(&agent_id, &name),
            da_enabled: deps.dispersal.is_some(),
        }));
        let synthesizer = CollectiveSynthesizer::new(deps.reasoning.clone());

        Self {
            config,
            identity,
            state,
            channel,
            snapshot,
            deps,
            synthesizer,
            datasets: Vec::new(),
            collective: Vec::new(),
            latest_signal: None,
            focus: None,
            last_result: None,
            last_step_deep: false,
            rng,
        }
    }

    /// Shared channel handle for the HTTP layer.
    pub fn channel(&self) -> Arc<Mutex<SignalChannel>> {
        self.channel.clone()
    }

    /// Shared snapshot handle for the HTTP layer.
    pub fn snapshot(&self) -> Arc<RwLock<AgentSnapshot>> {
        self.snapshot.clone()
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    /// Force the ledger balance; restricted to integration tests.
    pub fn override_credits(&mut self, credits: CreditLedger) {
        self.state.credits = credits;
    }

    /// Resume persisted counters from the store, if a prior run left any.
    pub async fn restore(&mut self) {
        let Some(store) = &self.deps.store else { return };
        match store.load_agent(&self.state.id).await {
            Ok(Some(previous)) => {
                info!(step = previous.step_count, "resuming persisted agent state");
                self.state = previous;
            }
            Ok(None) => {}
            Err(e) => warn!("state restore failed, starting fresh: {e}"),
        }
        match store.load_collective_memories().await {
            Ok(memories) => self.collective = memories,
            Err(e) => warn!("collective memory restore failed: {e}"),
        }
    }

    /// Run until shutdown or the configured step ceiling.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            agent = %self.state.name,
            peers = self.deps.gossip.peers().len(),
            "agent loop starting"
        );
        loop {
            self.tick().await;
            if self.config.max_steps > 0 && self.state.step_count >= self.config.max_steps {
                info!(steps = self.state.step_count, "step ceiling reached");
                break;
            }
            let interval = if self.last_step_deep {
                self.config.engineering_step_interval_ms
            } else {
                self.config.sync_interval_ms
            };
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(interval)) => {}
                _ = shutdown.changed() => {
                    info!("shutdown requested");
                    break;
                }
            }
        }
        self.flush().await;
    }

    /// One full step of the pipeline.
    pub async fn tick(&mut self) {
        self.state.step_count += 1;
        let step = self.state.step_count;

        // Pull peers, integrate unknown ids, decay, refresh density.
        let pulled = self.deps.gossip.pull_all().await;
        let newly_transitioned;
        {
            let mut ch = self.channel.lock().await;
            let mut integrated = 0usize;
            for signal in pulled {
                if ch.deposit(signal) {
                    integrated += 1;
                }
            }
            if integrated > 0 {
                debug!(step, integrated, "integrated gossip signals");
            }
            ch.decay();
            ch.refresh_density();

            newly_transitioned = ch.should_transition_gossip();
            if newly_transitioned {
                ch.mark_transition(step);
                info!(step, density = ch.density(), "phase transition latched");
            }
        }

        // Move, then absorb under one lock. The handle is cloned out so the
        // guard does not pin a borrow of `self`.
        let channel = Arc::clone(&self.channel);
        let (density, threshold) = {
            let mut ch = channel.lock().await;
            let view = ch.snapshot();
            self.state
                .drift(&view, ch.phase_transition_occurred(), &mut self.rng);
            self.absorb(&mut ch);
            (ch.density(), ch.critical_threshold())
        };

        // Deep or light work.
        let deep = self.decide_mode();
        if deep {
            self.deep_step().await;
        } else {
            self.light_step().await;
        }
        self.last_step_deep = deep;

        if newly_transitioned {
            self.run_synthesis().await;
        }

        self.state.check_sync(density, threshold);
        self.emit_distress_if_starving().await;
        self.maybe_reset_cycle().await;

        if step % PERSIST_EVERY == 0 {
            self.flush().await;
        }
        self.publish_snapshot().await;
    }

    /// Probabilistic absorption of foreign signals, with positive feedback
    /// on the source signal's strength.
    fn absorb(&mut self, channel: &mut SignalChannel) -> usize {
        let candidates: Vec<(String, f64)> = channel
            .signals()
            .iter()
            .filter(|s| {
                s.producer_id != self.state.id
                    && !self.state.absorbed.contains(&s.id)
                    && s.strength > ABSORB_THRESHOLD
            })
            .map(|s| (s.id.clone(), s.strength))
            .collect();

        let mut accepted = 0usize;
        for (id, strength) in candidates {
            if self.rng.gen::<f64>() < strength * 0.6 {
                self.state.absorbed.insert(id.clone());
                self.state.energy = (self.state.energy + 0.05).min(1.0);
                channel.boost(&id, 0.1);
                if let Some(signal) = channel.get(&id) {
                    self.state.knowledge.push(signal.clone());
                }
                accepted += 1;
            }
        }
        accepted
    }

    /// Deep mode needs a configured backend, budget headroom, a live credit
    /// tier, and a per-step Bernoulli gate that opens as the run matures.
    fn decide_mode(&mut self) -> bool {
        if !self.deps.reasoning.is_enabled() {
            return false;
        }
        if self.state.tokens_used >= self.state.token_budget {
            return false;
        }
        if !self.state.credits.tier().allows_reasoning() {
            return false;
        }
        let p = (self.state.step_count as f64 / 40.0).min(0.85);
        self.rng.gen::<f64>() < p
    }

    /// Think → decide → execute → emit.
    pub async fn deep_step(&mut self) {
        let thought = self.think().await;
        self.state.thoughts.push(thought.clone());

        // Keep or drop the running focus before generating candidates.
        if self.focus.is_some() && should_switch(&self.state, self.last_result, &mut self.rng) {
            self.focus = None;
        }
        let candidate = match self.focus.clone() {
            Some(focused) => Some(focused),
            None => {
                let ch = self.channel.lock().await;
                let candidates = generate_candidates(&self.state, &ch, &self.datasets, &mut self.rng);
                select_decision(&candidates, DECISION_TEMPERATURE, &mut self.rng)
            }
        };
        let Some(candidate) = candidate else {
            debug!("no affordable candidates this step");
            return;
        };

        let mut decision = Decision::from_candidate(&self.state.id, &candidate);
        self.state.current_decision = Some(decision.clone());

        match self.execute(&candidate, &thought).await {
            Ok(outcome) => {
                decision.complete(outcome.summary);
                self.last_result = Some(true);
                self.focus = Some(candidate);
                if let Some(draft) = outcome.emission {
                    self.emit(draft).await;
                }
            }
            Err(reason) => {
                debug!(%reason, "action failed");
                decision.fail(reason);
                self.last_result = Some(false);
                self.focus = None;
            }
        }
        self.state.decisions.push(decision);
        self.state.current_decision = None;
    }

    async fn think(&mut self) -> Thought {
        let tier = self.state.credits.tier();
        let synthesize_absorbed =
            !self.state.absorbed.is_empty() && self.state.personality.sociability > 0.4;

        let (trigger, observation, user) = if synthesize_absorbed {
            let recent: Vec<&str> = self
                .state
                .knowledge
                .iter()
                .rev()
                .take(4)
                .map(|s| s.content.as_str())
                .collect();
            let observation = format!("{} absorbed signals in view", self.state.absorbed.len());
            let user = format!(
                "Synthesize what these swarm signals jointly imply, then suggest next actions \
                 as bullet points:\n{}",
                recent.join("\n")
            );
            ("absorbed-synthesis".to_string(), observation, user)
        } else {
            let observation = match self.datasets.last() {
                Some(ds) => format!("latest dataset: {}", ds.summary),
                None => "no datasets studied yet".to_string(),
            };
            let user = format!(
                "Observation: {observation}. Studied topics: {:?}. Form a hypothesis about what \
                 to investigate next and suggest actions as bullet points.",
                self.state.topics_studied
            );
            ("observation".to_string(), observation, user)
        };

        let system = format!(
            "You are {}, a {} agent in a leaderless research swarm studying open space datasets. \
             Reason tersely.",
            self.state.name, self.state.specialization
        );
        let outcome = self
            .deps
            .reasoning
            .generate(&system, &user, tier, ReasoningOptions::default())
            .await;
        self.state.tokens_used = self.state.tokens_used.saturating_add(outcome.tokens_used);
        self.state.credits.spend(outcome.tokens_used as f64);

        if outcome.degraded {
            Thought::canned(&self.state.id, trigger)
        } else {
            let confidence = 0.55 + 0.3 * (outcome.content.len().min(800) as f64 / 800.0);
            Thought::from_reasoning(&self.state.id, trigger, observation, &outcome.content, confidence)
        }
    }

    async fn execute(
        &mut self,
        candidate: &ScoredCandidate,
        thought: &Thought,
    ) -> Result<ExecOutcome, String> {
        match &candidate.action {
            AgentAction::AnalyzeDataset { topic } => {
                let dataset = self
                    .deps
                    .data_source
                    .fetch_dataset(topic)
                    .await
                    .map_err(|e| format!("dataset fetch failed: {e}"))?
                    .ok_or_else(|| format!("no dataset for topic {topic}"))?;

                let content = format!(
                    "{topic} analysis: {} — {}. {}",
                    dataset.title,
                    dataset.highlights.join("; "),
                    thought.conclusion
                );
                self.cache_dataset(dataset);
                if !self.state.topics_studied.iter().any(|t| t == topic) {
                    self.state.topics_studied.push(topic.clone());
                }
                self.state.discoveries += 1;

                Ok(ExecOutcome {
                    summary: format!("analyzed {topic}"),
                    emission: Some(EmissionDraft {
                        content,
                        domain: topic.clone(),
                        confidence: thought.confidence,
                        strength: deep_strength(candidate.priority),
                    }),
                })
            }
            AgentAction::ShareFinding { finding, topic } => {
                let domain = topic.clone().unwrap_or_else(|| "general".to_string());
                Ok(ExecOutcome {
                    summary: "shared finding".to_string(),
                    emission: Some(EmissionDraft {
                        content: finding.clone(),
                        domain,
                        confidence: thought.confidence,
                        strength: deep_strength(candidate.priority),
                    }),
                })
            }
            AgentAction::CorrelateFindings { topics } => {
                let mut pieces = Vec::new();
                for topic in topics {
                    let ds = self
                        .datasets
                        .iter()
                        .find(|d| &d.topic == topic)
                        .ok_or_else(|| format!("dataset {topic} not cached"))?;
                    pieces.push(format!("{}: {}", topic, ds.highlights.join("; ")));
                }
                let content = format!(
                    "correlation across {}: {}. {}",
                    topics.join(" and "),
                    pieces.join(" || "),
                    thought.conclusion
                );
                Ok(ExecOutcome {
                    summary: format!("correlated {}", topics.join("+")),
                    emission: Some(EmissionDraft {
                        content,
                        domain: topics.first().cloned().unwrap_or_else(|| "general".into()),
                        confidence: thought.confidence,
                        strength: deep_strength(candidate.priority),
                    }),
                })
            }
            AgentAction::ExploreTopic { topic } => {
                let dataset = self
                    .deps
                    .data_source
                    .fetch_dataset(topic)
                    .await
                    .map_err(|e| format!("exploration fetch failed: {e}"))?
                    .ok_or_else(|| format!("nothing to explore for {topic}"))?;
                let content = format!("{topic} exploration: {}", dataset.summary);
                self.cache_dataset(dataset);
                Ok(ExecOutcome {
                    summary: format!("explored {topic}"),
                    emission: Some(EmissionDraft {
                        content,
                        domain: topic.clone(),
                        confidence: (thought.confidence * 0.8).max(0.3),
                        strength: deep_strength(candidate.priority),
                    }),
                })
            }
        }
    }

    /// Light mode: no reasoning backend, just an occasional dataset scan.
    pub async fn light_step(&mut self) {
        let gate = if self.state.synchronized { 0.75 } else { 0.45 };
        if self.rng.gen::<f64>() >= gate {
            return;
        }

        let topic = if !self.state.knowledge.is_empty() && self.rng.gen::<f64>() < 0.55 {
            let pick = self.rng.gen_range(0..self.state.knowledge.len());
            self.state.knowledge[pick].domain.clone()
        } else {
            self.state
                .current_target()
                .unwrap_or(CANONICAL_TOPICS[self.rng.gen_range(0..CANONICAL_TOPICS.len())])
                .to_string()
        };

        match self.deps.data_source.fetch_dataset(&topic).await {
            Ok(Some(dataset)) => {
                let highlight = if dataset.highlights.is_empty() {
                    dataset.summary.clone()
                } else {
                    dataset.highlights[self.rng.gen_range(0..dataset.highlights.len())].clone()
                };
                let confidence = self.rng.gen_range(0.45..=0.75);
                let content = format!("{topic} scan: {highlight}");
                self.cache_dataset(dataset);
                self.emit(EmissionDraft {
                    content,
                    domain: topic,
                    confidence,
                    strength: light_strength(confidence),
                })
                .await;
            }
            Ok(None) => debug!(%topic, "light scan found nothing"),
            Err(e) => debug!(%topic, "light scan failed: {e}"),
        }
    }

    /// Sign, deposit locally, fan out, and enqueue DA dispersal.
    async fn emit(&mut self, draft: EmissionDraft) {
        let connections: Vec<String> = self
            .state
            .knowledge
            .iter()
            .rev()
            .take(3)
            .map(|s| s.id.clone())
            .collect();
        let timestamp = Utc::now().timestamp_millis();
        let mut signal = Signal::new(
            &self.state.id,
            draft.content,
            draft.domain,
            draft.confidence,
            draft.strength,
            connections,
            timestamp,
        );
        signal.attestation =
            self.identity
                .attest(&signal.content, &signal.producer_id, signal.timestamp);
        signal.producer_pubkey = Some(self.identity.public_key_hex().to_string());

        {
            let mut ch = self.channel.lock().await;
            ch.deposit(signal.clone());
        }
        self.state.credits.earn_for_emission(signal.confidence);
        self.latest_signal = Some(signal.clone());

        self.deps.gossip.push_all(&signal).await;
        if let Some(da) = &self.deps.dispersal {
            da.disperse_signal(
                signal,
                self.channel.clone(),
                self.deps.gossip.clone(),
                self.config.da_commitment_writeback,
            );
        }
    }

    async fn run_synthesis(&mut self) {
        let view = { self.channel.lock().await.snapshot() };
        let tier = self.state.credits.tier();
        let Some(result) = self
            .synthesizer
            .synthesize(&self.state, &view, &self.identity, tier)
            .await
        else {
            return;
        };
        self.state.tokens_used = self.state.tokens_used.saturating_add(result.tokens_used);
        self.state.credits.spend(result.tokens_used as f64);

        if result.memory.contributors.iter().any(|c| c == &self.state.id) {
            self.state.credits.earn_collective_bonus();
            self.state.contributions_to_collective += 1;
        }
        if let Some(store) = &self.deps.store {
            if let Err(e) = store.save_collective_memory(&result.memory).await {
                warn!("collective memory persist failed: {e}");
            }
        }
        self.collective.push(result.memory);
    }

    /// One-shot distress emission when the tier decays to critical.
    async fn emit_distress_if_starving(&mut self) {
        self.state.credits.refresh_distress_latch();
        if self.state.credits.tier() == CreditTier::Critical && !self.state.credits.distress_emitted()
        {
            self.state.credits.note_distress();
            let content = format!(
                "{} reporting compute starvation at step {}; balance {:.0}",
                self.state.name,
                self.state.step_count,
                self.state.credits.balance()
            );
            self.emit(EmissionDraft {
                content,
                domain: "distress".to_string(),
                confidence: 0.2,
                strength: light_strength(0.2),
            })
            .await;
        }
    }

    /// Cycle reset after the post-transition cooldown: wipes the channel
    /// and the agent's synchronization state, reseeding energy low.
    async fn maybe_reset_cycle(&mut self) {
        let mut ch = self.channel.lock().await;
        let Some(transition_step) = ch.transition_step() else { return };
        if self.state.step_count.saturating_sub(transition_step) >= self.config.cycle_cooldown_steps {
            ch.reset();
            self.state.reset_cycle(&mut self.rng);
            info!(step = self.state.step_count, "cycle reset, next emergence cycle begins");
        }
    }

    fn cache_dataset(&mut self, dataset: Dataset) {
        if let Some(existing) = self.datasets.iter_mut().find(|d| d.topic == dataset.topic) {
            *existing = dataset;
        } else {
            self.datasets.push(dataset);
        }
    }

    /// Best-effort persistence; a failing store never fails the step.
    async fn flush(&self) {
        let Some(store) = &self.deps.store else { return };
        if let Err(e) = store.save_agent(&self.state).await {
            warn!("agent persist failed: {e}");
        }
        for thought in self.state.thoughts.iter().rev().take(PERSIST_EVERY as usize) {
            if let Err(e) = store.save_thought(&self.state.id, thought).await {
                warn!("thought persist failed: {e}");
                break;
            }
        }
        for decision in self.state.decisions.iter().rev().take(PERSIST_EVERY as usize) {
            if let Err(e) = store.save_decision(&self.state.id, decision).await {
                warn!("decision persist failed: {e}");
                break;
            }
        }
        let signals = { self.channel.lock().await.snapshot() };
        if let Err(e) = store.save_pheromones(&signals).await {
            warn!("pheromone persist failed: {e}");
        }
    }

    async fn publish_snapshot(&self) {
        let (density, threshold, latched, transition_step, signal_count) = {
            let ch = self.channel.lock().await;
            (
                ch.density(),
                ch.critical_threshold(),
                ch.phase_transition_occurred(),
                ch.transition_step(),
                ch.len(),
            )
        };
        let snapshot = AgentSnapshot {
            state: self.state.clone(),
            density,
            critical_threshold: threshold,
            phase_transition_occurred: latched,
            transition_step,
            signal_count,
            latest_signal: self.latest_signal.clone(),
            collective: self.collective.clone(),
            identity: self.identity.card(&self.state.id, &self.state.name),
            da_enabled: self.deps.dispersal.is_some(),
        };
        *self.snapshot.write().await = snapshot;
    }
}

fn deep_strength(priority: f64) -> f64 {
    (0.65 + 0.3 * priority).min(1.0)
}

fn light_strength(confidence: f64) -> f64 {
    (0.5 + 0.3 * confidence).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_formulas() {
        assert!((light_strength(0.5) - 0.65).abs() < 1e-12);
        assert!((deep_strength(0.5) - 0.8).abs() < 1e-12);
        assert_eq!(deep_strength(2.0), 1.0);
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Per-agent HTTP surface.
//!
//! Read endpoints serve the snapshot published at the end of the last tick;
//! only `POST /pheromone` writes, and it serializes with the loop through
//! the channel mutex. A single wire schema exists per endpoint and unknown
//! fields are rejected at the edge.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::application::agent_loop::AgentSnapshot;
use crate::domain::channel::SignalChannel;
use crate::domain::identity::{verify_attestation, AttestationCheck, IdentityCard};
use crate::domain::signal::Signal;
use crate::domain::thought::Thought;

/// Thoughts returned by `/thoughts`, newest first.
const THOUGHTS_LIMIT: usize = 50;

pub struct ApiContext {
    pub channel: Arc<Mutex<SignalChannel>>,
    pub snapshot: Arc<RwLock<AgentSnapshot>>,
}

/// `GET /state` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    pub id: String,
    pub name: String,
    pub specialization: String,
    pub step: u64,
    pub density: f64,
    pub critical_threshold: f64,
    pub phase_transition_occurred: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_step: Option<u64>,
    pub synchronized: bool,
    pub energy: f64,
    pub position: [f64; 2],
    pub signal_count: usize,
    pub absorbed_count: usize,
    pub discoveries: u32,
    pub tokens_used: u32,
    pub token_budget: u32,
    pub credits: CreditsView,
    pub thought_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_thought: Option<Thought>,
    pub decision_count: usize,
    pub topics_studied: Vec<String>,
    pub contributions_to_collective: u32,
    pub identity: IdentityCard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditsView {
    pub balance: f64,
    pub earned: f64,
    pub spent: f64,
    pub tier: crate::domain::credits::CreditTier,
    pub distress_emitted: bool,
}

/// `GET /attestation` response: identity, the latest signed signal, and an
/// advisory verification of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationView {
    pub identity: IdentityCard,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_signal: Option<Signal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<AttestationCheck>,
    pub compute: ComputeView,
    pub da: DaView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeView {
    pub tokens_used: u32,
    pub token_budget: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaView {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_commitment: Option<String>,
}

pub fn state_view(snapshot: &AgentSnapshot) -> StateView {
    let state = &snapshot.state;
    StateView {
        id: state.id.clone(),
        name: state.name.clone(),
        specialization: state.specialization.clone(),
        step: state.step_count,
        density: snapshot.density,
        critical_threshold: snapshot.critical_threshold,
        phase_transition_occurred: snapshot.phase_transition_occurred,
        transition_step: snapshot.transition_step,
        synchronized: state.synchronized,
        energy: state.energy,
        position: [state.position.x, state.position.y],
        signal_count: snapshot.signal_count,
        absorbed_count: state.absorbed.len(),
        discoveries: state.discoveries,
        tokens_used: state.tokens_used,
        token_budget: state.token_budget,
        credits: CreditsView {
            balance: state.credits.balance(),
            earned: state.credits.earned(),
            spent: state.credits.spent(),
            tier: state.credits.tier(),
            distress_emitted: state.credits.distress_emitted(),
        },
        thought_count: state.thoughts.len(),
        latest_thought: state.thoughts.last().cloned(),
        decision_count: state.decisions.len(),
        topics_studied: state.topics_studied.clone(),
        contributions_to_collective: state.contributions_to_collective,
        identity: snapshot.identity.clone(),
    }
}

pub fn router(ctx: Arc<ApiContext>) -> Router {
    Router::new()
        .route("/state", get(get_state))
        .route("/pheromones", get(get_pheromones))
        .route("/pheromone", post(post_pheromone))
        .route("/thoughts", get(get_thoughts))
        .route("/identity", get(get_identity))
        .route("/attestation", get(get_attestation))
        .route("/collective", get(get_collective))
        .route("/health", get(get_health))
        .with_state(ctx)
}

/// Bind and serve until the process exits. A bind failure is fatal.
pub async fn serve(ctx: Arc<ApiContext>, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "agent HTTP surface listening");
    axum::serve(listener, router(ctx)).await?;
    Ok(())
}

async fn get_state(State(ctx): State<Arc<ApiContext>>) -> Json<StateView> {
    let snapshot = ctx.snapshot.read().await;
    Json(state_view(&snapshot))
}

async fn get_pheromones(State(ctx): State<Arc<ApiContext>>) -> Json<Vec<Signal>> {
    let channel = ctx.channel.lock().await;
    Json(channel.snapshot())
}

async fn post_pheromone(
    State(ctx): State<Arc<ApiContext>>,
    Json(signal): Json<Signal>,
) -> Json<serde_json::Value> {
    let mut channel = ctx.channel.lock().await;
    let accepted = channel.deposit(signal);
    if !accepted {
        debug!("duplicate pheromone ignored");
    }
    Json(json!({ "ok": true }))
}

async fn get_thoughts(State(ctx): State<Arc<ApiContext>>) -> Json<Vec<Thought>> {
    let snapshot = ctx.snapshot.read().await;
    let thoughts: Vec<Thought> = snapshot
        .state
        .thoughts
        .iter()
        .rev()
        .take(THOUGHTS_LIMIT)
        .cloned()
        .collect();
    Json(thoughts)
}

async fn get_identity(State(ctx): State<Arc<ApiContext>>) -> Json<IdentityCard> {
    let snapshot = ctx.snapshot.read().await;
    Json(snapshot.identity.clone())
}

async fn get_attestation(State(ctx): State<Arc<ApiContext>>) -> Json<AttestationView> {
    let snapshot = ctx.snapshot.read().await;
    let verification = snapshot.latest_signal.as_ref().map(|s| {
        verify_attestation(&s.attestation, &s.content, &s.producer_id, s.timestamp)
    });
    Json(AttestationView {
        identity: snapshot.identity.clone(),
        latest_signal: snapshot.latest_signal.clone(),
        verification,
        compute: ComputeView {
            tokens_used: snapshot.state.tokens_used,
            token_budget: snapshot.state.token_budget,
        },
        da: DaView {
            enabled: snapshot.da_enabled,
            last_commitment: snapshot
                .latest_signal
                .as_ref()
                .and_then(|s| s.da_commitment.clone()),
        },
    })
}

async fn get_collective(
    State(ctx): State<Arc<ApiContext>>,
) -> Json<Vec<crate::domain::collective::CollectiveMemory>> {
    let snapshot = ctx.snapshot.read().await;
    Json(snapshot.collective.clone())
}

async fn get_health(State(ctx): State<Arc<ApiContext>>) -> Json<serde_json::Value> {
    let snapshot = ctx.snapshot.read().await;
    Json(json!({
        "ok": true,
        "agent": snapshot.state.name,
        "step": snapshot.state.step_count,
    }))
}

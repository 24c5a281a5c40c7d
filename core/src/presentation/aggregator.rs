// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Read-only aggregator over a set of independent agents.
//!
//! Every handler fans out to the configured agent URLs with per-request
//! deadlines, merges whatever answered, and de-duplicates signals by id.
//! Nothing here holds state; agents remain the only owners of theirs.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::domain::collective::CollectiveMemory;
use crate::domain::identity::IdentityCard;
use crate::domain::signal::Signal;
use crate::domain::thought::Thought;
use crate::presentation::api::{AttestationView, StateView};

const FANOUT_TIMEOUT: Duration = Duration::from_secs(3);

pub struct AggregatorContext {
    client: reqwest::Client,
    agent_urls: Vec<String>,
}

impl AggregatorContext {
    pub fn new(agent_urls: Vec<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            agent_urls,
        }
    }

    /// Fetch `path` from every agent concurrently; absent answers are
    /// skipped (the agent's state is unknown this request).
    async fn fan_out<T: serde::de::DeserializeOwned>(&self, path: &str) -> Vec<T> {
        let fetches = self.agent_urls.iter().map(|base| {
            let client = self.client.clone();
            let url = format!("{base}{path}");
            async move {
                client
                    .get(&url)
                    .timeout(FANOUT_TIMEOUT)
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<T>()
                    .await
            }
        });
        let mut collected = Vec::new();
        for outcome in join_all(fetches).await {
            match outcome {
                Ok(value) => collected.push(value),
                Err(e) => debug!("aggregator fan-out miss: {e}"),
            }
        }
        collected
    }
}

pub fn router(ctx: Arc<AggregatorContext>) -> Router {
    Router::new()
        .route("/api/state", get(api_state))
        .route("/api/agents", get(api_agents))
        .route("/api/pheromones", get(api_pheromones))
        .route("/api/thoughts", get(api_thoughts))
        .route("/api/collective", get(api_collective))
        .route("/api/report", get(api_report))
        .route("/api/attestations", get(api_attestations))
        .route("/api/identities", get(api_identities))
        .route("/api/inject", post(api_inject))
        .with_state(ctx)
}

pub async fn serve(ctx: Arc<AggregatorContext>, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, agents = ctx.agent_urls.len(), "aggregator listening");
    axum::serve(listener, router(ctx)).await?;
    Ok(())
}

async fn api_state(State(ctx): State<Arc<AggregatorContext>>) -> Json<Value> {
    let agents: Vec<StateView> = ctx.fan_out("/state").await;
    let transitioned = agents.iter().any(|a| a.phase_transition_occurred);
    let mean_density = if agents.is_empty() {
        0.0
    } else {
        agents.iter().map(|a| a.density).sum::<f64>() / agents.len() as f64
    };
    Json(json!({
        "agentCount": ctx.agent_urls.len(),
        "reachable": agents.len(),
        "transitioned": transitioned,
        "meanDensity": mean_density,
        "agents": agents,
    }))
}

async fn api_agents(State(ctx): State<Arc<AggregatorContext>>) -> Json<Vec<StateView>> {
    Json(ctx.fan_out("/state").await)
}

/// Union of all channels, de-duplicated by signal id.
async fn api_pheromones(State(ctx): State<Arc<AggregatorContext>>) -> Json<Vec<Signal>> {
    let batches: Vec<Vec<Signal>> = ctx.fan_out("/pheromones").await;
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for signal in batches.into_iter().flatten() {
        if seen.insert(signal.id.clone()) {
            merged.push(signal);
        }
    }
    Json(merged)
}

async fn api_thoughts(State(ctx): State<Arc<AggregatorContext>>) -> Json<Vec<Thought>> {
    let batches: Vec<Vec<Thought>> = ctx.fan_out("/thoughts").await;
    let mut merged: Vec<Thought> = batches.into_iter().flatten().collect();
    merged.sort_by_key(|t| std::cmp::Reverse(t.timestamp));
    Json(merged)
}

async fn api_collective(State(ctx): State<Arc<AggregatorContext>>) -> Json<Vec<CollectiveMemory>> {
    let batches: Vec<Vec<CollectiveMemory>> = ctx.fan_out("/collective").await;
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for memory in batches.into_iter().flatten() {
        if seen.insert(memory.id.clone()) {
            merged.push(memory);
        }
    }
    merged.sort_by_key(|m| std::cmp::Reverse(m.created_at));
    Json(merged)
}

/// The latest collective memory that carries a structured report, falling
/// back to the latest memory of any kind.
async fn api_report(State(ctx): State<Arc<AggregatorContext>>) -> Json<Value> {
    let batches: Vec<Vec<CollectiveMemory>> = ctx.fan_out("/collective").await;
    let mut memories: Vec<CollectiveMemory> = batches.into_iter().flatten().collect();
    memories.sort_by_key(|m| std::cmp::Reverse(m.created_at));
    let with_report = memories.iter().find(|m| m.report.is_some());
    match with_report.or(memories.first()) {
        Some(memory) => Json(json!({ "report": memory })),
        None => Json(json!({ "report": Value::Null })),
    }
}

async fn api_attestations(State(ctx): State<Arc<AggregatorContext>>) -> Json<Vec<AttestationView>> {
    Json(ctx.fan_out("/attestation").await)
}

async fn api_identities(State(ctx): State<Arc<AggregatorContext>>) -> Json<Vec<IdentityCard>> {
    Json(ctx.fan_out("/identity").await)
}

#[derive(Debug, Deserialize)]
struct InjectRequest {
    topic: Option<String>,
    content: Option<String>,
}

/// Synthesize a human-attributed signal and broadcast it to every agent.
async fn api_inject(
    State(ctx): State<Arc<AggregatorContext>>,
    Json(request): Json<InjectRequest>,
) -> Json<Value> {
    let domain = request.topic.unwrap_or_else(|| "general".to_string());
    let content = request
        .content
        .unwrap_or_else(|| format!("operator nudge: investigate {domain}"));

    let signal = Signal {
        id: Uuid::new_v4().to_string(),
        producer_id: "human".to_string(),
        content,
        domain,
        confidence: 0.9,
        strength: 0.8,
        connections: Vec::new(),
        timestamp: Utc::now().timestamp_millis(),
        attestation: "unsigned".to_string(),
        producer_pubkey: None,
        da_commitment: None,
    };

    let posts = ctx.agent_urls.iter().map(|base| {
        let client = ctx.client.clone();
        let url = format!("{base}/pheromone");
        let body = signal.clone();
        async move {
            client
                .post(&url)
                .timeout(FANOUT_TIMEOUT)
                .json(&body)
                .send()
                .await?
                .error_for_status()
        }
    });
    let delivered = join_all(posts)
        .await
        .into_iter()
        .filter(|r| r.is_ok())
        .count();

    Json(json!({ "ok": true, "id": signal.id, "delivered": delivered }))
}

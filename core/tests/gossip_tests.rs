// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Gossip dedup over live HTTP: two agents exchange one signal by push and
//! pull; both converge on exactly one copy and further exchange adds
//! nothing.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use hive_core::application::agent_loop::AgentSnapshot;
use hive_core::domain::agent::AgentState;
use hive_core::domain::channel::SignalChannel;
use hive_core::domain::credits::CreditLedger;
use hive_core::domain::identity::AgentIdentity;
use hive_core::domain::personality::{AgentPersonality, AgentRole};
use hive_core::domain::signal::Signal;
use hive_core::infrastructure::gossip::GossipClient;
use hive_core::presentation::api::{router, ApiContext};

struct TestNode {
    url: String,
    channel: Arc<Mutex<SignalChannel>>,
}

async fn spawn_node(index: usize) -> TestNode {
    let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(index as u64);
    let identity = AgentIdentity::generate();
    let agent_id = format!("agent-{index}");
    let name = format!("hive-scout-{index}");
    let state = AgentState::new(
        agent_id.clone(),
        name.clone(),
        AgentRole::Scout.specialization(),
        AgentPersonality::seeded(AgentRole::Scout, &mut rng),
        50_000,
        CreditLedger::new(50_000.0, 10_000.0, 2_000.0),
        &mut rng,
    );
    let channel = Arc::new(Mutex::new(SignalChannel::new(0.55, 0.12, 0.05, 2)));
    let snapshot = Arc::new(RwLock::new(AgentSnapshot {
        state,
        density: 0.0,
        critical_threshold: 0.55,
        phase_transition_occurred: false,
        transition_step: None,
        signal_count: 0,
        latest_signal: None,
        collective: Vec::new(),
        identity: identity.card(&agent_id, &name),
        da_enabled: false,
    }));
    let ctx = Arc::new(ApiContext { channel: channel.clone(), snapshot });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(ctx)).await.unwrap();
    });

    TestNode {
        url: format!("http://{addr}"),
        channel,
    }
}

fn signed_signal(identity: &AgentIdentity, producer: &str) -> Signal {
    let mut s = Signal::new(
        producer,
        "transit depth varies with a 3.2 day period across the batch",
        "exoplanets",
        0.8,
        0.74,
        vec![],
        1_722_000_000_000,
    );
    s.id = "X".to_string();
    s.attestation = identity.attest(&s.content, &s.producer_id, s.timestamp);
    s.producer_pubkey = Some(identity.public_key_hex().to_string());
    s
}

#[tokio::test]
async fn test_push_then_pull_converges_to_one_copy_each() {
    let node_a = spawn_node(0).await;
    let node_b = spawn_node(1).await;

    let identity = AgentIdentity::generate();
    let signal = signed_signal(&identity, "agent-0");

    // A emits: deposit locally, push to B.
    {
        let mut ch = node_a.channel.lock().await;
        assert!(ch.deposit(signal.clone()));
    }
    let a_to_b = GossipClient::new(vec![node_b.url.clone()]);
    a_to_b.push_all(&signal).await;

    {
        let ch = node_b.channel.lock().await;
        assert_eq!(ch.len(), 1);
        assert!(ch.contains("X"));
    }

    // B pulls from A: nothing new arrives.
    let b_from_a = GossipClient::new(vec![node_a.url.clone()]);
    let pulled = b_from_a.pull_all().await;
    assert_eq!(pulled.len(), 1);
    {
        let mut ch = node_b.channel.lock().await;
        for s in pulled {
            ch.deposit(s);
        }
        assert_eq!(ch.len(), 1);
    }

    // A third exchange in the other direction adds nothing either.
    a_to_b.push_all(&signal).await;
    {
        let ch = node_b.channel.lock().await;
        assert_eq!(ch.len(), 1);
    }
    {
        let ch = node_a.channel.lock().await;
        assert_eq!(ch.len(), 1);
    }
}

#[tokio::test]
async fn test_pull_skips_dead_peers_silently() {
    let node_a = spawn_node(2).await;
    {
        let mut ch = node_a.channel.lock().await;
        let identity = AgentIdentity::generate();
        ch.deposit(signed_signal(&identity, "agent-2"));
    }

    // One live peer, one that answers nothing.
    let client = GossipClient::new(vec![
        node_a.url.clone(),
        "http://127.0.0.1:9".to_string(),
    ]);
    let pulled = client.pull_all().await;
    assert_eq!(pulled.len(), 1, "live peer still contributes");
}

#[tokio::test]
async fn test_malformed_wire_signal_is_rejected_at_the_edge() {
    let node = spawn_node(3).await;

    let client = reqwest::Client::new();
    let bogus = serde_json::json!({
        "id": "bad", "producerId": "p", "content": "c", "domain": "d",
        "confidence": 0.5, "strength": 0.5, "connections": [],
        "timestamp": 0, "attestation": "", "surprise": "field"
    });
    let response = client
        .post(format!("{}/pheromone", node.url))
        .json(&bogus)
        .send()
        .await
        .unwrap();
    assert!(!response.status().is_success());

    let ch = node.channel.lock().await;
    assert!(ch.is_empty());
}

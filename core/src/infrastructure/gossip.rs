// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Best-effort gossip transport between agent processes.
//!
//! Fire-and-forget semantics throughout: every request carries its own
//! deadline, failed peers are skipped for the tick, and nothing retries.
//! Convergence rests entirely on dedup-by-id at the channel.

use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::domain::signal::Signal;

/// Per-request deadline for peer RPC.
const PEER_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone)]
pub struct GossipClient {
    client: reqwest::Client,
    peers: Vec<String>,
}

impl GossipClient {
    pub fn new(peers: Vec<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            peers,
        }
    }

    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    /// Pull every peer's channel snapshot concurrently. Failures are
    /// skipped silently; the peer's state is simply unknown this tick.
    pub async fn pull_all(&self) -> Vec<Signal> {
        if self.peers.is_empty() {
            return Vec::new();
        }
        let fetches = self.peers.iter().map(|peer| {
            let client = self.client.clone();
            let url = format!("{peer}/pheromones");
            async move {
                let result = client
                    .get(&url)
                    .timeout(PEER_TIMEOUT)
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<Vec<Signal>>()
                    .await;
                result.map(|signals| (url, signals))
            }
        });

        let mut pulled = Vec::new();
        for outcome in join_all(fetches).await {
            match outcome {
                Ok((_, signals)) => pulled.extend(signals),
                Err(e) => debug!("peer pull skipped: {e}"),
            }
        }
        pulled
    }

    /// Push one signal to every peer concurrently. Failures are logged and
    /// ignored; gossip owes no delivery guarantee.
    pub async fn push_all(&self, signal: &Signal) {
        if self.peers.is_empty() {
            return;
        }
        let pushes = self.peers.iter().map(|peer| {
            let client = self.client.clone();
            let url = format!("{peer}/pheromone");
            let body = signal.clone();
            async move {
                client
                    .post(&url)
                    .timeout(PEER_TIMEOUT)
                    .json(&body)
                    .send()
                    .await?
                    .error_for_status()?;
                Ok::<_, reqwest::Error>(url)
            }
        });

        for outcome in join_all(pushes).await {
            if let Err(e) = outcome {
                warn!("peer push failed: {e}");
            }
        }
    }
}

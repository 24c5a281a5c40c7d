// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Data-availability dispersal client.
//!
//! Dispersal is fire-and-forget: a background task posts the signal payload
//! to the DA proxy and, depending on configuration, writes the returned
//! commitment back onto the local signal copy (optionally re-gossiping it).
//! Overflow or failure drops silently.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::channel::SignalChannel;
use crate::domain::signal::Signal;
use crate::infrastructure::gossip::GossipClient;

const DISPERSAL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum DispersalError {
    #[error("network error: {0}")]
    Network(String),

    #[error("proxy returned HTTP {0}")]
    Status(u16),

    #[error("malformed proxy response: {0}")]
    Decode(String),
}

#[derive(Deserialize)]
struct DisperseResponse {
    commitment: String,
}

#[derive(Clone)]
pub struct DaClient {
    client: reqwest::Client,
    base_url: String,
}

impl DaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Disperse a blob and return the opaque commitment string.
    pub async fn disperse(&self, blob: &[u8]) -> Result<String, DispersalError> {
        let url = format!("{}/disperse", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .timeout(DISPERSAL_TIMEOUT)
            .json(&serde_json::json!({ "data": BASE64.encode(blob) }))
            .send()
            .await
            .map_err(|e| DispersalError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DispersalError::Status(response.status().as_u16()));
        }
        let parsed: DisperseResponse = response
            .json()
            .await
            .map_err(|e| DispersalError::Decode(e.to_string()))?;
        Ok(parsed.commitment)
    }

    /// Spawn the fire-and-forget dispersal of an emitted signal.
    ///
    /// With write-back enabled the commitment is attached to the local copy
    /// and the enriched signal is re-gossiped; otherwise it stays local-only
    /// and peers may permanently lack it.
    pub fn disperse_signal(
        &self,
        signal: Signal,
        channel: Arc<Mutex<SignalChannel>>,
        gossip: GossipClient,
        writeback: bool,
    ) {
        let da = self.clone();
        tokio::spawn(async move {
            let blob = match serde_json::to_vec(&signal) {
                Ok(b) => b,
                Err(e) => {
                    warn!("dispersal serialization failed: {e}");
                    return;
                }
            };
            match da.disperse(&blob).await {
                Ok(commitment) => {
                    debug!(signal = %signal.id, "DA commitment received");
                    let updated = {
                        let mut ch = channel.lock().await;
                        ch.set_da_commitment(&signal.id, &commitment)
                    };
                    if writeback {
                        if let Some(updated) = updated {
                            gossip.push_all(&updated).await;
                        }
                    }
                }
                Err(e) => debug!(signal = %signal.id, "DA dispersal dropped: {e}"),
            }
        });
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;

use hive_core::domain::collective::CollectiveMemory;
use hive_core::domain::identity::IdentityCard;
use hive_core::domain::signal::Signal;
use hive_core::domain::thought::Thought;
use hive_core::presentation::api::{AttestationView, StateView};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Client for one hive agent's HTTP surface.
pub struct HiveClient {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
pub struct HealthView {
    pub ok: bool,
    pub agent: String,
    pub step: u64,
}

impl HiveClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn state(&self) -> Result<StateView> {
        self.get("/state").await
    }

    pub async fn pheromones(&self) -> Result<Vec<Signal>> {
        self.get("/pheromones").await
    }

    /// Deposit one signal; the agent ignores duplicates by id.
    pub async fn deposit_pheromone(&self, signal: &Signal) -> Result<()> {
        let url = format!("{}/pheromone", self.base_url);
        self.client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(signal)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn thoughts(&self) -> Result<Vec<Thought>> {
        self.get("/thoughts").await
    }

    pub async fn identity(&self) -> Result<IdentityCard> {
        self.get("/identity").await
    }

    pub async fn attestation(&self) -> Result<AttestationView> {
        self.get("/attestation").await
    }

    pub async fn collective(&self) -> Result<Vec<CollectiveMemory>> {
        self.get("/collective").await
    }

    pub async fn health(&self) -> Result<HealthView> {
        self.get("/health").await
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let value = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(value)
    }
}

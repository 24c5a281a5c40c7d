// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Dataset value objects and the data-source seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A fetched dataset, reduced to the fields the agents reason over.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub topic: String,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    pub source: String,
    /// Unix milliseconds.
    pub fetched_at: i64,
}

#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Decode(String),
}

/// External data source contract. `Ok(None)` means the topic is unknown to
/// the upstream; errors mean the fetch itself failed and the calling action
/// records a failure.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_dataset(&self, topic: &str) -> Result<Option<Dataset>, DataSourceError>;
}

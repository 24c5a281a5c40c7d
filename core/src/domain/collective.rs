// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Collective memories assembled at phase transition.

use serde::{Deserialize, Serialize};

/// Structured report returned by the reasoning backend during synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectiveReport {
    pub overview: String,
    #[serde(default)]
    pub key_findings: Vec<String>,
    #[serde(default)]
    pub opinions: String,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub verdict: String,
}

/// One contributor's evidence in the synthesis bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceEntry {
    pub producer_name: String,
    pub specialization: String,
    pub observation: String,
    pub reasoning: String,
    pub conclusion: String,
    pub confidence: f64,
}

/// The durable artifact of a synthesis round. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectiveMemory {
    pub id: String,
    pub topic: String,
    /// Plaintext fallback; the primary payload when `report` is absent.
    pub synthesis: String,
    pub contributors: Vec<String>,
    pub signal_ids: Vec<String>,
    pub confidence: f64,
    pub attestation: String,
    /// Unix milliseconds.
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<CollectiveReport>,
}

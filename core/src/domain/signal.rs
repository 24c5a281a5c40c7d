// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The signal (pheromone): a signed, decaying knowledge token gossiped
//! between agents. `id` is the dedup key across the whole network.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Strength above which a signal counts toward channel density.
pub const ACTIVE_STRENGTH: f64 = 0.1;

/// Strength above which a signal counts toward the gossip transition quorum.
pub const STRONG_STRENGTH: f64 = 0.4;

/// A signed, decaying knowledge token.
///
/// `confidence` is the producer's self-assessment and never changes after
/// emission. `strength` is the mutable vitality: it decays every tick and is
/// boosted when another agent absorbs the signal. Unknown fields arriving
/// over the wire are rejected at the edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Signal {
    pub id: String,
    pub producer_id: String,
    pub content: String,
    pub domain: String,
    pub confidence: f64,
    pub strength: f64,
    #[serde(default)]
    pub connections: Vec<String>,
    /// Producer wall-clock at emission, unix milliseconds. Not monotonic.
    pub timestamp: i64,
    /// `"ed25519:<hex sig>:<hex pubkey>"` over `content|producer_id|timestamp`.
    pub attestation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer_pubkey: Option<String>,
    /// Set asynchronously after DA dispersal; peers may never see it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub da_commitment: Option<String>,
}

impl Signal {
    /// Build an unsigned signal; the caller attaches the attestation.
    pub fn new(
        producer_id: impl Into<String>,
        content: impl Into<String>,
        domain: impl Into<String>,
        confidence: f64,
        strength: f64,
        connections: Vec<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            producer_id: producer_id.into(),
            content: content.into(),
            domain: domain.into(),
            confidence: confidence.clamp(0.0, 1.0),
            strength: strength.clamp(0.0, 1.0),
            connections,
            timestamp,
            attestation: String::new(),
            producer_pubkey: None,
            da_commitment: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.strength > ACTIVE_STRENGTH
    }

    pub fn is_strong(&self) -> bool {
        self.strength > STRONG_STRENGTH
    }

    /// Payload the attestation signature covers.
    pub fn attestation_payload(&self) -> String {
        format!("{}|{}|{}", self.content, self.producer_id, self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_and_strength_are_clamped() {
        let s = Signal::new("a", "finding", "exoplanets", 1.7, -0.3, vec![], 0);
        assert_eq!(s.confidence, 1.0);
        assert_eq!(s.strength, 0.0);
    }

    #[test]
    fn test_wire_roundtrip_uses_camel_case() {
        let mut s = Signal::new("agent-1", "c", "mars_weather", 0.8, 0.7, vec!["x".into()], 42);
        s.attestation = "ed25519:aa:bb".to_string();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["producerId"], "agent-1");
        assert_eq!(json["timestamp"], 42);
        assert!(json.get("daCommitment").is_none());

        let back: Signal = serde_json::from_value(json).unwrap();
        assert_eq!(back.id, s.id);
        assert_eq!(back.connections, vec!["x".to_string()]);
    }

    #[test]
    fn test_unknown_wire_fields_are_rejected() {
        let json = serde_json::json!({
            "id": "i", "producerId": "p", "content": "c", "domain": "d",
            "confidence": 0.5, "strength": 0.5, "connections": [],
            "timestamp": 0, "attestation": "", "bogus": true
        });
        assert!(serde_json::from_value::<Signal>(json).is_err());
    }
}

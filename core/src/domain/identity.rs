// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Per-agent Ed25519 identity and the signal attestation format.
//!
//! The attestation string is exactly `"ed25519:<hex sig>:<hex pubkey>"`,
//! with the signature taken over `content|producer_id|timestamp`. The
//! private key never leaves the process; on a TEE deployment the same
//! contract holds with enclave-held keys.

use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const ATTESTATION_SCHEME: &str = "ed25519";
const FINGERPRINT_LEN: usize = 16;

/// An agent's keypair plus the derived public material.
pub struct AgentIdentity {
    signing_key: SigningKey,
    public_key_hex: String,
    fingerprint: String,
    created_at: DateTime<Utc>,
}

/// Public identity card exposed on `/identity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityCard {
    pub agent_id: String,
    pub name: String,
    pub public_key: String,
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
    pub tee_mode: bool,
}

/// Result of advisory attestation verification. An invalid attestation
/// marks a signal as unverified; it never removes it from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl AttestationCheck {
    fn invalid() -> Self {
        Self { valid: false, public_key: None, fingerprint: None }
    }
}

impl AgentIdentity {
    /// Generate a fresh keypair from the OS CSPRNG.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Deterministic identity from a 32-byte seed. Test use only.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(&seed))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key_hex = hex::encode(signing_key.verifying_key().to_bytes());
        let fingerprint = fingerprint_of(&public_key_hex);
        Self {
            signing_key,
            public_key_hex,
            fingerprint,
            created_at: Utc::now(),
        }
    }

    pub fn public_key_hex(&self) -> &str {
        &self.public_key_hex
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn card(&self, agent_id: &str, name: &str) -> IdentityCard {
        IdentityCard {
            agent_id: agent_id.to_string(),
            name: name.to_string(),
            public_key: self.public_key_hex.clone(),
            fingerprint: self.fingerprint.clone(),
            created_at: self.created_at,
            tee_mode: false,
        }
    }

    /// Sign a payload and render the attestation string.
    pub fn attest(&self, content: &str, producer_id: &str, timestamp: i64) -> String {
        let payload = attestation_payload(content, producer_id, timestamp);
        let sig = self.signing_key.sign(payload.as_bytes());
        format!(
            "{ATTESTATION_SCHEME}:{}:{}",
            hex::encode(sig.to_bytes()),
            self.public_key_hex
        )
    }
}

/// First sixteen hex chars of sha256 over the hex-encoded public key.
pub fn fingerprint_of(public_key_hex: &str) -> String {
    let digest = Sha256::digest(public_key_hex.as_bytes());
    hex::encode(digest)[..FINGERPRINT_LEN].to_string()
}

fn attestation_payload(content: &str, producer_id: &str, timestamp: i64) -> String {
    format!("{content}|{producer_id}|{timestamp}")
}

/// Verify an attestation string against the payload it claims to cover.
/// Malformed input yields `valid = false`; this function never errors.
pub fn verify_attestation(
    attestation: &str,
    content: &str,
    producer_id: &str,
    timestamp: i64,
) -> AttestationCheck {
    let mut parts = attestation.splitn(3, ':');
    let (scheme, sig_hex, pubkey_hex) = match (parts.next(), parts.next(), parts.next()) {
        (Some(s), Some(sig), Some(pk)) => (s, sig, pk),
        _ => return AttestationCheck::invalid(),
    };
    if scheme != ATTESTATION_SCHEME {
        return AttestationCheck::invalid();
    }

    let sig_bytes: [u8; 64] = match hex::decode(sig_hex).ok().and_then(|b| b.try_into().ok()) {
        Some(b) => b,
        None => return AttestationCheck::invalid(),
    };
    let pk_bytes: [u8; 32] = match hex::decode(pubkey_hex).ok().and_then(|b| b.try_into().ok()) {
        Some(b) => b,
        None => return AttestationCheck::invalid(),
    };
    let verifying_key = match VerifyingKey::from_bytes(&pk_bytes) {
        Ok(k) => k,
        Err(_) => return AttestationCheck::invalid(),
    };

    let payload = attestation_payload(content, producer_id, timestamp);
    let signature = Signature::from_bytes(&sig_bytes);
    let valid = verifying_key.verify(payload.as_bytes(), &signature).is_ok();

    AttestationCheck {
        valid,
        public_key: Some(pubkey_hex.to_string()),
        fingerprint: Some(fingerprint_of(pubkey_hex)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attestation_roundtrip() {
        let id = AgentIdentity::generate();
        let att = id.attest("orbital resonance in K2-138", "agent-3", 1_722_000_000_000);
        let check = verify_attestation(&att, "orbital resonance in K2-138", "agent-3", 1_722_000_000_000);
        assert!(check.valid);
        assert_eq!(check.public_key.as_deref(), Some(id.public_key_hex()));
        assert_eq!(check.fingerprint.as_deref(), Some(id.fingerprint()));
    }

    #[test]
    fn test_tampered_payload_fails_verification() {
        let id = AgentIdentity::generate();
        let att = id.attest("original", "agent-3", 1);
        assert!(!verify_attestation(&att, "tampered", "agent-3", 1).valid);
        assert!(!verify_attestation(&att, "original", "agent-4", 1).valid);
        assert!(!verify_attestation(&att, "original", "agent-3", 2).valid);
    }

    #[test]
    fn test_malformed_attestations_are_invalid_not_fatal() {
        for bad in [
            "",
            "ed25519",
            "ed25519:zz:yy",
            "rsa:00:11",
            "ed25519:deadbeef:cafe",
        ] {
            let check = verify_attestation(bad, "c", "p", 0);
            assert!(!check.valid, "{bad:?} should not verify");
        }
    }

    #[test]
    fn test_fingerprint_is_sixteen_hex_chars() {
        let id = AgentIdentity::from_seed([7u8; 32]);
        assert_eq!(id.fingerprint().len(), 16);
        assert!(id.fingerprint().chars().all(|c| c.is_ascii_hexdigit()));
        // Deterministic for a fixed seed.
        let again = AgentIdentity::from_seed([7u8; 32]);
        assert_eq!(id.fingerprint(), again.fingerprint());
    }

    #[test]
    fn test_attestation_format_has_three_colon_fields() {
        let id = AgentIdentity::generate();
        let att = id.attest("c", "p", 0);
        let parts: Vec<&str> = att.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ed25519");
        assert_eq!(parts[1].len(), 128);
        assert_eq!(parts[2].len(), 64);
    }
}

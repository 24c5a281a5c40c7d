// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Attestation round-trips over the signal wire format, and the tolerance
//! rule: a signal that fails verification is marked invalid but never
//! removed from a channel.

use hive_core::domain::channel::SignalChannel;
use hive_core::domain::identity::{verify_attestation, AgentIdentity};
use hive_core::domain::signal::Signal;

fn emitted(identity: &AgentIdentity, producer: &str, content: &str, timestamp: i64) -> Signal {
    let mut s = Signal::new(producer, content, "exoplanets", 0.8, 0.7, vec![], timestamp);
    s.attestation = identity.attest(&s.content, &s.producer_id, s.timestamp);
    s.producer_pubkey = Some(identity.public_key_hex().to_string());
    s
}

#[test]
fn test_roundtrip_holds_across_keys_contents_and_timestamps() {
    for seed in 0..16u8 {
        let identity = AgentIdentity::from_seed([seed; 32]);
        let producer = format!("agent-{seed}");
        let content = format!("finding {seed}: flux anomaly at bin {}", seed as u32 * 7);
        let timestamp = 1_700_000_000_000 + seed as i64 * 13;

        let signal = emitted(&identity, &producer, &content, timestamp);
        let check = verify_attestation(
            &signal.attestation,
            &signal.content,
            &signal.producer_id,
            signal.timestamp,
        );
        assert!(check.valid, "seed {seed}");
        assert_eq!(check.public_key.as_deref(), Some(identity.public_key_hex()));
        assert_eq!(check.fingerprint.as_deref(), Some(identity.fingerprint()));
    }
}

#[test]
fn test_roundtrip_survives_wire_serialization() {
    let identity = AgentIdentity::generate();
    let signal = emitted(&identity, "agent-0", "serialized and back", 42);

    let wire = serde_json::to_string(&signal).unwrap();
    let back: Signal = serde_json::from_str(&wire).unwrap();

    let check =
        verify_attestation(&back.attestation, &back.content, &back.producer_id, back.timestamp);
    assert!(check.valid);
}

#[test]
fn test_unverified_signal_stays_in_the_channel() {
    let identity = AgentIdentity::generate();
    let mut forged = emitted(&identity, "agent-0", "original claim", 7);
    forged.content = "tampered claim".to_string();

    let check = verify_attestation(
        &forged.attestation,
        &forged.content,
        &forged.producer_id,
        forged.timestamp,
    );
    assert!(!check.valid);

    // Verification is advisory: the channel accepts the signal anyway.
    let mut channel = SignalChannel::new(0.55, 0.12, 0.05, 2);
    assert!(channel.deposit(forged.clone()));
    assert!(channel.contains(&forged.id));
}

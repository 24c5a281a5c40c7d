// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

/// Hive Rust SDK
///
/// Typed client for one agent's HTTP surface: state, pheromones, thoughts,
/// identity, attestation, and collective memories.

pub mod client;

pub use client::HiveClient;

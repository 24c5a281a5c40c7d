// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Hive Core
//!
//! Leaderless multi-agent coordination substrate. A population of
//! independent agent processes exchanges signed, decaying signals over
//! best-effort gossip; each process derives a density scalar from its own
//! view and detects the collective phase transition locally.
//!
//! Layers follow the AEGIS layout:
//! - `domain` — value objects, the signal channel, identity, credits
//! - `application` — the agent loop, decision engine, synthesis
//! - `infrastructure` — reasoning adapters, gossip, data source, persistence
//! - `presentation` — the per-agent HTTP surface and the aggregator

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

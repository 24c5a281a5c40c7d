// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod agent_loop;
pub mod decision_engine;
pub mod reasoning_service;
pub mod synthesis;

pub use agent_loop::{AgentSnapshot, SwarmAgent, SwarmAgentDeps};
pub use reasoning_service::{ReasoningOutcome, ReasoningService};

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod agent;
pub mod channel;
pub mod collective;
pub mod config;
pub mod credits;
pub mod dataset;
pub mod decision;
pub mod identity;
pub mod personality;
pub mod reasoning;
pub mod signal;
pub mod thought;

pub use agent::AgentState;
pub use channel::SignalChannel;
pub use config::HiveConfig;
pub use credits::{CreditLedger, CreditTier};
pub use identity::AgentIdentity;
pub use personality::{AgentPersonality, AgentRole};
pub use signal::Signal;
pub use thought::Thought;

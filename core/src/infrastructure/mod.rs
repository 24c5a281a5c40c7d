// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod data_source;
pub mod db;
pub mod dispersal;
pub mod gossip;
pub mod llm;
pub mod repositories;

pub use data_source::NasaDataSource;
pub use db::Database;
pub use dispersal::DaClient;
pub use gossip::GossipClient;
pub use repositories::StateStore;

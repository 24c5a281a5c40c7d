// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `hive aggregator` - run the read-only aggregator over agent nodes.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use hive_core::presentation::aggregator::{self, AggregatorContext};

#[derive(Subcommand)]
pub enum AggregatorCommand {
    /// Serve the aggregator API until SIGINT
    Run {
        /// HTTP port for the aggregator
        #[arg(long, env = "AGGREGATOR_PORT", default_value = "3000")]
        port: u16,

        /// Comma-separated agent base URLs
        #[arg(long, env = "AGENT_URLS")]
        agents: String,
    },
}

pub async fn handle_command(command: AggregatorCommand) -> Result<()> {
    match command {
        AggregatorCommand::Run { port, agents } => {
            let agent_urls: Vec<String> = agents
                .split(',')
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty())
                .collect();
            if agent_urls.is_empty() {
                anyhow::bail!("No agent URLs configured; pass --agents or set AGENT_URLS");
            }
            println!(
                "{} aggregating {} agents on port {}",
                "hive".green().bold(),
                agent_urls.len(),
                port
            );
            let ctx = Arc::new(AggregatorContext::new(agent_urls));
            aggregator::serve(ctx, port)
                .await
                .context("Aggregator server failed")
        }
    }
}

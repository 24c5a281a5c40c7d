// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `hive agent` - run one swarm agent node.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use tokio::sync::watch;
use tracing::{error, info};

use hive_core::application::agent_loop::{SwarmAgent, SwarmAgentDeps};
use hive_core::application::reasoning_service::ReasoningService;
use hive_core::domain::config::HiveConfig;
use hive_core::domain::identity::AgentIdentity;
use hive_core::infrastructure::data_source::NasaDataSource;
use hive_core::infrastructure::db::Database;
use hive_core::infrastructure::dispersal::DaClient;
use hive_core::infrastructure::gossip::GossipClient;
use hive_core::infrastructure::llm::provider_from_config;
use hive_core::infrastructure::repositories::StateStore;
use hive_core::presentation::api::{self, ApiContext};

#[derive(Subcommand)]
pub enum AgentCommand {
    /// Run the agent node: loop plus HTTP surface, until SIGINT
    Run {
        /// Override the HTTP port (defaults to 3001 + agent index)
        #[arg(long)]
        port: Option<u16>,

        /// Comma-separated peer base URLs (overrides PEER_URLS)
        #[arg(long)]
        peers: Option<String>,
    },
}

pub async fn handle_command(command: AgentCommand, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        AgentCommand::Run { port, peers } => run(config_path, port, peers).await,
    }
}

async fn run(config_path: Option<PathBuf>, port: Option<u16>, peers: Option<String>) -> Result<()> {
    let mut config = HiveConfig::load(config_path.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = port {
        config.agent_port = port;
    }
    if let Some(peers) = peers {
        config.peer_urls = peers
            .split(',')
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .collect();
    }
    config.validate().context("Configuration validation failed")?;
    let config = Arc::new(config);

    // Keypair generation failure is fatal by policy; generate() can only
    // fail by panicking inside the CSPRNG, which is equivalent.
    let identity = Arc::new(AgentIdentity::generate());
    println!(
        "{} agent {} fingerprint {}",
        "hive".green().bold(),
        config.agent_index,
        identity.fingerprint()
    );

    let reasoning = ReasoningService::new(provider_from_config(&config));
    if !reasoning.is_enabled() {
        println!(
            "{}",
            "No reasoning provider configured; running in light mode only.".yellow()
        );
    }

    let store = match &config.db_path {
        Some(path) => {
            let db = Database::open(path)
                .await
                .with_context(|| format!("Failed to open database at {}", path.display()))?;
            Some(StateStore::new(db))
        }
        None => None,
    };

    let deps = SwarmAgentDeps {
        reasoning,
        data_source: Arc::new(NasaDataSource::new(config.data_api_key.clone())),
        gossip: GossipClient::new(config.peer_urls.clone()),
        dispersal: config.da_proxy_url.clone().map(DaClient::new),
        store,
    };

    let mut agent = SwarmAgent::new(config.clone(), identity, deps);
    agent.restore().await;

    let api_ctx = Arc::new(ApiContext {
        channel: agent.channel(),
        snapshot: agent.snapshot(),
    });
    let api_port = config.agent_port;
    tokio::spawn(async move {
        if let Err(e) = api::serve(api_ctx, api_port).await {
            error!("HTTP surface failed: {e}");
            std::process::exit(1);
        }
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("SIGINT received, stopping agent");
            let _ = shutdown_tx.send(true);
        }
    });

    agent.run(shutdown_rx).await;
    println!("{}", "Agent stopped.".green());
    Ok(())
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Hive Agent Host CLI
//!
//! The `hive` binary hosts one swarm agent node, or the read-only
//! aggregator over a set of nodes.
//!
//! ## Commands
//!
//! - `hive agent run` - run one agent node (loop + HTTP surface)
//! - `hive aggregator run` - run the aggregator over configured agent URLs
//! - `hive config show|generate` - configuration management
//!
//! Configuration comes from an optional YAML manifest overlaid by
//! environment variables (`AGENT_INDEX`, `AGENT_PORT`, `PEER_URLS`, ...),
//! parsed exactly once at startup.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod commands;

use commands::{AgentCommand, AggregatorCommand, ConfigCommand};

/// Hive Agent Host - leaderless swarm substrate node
#[derive(Parser)]
#[command(name = "hive")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a YAML configuration manifest
    #[arg(short, long, global = true, env = "HIVE_CONFIG_PATH", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "HIVE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Agent node operations
    #[command(name = "agent")]
    Agent {
        #[command(subcommand)]
        command: AgentCommand,
    },

    /// Aggregator operations
    #[command(name = "aggregator")]
    Aggregator {
        #[command(subcommand)]
        command: AggregatorCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Agent { command }) => commands::agent::handle_command(command, cli.config).await,
        Some(Commands::Aggregator { command }) => {
            commands::aggregator::handle_command(command).await
        }
        Some(Commands::Config { command }) => commands::config::handle_command(command, cli.config).await,
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `hive config` - show or generate the node configuration manifest.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use hive_core::domain::config::HiveConfig;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (manifest + environment overlay)
    Show,

    /// Write a default manifest to the given path
    Generate {
        /// Output path for the manifest
        #[arg(default_value = "hive-config.yaml")]
        path: PathBuf,
    },
}

pub async fn handle_command(command: ConfigCommand, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let config = HiveConfig::load(config_path.as_deref())
                .context("Failed to load configuration")?;
            config.validate().context("Configuration validation failed")?;
            println!("{}", config.to_yaml()?);
            Ok(())
        }
        ConfigCommand::Generate { path } => {
            if path.exists() {
                anyhow::bail!("Refusing to overwrite existing file: {}", path.display());
            }
            let config = HiveConfig::default();
            std::fs::write(&path, config.to_yaml()?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} wrote {}", "hive".green().bold(), path.display());
            Ok(())
        }
    }
}

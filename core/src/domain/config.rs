// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Node configuration, built once at startup and passed by reference.
//!
//! Values come from an optional YAML manifest overlaid by environment
//! variables; the environment is never re-read mid-run.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const BASE_PORT: u16 = 3001;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HiveConfig {
    /// Index of this agent within the swarm; selects role and default port.
    pub agent_index: usize,
    pub agent_port: u16,
    /// Base URLs of every peer agent, e.g. `http://127.0.0.1:3002`.
    #[serde(default)]
    pub peer_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
    pub sync_interval_ms: u64,
    /// Pacing interval after a deep (reasoning-backed) step.
    pub engineering_step_interval_ms: u64,
    pub pheromone_decay: f64,
    pub pheromone_min_strength: f64,
    pub critical_density: f64,
    pub token_budget_per_agent: u32,
    /// 0 = run forever.
    pub max_steps: u64,
    /// Ticks between transition and cycle reset.
    pub cycle_cooldown_steps: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_model: Option<String>,
    /// Cheaper model variant for the `low_compute` credit tier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_model_cheap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_api_key: Option<String>,
    /// Unset disables DA dispersal entirely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub da_proxy_url: Option<String>,
    /// Whether a dispersal commitment is written back onto the local signal
    /// copy and re-gossiped, or kept local-only.
    pub da_commitment_writeback: bool,
    pub initial_credits: f64,
    pub credit_normal_floor: f64,
    pub credit_low_compute_floor: f64,
}

impl Default for HiveConfig {
    fn default() -> Self {
        Self {
            agent_index: 0,
            agent_port: BASE_PORT,
            peer_urls: Vec::new(),
            db_path: None,
            sync_interval_ms: 2_000,
            engineering_step_interval_ms: 10_000,
            pheromone_decay: 0.12,
            pheromone_min_strength: 0.05,
            critical_density: 0.55,
            token_budget_per_agent: 50_000,
            max_steps: 0,
            cycle_cooldown_steps: 18,
            reasoning_provider: None,
            reasoning_api_url: None,
            reasoning_api_key: None,
            reasoning_model: None,
            reasoning_model_cheap: None,
            data_api_key: None,
            da_proxy_url: None,
            da_commitment_writeback: false,
            initial_credits: 50_000.0,
            credit_normal_floor: 10_000.0,
            credit_low_compute_floor: 2_000.0,
        }
    }
}

impl HiveConfig {
    /// Load: manifest file if given, defaults otherwise, then environment
    /// overrides on top.
    pub fn load(manifest_path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match manifest_path {
            Some(path) => {
                tracing::info!("Loading configuration manifest from {:?}", path);
                let content = std::fs::read_to_string(path)?;
                serde_yaml::from_str(&content)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Apply environment variable overrides. Invalid values are logged and
    /// ignored rather than fatal.
    pub fn apply_env_overrides(&mut self) {
        override_parse("AGENT_INDEX", &mut self.agent_index);
        // Port default tracks the index unless AGENT_PORT pins it.
        self.agent_port = BASE_PORT.saturating_add(self.agent_index as u16);
        override_parse("AGENT_PORT", &mut self.agent_port);

        if let Ok(urls) = std::env::var("PEER_URLS") {
            self.peer_urls = urls
                .split(',')
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty())
                .collect();
        }
        if let Ok(path) = std::env::var("DB_PATH") {
            if !path.is_empty() {
                self.db_path = Some(PathBuf::from(path));
            }
        }

        override_parse("SYNC_INTERVAL_MS", &mut self.sync_interval_ms);
        override_parse("ENGINEERING_STEP_INTERVAL_MS", &mut self.engineering_step_interval_ms);
        override_parse("PHEROMONE_DECAY", &mut self.pheromone_decay);
        override_parse("PHEROMONE_MIN_STRENGTH", &mut self.pheromone_min_strength);
        override_parse("CRITICAL_DENSITY", &mut self.critical_density);
        override_parse("TOKEN_BUDGET_PER_AGENT", &mut self.token_budget_per_agent);
        override_parse("MAX_STEPS", &mut self.max_steps);
        override_parse("CYCLE_COOLDOWN_STEPS", &mut self.cycle_cooldown_steps);
        override_parse("DA_COMMITMENT_WRITEBACK", &mut self.da_commitment_writeback);
        override_parse("INITIAL_CREDITS", &mut self.initial_credits);
        override_parse("CREDIT_NORMAL_FLOOR", &mut self.credit_normal_floor);
        override_parse("CREDIT_LOW_COMPUTE_FLOOR", &mut self.credit_low_compute_floor);

        override_string("REASONING_PROVIDER", &mut self.reasoning_provider);
        override_string("REASONING_API_URL", &mut self.reasoning_api_url);
        override_string("REASONING_API_KEY", &mut self.reasoning_api_key);
        override_string("REASONING_MODEL", &mut self.reasoning_model);
        override_string("REASONING_MODEL_CHEAP", &mut self.reasoning_model_cheap);
        override_string("DATA_API_KEY", &mut self.data_api_key);
        override_string("DA_PROXY_URL", &mut self.da_proxy_url);
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.agent_port == 0 {
            anyhow::bail!("agent_port cannot be 0");
        }
        if !(0.0..1.0).contains(&self.pheromone_decay) {
            anyhow::bail!("pheromone_decay must be in [0, 1): {}", self.pheromone_decay);
        }
        if !(0.0..1.0).contains(&self.critical_density) || self.critical_density == 0.0 {
            anyhow::bail!("critical_density must be in (0, 1): {}", self.critical_density);
        }
        if self.credit_low_compute_floor > self.credit_normal_floor {
            anyhow::bail!(
                "credit_low_compute_floor {} exceeds credit_normal_floor {}",
                self.credit_low_compute_floor,
                self.credit_normal_floor
            );
        }
        for url in &self.peer_urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("peer URL must be http(s): {url}");
            }
        }
        Ok(())
    }

    /// Swarm size as seen from this process: every peer plus itself.
    pub fn agent_count(&self) -> usize {
        self.peer_urls.len() + 1
    }

    /// Deep mode exists only when a reasoning provider is configured.
    pub fn engineering_enabled(&self) -> bool {
        self.reasoning_provider.is_some()
    }
}

fn override_parse<T: FromStr>(key: &str, slot: &mut T) {
    if let Ok(raw) = std::env::var(key) {
        match raw.parse::<T>() {
            Ok(v) => *slot = v,
            Err(_) => tracing::warn!("Ignoring invalid value for {key}: {raw:?}"),
        }
    }
}

fn override_string(key: &str, slot: &mut Option<String>) {
    if let Ok(raw) = std::env::var(key) {
        if raw.is_empty() {
            *slot = None;
        } else {
            *slot = Some(raw);
        }
    }
}

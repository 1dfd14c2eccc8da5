// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cartsim` binary configuration, mirroring the teacher's `Config`/
//! `MuxConfig` derive-`clap::Parser` style (SPEC_FULL §12).

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::network::LinkParams;

/// Demo harness for the cart-core coordination engine: wires a chain of
/// agents through a lossy/delayed relay and drives them with a scenario.
#[derive(Debug, Parser)]
#[command(name = "cartsim", version, about)]
pub struct SimConfig {
    /// Number of agents in the chain (must be at least 2 so there is at
    /// least one negotiable border).
    #[arg(long, env = "CARTSIM_AGENTS", default_value = "2")]
    pub agents: usize,

    /// Initial spacing between adjacent agents' starting positions.
    #[arg(long, env = "CARTSIM_SPACING", default_value = "800")]
    pub spacing: f64,

    /// Safety margin applied to every border comparison.
    #[arg(long, env = "CARTSIM_SAFETY_MARGIN", default_value = "30")]
    pub safety_margin: f64,

    /// Path to a JSON scenario file (see `scenario::Scenario`). If absent,
    /// a short built-in demo scenario runs instead.
    #[arg(long, env = "CARTSIM_SCENARIO")]
    pub scenario: Option<PathBuf>,

    /// Minimum simulated network delay, in milliseconds.
    #[arg(long, env = "CARTSIM_MIN_DELAY_MS", default_value = "10")]
    pub min_delay_ms: u64,

    /// Maximum simulated network delay, in milliseconds.
    #[arg(long, env = "CARTSIM_MAX_DELAY_MS", default_value = "20")]
    pub max_delay_ms: u64,

    /// Probability (0..=1) that any given message is dropped.
    #[arg(long, env = "CARTSIM_LOSS_PROBABILITY", default_value = "0.0")]
    pub loss_probability: f64,

    /// Total wall-clock duration to run the scenario for, in seconds.
    #[arg(long, env = "CARTSIM_DURATION_SECS", default_value = "30")]
    pub duration_secs: u64,

    /// Log format (json or text).
    #[arg(long, env = "CARTSIM_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "CARTSIM_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl SimConfig {
    /// Validate the configuration after parsing (mirrors the teacher's
    /// `Config::validate` post-parse checks).
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.agents < 2 {
            anyhow::bail!("--agents must be at least 2 (need at least one border to negotiate)");
        }
        if self.spacing <= 0.0 {
            anyhow::bail!("--spacing must be positive");
        }
        if self.safety_margin <= 0.0 {
            anyhow::bail!("--safety-margin must be positive");
        }
        if self.min_delay_ms > self.max_delay_ms {
            anyhow::bail!("--min-delay-ms must not exceed --max-delay-ms");
        }
        if !(0.0..=1.0).contains(&self.loss_probability) {
            anyhow::bail!("--loss-probability must be in [0, 1]");
        }
        if self.duration_secs == 0 {
            anyhow::bail!("--duration-secs must be positive");
        }
        Ok(())
    }

    pub fn link_params(&self) -> LinkParams {
        LinkParams {
            min_delay: Duration::from_millis(self.min_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            loss_probability: self.loss_probability,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

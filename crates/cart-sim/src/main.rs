// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use clap::Parser;
use tracing::error;

use cart_sim::config::SimConfig;

#[tokio::main]
async fn main() {
    let config = SimConfig::parse();

    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.clone()))
    };
    if config.log_format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(env_filter()).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter()).init();
    }

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    if let Err(e) = run(config).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

async fn run(config: SimConfig) -> anyhow::Result<()> {
    use cart_core::AgentConfig;

    let mut configs = Vec::with_capacity(config.agents);
    let mut names = Vec::with_capacity(config.agents);
    for i in 0..config.agents {
        let left = i as f64 * config.spacing;
        let right = left + config.spacing;
        let cfg = AgentConfig {
            safety_margin: config.safety_margin,
            left_border_initial: left,
            right_border_initial: right,
            cart_initial_position: (left + right) / 2.0,
            ..AgentConfig::default()
        };
        cfg.planner.validate()?;
        configs.push(cfg);
        names.push(format!("cart{i}"));
    }

    let scenario = match &config.scenario {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            serde_json::from_str(&text)?
        }
        None => cart_sim::scenario::Scenario::demo_two_cart(),
    };

    let chain = cart_sim::build_chain(&configs, &names, config.link_params(), 32);
    cart_sim::run_scenario(chain, scenario, Duration::from_secs(config.duration_secs)).await;
    Ok(())
}

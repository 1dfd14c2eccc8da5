// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use cart_core::AgentConfig;

use super::*;
use crate::network::LinkParams;
use crate::topology::build_chain;

fn two_cart_configs() -> Vec<AgentConfig> {
    vec![
        AgentConfig { left_border_initial: 0.0, right_border_initial: 800.0, cart_initial_position: 400.0, ..AgentConfig::default() },
        AgentConfig { left_border_initial: 800.0, right_border_initial: 1600.0, cart_initial_position: 1200.0, ..AgentConfig::default() },
    ]
}

#[test]
fn demo_scenario_has_at_least_one_step() {
    let scenario = Scenario::demo_two_cart();
    assert!(!scenario.steps.is_empty());
}

#[test]
fn scenario_round_trips_through_json() {
    let scenario = Scenario::demo_two_cart();
    let text = serde_json::to_string(&scenario).unwrap();
    let parsed: Scenario = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed.steps.len(), scenario.steps.len());
}

#[tokio::test(flavor = "multi_thread")]
async fn in_border_goal_reaches_busy_within_the_simple_scenario() {
    let configs = two_cart_configs();
    let names = vec!["cart0".to_string(), "cart1".to_string()];
    let link = LinkParams { min_delay: Duration::from_millis(1), max_delay: Duration::from_millis(2), loss_probability: 0.0 };
    let chain = build_chain(&configs, &names, link, 8);

    let scenario = Scenario { steps: vec![ScenarioStep { at_ms: 0, agent: 0, action: ScenarioAction::Goal { position: 700.0 } }] };

    tokio::time::timeout(Duration::from_secs(5), run_scenario(chain, scenario, Duration::from_millis(500)))
        .await
        .expect("scenario should finish within its own duration budget");
}

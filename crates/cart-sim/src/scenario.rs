// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A small scenario runner standing in for "the operator CLI" (spec.md
//! §1). Drives a built chain of agents by replaying timed goal/emergency-
//! stop events, ticking each agent's physics plant, and periodically
//! logging metrics.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{interval, sleep, Instant};
use tracing::info;

use crate::topology::ChainAgent;

/// One action to inject into `agent`'s inbound channels at `at_ms`
/// milliseconds after the scenario starts.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioStep {
    pub at_ms: u64,
    pub agent: usize,
    pub action: ScenarioAction,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioAction {
    /// Deposit a new goal onto the agent's inbound goal channel.
    Goal { position: f64 },
    /// Trigger the agent's inbound emergency-stop channel.
    EmergencyStop,
}

/// A replayable list of timed steps (spec.md §1's "goal-generation
/// utilities" are out of scope for the core but a scenario file is the
/// natural way to drive the demo harness end to end).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Scenario {
    pub steps: Vec<ScenarioStep>,
}

impl Scenario {
    /// The two-cart scenarios enumerated in spec.md §8, scenario 2
    /// ("Border shift requested"): a single goal that forces Cart1 to
    /// negotiate with Cart2.
    pub fn demo_two_cart() -> Self {
        Scenario { steps: vec![ScenarioStep { at_ms: 200, agent: 0, action: ScenarioAction::Goal { position: 850.0 } }] }
    }
}

const PHYSICS_TICK: Duration = Duration::from_millis(5);
const METRICS_INTERVAL: Duration = Duration::from_millis(2000);

/// Run `scenario` against an already-built `chain` for `duration`, then
/// signal every agent to shut down and wait for their event loops to exit.
pub async fn run_scenario(chain: Vec<ChainAgent>, scenario: Scenario, duration: Duration) {
    let mut handles = Vec::with_capacity(chain.len());
    let mut plants = Vec::with_capacity(chain.len());
    let mut join_handles = Vec::with_capacity(chain.len());

    for ChainAgent { agent, handle, plant } in chain {
        let id = agent.id();
        let name = agent.name().to_string();
        handles.push(handle);
        plants.push(plant);
        join_handles.push(tokio::spawn(async move {
            agent.run().await;
            (id, name)
        }));
    }

    let mut steps = scenario.steps;
    steps.sort_by_key(|s| s.at_ms);
    let mut next_step = 0usize;

    let start = Instant::now();
    let deadline = start + duration;
    let mut physics = interval(PHYSICS_TICK);
    let mut metrics_at = start + METRICS_INTERVAL;

    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }

        while next_step < steps.len() && now.duration_since(start).as_millis() as u64 >= steps[next_step].at_ms {
            let step = &steps[next_step];
            if let Some(handle) = handles.get(step.agent) {
                match &step.action {
                    ScenarioAction::Goal { position } => {
                        info!(agent = step.agent, position, "scenario: dispatching goal");
                        let _ = handle.goal.try_send(*position);
                    }
                    ScenarioAction::EmergencyStop => {
                        info!(agent = step.agent, "scenario: dispatching emergency stop");
                        let _ = handle.emergency_stop.try_send(());
                    }
                }
            }
            next_step += 1;
        }

        for plant in &plants {
            plant.integrate(PHYSICS_TICK.as_secs_f64());
        }

        if now >= metrics_at {
            for (i, plant) in plants.iter().enumerate() {
                let snap = plant.snapshot();
                info!(agent = i, position = snap.position(), velocity = snap.velocity(), "scenario: plant snapshot");
            }
            metrics_at = now + METRICS_INTERVAL;
        }

        physics.tick().await;
    }

    for handle in &handles {
        let _ = handle.stop_controller.send(()).await;
    }
    for join in join_handles {
        let _ = join.await;
    }
    // Give relay tasks a moment to notice closed downstream channels and
    // exit; they are detached, not joined, so this is best-effort cleanup
    // rather than a correctness requirement.
    sleep(Duration::from_millis(10)).await;
}

#[cfg(test)]
#[path = "scenario_tests.rs"]
mod tests;

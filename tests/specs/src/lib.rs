// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end coordination scenarios.
//!
//! Unlike a binary smoke test, the wire protocol here is in-process only
//! (spec.md §6) — there is no subprocess to spawn. Instead this builds real
//! `cart_core::Agent`s wired through `cart_sim`'s `FlakyLink`/`SharedPlant`,
//! runs their event loops as real `tokio` tasks on the test's own runtime,
//! and drives/observes them through the same channels an embedder would use.

use std::time::Duration;

use cart_core::channels::AgentHandle;
use cart_core::AgentConfig;
use cart_sim::network::LinkParams;
use cart_sim::plant::SharedPlant;
use cart_sim::topology::build_chain;

/// The two-cart layout spec.md §8's scenarios are all stated against:
/// Cart1 at 400 with borders `[0, 800]`, Cart2 at 1200 with borders
/// `[800, 1600]`, default safety margin and overshoot.
pub fn two_cart_configs() -> Vec<AgentConfig> {
    vec![
        AgentConfig { left_border_initial: 0.0, right_border_initial: 800.0, cart_initial_position: 400.0, ..AgentConfig::default() },
        AgentConfig { left_border_initial: 800.0, right_border_initial: 1600.0, cart_initial_position: 1200.0, ..AgentConfig::default() },
    ]
}

/// A free-standing "nth cart in a long-enough-to-not-matter chain" layout,
/// used by scenarios that only care about one agent's direct negotiation
/// with its immediate neighbors (spec.md §8 scenarios run against a 2-cart
/// line; this generalizes to n for the packet-loss-resilience repeat runs).
pub fn chain_configs(n: usize, spacing: f64) -> Vec<AgentConfig> {
    (0..n)
        .map(|i| {
            let left = i as f64 * spacing;
            let right = left + spacing;
            AgentConfig {
                left_border_initial: left,
                right_border_initial: right,
                cart_initial_position: (left + right) / 2.0,
                ..AgentConfig::default()
            }
        })
        .collect()
}

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("cart{i}")).collect()
}

/// A link with negligible delay and no loss — scenarios 1 through 5 are
/// about negotiation logic, not network impairment, so they run the wiring
/// as close to synchronous as `FlakyLink` allows.
pub fn reliable_link() -> LinkParams {
    LinkParams { min_delay: Duration::from_millis(1), max_delay: Duration::from_millis(2), loss_probability: 0.0 }
}

/// A link exercising spec.md §8 scenario 6's packet-loss-resilience case.
pub fn lossy_link(loss_probability: f64) -> LinkParams {
    LinkParams { min_delay: Duration::from_millis(1), max_delay: Duration::from_millis(5), loss_probability }
}

const PHYSICS_TICK: Duration = Duration::from_millis(5);

/// A running chain of agents, plus the handles/plants needed to drive and
/// observe them, and the join handles needed to shut them down cleanly.
/// Owns a background task that integrates every plant on a fixed tick, the
/// same role `cart_sim::scenario::run_scenario`'s own loop plays for the
/// demo harness — tests just need it running without the rest of that
/// loop's scenario-file/metrics-logging concerns.
pub struct RunningChain {
    pub handles: Vec<AgentHandle>,
    pub plants: Vec<SharedPlant>,
    joins: Vec<tokio::task::JoinHandle<()>>,
    physics: tokio::task::JoinHandle<()>,
}

impl RunningChain {
    /// Spawn every agent's event loop as its own task, consuming the
    /// chain built by `cart_sim::topology::build_chain`, plus a physics
    /// task ticking all of their plants forward.
    pub fn spawn(chain: Vec<cart_sim::topology::ChainAgent>) -> Self {
        let mut handles = Vec::with_capacity(chain.len());
        let mut plants = Vec::with_capacity(chain.len());
        let mut joins = Vec::with_capacity(chain.len());
        for cart_sim::topology::ChainAgent { agent, handle, plant } in chain {
            handles.push(handle);
            plants.push(plant);
            joins.push(tokio::spawn(async move {
                agent.run().await;
            }));
        }

        let physics_plants = plants.clone();
        let physics = tokio::spawn(async move {
            let mut tick = tokio::time::interval(PHYSICS_TICK);
            loop {
                tick.tick().await;
                for plant in &physics_plants {
                    plant.integrate(PHYSICS_TICK.as_secs_f64());
                }
            }
        });

        RunningChain { handles, plants, joins, physics }
    }

    /// Build and spawn a two-cart chain over `link`, matching spec.md §8's
    /// literal scenario layout.
    pub fn two_cart(link: LinkParams) -> Self {
        let chain = build_chain(&two_cart_configs(), &names(2), link, 32);
        Self::spawn(chain)
    }

    /// Build and spawn an n-cart chain over `link`.
    pub fn chain(n: usize, spacing: f64, link: LinkParams) -> Self {
        let chain = build_chain(&chain_configs(n, spacing), &names(n), link, 32);
        Self::spawn(chain)
    }

    /// Signal every agent to shut down and wait for their event loops to
    /// exit, then stop the physics task. Leaves the relay tasks to notice
    /// closed channels on their own.
    pub async fn shutdown(self) {
        for handle in &self.handles {
            let _ = handle.stop_controller.send(()).await;
        }
        for join in self.joins {
            let _ = join.await;
        }
        self.physics.abort();
    }
}

/// Poll `plant`'s position every `interval` until it is within `tolerance`
/// of `target`, or `timeout` elapses.
pub async fn settle_near(plant: &SharedPlant, target: f64, tolerance: f64, timeout: Duration, interval: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if (plant.snapshot().position() - target).abs() <= tolerance {
            return true;
        }
        if tokio::time::Instant::now() + interval > deadline {
            return false;
        }
        tokio::time::sleep(interval).await;
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wiring a fixed left-to-right chain of agents through lossy/delayed
//! links (spec.md §3 "agents are arranged in a fixed left-to-right chain,
//! wired at startup"). Mirrors `cart_core::channels::direct_chain`'s pairing
//! logic but interposes a [`FlakyLink`] on each of the four inter-agent
//! channels instead of connecting the `mpsc` endpoints directly.

use cart_core::channels::{operator_channels, AgentChannels, AgentHandle, Inbound, Outbound};
use cart_core::protocol::{Request, Response};
use cart_core::{Agent, AgentConfig};
use tokio::sync::mpsc;

use crate::network::LinkParams;
use crate::plant::SharedPlant;

/// One agent in a built chain, plus the plant handle the scenario runner
/// needs to drive its own physics tick (the agent itself never calls
/// [`SharedPlant::integrate`]).
pub struct ChainAgent {
    pub agent: Agent<SharedPlant>,
    pub handle: AgentHandle,
    pub plant: SharedPlant,
}

/// Build a chain of `configs.len()` agents, naming them `names[i]` and
/// numbering them `0..len` by position, wired left-to-right through
/// [`FlakyLink`]s parameterized by `link`. The leftmost and rightmost
/// agents have no outbound channel on their outward side — a hard wall
/// (spec.md §3, Glossary "Hard wall").
pub fn build_chain(configs: &[AgentConfig], names: &[String], link: LinkParams, capacity: usize) -> Vec<ChainAgent> {
    let n = configs.len();
    assert_eq!(n, names.len(), "one name per agent config");
    assert!(n >= 1, "a chain needs at least one agent");

    let boundaries = n.saturating_sub(1);
    let mut right_req_tx: Vec<Option<mpsc::Sender<Request>>> = (0..n).map(|_| None).collect();
    let mut left_req_rx: Vec<Option<mpsc::Receiver<Request>>> = (0..n).map(|_| None).collect();
    let mut left_req_tx: Vec<Option<mpsc::Sender<Request>>> = (0..n).map(|_| None).collect();
    let mut right_req_rx: Vec<Option<mpsc::Receiver<Request>>> = (0..n).map(|_| None).collect();
    let mut right_resp_tx: Vec<Option<mpsc::Sender<Response>>> = (0..n).map(|_| None).collect();
    let mut left_resp_rx: Vec<Option<mpsc::Receiver<Response>>> = (0..n).map(|_| None).collect();
    let mut left_resp_tx: Vec<Option<mpsc::Sender<Response>>> = (0..n).map(|_| None).collect();
    let mut right_resp_rx: Vec<Option<mpsc::Receiver<Response>>> = (0..n).map(|_| None).collect();

    for b in 0..boundaries {
        // Requests travelling rightward (agent b -> agent b+1, concerning
        // agent b+1's left border) go through a relay whose lossy sender is
        // what agent b's outbound half holds.
        let (raw_tx, raw_rx) = mpsc::channel(capacity);
        left_req_rx[b + 1] = Some(raw_rx);
        let relay_tx = crate::network::FlakyLink::spawn(link, raw_tx, capacity);
        right_req_tx[b] = Some(relay_tx.sender());

        // Requests travelling leftward (agent b+1 -> agent b, concerning
        // agent b's right border).
        let (raw_tx, raw_rx) = mpsc::channel(capacity);
        right_req_rx[b] = Some(raw_rx);
        let relay_tx = crate::network::FlakyLink::spawn(link, raw_tx, capacity);
        left_req_tx[b + 1] = Some(relay_tx.sender());

        // Responses travelling rightward (agent b answering agent b+1's
        // request, which agent b received as inbound.right_request).
        let (raw_tx, raw_rx) = mpsc::channel(capacity);
        left_resp_rx[b + 1] = Some(raw_rx);
        let relay_tx = crate::network::FlakyLink::spawn(link, raw_tx, capacity);
        right_resp_tx[b] = Some(relay_tx.sender());

        // Responses travelling leftward (agent b+1 answering agent b's
        // request).
        let (raw_tx, raw_rx) = mpsc::channel(capacity);
        right_resp_rx[b] = Some(raw_rx);
        let relay_tx = crate::network::FlakyLink::spawn(link, raw_tx, capacity);
        left_resp_tx[b + 1] = Some(relay_tx.sender());
    }

    let empty_req = || mpsc::channel::<Request>(1).1;
    let empty_resp = || mpsc::channel::<Response>(1).1;

    let mut out = Vec::with_capacity(n);
    for (i, (config, name)) in configs.iter().zip(names.iter()).enumerate() {
        let (goal_rx, goal_tx, estop_rx, estop_tx, stop_rx, stop_tx, completion_tx, completion_rx) =
            operator_channels(capacity);

        let channels = AgentChannels {
            inbound: Inbound {
                goal: goal_rx,
                emergency_stop: estop_rx,
                left_request: left_req_rx[i].take().unwrap_or_else(empty_req),
                right_request: right_req_rx[i].take().unwrap_or_else(empty_req),
                left_response: left_resp_rx[i].take().unwrap_or_else(empty_resp),
                right_response: right_resp_rx[i].take().unwrap_or_else(empty_resp),
                stop_controller: stop_rx,
            },
            outbound: Outbound {
                left_request: left_req_tx[i].take(),
                right_request: right_req_tx[i].take(),
                left_response: left_resp_tx[i].take(),
                right_response: right_resp_tx[i].take(),
                goal_completion: completion_tx,
            },
        };
        let handle = AgentHandle { goal: goal_tx, emergency_stop: estop_tx, stop_controller: stop_tx, goal_completion: completion_rx };

        let plant = SharedPlant::new(crate::plant::EulerPlant::new(config.cart_initial_position, config.mass));
        let agent = Agent::new(i as u64, name.clone(), config.clone(), plant.clone(), channels);

        out.push(ChainAgent { agent, handle, plant });
    }
    out
}

#[cfg(test)]
#[path = "topology_tests.rs"]
mod tests;

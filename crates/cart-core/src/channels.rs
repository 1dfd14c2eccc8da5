// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed channel bundles wiring each agent to its neighbors and to the
//! outside world (spec §3 "Channels", §6 "External Interfaces").
//!
//! Channels are the only state shared across agent tasks (spec §5): each
//! bundle is plain `tokio::sync::mpsc` endpoints, bounded so a slow or
//! absent receiver degrades to the same "drop on full" semantics spec §4.6
//! treats as simulated packet loss. Grounded on the teacher's channel-bundle
//! structs (`MuxState`'s `aggregator`/`sessions`, `DetectorSinks` in
//! `driver/mod.rs`) — a plain struct of named endpoints rather than a
//! generic pub/sub bus.

use tokio::sync::mpsc;

use crate::protocol::{Request, Response};

/// Default bounded capacity for inter-agent request/response channels and
/// the operator-facing goal/stop channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// The inbound half of one agent's wiring — owned and consumed by the
/// agent's own event loop (spec §6 "Inbound channels per agent").
pub struct Inbound {
    pub goal: mpsc::Receiver<f64>,
    pub emergency_stop: mpsc::Receiver<()>,
    pub left_request: mpsc::Receiver<Request>,
    pub right_request: mpsc::Receiver<Request>,
    pub left_response: mpsc::Receiver<Response>,
    pub right_response: mpsc::Receiver<Response>,
    pub stop_controller: mpsc::Receiver<()>,
}

/// The outbound half of one agent's wiring (spec §6 "Outbound channels per
/// agent"). The left/right request and response senders are `None` for an
/// edge agent with no neighbor on that side — a hard wall (spec §4.4, §4.6,
/// Glossary "Hard wall").
pub struct Outbound {
    pub left_request: Option<mpsc::Sender<Request>>,
    pub right_request: Option<mpsc::Sender<Request>>,
    pub left_response: Option<mpsc::Sender<Response>>,
    pub right_response: Option<mpsc::Sender<Response>>,
    pub goal_completion: mpsc::Sender<bool>,
}

/// Everything one `Agent` needs to run: its inbound receivers plus its
/// outbound senders.
pub struct AgentChannels {
    pub inbound: Inbound,
    pub outbound: Outbound,
}

/// The harness-facing counterpart to one agent's `Inbound`/`Outbound`:
/// senders to push goals/stops in, and a receiver to observe completion
/// signals, used by `cart-sim`'s scenario runner and by `tests/specs`.
pub struct AgentHandle {
    pub goal: mpsc::Sender<f64>,
    pub emergency_stop: mpsc::Sender<()>,
    pub stop_controller: mpsc::Sender<()>,
    pub goal_completion: mpsc::Receiver<bool>,
}

/// Build the operator-facing (goal/estop/shutdown/completion) half of one
/// agent's wiring, returning the receiver end for `Inbound`/`Outbound` and
/// the sender/receiver end for the harness's `AgentHandle`.
pub fn operator_channels(capacity: usize) -> (mpsc::Receiver<f64>, mpsc::Sender<f64>, mpsc::Receiver<()>, mpsc::Sender<()>, mpsc::Receiver<()>, mpsc::Sender<()>, mpsc::Sender<bool>, mpsc::Receiver<bool>) {
    let (goal_tx, goal_rx) = mpsc::channel(capacity);
    let (estop_tx, estop_rx) = mpsc::channel(capacity);
    let (stop_tx, stop_rx) = mpsc::channel(1);
    let (completion_tx, completion_rx) = mpsc::channel(capacity);
    (goal_rx, goal_tx, estop_rx, estop_tx, stop_rx, stop_tx, completion_tx, completion_rx)
}

/// Directly wire a chain of `n` agents' request/response channels with no
/// intervening delay or loss (spec §3 "fixed left-to-right chain, wired at
/// startup"). Returns one `(AgentChannels, AgentHandle)` pair per position
/// in the chain, index 0 being the leftmost (hard wall on its left) and
/// index `n - 1` the rightmost (hard wall on its right).
///
/// `cart-sim`'s topology builder re-implements this same left-to-right
/// wiring but interposes a `FlakyLink` on each inter-agent channel instead
/// of connecting the mpsc endpoints directly — this bare version exists so
/// `cart-core`'s own tests can exercise the negotiation protocol without
/// depending on the simulator crate.
pub fn direct_chain(n: usize, capacity: usize) -> Vec<(AgentChannels, AgentHandle)> {
    assert!(n >= 1, "a chain needs at least one agent");

    // Slot `i`'s "right_request" sender/receiver pair lives at boundary `i`
    // (between agent `i` and agent `i + 1`); slot `i`'s "left_request" pair
    // is boundary `i - 1`'s "right_request" pair read from the other end.
    // Building per-slot `Option` vectors up front (rather than threading
    // ownership through a shared boundary struct) keeps each channel
    // endpoint moved exactly once.
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
        // Agent `b`'s right-request sender feeds agent `b + 1`'s
        // left-request receiver (the message concerns the border to *that*
        // agent's left), and symmetrically for the other three pairs.
        let (req_to_right_tx, req_to_right_rx) = mpsc::channel(capacity);
        right_req_tx[b] = Some(req_to_right_tx);
        left_req_rx[b + 1] = Some(req_to_right_rx);

        let (req_to_left_tx, req_to_left_rx) = mpsc::channel(capacity);
        left_req_tx[b + 1] = Some(req_to_left_tx);
        right_req_rx[b] = Some(req_to_left_rx);

        let (resp_to_right_tx, resp_to_right_rx) = mpsc::channel(capacity);
        right_resp_tx[b] = Some(resp_to_right_tx);
        left_resp_rx[b + 1] = Some(resp_to_right_rx);

        let (resp_to_left_tx, resp_to_left_rx) = mpsc::channel(capacity);
        left_resp_tx[b + 1] = Some(resp_to_left_tx);
        right_resp_rx[b] = Some(resp_to_left_rx);
    }

    let empty_req = || mpsc::channel::<Request>(1).1;
    let empty_resp = || mpsc::channel::<Response>(1).1;

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
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
        out.push((channels, handle));
    }
    out
}

#[cfg(test)]
#[path = "channels_tests.rs"]
mod tests;

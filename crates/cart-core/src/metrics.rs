// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent metrics (spec §2 "~10% of core"): request round-trip time,
//! goal-to-movement latency, scenario message counts.

use std::time::Duration;

use tokio::time::Instant;

/// A serializable point-in-time view of one agent's metrics, grounded in
/// `broker/distributor.rs`'s success/failed/total `info!` summary pattern
/// (SPEC_FULL §14) — this is the shape `cart-sim` prints periodically.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricsSnapshot {
    pub requests_sent: u64,
    pub requests_acked: u64,
    pub mean_rtt_ms: f64,
    pub goal_to_movement_latency_ms: Option<f64>,
    pub messages_this_scenario: u64,
}

/// Running metrics accumulator owned by one `Agent`.
#[derive(Debug, Clone, Default)]
pub struct AgentMetrics {
    requests_sent: u64,
    requests_acked: u64,
    rtt_total_ms: f64,
    rtt_samples: u64,
    goal_to_movement_latency_ms: Option<f64>,
    messages_this_scenario: u64,
    goal_received_at: Option<Instant>,
}

impl AgentMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a request was transmitted (fresh send, not a retry —
    /// retries resend the same id and are not double-counted as new
    /// requests for RTT purposes, though they do count as wire traffic).
    pub fn record_request_sent(&mut self) {
        self.requests_sent += 1;
        self.messages_this_scenario += 1;
    }

    /// Record a retry (same request id resent).
    pub fn record_retry(&mut self) {
        self.messages_this_scenario += 1;
    }

    /// Record the final response to a pending request, with the elapsed
    /// time since it was first sent.
    pub fn record_response(&mut self, rtt: Duration) {
        self.requests_acked += 1;
        self.rtt_samples += 1;
        self.rtt_total_ms += rtt.as_secs_f64() * 1000.0;
        self.messages_this_scenario += 1;
    }

    /// Record that a neighbor message (request or response) was sent or
    /// received, for the scenario-wide traffic count.
    pub fn record_message(&mut self) {
        self.messages_this_scenario += 1;
    }

    /// Mark the instant a goal was accepted onto the inbound channel.
    pub fn record_goal_received(&mut self, at: Instant) {
        self.goal_received_at = Some(at);
    }

    /// Mark the instant the agent actually begins tracking motion toward
    /// that goal (`Moving`/`Avoiding` entry), closing out the
    /// goal-to-movement latency sample.
    pub fn record_movement_started(&mut self, at: Instant) {
        if let Some(received) = self.goal_received_at.take() {
            self.goal_to_movement_latency_ms = Some(at.saturating_duration_since(received).as_secs_f64() * 1000.0);
        }
    }

    pub fn reset_scenario_counters(&mut self) {
        self.messages_this_scenario = 0;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let mean_rtt_ms = if self.rtt_samples == 0 { 0.0 } else { self.rtt_total_ms / self.rtt_samples as f64 };
        MetricsSnapshot {
            requests_sent: self.requests_sent,
            requests_acked: self.requests_acked,
            mean_rtt_ms,
            goal_to_movement_latency_ms: self.goal_to_movement_latency_ms,
            messages_this_scenario: self.messages_this_scenario,
        }
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;

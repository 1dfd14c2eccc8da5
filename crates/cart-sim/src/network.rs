// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A lossy, delayed relay standing in for "the simulated-network delay/loss
//! injector" (spec.md §1, §6 "Network simulator interface"). Grounded on
//! the teacher's `upstream/bridge.rs` relay — a spawned task that owns one
//! end of a channel pair and forwards messages to the other, here adapted
//! from WebSocket fan-out/correlation routing to per-message delay and drop.

use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::trace;

/// Parameters for one direction of simulated network impairment (spec.md
/// §6 "Network simulator interface"). Defaults match the spec's stated
/// defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkParams {
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub loss_probability: f64,
}

impl Default for LinkParams {
    fn default() -> Self {
        LinkParams {
            min_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(20),
            loss_probability: 0.0,
        }
    }
}

impl LinkParams {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_delay > self.max_delay {
            anyhow::bail!("min_delay must not exceed max_delay");
        }
        if !(0.0..=1.0).contains(&self.loss_probability) {
            anyhow::bail!("loss_probability must be in [0, 1]");
        }
        Ok(())
    }

    fn sample_delay(&self) -> Duration {
        if self.min_delay == self.max_delay {
            return self.min_delay;
        }
        let mut rng = rand::rng();
        let min_ns = self.min_delay.as_nanos() as u64;
        let max_ns = self.max_delay.as_nanos() as u64;
        Duration::from_nanos(rng.random_range(min_ns..=max_ns))
    }

    fn sample_drop(&self) -> bool {
        if self.loss_probability <= 0.0 {
            return false;
        }
        rand::rng().random_bool(self.loss_probability.min(1.0))
    }
}

/// A one-directional lossy/delayed channel: messages sent into `sender()`
/// are relayed to `receiver` (the inner, already-wired destination) after a
/// sampled delay, dropped with `loss_probability`. Per-channel FIFO order is
/// preserved by relaying one message at a time (spec.md §5 "per-channel
/// FIFO order is preserved"); delay is simulated by a straight `sleep` in
/// the relay task rather than a separate timer wheel, since no two links
/// share ordering guarantees anyway.
pub struct FlakyLink<T> {
    inbound: mpsc::Sender<T>,
}

impl<T: Send + 'static> FlakyLink<T> {
    /// Spawn the relay task sitting between a sender and the real
    /// `downstream` destination the agent's inbound half already owns;
    /// returns a handle whose `sender()` is the channel callers should
    /// treat as "the wire".
    pub fn spawn(params: LinkParams, downstream: mpsc::Sender<T>, capacity: usize) -> Self {
        let (inbound_tx, mut inbound_rx) = mpsc::channel::<T>(capacity);
        tokio::spawn(async move {
            while let Some(msg) = inbound_rx.recv().await {
                if params.sample_drop() {
                    trace!("network simulator dropped message");
                    continue;
                }
                let delay = params.sample_delay();
                if !delay.is_zero() {
                    sleep(delay).await;
                }
                if downstream.send(msg).await.is_err() {
                    trace!("network simulator downstream closed, stopping relay");
                    break;
                }
            }
        });
        FlakyLink { inbound: inbound_tx }
    }

    pub fn sender(&self) -> mpsc::Sender<T> {
        self.inbound.clone()
    }
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod tests;

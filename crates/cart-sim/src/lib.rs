// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Demo harness for `cart-core`.
//!
//! This crate is deliberately *not* part of the core (spec.md §1): it plays
//! the role of the external collaborators the core treats as typed
//! channels — a toy physics integrator, a lossy/delayed network relay, and
//! a small scenario runner standing in for an operator CLI. No negotiation
//! or safety logic lives here; all of it is in `cart-core`.

pub mod config;
pub mod network;
pub mod plant;
pub mod scenario;
pub mod topology;

pub use config::SimConfig;
pub use network::FlakyLink;
pub use plant::EulerPlant;
pub use scenario::{run_scenario, Scenario, ScenarioStep};
pub use topology::build_chain;

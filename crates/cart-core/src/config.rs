// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Tuning for one discrete-time PID loop (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub output_limit: f64,
}

/// Bounds for the jerk-limited trajectory planner (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlannerConfig {
    pub max_jerk: f64,
    pub max_acceleration: f64,
    pub max_velocity: f64,
}

impl PlannerConfig {
    /// Reject configurations the planner cannot be asked to honor.
    /// Spec §4.1: "malformed inputs ... are a programmer error" — this lets
    /// a caller turn that into a catchable `Result` at construction time
    /// instead of discovering it mid-plan.
    pub fn validate(&self) -> Result<(), crate::error::AgentError> {
        if self.max_jerk <= 0.0 || self.max_acceleration <= 0.0 || self.max_velocity <= 0.0 {
            return Err(crate::error::AgentError::InvariantViolation {
                detail: "planner limits must be strictly positive".into(),
            });
        }
        Ok(())
    }
}

/// Full per-agent configuration (spec §6 "Configuration").
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentConfig {
    pub safety_margin: f64,
    pub velocity_pid: PidConfig,
    pub position_pid: PidConfig,
    pub planner: PlannerConfig,
    pub left_border_initial: f64,
    pub right_border_initial: f64,
    pub cart_initial_position: f64,
    #[cfg_attr(feature = "serde", serde(with = "duration_millis"))]
    pub control_tick: Duration,
    #[cfg_attr(feature = "serde", serde(with = "duration_millis"))]
    pub busy_dwell: Duration,
    #[cfg_attr(feature = "serde", serde(with = "duration_millis"))]
    pub retry_interval: Duration,
    pub overshoot_factor: f64,
    pub mass: f64,
    pub width: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            safety_margin: 30.0,
            velocity_pid: PidConfig { kp: 150.0, ki: 10.0, kd: 0.0, output_limit: 150.0 },
            position_pid: PidConfig { kp: 100.0, ki: 0.0, kd: 0.0, output_limit: 300.0 },
            planner: PlannerConfig { max_jerk: 200.0, max_acceleration: 100.0, max_velocity: 300.0 },
            left_border_initial: 0.0,
            right_border_initial: 800.0,
            cart_initial_position: 400.0,
            control_tick: Duration::from_millis(10),
            busy_dwell: Duration::from_millis(5000),
            retry_interval: Duration::from_millis(1000),
            overshoot_factor: 1.01,
            mass: 1.0,
            width: 0.0,
        }
    }
}

#[cfg(feature = "serde")]
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        (d.as_millis() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A minimal forward-Euler stand-in for "the physics integration loop"
//! (spec.md §1, §6 "Plant adapter interface"). The core never sees this
//! type directly — it only sees [`cart_core::PlantAdapter`].

use std::sync::{Arc, Mutex};

use cart_core::PlantAdapter;

/// A single cart modeled as a point mass with a commanded force, integrated
/// forward one `dt` at a time by whoever owns the simulation tick (here,
/// `scenario::run_scenario`'s own loop — the physics tick is independent of
/// the agent's 100 Hz control tick, per spec.md §5 "produced by an external
/// integrator").
#[derive(Debug, Clone, Copy)]
pub struct EulerPlant {
    position: f64,
    velocity: f64,
    mass: f64,
    applied_force: f64,
}

impl EulerPlant {
    pub fn new(position: f64, mass: f64) -> Self {
        EulerPlant { position, velocity: 0.0, mass: mass.max(f64::MIN_POSITIVE), applied_force: 0.0 }
    }

    /// Advance the plant by `dt` seconds under whatever force was last
    /// applied. Pure Euler, no damping — good enough for a demo harness, not
    /// a physical model (spec.md §1 Non-goals: "cart-to-cart physical models
    /// beyond the one-dimensional kinematic abstraction").
    pub fn integrate(&mut self, dt: f64) {
        let acceleration = self.applied_force / self.mass;
        self.position += self.velocity * dt + 0.5 * acceleration * dt * dt;
        self.velocity += acceleration * dt;
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }
}

impl PlantAdapter for EulerPlant {
    fn read_position(&self) -> f64 {
        self.position
    }

    fn read_velocity(&self) -> f64 {
        self.velocity
    }

    fn apply_force(&mut self, force: f64) {
        self.applied_force = force;
    }
}

/// A handle to an [`EulerPlant`] shared between the agent that reads/writes
/// it through [`PlantAdapter`] and the scenario runner's own physics tick,
/// which is the only thing allowed to call [`EulerPlant::integrate`]. This
/// is the concrete seam spec.md §5 describes as "no RMW from agent code" —
/// the agent only ever loads position/velocity or stores a force, never
/// advances the simulation itself.
#[derive(Clone)]
pub struct SharedPlant(Arc<Mutex<EulerPlant>>);

impl SharedPlant {
    pub fn new(plant: EulerPlant) -> Self {
        SharedPlant(Arc::new(Mutex::new(plant)))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, EulerPlant> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Advance the underlying plant; called only from the scenario runner's
    /// physics tick, never from agent code.
    pub fn integrate(&self, dt: f64) {
        self.lock().integrate(dt);
    }

    pub fn snapshot(&self) -> EulerPlant {
        *self.lock()
    }
}

impl PlantAdapter for SharedPlant {
    fn read_position(&self) -> f64 {
        self.lock().read_position()
    }

    fn read_velocity(&self) -> f64 {
        self.lock().read_velocity()
    }

    fn apply_force(&mut self, force: f64) {
        self.lock().apply_force(force);
    }
}

#[cfg(test)]
#[path = "plant_tests.rs"]
mod tests;

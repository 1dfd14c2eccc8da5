// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time-parameterized, jerk-limited motion curves (spec §3, §4.1).
//!
//! A [`Trajectory`] is an immutable snapshot: it is never mutated in place,
//! only ever replaced wholesale, so that a PID update always reads a
//! coherent `(p, v, a)` triple even while another part of the agent is about
//! to swap in a new trajectory (spec §9 "Trajectory objects are immutable
//! snapshots").

use tokio::time::Instant;

/// Number of breakpoints in any trajectory (the initial state plus up to
/// seven phase boundaries).
pub const BREAKPOINT_COUNT: usize = 8;

/// A single phase boundary: the kinematic state at a relative time since
/// `t0`, plus the jerk applied over the phase that *begins* here.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Breakpoint {
    pub t: f64,
    pub p: f64,
    pub v: f64,
    pub a: f64,
    pub jerk: f64,
}

impl Breakpoint {
    const ZERO: Breakpoint = Breakpoint { t: 0.0, p: 0.0, v: 0.0, a: 0.0, jerk: 0.0 };

    /// Integrate this breakpoint's state forward by `dt` seconds under its
    /// own constant jerk, producing the breakpoint that starts the next
    /// phase (whose own `jerk` field is filled in by the caller).
    fn advance(&self, dt: f64) -> Breakpoint {
        let j = self.jerk;
        let a = self.a + j * dt;
        let v = self.v + self.a * dt + 0.5 * j * dt * dt;
        let p = self.p + self.v * dt + 0.5 * self.a * dt * dt + (1.0 / 6.0) * j * dt * dt * dt;
        Breakpoint { t: self.t + dt, p, v, a, jerk: 0.0 }
    }

    fn evaluate_at(&self, dt: f64) -> KinematicState {
        let j = self.jerk;
        KinematicState {
            p: self.p + self.v * dt + 0.5 * self.a * dt * dt + (1.0 / 6.0) * j * dt * dt * dt,
            v: self.v + self.a * dt + 0.5 * j * dt * dt,
            a: self.a + j * dt,
            j,
        }
    }
}

/// A `(position, velocity, acceleration, jerk)` sample of a trajectory at
/// some instant.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KinematicState {
    pub p: f64,
    pub v: f64,
    pub a: f64,
    pub j: f64,
}

/// Whether a trajectory is a full seven-phase point-to-point plan or a
/// three-phase stop (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrajectoryKind {
    PointToPoint,
    Stopping,
}

/// An immutable, time-parameterized motion curve.
#[derive(Debug, Clone)]
pub struct Trajectory {
    t0: Instant,
    breakpoints: [Breakpoint; BREAKPOINT_COUNT],
    end_position: f64,
    kind: TrajectoryKind,
}

impl Trajectory {
    /// Build a trajectory from a start time and breakpoints computed by the
    /// planner. `breakpoints[0].t` must be `0.0`.
    pub(crate) fn from_breakpoints(
        t0: Instant,
        breakpoints: [Breakpoint; BREAKPOINT_COUNT],
        kind: TrajectoryKind,
    ) -> Self {
        let end_position = breakpoints[BREAKPOINT_COUNT - 1].p;
        Trajectory { t0, breakpoints, end_position, kind }
    }

    /// A degenerate trajectory at rest at `p`: all eight breakpoints carry
    /// the same `(p, 0, 0, 0)` state at `t = 0` (spec §3).
    pub fn stationary(p: f64, t0: Instant) -> Self {
        let bp = Breakpoint { t: 0.0, p, v: 0.0, a: 0.0, jerk: 0.0 };
        Trajectory {
            t0,
            breakpoints: [bp; BREAKPOINT_COUNT],
            end_position: p,
            kind: TrajectoryKind::PointToPoint,
        }
    }

    pub fn t0(&self) -> Instant {
        self.t0
    }

    pub fn end_position(&self) -> f64 {
        self.end_position
    }

    pub fn kind(&self) -> TrajectoryKind {
        self.kind
    }

    pub fn breakpoints(&self) -> &[Breakpoint; BREAKPOINT_COUNT] {
        &self.breakpoints
    }

    pub fn final_time(&self) -> f64 {
        self.breakpoints[BREAKPOINT_COUNT - 1].t
    }

    /// True once `now` is at or past the final breakpoint.
    pub fn is_finished(&self, now: Instant) -> bool {
        self.elapsed(now) >= self.final_time()
    }

    fn elapsed(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.t0).as_secs_f64()
    }

    /// Sample `(p, v, a, j)` at `now` by piecewise integration from the
    /// breakpoint immediately preceding `now - t0` (spec §4.1 "Query
    /// interface").
    pub fn evaluate(&self, now: Instant) -> KinematicState {
        let elapsed = self.elapsed(now);
        if elapsed <= 0.0 {
            let bp = &self.breakpoints[0];
            return KinematicState { p: bp.p, v: bp.v, a: bp.a, j: bp.jerk };
        }
        let last = BREAKPOINT_COUNT - 1;
        if elapsed >= self.breakpoints[last].t {
            let bp = &self.breakpoints[last];
            return KinematicState { p: bp.p, v: 0.0, a: 0.0, j: 0.0 };
        }
        for i in 0..last {
            let start = self.breakpoints[i].t;
            let end = self.breakpoints[i + 1].t;
            if elapsed >= start && elapsed < end {
                return self.breakpoints[i].evaluate_at(elapsed - start);
            }
        }
        // Unreachable given the checks above, but fall back to the final
        // state rather than panicking on float edge cases.
        let bp = &self.breakpoints[last];
        KinematicState { p: bp.p, v: 0.0, a: 0.0, j: 0.0 }
    }
}

/// Fill breakpoints 0 and `1..=n` from an initial breakpoint, a list of
/// `(duration, jerk)` phases, then pad the remainder with the final state
/// (jerk 0), used for both the seven-phase point-to-point build and the
/// three-phase stop build.
pub(crate) fn build_breakpoints(
    initial: Breakpoint,
    phases: &[(f64, f64)],
) -> [Breakpoint; BREAKPOINT_COUNT] {
    debug_assert!(phases.len() < BREAKPOINT_COUNT);
    let mut bps = [Breakpoint::ZERO; BREAKPOINT_COUNT];
    bps[0] = initial;
    let mut cur = initial;
    for (idx, &(dur, jerk)) in phases.iter().enumerate() {
        cur.jerk = jerk;
        bps[idx] = cur;
        cur = cur.advance(dur.max(0.0));
        cur.jerk = 0.0;
    }
    for slot in bps.iter_mut().skip(phases.len()) {
        *slot = cur;
    }
    bps
}

#[cfg(test)]
#[path = "trajectory_tests.rs"]
mod tests;

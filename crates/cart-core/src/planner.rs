// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The jerk-limited trajectory planner (spec §4.1): point-to-point
//! from-rest-to-rest planning, and the fastest safe stop from an
//! in-progress trajectory.

use tokio::time::Instant;

use crate::config::PlannerConfig;
use crate::trajectory::{build_breakpoints, Breakpoint, Trajectory, TrajectoryKind};

/// Below this distance a point-to-point plan degenerates to a stationary
/// trajectory rather than chasing a near-zero-duration S-curve.
const EPSILON: f64 = 1e-6;

/// Which of the four point-to-point regimes a move falls into, purely for
/// diagnostics/tests — the planner doesn't branch on this type at call
/// sites, it's returned alongside the trajectory for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    AccelLimitedWithMaxVelocity,
    VelocityLimited,
    AccelLimitedWithoutMaxVelocity,
    JerkLimited,
}

/// Plan a seven-phase jerk-limited move from rest at `p0` to rest at `p1`,
/// starting at wall-clock `t0` (spec §4.1 "Point-to-point planning").
pub fn plan_point_to_point(cfg: &PlannerConfig, p0: f64, p1: f64, t0: Instant) -> Trajectory {
    let s = (p1 - p0).abs();
    if s < EPSILON {
        return Trajectory::stationary(p0, t0);
    }
    let sign = if p1 > p0 { 1.0 } else { -1.0 };
    let j = cfg.max_jerk;
    let a_max = cfg.max_acceleration;
    let v_max = cfg.max_velocity;

    let (regime, tj, ta, tv) = select_regime(s, j, a_max, v_max);
    let _ = regime;

    let base_jerk = [j, 0.0, -j, 0.0, -j, 0.0, j];
    let durations = [tj, ta, tj, tv, tj, ta, tj];
    let phases: Vec<(f64, f64)> =
        durations.iter().zip(base_jerk.iter()).map(|(&d, &bj)| (d, sign * bj)).collect();

    let initial = Breakpoint { t: 0.0, p: p0, v: 0.0, a: 0.0, jerk: 0.0 };
    let bps = build_breakpoints(initial, &phases);
    Trajectory::from_breakpoints(t0, bps, TrajectoryKind::PointToPoint)
}

/// Select the regime and `(tj, ta, tv)` phase durations per the spec §4.1
/// table.
pub fn select_regime(s: f64, j: f64, a_max: f64, v_max: f64) -> (Regime, f64, f64, f64) {
    let sa = 2.0 * a_max.powi(3) / (j * j);
    let triangular_velocity = v_max * j < a_max * a_max;
    let sv = if triangular_velocity {
        2.0 * v_max * (v_max / j).sqrt()
    } else {
        v_max * (v_max / a_max + a_max / j)
    };

    if s >= sv {
        if triangular_velocity {
            let tj = (v_max / j).sqrt();
            let tv = s / v_max - 2.0 * tj;
            (Regime::VelocityLimited, tj, 0.0, tv)
        } else {
            let tj = a_max / j;
            let ta = v_max / a_max - tj;
            let tv = s / v_max - 2.0 * tj - ta;
            (Regime::AccelLimitedWithMaxVelocity, tj, ta, tv)
        }
    } else if s >= sa {
        let tj = a_max / j;
        let ta = 0.5 * ((4.0 * s * j * j + a_max.powi(3)) / (a_max * j * j)).sqrt() - 1.5 * tj;
        (Regime::AccelLimitedWithoutMaxVelocity, tj, ta, 0.0)
    } else {
        let tj = (s / (2.0 * j)).cbrt();
        (Regime::JerkLimited, tj, 0.0, 0.0)
    }
}

/// Which phase (1-indexed, spec §4.1 table) of a seven-phase point-to-point
/// trajectory an elapsed time falls within, plus the time-within-phase.
fn locate_phase(breakpoints: &[Breakpoint; 8], elapsed: f64) -> (usize, f64) {
    for k in 1..=7 {
        if elapsed < breakpoints[k].t || k == 7 {
            return (k, elapsed - breakpoints[k - 1].t);
        }
    }
    unreachable!()
}

/// Plan the fastest safe stop from the current state of `reference` at wall
/// clock `now` (spec §4.1 "Stopping trajectory").
pub fn plan_stop(cfg: &PlannerConfig, reference: &Trajectory, now: Instant) -> Trajectory {
    if reference.is_finished(now) {
        let state = reference.evaluate(now);
        return Trajectory::stationary(state.p, now);
    }

    let state = reference.evaluate(now);
    let j = cfg.max_jerk;
    let brake_jerk = if state.v > 0.0 {
        -j
    } else if state.v < 0.0 {
        j
    } else if state.a > 0.0 {
        -j
    } else if state.a < 0.0 {
        j
    } else {
        return Trajectory::stationary(state.p, now);
    };

    let (tj1, ta_stop, tj2) = match reference.kind() {
        TrajectoryKind::PointToPoint => {
            let bps = reference.breakpoints();
            let elapsed = now.saturating_duration_since(reference.t0()).as_secs_f64();
            let (phase, t_in_phase) = locate_phase(bps, elapsed);

            // Original phase durations, needed by several branches below.
            let tj = bps[1].t - bps[0].t;
            let ta = bps[2].t - bps[1].t;

            match phase {
                1 => (2.0 * t_in_phase, 0.0, t_in_phase),
                2 => (2.0 * tj, t_in_phase, tj),
                3 => {
                    let r = bps[3].t - elapsed;
                    (r + tj, ta, tj)
                }
                4 => (tj, ta, tj),
                5 => {
                    let r = bps[5].t - elapsed;
                    (r, ta, tj)
                }
                6 => {
                    let r = bps[6].t - elapsed;
                    (0.0, r, tj)
                }
                7 => {
                    let r = bps[7].t - elapsed;
                    (0.0, 0.0, r)
                }
                _ => unreachable!(),
            }
        }
        TrajectoryKind::Stopping => {
            // The three stop phases live at breakpoints 0..=3. Whichever
            // phase we're currently in keeps its remaining duration; phases
            // already completed are zeroed; a phase not yet reached keeps
            // its full original duration so the rebuilt profile still
            // finishes at rest (the hard trajectory invariant that
            // evaluating past the final breakpoint yields zero v/a must
            // hold for this branch too).
            let bps = reference.breakpoints();
            let elapsed = now.saturating_duration_since(reference.t0()).as_secs_f64();
            let ta_stop_full = bps[2].t - bps[1].t;
            let tj2_full = bps[3].t - bps[2].t;
            if elapsed < bps[1].t {
                (bps[1].t - elapsed, ta_stop_full, tj2_full)
            } else if elapsed < bps[2].t {
                (0.0, bps[2].t - elapsed, tj2_full)
            } else {
                (0.0, 0.0, bps[3].t - elapsed)
            }
        }
    };

    let initial = Breakpoint { t: 0.0, p: state.p, v: state.v, a: state.a, jerk: 0.0 };
    let phases = [(tj1.max(0.0), brake_jerk), (ta_stop.max(0.0), 0.0), (tj2.max(0.0), -brake_jerk)];
    let bps = build_breakpoints(initial, &phases);
    Trajectory::from_breakpoints(now, bps, TrajectoryKind::Stopping)
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;

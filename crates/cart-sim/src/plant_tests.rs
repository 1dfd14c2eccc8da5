// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn at_rest_with_no_force_stays_put() {
    let mut plant = EulerPlant::new(100.0, 1.0);
    plant.integrate(1.0);
    assert_eq!(plant.position(), 100.0);
    assert_eq!(plant.velocity(), 0.0);
}

#[test]
fn constant_force_accelerates_uniformly() {
    let mut plant = EulerPlant::new(0.0, 2.0);
    plant.apply_force(4.0);
    for _ in 0..100 {
        plant.integrate(0.01);
    }
    // a = f/m = 2, after 1s: v = 2, p = 0.5*2*1^2 = 1 (approximately, Euler error is small at this step size)
    assert!((plant.velocity() - 2.0).abs() < 0.05);
    assert!((plant.position() - 1.0).abs() < 0.05);
}

#[test]
fn shared_plant_reads_reflect_integration() {
    let shared = SharedPlant::new(EulerPlant::new(10.0, 1.0));
    let mut adapter: SharedPlant = shared.clone();
    adapter.apply_force(1.0);
    shared.integrate(1.0);
    assert!(adapter.read_velocity() > 0.0);
    assert!(adapter.read_position() > 10.0);
}

#[test]
fn zero_mass_does_not_panic() {
    let mut plant = EulerPlant::new(0.0, 0.0);
    plant.apply_force(1.0);
    plant.integrate(0.01);
    assert!(plant.velocity().is_finite());
}

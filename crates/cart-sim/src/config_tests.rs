// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn base() -> SimConfig {
    SimConfig {
        agents: 2,
        spacing: 800.0,
        safety_margin: 30.0,
        scenario: None,
        min_delay_ms: 10,
        max_delay_ms: 20,
        loss_probability: 0.0,
        duration_secs: 30,
        log_format: "text".into(),
        log_level: "info".into(),
    }
}

#[test]
fn default_shaped_config_validates() {
    assert!(base().validate().is_ok());
}

#[test]
fn rejects_fewer_than_two_agents() {
    let mut cfg = base();
    cfg.agents = 1;
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_inverted_delay_bounds() {
    let mut cfg = base();
    cfg.min_delay_ms = 50;
    cfg.max_delay_ms = 10;
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_out_of_range_loss_probability() {
    let mut cfg = base();
    cfg.loss_probability = 1.5;
    assert!(cfg.validate().is_err());
}

#[test]
fn link_params_reflect_config() {
    let cfg = base();
    let params = cfg.link_params();
    assert_eq!(params.min_delay.as_millis(), 10);
    assert_eq!(params.max_delay.as_millis(), 20);
    assert_eq!(params.loss_probability, 0.0);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn side_opposite_is_involutive() {
    assert_eq!(Side::Left.opposite(), Side::Right);
    assert_eq!(Side::Right.opposite().opposite(), Side::Right);
}

#[test]
fn display_matches_as_str_code_family() {
    let err = AgentError::NoNeighbor { side: Side::Left };
    assert_eq!(err.as_str(), "NO_NEIGHBOR");
    assert_eq!(err.to_string(), "no neighbor on left side");
}

#[test]
fn invariant_violation_carries_detail() {
    let err = AgentError::InvariantViolation { detail: "goal inside borders".into() };
    assert!(err.to_string().contains("goal inside borders"));
}

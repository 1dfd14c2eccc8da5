// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// Errors surfaced by an agent's local decision logic.
///
/// None of these cross a channel boundary (spec §7): a rejected goal is
/// reported to the caller via the goal-completion channel, not as an
/// `AgentError`. This enum exists for the cases an embedder of `cart-core`
/// (e.g. a topology builder) needs to observe at construction time, plus the
/// local-invariant failures spec §7 says should be logged and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// A goal or border-move requires a side with no wired neighbor.
    NoNeighbor { side: Side },
    /// The outbound channel to a neighbor has been dropped (peer gone).
    UnreachableNeighbor { side: Side },
    /// A local invariant was violated — logged and the triggering operation
    /// is aborted rather than propagated (spec §7).
    InvariantViolation { detail: String },
}

/// Which side of an agent a border or neighbor reference denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AgentError {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentError::NoNeighbor { .. } => "NO_NEIGHBOR",
            AgentError::UnreachableNeighbor { .. } => "UNREACHABLE_NEIGHBOR",
            AgentError::InvariantViolation { .. } => "INVARIANT_VIOLATION",
        }
    }
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::NoNeighbor { side } => write!(f, "no neighbor on {side} side"),
            AgentError::UnreachableNeighbor { side } => {
                write!(f, "{side} neighbor channel is gone")
            }
            AgentError::InvariantViolation { detail } => {
                write!(f, "invariant violation: {detail}")
            }
        }
    }
}

impl std::error::Error for AgentError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire types for the peer-to-peer border-move / emergency-stop negotiation
//! protocol (spec §3 "Request"/"Response", §4.4, §4.5, §9).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

use crate::error::Side;
use crate::state::AcceptTransition;

/// A request id, per spec §3: "monotonic nanosecond timestamp at
/// origination", which doubles as a priority for tie-breaking.
pub type RequestId = u64;

/// Process-wide monotonic id source. Nanosecond wall-clock timestamps are
/// the spec's chosen scheme (spec §9 "Monotonic ids as priorities"), but
/// clock resolution on some platforms can repeat a nanosecond across two
/// calls in quick succession; `last` guarantees strict monotonicity the
/// same way `transcript.rs`'s `seq: AtomicU64` guarantees unique sequence
/// numbers, without abandoning the wall-clock basis the spec asks for.
static LAST_ID: AtomicU64 = AtomicU64::new(0);

/// Mint a fresh, strictly-increasing request id.
pub fn next_request_id() -> RequestId {
    let now_nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0);
    let mut prev = LAST_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now_nanos.max(prev + 1);
        match LAST_ID.compare_exchange_weak(prev, candidate, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return candidate,
            Err(actual) => prev = actual,
        }
    }
}

/// The type of an outgoing or incoming request (spec §3, §6).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RequestKind {
    /// Ask the receiver to move its shared border to `proposed_border_end`.
    /// `proposed_border_start` is carried only for logging (spec §3).
    BorderMove { proposed_border_start: f64, proposed_border_end: f64 },
    /// Ask the receiver to begin stopping because our own stop may cross
    /// into its territory.
    EmergencyStop,
}

/// A request sent over one of the four neighbor channels (spec §3, §6).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Request {
    pub id: RequestId,
    pub kind: RequestKind,
}

impl Request {
    pub fn border_move(proposed_border_start: f64, proposed_border_end: f64) -> Self {
        Request {
            id: next_request_id(),
            kind: RequestKind::BorderMove { proposed_border_start, proposed_border_end },
        }
    }

    pub fn emergency_stop() -> Self {
        Request { id: next_request_id(), kind: RequestKind::EmergencyStop }
    }

    /// Re-issue this request with the same id, for the retry path (spec
    /// §4.6 "Lost request ... resent with the same id").
    pub fn reissue(&self) -> Self {
        *self
    }

    pub fn proposed_border_end(&self) -> Option<f64> {
        match self.kind {
            RequestKind::BorderMove { proposed_border_end, .. } => Some(proposed_border_end),
            RequestKind::EmergencyStop => None,
        }
    }
}

/// The four response types a neighbor can send back (spec §3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResponseKind {
    Accept,
    Reject,
    Wait,
    StopConfirm,
}

/// A response to a previously-received `Request`, correlated by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Response {
    pub request_id: RequestId,
    pub kind: ResponseKind,
}

impl Response {
    pub fn new(request_id: RequestId, kind: ResponseKind) -> Self {
        Response { request_id, kind }
    }
}

/// Where a `PendingRequest` originated, replacing the closure-capturing
/// back-pointers the source repository used (spec §9 "Replacement of
/// callback-holding structures"). When a forwarded chain resolves, the
/// agent looks the original request up by id on `side` and replies through
/// that side's outbound response channel — no captured function values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PendingOrigin {
    /// This request was spawned to service an operator goal (or a local
    /// emergency-stop trigger) — no one to forward the answer to.
    Local,
    /// This request was spawned while servicing an *incoming* request from
    /// `side`, whose eventual response must be forwarded back unchanged to
    /// whichever original request id is recorded there.
    ForwardedFrom { side: Side, original_request_id: RequestId },
}

/// Bookkeeping for one outstanding outgoing request (spec §3
/// "Pending-Request Parameters").
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub request: Request,
    /// The side this request was sent to.
    pub side: Side,
    /// The operator goal that motivated this request, if any (absent for
    /// emergency-stop requests and for requests spawned purely to give way).
    pub goal: Option<f64>,
    /// What state to transition to once this request is Accepted. `None`
    /// for `EmergencyStop` requests, which are resolved through the
    /// dedicated `StopConfirm` path rather than the Accept/Reject/Wait
    /// forwarding machinery.
    pub on_accept: Option<AcceptTransition>,
    pub retry_at: Instant,
    /// When this request (or its first incarnation, across retries) was
    /// originally sent, for round-trip-time metrics.
    pub first_sent_at: Instant,
    pub origin: PendingOrigin,
}

impl PendingRequest {
    pub fn is_forwarded(&self) -> bool {
        matches!(self.origin, PendingOrigin::ForwardedFrom { .. })
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;

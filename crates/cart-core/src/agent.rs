// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent state machine and negotiation protocol (spec §4.3, §4.4, §4.5),
//! the largest single piece of the core (spec §2: "~45%"). One `Agent`
//! drives one cart: a single-threaded `tokio::select!` event loop
//! multiplexing a 100 Hz control tick against the union of its inbound
//! channels, grounded on the teacher's `broker/distributor.rs::run` /
//! `broker/registry.rs::run_health_checks` select loops (SPEC_FULL §0, §10).

use std::collections::HashMap;

use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::AgentConfig;
use crate::channels::AgentChannels;
use crate::error::Side;
use crate::metrics::AgentMetrics;
use crate::pid::PidCascade;
use crate::plant::PlantAdapter;
use crate::planner::{plan_point_to_point, plan_stop};
use crate::protocol::{
    next_request_id, PendingOrigin, PendingRequest, Request, RequestId, RequestKind, Response,
    ResponseKind,
};
use crate::state::{AcceptTransition, AgentState};
use crate::trajectory::Trajectory;

/// A single cart's coordination engine: identity, kinematic plant handle,
/// border/current trajectories, state machine, and negotiation bookkeeping
/// (spec §3 "Agent").
pub struct Agent<P: PlantAdapter> {
    id: u64,
    name: String,
    config: AgentConfig,
    plant: P,
    pid: PidCascade,

    left_border: Trajectory,
    right_border: Trajectory,
    current_trajectory: Trajectory,

    state: AgentState,
    pending: HashMap<RequestId, PendingRequest>,
    /// Cache of terminal answers we've already given to incoming requests,
    /// so a retried (duplicate) request is answered idempotently without
    /// re-running side effects (spec §4.6 "the receiver, on seeing an
    /// already-answered id, must reply again with the prior answer").
    answered: HashMap<RequestId, ResponseKind>,
    /// A `StopConfirm` owed to the left/right neighbor once our own stop
    /// resolves (spec §3 singular "Pending Emergency-Stop Confirmation",
    /// modeled per-side here since a breadth-first cascade can owe a
    /// confirmation to both neighbors independently — see DESIGN.md).
    pending_stop_confirm: [Option<RequestId>; 2],
    /// The goal to resume via the normal intake path once a stop finishes,
    /// set only when the stop was triggered by a goal *replacing* one
    /// already in progress (spec §4.5 "mid-movement goal change"); a plain
    /// operator emergency-stop leaves this `None` and the goal is abandoned.
    pending_goal_after_stop: Option<f64>,
    /// The operator goal currently accepted and being tracked (`Moving`),
    /// if any — used to decide whether a stop or rejection owes a
    /// completion signal.
    current_goal: Option<f64>,
    /// Priority stamp of whatever we are currently committed to (an
    /// operator goal in `Moving`, or a give-way position in `Avoiding`)
    /// (spec §3 "Goal Timestamp").
    goal_timestamp: RequestId,

    channels: AgentChannels,
    metrics: AgentMetrics,
}

impl<P: PlantAdapter> Agent<P> {
    pub fn new(id: u64, name: impl Into<String>, config: AgentConfig, plant: P, channels: AgentChannels) -> Self {
        let now = Instant::now();
        let pid = PidCascade::new(config.position_pid, config.velocity_pid);
        let left_border = Trajectory::stationary(config.left_border_initial, now);
        let right_border = Trajectory::stationary(config.right_border_initial, now);
        let current_trajectory = Trajectory::stationary(config.cart_initial_position, now);

        Agent {
            id,
            name: name.into(),
            config,
            plant,
            pid,
            left_border,
            right_border,
            current_trajectory,
            state: AgentState::Idle,
            pending: HashMap::new(),
            answered: HashMap::new(),
            pending_stop_confirm: [None, None],
            pending_goal_after_stop: None,
            current_goal: None,
            goal_timestamp: 0,
            channels,
            metrics: AgentMetrics::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn metrics(&self) -> &AgentMetrics {
        &self.metrics
    }

    pub fn left_border(&self) -> &Trajectory {
        &self.left_border
    }

    pub fn right_border(&self) -> &Trajectory {
        &self.right_border
    }

    pub fn current_trajectory(&self) -> &Trajectory {
        &self.current_trajectory
    }

    fn border(&self, side: Side) -> &Trajectory {
        match side {
            Side::Left => &self.left_border,
            Side::Right => &self.right_border,
        }
    }

    fn border_mut(&mut self, side: Side) -> &mut Trajectory {
        match side {
            Side::Left => &mut self.left_border,
            Side::Right => &mut self.right_border,
        }
    }

    fn outbound_request(&self, side: Side) -> Option<&tokio::sync::mpsc::Sender<Request>> {
        match side {
            Side::Left => self.channels.outbound.left_request.as_ref(),
            Side::Right => self.channels.outbound.right_request.as_ref(),
        }
    }

    fn outbound_response(&self, side: Side) -> Option<&tokio::sync::mpsc::Sender<Response>> {
        match side {
            Side::Left => self.channels.outbound.left_response.as_ref(),
            Side::Right => self.channels.outbound.right_response.as_ref(),
        }
    }

    /// Run the event loop until the stop-controller channel fires (spec
    /// §4.3 "Event loop"). Consumes the agent since nothing outlives the
    /// loop — the harness only ever observes the agent through its
    /// channels and (for tests) a post-mortem snapshot taken by cloning
    /// fields out before calling this.
    pub async fn run(mut self) {
        let span = info_span!("agent", id = self.id, name = %self.name);
        async move {
            info!("agent event loop starting");
            let mut tick = interval(self.config.control_tick);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        self.on_tick(Instant::now());
                    }
                    Some(goal) = self.channels.inbound.goal.recv() => {
                        self.on_incoming_goal(goal, Instant::now());
                    }
                    Some(()) = self.channels.inbound.emergency_stop.recv() => {
                        self.on_incoming_emergency_stop_trigger(Instant::now());
                    }
                    Some(req) = self.channels.inbound.left_request.recv() => {
                        self.on_incoming_request(Side::Left, req, Instant::now());
                    }
                    Some(req) = self.channels.inbound.right_request.recv() => {
                        self.on_incoming_request(Side::Right, req, Instant::now());
                    }
                    Some(resp) = self.channels.inbound.left_response.recv() => {
                        self.on_incoming_response(Side::Left, resp, Instant::now());
                    }
                    Some(resp) = self.channels.inbound.right_response.recv() => {
                        self.on_incoming_response(Side::Right, resp, Instant::now());
                    }
                    Some(()) = self.channels.inbound.stop_controller.recv() => {
                        info!("agent received shutdown signal");
                        break;
                    }
                    else => {
                        debug!("all inbound channels closed, shutting down");
                        break;
                    }
                }
            }
            info!("agent event loop stopped");
        }
        .instrument(span)
        .await
    }

    // -- Control tick --------------------------------------------------

    fn on_tick(&mut self, now: Instant) {
        let position = self.plant.read_position();
        let velocity = self.plant.read_velocity();
        let setpoint = self.current_trajectory.evaluate(now).p;
        let force = self.pid.step(setpoint, position, velocity, self.config.control_tick.as_secs_f64());
        self.plant.apply_force(force);

        self.drain_retries(now);
        self.advance_state_machine(now);
    }

    /// Re-issue any pending request whose retry deadline has passed (spec
    /// §4.4 "Retries: scanned each tick in Requesting (and Idle, so that a
    /// recovered agent drains its retries)"). Forwarded requests are not
    /// retried locally — the upstream retry re-enters them naturally.
    fn drain_retries(&mut self, now: Instant) {
        if !matches!(self.state, AgentState::Requesting | AgentState::Idle) {
            return;
        }
        let due: Vec<RequestId> = self
            .pending
            .iter()
            .filter(|(_, p)| !p.is_forwarded() && p.retry_at <= now)
            .map(|(id, _)| *id)
            .collect();

        for id in due {
            let side = self.pending[&id].side;
            let request = self.pending[&id].request.reissue();
            debug!(request_id = id, side = %side, "retrying request");
            self.metrics.record_retry();
            if let Some(pending) = self.pending.get_mut(&id) {
                pending.retry_at = now + self.config.retry_interval;
            }
            self.send_request_raw(side, request);
        }
    }

    fn advance_state_machine(&mut self, now: Instant) {
        match self.state {
            AgentState::Moving => {
                if self.current_trajectory.is_finished(now) {
                    info!("goal reached, entering busy dwell");
                    self.current_goal = None;
                    self.state = AgentState::Busy { until: now + self.config.busy_dwell };
                    self.complete_goal();
                }
            }
            AgentState::Avoiding => {
                if self.current_trajectory.is_finished(now) {
                    debug!("avoidance complete, returning to idle");
                    self.state = AgentState::Idle;
                }
            }
            AgentState::Busy { until } => {
                if now >= until {
                    debug!("busy dwell elapsed, returning to idle");
                    self.state = AgentState::Idle;
                }
            }
            AgentState::Stopping => {
                if self.current_trajectory.is_finished(now) {
                    if let Some(goal) = self.pending_goal_after_stop.take() {
                        info!(goal, "stop complete, resuming deferred goal");
                        self.goal_intake(goal, now);
                    } else {
                        info!("stop complete, returning to idle");
                        self.state = AgentState::Idle;
                        if self.current_goal.take().is_some() {
                            self.complete_goal();
                        }
                    }
                }
            }
            AgentState::Idle | AgentState::Requesting => {}
        }
    }

    fn complete_goal(&mut self) {
        // Spec §7: the consumer cannot distinguish success/rejection on
        // this channel alone — it always carries the same value; telemetry
        // is where the distinction lives.
        let _ = self.channels.outbound.goal_completion.try_send(true);
    }

    // -- Goal intake (spec §4.4) ----------------------------------------

    fn on_incoming_goal(&mut self, goal: f64, now: Instant) {
        self.metrics.record_goal_received(now);
        info!(goal, state = self.state.as_str(), "goal received");
        match self.state {
            AgentState::Idle | AgentState::Busy { .. } => {
                self.goal_intake(goal, now);
            }
            AgentState::Requesting => {
                // A fresh operator goal pre-empts whatever local
                // negotiation was in flight for the previous one; forwarded
                // entries (servicing someone else's request) are left
                // alone since they don't belong to our own goal.
                let stale: Vec<RequestId> =
                    self.pending.iter().filter(|(_, p)| !p.is_forwarded()).map(|(id, _)| *id).collect();
                for id in stale {
                    self.pending.remove(&id);
                }
                self.goal_intake(goal, now);
            }
            AgentState::Moving | AgentState::Avoiding => {
                debug!("goal change mid-motion, stopping before replanning");
                self.pending_goal_after_stop = Some(goal);
                self.trigger_emergency_stop(now);
            }
            AgentState::Stopping => {
                debug!("goal change while already stopping, deferring");
                self.pending_goal_after_stop = Some(goal);
            }
        }
    }

    /// Decide whether `goal` is reachable inside the current borders, and
    /// either start moving or open a border-move negotiation (spec §4.4
    /// "Goal intake").
    fn goal_intake(&mut self, goal: f64, now: Instant) {
        let m = self.config.safety_margin;
        let l = self.left_border.end_position();
        let r = self.right_border.end_position();

        if l + m < goal && goal < r - m {
            self.begin_motion(goal, AcceptTransition::Moving, now);
            return;
        }

        let side = if goal <= l + m { Side::Left } else { Side::Right };
        let overshoot = self.config.overshoot_factor * m;
        let proposed = match side {
            Side::Left => goal - overshoot,
            Side::Right => goal + overshoot,
        };

        if self.send_border_move(side, proposed, Some(goal), AcceptTransition::Moving, PendingOrigin::Local, now) {
            self.state = AgentState::Requesting;
        } else {
            warn!(side = %side, "no neighbor on required side, rejecting goal");
            self.current_goal = None;
            self.state = AgentState::Idle;
            self.complete_goal();
        }
    }

    /// Plan motion to `target` from the current physical position and
    /// enter the corresponding state (spec §4.4's `acceptGoal`, reused for
    /// both directly-accepted goals and avoidance moves).
    fn begin_motion(&mut self, target: f64, transition: AcceptTransition, now: Instant) {
        let position = self.plant.read_position();
        self.current_trajectory = plan_point_to_point(&self.config.planner, position, target, now);
        self.pid.reset();
        self.goal_timestamp = next_request_id();
        self.state = transition.into();
        if transition == AcceptTransition::Moving {
            self.current_goal = Some(target);
        }
        self.metrics.record_movement_started(now);
        info!(target, state = self.state.as_str(), "beginning motion");
    }

    /// Construct and send a fresh border-move request, recording a
    /// `PendingRequest`. Returns `false` (no-op) if the side has no
    /// outbound channel (a hard wall).
    fn send_border_move(
        &mut self,
        side: Side,
        proposed_border_end: f64,
        goal: Option<f64>,
        on_accept: AcceptTransition,
        origin: PendingOrigin,
        now: Instant,
    ) -> bool {
        if self.outbound_request(side).is_none() {
            return false;
        }
        let current_border = self.border(side).end_position();
        let request = Request::border_move(current_border, proposed_border_end);
        let pending = PendingRequest {
            request,
            side,
            goal,
            on_accept: Some(on_accept),
            retry_at: now + self.config.retry_interval,
            first_sent_at: now,
            origin,
        };
        self.pending.insert(request.id, pending);
        self.metrics.record_request_sent();
        self.send_request_raw(side, request);
        true
    }

    fn send_request_raw(&self, side: Side, request: Request) {
        if let Some(tx) = self.outbound_request(side) {
            if tx.try_send(request).is_err() {
                debug!(side = %side, request_id = request.id, "request dropped (channel full or closed)");
            }
        }
    }

    fn respond(&mut self, side: Side, response: Response) {
        self.metrics.record_message();
        if let Some(tx) = self.outbound_response(side) {
            if tx.try_send(response).is_err() {
                debug!(side = %side, request_id = response.request_id, "response dropped (channel full or closed)");
            }
        }
    }

    // -- Servicing incoming requests (spec §4.4, §4.5) -------------------

    fn on_incoming_request(&mut self, side: Side, req: Request, now: Instant) {
        self.metrics.record_message();
        if let Some(&answer) = self.answered.get(&req.id) {
            debug!(request_id = req.id, side = %side, "replaying cached answer to duplicate request");
            self.respond(side, Response::new(req.id, answer));
            return;
        }
        match req.kind {
            RequestKind::EmergencyStop => self.on_incoming_emergency_stop(side, req, now),
            RequestKind::BorderMove { proposed_border_end, .. } => {
                self.on_incoming_border_move(side, req, proposed_border_end, now)
            }
        }
    }

    fn on_incoming_border_move(&mut self, from_side: Side, req: Request, proposed: f64, now: Instant) {
        let m = self.config.safety_margin;

        let conflicting_pending_id =
            self.pending.iter().find(|(_, p)| p.side == from_side && !p.is_forwarded()).map(|(id, _)| *id);
        let our_extent = self.current_trajectory.end_position();
        let motion_conflict = self.state.is_in_motion()
            && match from_side {
                Side::Left => proposed > our_extent - m,
                Side::Right => proposed < our_extent + m,
            };

        if conflicting_pending_id.is_some() || motion_conflict {
            let our_priority = conflicting_pending_id.unwrap_or(self.goal_timestamp);
            if req.id > our_priority {
                // Newer incoming request wins the tie (spec §9 open
                // question resolution): we yield, abandoning whatever of
                // our own was contending for this side so the next retry
                // from the winner lands on a clean slate.
                debug!(request_id = req.id, side = %from_side, "conflict lost, yielding");
                if let Some(id) = conflicting_pending_id {
                    if let Some(lost) = self.pending.remove(&id) {
                        if lost.goal.is_some() {
                            self.current_goal = None;
                            self.state = AgentState::Idle;
                            self.complete_goal();
                        }
                    }
                }
                if self.state.is_in_motion() {
                    self.trigger_emergency_stop(now);
                }
            } else {
                debug!(request_id = req.id, side = %from_side, "conflict won, asking requester to wait");
            }
            self.finalize_response(from_side, req.id, ResponseKind::Wait, now);
            return;
        }

        if matches!(self.state, AgentState::Stopping) {
            // Can't replan a border/avoidance move mid-stop.
            self.finalize_response(from_side, req.id, ResponseKind::Wait, now);
            return;
        }

        let accept_directly = match from_side {
            Side::Left => proposed < our_extent - m,
            Side::Right => proposed > our_extent + m,
        };

        if accept_directly {
            let current = self.border(from_side).end_position();
            let new_border = plan_point_to_point(&self.config.planner, current, proposed, now);
            *self.border_mut(from_side) = new_border;
            self.finalize_response(from_side, req.id, ResponseKind::Accept, now);
            return;
        }

        // Give way: move our own cart clear of the proposed border.
        let avoidance = self.config.overshoot_factor * m;
        let avoidance_goal = match from_side {
            Side::Left => proposed + avoidance,
            Side::Right => proposed - avoidance,
        };
        let far_border_end = match from_side {
            Side::Left => self.right_border.end_position(),
            Side::Right => self.left_border.end_position(),
        };
        let within_own_borders = match from_side {
            Side::Left => avoidance_goal < far_border_end - m,
            Side::Right => avoidance_goal > far_border_end + m,
        };

        if within_own_borders {
            let current = self.border(from_side).end_position();
            let new_border = plan_point_to_point(&self.config.planner, current, proposed, now);
            *self.border_mut(from_side) = new_border;
            self.begin_motion(avoidance_goal, AcceptTransition::Avoiding, now);
            self.finalize_response(from_side, req.id, ResponseKind::Accept, now);
        } else {
            // Our own far border must also yield — recursively negotiate
            // with the opposite neighbor, forwarding its eventual answer
            // back to the original requester unchanged (spec §9
            // "Replacement of callback-holding structures").
            let opposite = from_side.opposite();
            let far_overshoot = self.config.overshoot_factor * m;
            let far_proposed = match opposite {
                Side::Left => avoidance_goal - far_overshoot,
                Side::Right => avoidance_goal + far_overshoot,
            };
            let origin = PendingOrigin::ForwardedFrom { side: from_side, original_request_id: req.id };
            let sent = self.send_border_move(opposite, far_proposed, Some(avoidance_goal), AcceptTransition::Avoiding, origin, now);
            if sent {
                self.state = AgentState::Requesting;
            } else {
                warn!(side = %opposite, "no neighbor to forward give-way chain to");
                self.finalize_response(from_side, req.id, ResponseKind::Wait, now);
            }
        }
    }

    fn on_incoming_emergency_stop_trigger(&mut self, now: Instant) {
        info!("operator emergency stop received");
        self.pending_goal_after_stop = None;
        self.trigger_emergency_stop(now);
    }

    fn on_incoming_emergency_stop(&mut self, from_side: Side, req: Request, now: Instant) {
        // If already stopping, trigger_emergency_stop below is a no-op and
        // we still owe this neighbor a StopConfirm once our stop resolves.
        debug!(request_id = req.id, side = %from_side, "incoming emergency-stop request");
        self.pending_stop_confirm[side_index(from_side)] = Some(req.id);
        self.trigger_emergency_stop(now);
    }

    /// Execute the emergency-stop procedure (spec §4.5): either brake
    /// immediately, or first ask any neighbor whose border the stop would
    /// cross to stop too.
    fn trigger_emergency_stop(&mut self, now: Instant) {
        if matches!(self.state, AgentState::Stopping) {
            return;
        }

        let stop_traj = plan_stop(&self.config.planner, &self.current_trajectory, now);
        let p_stop = stop_traj.end_position();
        let m = self.config.safety_margin;

        let violates_left = p_stop <= self.left_border.end_position() + m;
        let violates_right = p_stop >= self.right_border.end_position() - m;

        let pending_goal_needs_left = self
            .pending_goal_after_stop
            .is_some_and(|g| g <= self.left_border.end_position() + m);
        let pending_goal_needs_right = self
            .pending_goal_after_stop
            .is_some_and(|g| g >= self.right_border.end_position() - m);

        let need_left = violates_left || pending_goal_needs_left;
        let need_right = violates_right || pending_goal_needs_right;

        if !need_left && !need_right {
            debug!(p_stop, "stopping immediately, no border violated");
            self.current_trajectory = stop_traj;
            self.pid.reset();
            self.state = AgentState::Stopping;
            self.cancel_non_emergency_pending();
            self.settle_owed_stop_confirms(now);
            return;
        }

        self.cancel_non_emergency_pending();
        if need_left {
            self.send_emergency_stop(Side::Left, now);
        }
        if need_right {
            self.send_emergency_stop(Side::Right, now);
        }
        self.state = AgentState::Requesting;
    }

    fn send_emergency_stop(&mut self, side: Side, now: Instant) {
        if self.pending.values().any(|p| p.side == side && matches!(p.request.kind, RequestKind::EmergencyStop)) {
            return;
        }
        if self.outbound_request(side).is_none() {
            warn!(side = %side, "no neighbor to propagate emergency stop to");
            return;
        }
        let request = Request::emergency_stop();
        let pending = PendingRequest {
            request,
            side,
            goal: None,
            on_accept: None,
            retry_at: now + self.config.retry_interval,
            first_sent_at: now,
            origin: PendingOrigin::Local,
        };
        self.pending.insert(request.id, pending);
        self.metrics.record_request_sent();
        self.send_request_raw(side, request);
    }

    fn cancel_non_emergency_pending(&mut self) {
        self.pending.retain(|_, p| matches!(p.request.kind, RequestKind::EmergencyStop));
    }

    /// If no emergency-stop request remains in flight, send any owed
    /// `StopConfirm`s downstream (spec §4.5 "Send any owed StopConfirm
    /// downstream").
    fn settle_owed_stop_confirms(&mut self, now: Instant) {
        let still_waiting = self.pending.values().any(|p| matches!(p.request.kind, RequestKind::EmergencyStop));
        if still_waiting {
            return;
        }
        for side in [Side::Left, Side::Right] {
            if let Some(owed_id) = self.pending_stop_confirm[side_index(side)].take() {
                self.finalize_response(side, owed_id, ResponseKind::StopConfirm, now);
            }
        }
    }

    /// Send a response and cache it for idempotent replay on retry (spec
    /// §4.6), except `Wait` which must be re-evaluated fresh each time.
    fn finalize_response(&mut self, side: Side, request_id: RequestId, kind: ResponseKind, _now: Instant) {
        if !matches!(kind, ResponseKind::Wait) {
            self.answered.insert(request_id, kind);
        }
        self.respond(side, Response::new(request_id, kind));
    }

    // -- Handling responses to our own requests (spec §4.4, §4.5) --------

    fn on_incoming_response(&mut self, side: Side, resp: Response, now: Instant) {
        self.metrics.record_message();
        let Some(pending) = self.pending.remove(&resp.request_id) else {
            warn!(request_id = resp.request_id, side = %side, "stale or duplicate response ignored");
            return;
        };
        if pending.side != side {
            // Shouldn't happen given symmetric wiring, but don't let a
            // misrouted response corrupt state.
            warn!(request_id = resp.request_id, "response arrived on unexpected side, dropping");
            return;
        }

        match resp.kind {
            ResponseKind::Accept => self.on_accept(pending, now),
            ResponseKind::Reject => self.on_reject(pending, now),
            ResponseKind::Wait => self.on_wait(pending, now),
            ResponseKind::StopConfirm => self.on_stop_confirm(side, pending, now),
        }
    }

    fn on_accept(&mut self, pending: PendingRequest, now: Instant) {
        self.metrics.record_response(now.saturating_duration_since(pending.first_sent_at));
        if let RequestKind::BorderMove { proposed_border_end, .. } = pending.request.kind {
            let side = pending.side;
            let current = self.border(side).end_position();
            let new_border = plan_point_to_point(&self.config.planner, current, proposed_border_end, now);
            *self.border_mut(side) = new_border;
        }
        if let (Some(goal), Some(transition)) = (pending.goal, pending.on_accept) {
            self.begin_motion(goal, transition, now);
        }
        if let PendingOrigin::ForwardedFrom { side, original_request_id } = pending.origin {
            self.finalize_response(side, original_request_id, ResponseKind::Accept, now);
        }
    }

    fn on_reject(&mut self, pending: PendingRequest, now: Instant) {
        self.metrics.record_response(now.saturating_duration_since(pending.first_sent_at));
        if !pending.is_forwarded() {
            info!(request_id = pending.request.id, "goal rejected by neighbor, abandoning");
            self.current_goal = None;
            self.state = AgentState::Idle;
            self.complete_goal();
        }
        if let PendingOrigin::ForwardedFrom { side, original_request_id } = pending.origin {
            self.finalize_response(side, original_request_id, ResponseKind::Reject, now);
        }
    }

    fn on_wait(&mut self, pending: PendingRequest, now: Instant) {
        debug!(request_id = pending.request.id, "neighbor asked us to wait, rescheduling retry");
        let origin = pending.origin;
        let mut rescheduled = pending;
        rescheduled.retry_at = now + self.config.retry_interval;
        self.pending.insert(rescheduled.request.id, rescheduled);
        if let PendingOrigin::ForwardedFrom { side, original_request_id } = origin {
            self.respond(side, Response::new(original_request_id, ResponseKind::Wait));
        }
    }

    fn on_stop_confirm(&mut self, side: Side, pending: PendingRequest, now: Instant) {
        self.metrics.record_response(now.saturating_duration_since(pending.first_sent_at));
        info!(side = %side, "neighbor confirmed stop, braking");
        self.current_trajectory = plan_stop(&self.config.planner, &self.current_trajectory, now);
        self.pid.reset();
        self.state = AgentState::Stopping;

        // Freeze the border we were moving on that side too.
        let current_border = self.border(side).clone();
        let new_border = plan_stop(&self.config.planner, &current_border, now);
        *self.border_mut(side) = new_border;

        self.cancel_non_emergency_pending();
        self.settle_owed_stop_confirms(now);
    }
}

fn side_index(side: Side) -> usize {
    match side {
        Side::Left => 0,
        Side::Right => 1,
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;

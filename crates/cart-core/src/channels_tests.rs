// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn edge_agents_have_no_outbound_neighbor_on_the_hard_wall_side() {
    let mut chain = direct_chain(3, 4);
    assert_eq!(chain.len(), 3);

    let (left_channels, _) = &chain[0];
    assert!(left_channels.outbound.left_request.is_none());
    assert!(left_channels.outbound.right_request.is_some());

    let (right_channels, _) = &chain[2];
    assert!(right_channels.outbound.right_request.is_none());
    assert!(right_channels.outbound.left_request.is_some());

    let (middle_channels, _) = &chain[1];
    assert!(middle_channels.outbound.left_request.is_some());
    assert!(middle_channels.outbound.right_request.is_some());

    // Sending on agent 0's right-request sender should be observable on
    // agent 1's left-request receiver.
    let req = Request::border_move(10.0, 20.0);
    chain[0].0.outbound.right_request.as_ref().unwrap().send(req).await.unwrap();
    let received = chain[1].0.inbound.left_request.recv().await.unwrap();
    assert_eq!(received.id, req.id);
}

#[tokio::test]
async fn single_agent_chain_has_hard_walls_on_both_sides() {
    let chain = direct_chain(1, 4);
    let (channels, _) = &chain[0];
    assert!(channels.outbound.left_request.is_none());
    assert!(channels.outbound.right_request.is_none());
}

#[tokio::test]
async fn operator_handle_drives_goal_channel() {
    let chain = direct_chain(1, 4);
    let (mut channels, handle) = { let mut c = chain; c.remove(0) };
    handle.goal.send(700.0).await.unwrap();
    let received = channels.inbound.goal.recv().await.unwrap();
    assert_eq!(received, 700.0);
}

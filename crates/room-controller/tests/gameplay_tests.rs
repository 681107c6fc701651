//! Gameplay integration tests.
//!
//! Drives full games over real WebSocket connections using the
//! `TestRcServer` harness and `TestClient`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use rc_test_utils::{TestClient, TestRcServer};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Two connected clients seated in one room; returns `(x, o, room_id)`.
async fn seated_pair(server: &TestRcServer) -> Result<(TestClient, TestClient, String), anyhow::Error> {
    let mut alice = TestClient::connect(&server.ws_url()).await?;
    let mut bob = TestClient::connect(&server.ws_url()).await?;

    let (room_id, mark) = alice.create_room().await?;
    assert_eq!(mark, "X");
    assert_eq!(bob.join_room_ok(&room_id).await?, "O");

    // Both members see the opening state.
    let opening = json!({"event": "room:state", "board": [null, null, null, null, null, null, null, null, null], "turn": "X"});
    assert_eq!(alice.wait_for_event("room:state", WAIT).await?, opening);
    assert_eq!(bob.wait_for_event("room:state", WAIT).await?, opening);

    Ok((alice, bob, room_id))
}

async fn play(
    x: &mut TestClient,
    o: &mut TestClient,
    room_id: &str,
    moves: &[i64],
) -> Result<(), anyhow::Error> {
    for (n, &index) in moves.iter().enumerate() {
        let mover = if n % 2 == 0 { &mut *x } else { &mut *o };
        let result = mover.make_move(room_id, index).await?;
        assert_eq!(result, json!({"ok": true}), "move {n} at {index}");
    }
    Ok(())
}

fn error_code(result: &Value) -> &str {
    result["code"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn test_create_join_and_first_move() -> Result<(), anyhow::Error> {
    let server = TestRcServer::spawn().await?;
    let (mut alice, mut bob, room_id) = seated_pair(&server).await?;

    let result = alice.make_move(&room_id, 0).await?;
    assert_eq!(result, json!({"ok": true}));

    let expected = json!({
        "event": "room:state",
        "board": ["X", null, null, null, null, null, null, null, null],
        "turn": "O"
    });
    assert_eq!(alice.wait_for_event("room:state", WAIT).await?, expected);
    assert_eq!(bob.wait_for_event("room:state", WAIT).await?, expected);

    Ok(())
}

#[tokio::test]
async fn test_move_out_of_turn_rejected() -> Result<(), anyhow::Error> {
    let server = TestRcServer::spawn().await?;
    let (mut alice, mut bob, room_id) = seated_pair(&server).await?;

    let result = bob.make_move(&room_id, 4).await?;
    assert_eq!(result, json!({"error": "Not your turn", "code": "NOT_YOUR_TURN"}));

    // Board unchanged: X's next move still lands on an empty board.
    alice.make_move(&room_id, 4).await?;
    let state = bob.wait_for_event("room:state", WAIT).await?;
    assert_eq!(
        state["board"],
        json!([null, null, null, null, "X", null, null, null, null])
    );

    Ok(())
}

#[tokio::test]
async fn test_invalid_moves() -> Result<(), anyhow::Error> {
    let server = TestRcServer::spawn().await?;
    let (mut alice, mut bob, room_id) = seated_pair(&server).await?;

    assert_eq!(error_code(&alice.make_move(&room_id, 9).await?), "INVALID_MOVE");
    assert_eq!(error_code(&alice.make_move(&room_id, -1).await?), "INVALID_MOVE");

    alice.make_move(&room_id, 0).await?;
    let occupied = bob.make_move(&room_id, 0).await?;
    assert_eq!(occupied, json!({"error": "Cell occupied", "code": "CELL_OCCUPIED"}));

    let elsewhere = bob.make_move("zzzzzz", 1).await?;
    assert_eq!(error_code(&elsewhere), "ROOM_NOT_FOUND");

    Ok(())
}

#[tokio::test]
async fn test_move_before_opponent_joins() -> Result<(), anyhow::Error> {
    let server = TestRcServer::spawn().await?;
    let mut alice = TestClient::connect(&server.ws_url()).await?;

    let (room_id, _) = alice.create_room().await?;
    let result = alice.make_move(&room_id, 0).await?;
    assert_eq!(
        result,
        json!({"error": "Waiting for opponent", "code": "WAITING_FOR_OPPONENT"})
    );

    Ok(())
}

#[tokio::test]
async fn test_win_ends_game() -> Result<(), anyhow::Error> {
    let server = TestRcServer::spawn_with_vars(vars(&[("RC_TICK_INTERVAL_MS", "100")])).await?;
    let (mut alice, mut bob, room_id) = seated_pair(&server).await?;

    play(&mut alice, &mut bob, &room_id, &[0, 3, 1, 4, 2]).await?;

    let over = json!({"event": "room:game_over", "winner": "X"});
    assert_eq!(alice.wait_for_event("room:game_over", WAIT).await?, over);
    assert_eq!(bob.wait_for_event("room:game_over", WAIT).await?, over);

    let late = bob.make_move(&room_id, 5).await?;
    assert_eq!(late, json!({"error": "Game over", "code": "GAME_OVER"}));

    // Countdown stopped with the game.
    bob.expect_silence(Duration::from_millis(500)).await?;

    Ok(())
}

#[tokio::test]
async fn test_full_board_is_draw() -> Result<(), anyhow::Error> {
    let server = TestRcServer::spawn().await?;
    let (mut alice, mut bob, room_id) = seated_pair(&server).await?;

    play(&mut alice, &mut bob, &room_id, &[0, 1, 2, 4, 3, 5, 7, 6, 8]).await?;

    let over = json!({"event": "room:game_over", "draw": true});
    assert_eq!(alice.wait_for_event("room:game_over", WAIT).await?, over);
    assert_eq!(bob.wait_for_event("room:game_over", WAIT).await?, over);

    Ok(())
}

#[tokio::test]
async fn test_countdown_forces_pass() -> Result<(), anyhow::Error> {
    let server = TestRcServer::spawn_with_vars(vars(&[
        ("RC_TICK_INTERVAL_MS", "20"),
        ("RC_TURN_DURATION_TICKS", "3"),
    ]))
    .await?;
    let (_alice, mut bob, _room_id) = seated_pair(&server).await?;

    for remaining in [2, 1, 0] {
        assert_eq!(
            bob.next_event(WAIT).await?,
            json!({"event": "room:tick", "remaining": remaining})
        );
    }

    // Turn passes to O without touching the board, and the countdown restarts.
    assert_eq!(
        bob.next_event(WAIT).await?,
        json!({
            "event": "room:state",
            "board": [null, null, null, null, null, null, null, null, null],
            "turn": "O"
        })
    );
    assert_eq!(
        bob.next_event(WAIT).await?,
        json!({"event": "room:tick", "remaining": 2})
    );

    Ok(())
}

#[tokio::test]
async fn test_third_member_rejected() -> Result<(), anyhow::Error> {
    let server = TestRcServer::spawn().await?;
    let (_alice, _bob, room_id) = seated_pair(&server).await?;

    let mut carol = TestClient::connect(&server.ws_url()).await?;
    let result = carol.join_room(&room_id).await?;
    assert_eq!(result, json!({"error": "Room full", "code": "ROOM_FULL"}));

    let missing = carol.join_room("nope00").await?;
    assert_eq!(missing, json!({"error": "Room not found", "code": "ROOM_NOT_FOUND"}));

    Ok(())
}

#[tokio::test]
async fn test_one_room_per_connection() -> Result<(), anyhow::Error> {
    let server = TestRcServer::spawn().await?;
    let mut alice = TestClient::connect(&server.ws_url()).await?;

    alice.create_room().await?;
    let again = alice.request(json!({"event": "room:create"})).await?;
    assert_eq!(error_code(&again), "ALREADY_IN_ROOM");

    Ok(())
}

#[tokio::test]
async fn test_disconnect_notifies_and_deletes_room() -> Result<(), anyhow::Error> {
    let server = TestRcServer::spawn().await?;
    let (alice, mut bob, room_id) = seated_pair(&server).await?;

    alice.close().await?;
    assert_eq!(
        bob.wait_for_event("room:player_left", WAIT).await?,
        json!({"event": "room:player_left"})
    );
    assert!(server.registry().get_room(room_id.clone()).await.is_ok());

    bob.close().await?;

    let mut deleted = false;
    for _ in 0..50 {
        if server.registry().get_room(room_id.clone()).await.is_err() {
            deleted = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(deleted, "room should be deleted once empty");
    assert_eq!(server.registry().get_status().await?.room_count, 0);

    Ok(())
}

#[tokio::test]
async fn test_explicit_leave_frees_connection() -> Result<(), anyhow::Error> {
    let server = TestRcServer::spawn().await?;
    let (mut alice, mut bob, room_id) = seated_pair(&server).await?;

    assert_eq!(bob.leave_room().await?, json!({"ok": true}));
    alice.wait_for_event("room:player_left", WAIT).await?;

    // Bob may now open a room of his own.
    let (other_room, mark) = bob.create_room().await?;
    assert_ne!(other_room, room_id);
    assert_eq!(mark, "X");

    // And the seat Bob left can be taken again.
    let mut carol = TestClient::connect(&server.ws_url()).await?;
    assert_eq!(carol.join_room_ok(&room_id).await?, "O");

    Ok(())
}

#[tokio::test]
async fn test_malformed_frame_answered() -> Result<(), anyhow::Error> {
    let server = TestRcServer::spawn().await?;
    let mut alice = TestClient::connect(&server.ws_url()).await?;

    alice.send_raw("definitely not json").await?;
    let reply = alice.next_event(WAIT).await?;
    assert_eq!(reply["event"], "ack");
    assert_eq!(reply["result"]["code"], "INVALID_MESSAGE");

    let unknown = alice.request(json!({"event": "room:teleport"})).await?;
    assert_eq!(error_code(&unknown), "INVALID_MESSAGE");

    // The session survives.
    let (_, mark) = alice.create_room().await?;
    assert_eq!(mark, "X");

    Ok(())
}

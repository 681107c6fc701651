//! HTTP API integration tests.
//!
//! Tests the `/api/*` endpoints and probes using the `TestRcServer` harness.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use rc_test_utils::TestRcServer;
use serde_json::{json, Value};

/// Test that the API health endpoint returns `{"ok": true}`.
#[tokio::test]
async fn test_api_health_returns_ok() -> Result<(), anyhow::Error> {
    let server = TestRcServer::spawn().await?;

    let response = reqwest::get(format!("{}/api/health", server.url())).await?;
    assert_eq!(response.status(), 200);

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    assert!(
        content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/json")),
        "Expected application/json content type, got {:?}",
        content_type
    );

    let body: Value = response.json().await?;
    assert_eq!(body, json!({"ok": true}));

    Ok(())
}

#[tokio::test]
async fn test_probes() -> Result<(), anyhow::Error> {
    let server = TestRcServer::spawn().await?;

    let live: Value = reqwest::get(format!("{}/health", server.url()))
        .await?
        .json()
        .await?;
    assert_eq!(live, json!({"status": "alive"}));

    let ready: Value = reqwest::get(format!("{}/ready", server.url()))
        .await?
        .json()
        .await?;
    assert_eq!(ready, json!({"status": "ready"}));

    Ok(())
}

#[tokio::test]
async fn test_unknown_route_returns_404() -> Result<(), anyhow::Error> {
    let server = TestRcServer::spawn().await?;

    let response = reqwest::get(format!("{}/api/nonexistent", server.url())).await?;
    assert_eq!(response.status(), 404);

    Ok(())
}

#[tokio::test]
async fn test_cors_allows_any_origin() -> Result<(), anyhow::Error> {
    let server = TestRcServer::spawn().await?;

    let response = reqwest::Client::new()
        .get(format!("{}/api/health", server.url()))
        .header("Origin", "http://localhost:5173")
        .send()
        .await?;

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    Ok(())
}

#[tokio::test]
async fn test_ai_move_suggestions() -> Result<(), anyhow::Error> {
    let server = TestRcServer::spawn().await?;
    let client = reqwest::Client::new();
    let url = format!("{}/api/ai/move", server.url());

    // Block X's top row with the default marks.
    let response = client
        .post(&url)
        .json(&json!({"board": ["X", "X", null, null, "O", null, null, null, null]}))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    assert_eq!(response.json::<Value>().await?, json!({"move": 2}));

    // Empty-string cells count as empty.
    let response = client
        .post(&url)
        .json(&json!({"board": ["", "", "", "", "", "", "", "", ""], "aiMark": "X", "humanMark": "O"}))
        .send()
        .await?;
    assert_eq!(response.json::<Value>().await?, json!({"move": 0}));

    let full = json!({"board": ["X", "O", "X", "X", "O", "O", "O", "X", "X"]});
    let response = client.post(&url).json(&full).send().await?;
    assert_eq!(response.json::<Value>().await?, json!({"move": null}));

    Ok(())
}

#[tokio::test]
async fn test_ai_move_invalid_board() -> Result<(), anyhow::Error> {
    let server = TestRcServer::spawn().await?;
    let client = reqwest::Client::new();
    let url = format!("{}/api/ai/move", server.url());

    for body in [json!({}), json!({"board": [null, null, null]}), json!({"board": 7})] {
        let response = client.post(&url).json(&body).send().await?;
        assert_eq!(response.status(), 400, "{body}");
        let error: Value = response.json().await?;
        assert_eq!(error["error"], "Invalid board");
    }

    let response = client.post(&url).body("{{{").send().await?;
    assert_eq!(response.status(), 400);

    Ok(())
}

#[tokio::test]
async fn test_player_settings_flow() -> Result<(), anyhow::Error> {
    let server = TestRcServer::spawn().await?;
    let client = reqwest::Client::new();

    let created: Value = client
        .post(format!("{}/api/player", server.url()))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(created["settings"], json!({"music": true, "sound": true}));
    let player_id = created["playerId"].as_str().unwrap().to_string();
    let settings_url = format!("{}/api/player/{}/settings", server.url(), player_id);

    let response = client
        .put(&settings_url)
        .json(&json!({"music": false}))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.json::<Value>().await?,
        json!({"music": false, "sound": true})
    );

    // Non-boolean values leave the field as it was.
    let response = client
        .put(&settings_url)
        .json(&json!({"music": "on", "sound": false}))
        .send()
        .await?;
    assert_eq!(
        response.json::<Value>().await?,
        json!({"music": false, "sound": false})
    );

    let fetched: Value = client.get(&settings_url).send().await?.json().await?;
    assert_eq!(fetched, json!({"music": false, "sound": false}));

    Ok(())
}

#[tokio::test]
async fn test_unknown_player_returns_404() -> Result<(), anyhow::Error> {
    let server = TestRcServer::spawn().await?;
    let client = reqwest::Client::new();

    let url = format!(
        "{}/api/player/00000000-0000-4000-8000-000000000000/settings",
        server.url()
    );

    let response = client.get(&url).send().await?;
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "Player not found");

    let response = client.put(&url).json(&json!({"sound": false})).send().await?;
    assert_eq!(response.status(), 404);

    Ok(())
}

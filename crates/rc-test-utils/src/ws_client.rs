//! WebSocket test client for the `/ws` gateway.
//!
//! `TestClient` numbers its requests, waits for the matching `ack` and buffers
//! any room broadcasts that arrive in between, so tests can assert on them in
//! order afterwards.

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// How long `request` waits for its acknowledgment.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(5);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A connected WebSocket client.
pub struct TestClient {
    socket: Socket,
    next_ack: u64,
    events: VecDeque<Value>,
}

impl TestClient {
    /// Connect to a gateway URL such as `ws://127.0.0.1:1234/ws`.
    pub async fn connect(url: &str) -> Result<Self, anyhow::Error> {
        let (socket, _response) = connect_async(url)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to {}: {}", url, e))?;
        Ok(Self {
            socket,
            next_ack: 1,
            events: VecDeque::new(),
        })
    }

    /// Send a raw text frame.
    pub async fn send_raw(&mut self, text: &str) -> Result<(), anyhow::Error> {
        self.socket.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Send `request` with a fresh ack number and return the ack `result`.
    pub async fn request(&mut self, mut request: Value) -> Result<Value, anyhow::Error> {
        let ack = self.next_ack;
        self.next_ack += 1;
        request["ack"] = json!(ack);
        self.send_raw(&request.to_string()).await?;

        let deadline = tokio::time::Instant::now() + DEFAULT_ACK_TIMEOUT;
        loop {
            let frame = self.read_frame(deadline).await?;
            if frame["event"] == "ack" && frame["ack"] == json!(ack) {
                return Ok(frame["result"].clone());
            }
            self.events.push_back(frame);
        }
    }

    /// `room:create`, returning `(room_id, mark)`.
    pub async fn create_room(&mut self) -> Result<(String, String), anyhow::Error> {
        let result = self.request(json!({"event": "room:create"})).await?;
        joined(&result)
    }

    /// `room:join`, returning the raw ack result.
    pub async fn join_room(&mut self, room_id: &str) -> Result<Value, anyhow::Error> {
        self.request(json!({"event": "room:join", "roomId": room_id}))
            .await
    }

    /// `room:join` that must succeed, returning the assigned mark.
    pub async fn join_room_ok(&mut self, room_id: &str) -> Result<String, anyhow::Error> {
        let result = self.join_room(room_id).await?;
        let (_, mark) = joined(&result)?;
        Ok(mark)
    }

    /// `game:move`, returning the raw ack result.
    pub async fn make_move(&mut self, room_id: &str, index: i64) -> Result<Value, anyhow::Error> {
        self.request(json!({"event": "game:move", "roomId": room_id, "index": index}))
            .await
    }

    /// `room:leave`, returning the raw ack result.
    pub async fn leave_room(&mut self) -> Result<Value, anyhow::Error> {
        self.request(json!({"event": "room:leave"})).await
    }

    /// Next broadcast (buffered first), or an error after `timeout`.
    pub async fn next_event(&mut self, timeout: Duration) -> Result<Value, anyhow::Error> {
        if let Some(event) = self.events.pop_front() {
            return Ok(event);
        }
        let deadline = tokio::time::Instant::now() + timeout;
        self.read_frame(deadline).await
    }

    /// Skip broadcasts until one named `name` arrives.
    pub async fn wait_for_event(
        &mut self,
        name: &str,
        timeout: Duration,
    ) -> Result<Value, anyhow::Error> {
        if let Some(pos) = self.events.iter().position(|e| e["event"] == name) {
            self.events.drain(..pos);
            if let Some(event) = self.events.pop_front() {
                return Ok(event);
            }
        }
        self.events.clear();

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let frame = self.read_frame(deadline).await?;
            if frame["event"] == name {
                return Ok(frame);
            }
        }
    }

    /// Assert that no broadcast arrives within `window`.
    pub async fn expect_silence(&mut self, window: Duration) -> Result<(), anyhow::Error> {
        if let Some(event) = self.events.pop_front() {
            anyhow::bail!("expected silence, buffered event {}", event);
        }
        let deadline = tokio::time::Instant::now() + window;
        match self.read_frame(deadline).await {
            Ok(frame) => anyhow::bail!("expected silence, got {}", frame),
            Err(_) => Ok(()),
        }
    }

    /// Close the connection.
    pub async fn close(mut self) -> Result<(), anyhow::Error> {
        self.socket.close(None).await?;
        Ok(())
    }

    async fn read_frame(&mut self, deadline: tokio::time::Instant) -> Result<Value, anyhow::Error> {
        loop {
            let message = tokio::time::timeout_at(deadline, self.socket.next())
                .await
                .map_err(|_| anyhow::anyhow!("Timed out waiting for frame"))?
                .ok_or_else(|| anyhow::anyhow!("Connection closed"))??;

            match message {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Close(_) => anyhow::bail!("Connection closed by server"),
                _ => continue,
            }
        }
    }
}

/// Extract `(roomId, mark)` from a successful create/join result.
fn joined(result: &Value) -> Result<(String, String), anyhow::Error> {
    match (result["roomId"].as_str(), result["mark"].as_str()) {
        (Some(room_id), Some(mark)) => Ok((room_id.to_string(), mark.to_string())),
        _ => anyhow::bail!("Unexpected join result: {}", result),
    }
}

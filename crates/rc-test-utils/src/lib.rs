//! # RC Test Utilities
//!
//! Shared test utilities for the Room Controller (RC) service.
//!
//! This crate provides:
//! - Server test harness (`TestRcServer` for E2E tests)
//! - WebSocket client (`TestClient`) speaking the `/ws` protocol
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rc_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestRcServer::spawn().await?;
//!     let mut alice = TestClient::connect(&server.ws_url()).await?;
//!
//!     let (room_id, mark) = alice.create_room().await?;
//!     assert_eq!(mark, "X");
//!     Ok(())
//! }
//! ```

pub mod server_harness;
pub mod ws_client;

// Re-export commonly used items
pub use server_harness::*;
pub use ws_client::*;

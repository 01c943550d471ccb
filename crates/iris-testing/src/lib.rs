//! # iris-testing
//!
//! Test infrastructure for IRIS native protocol client development.
//!
//! This crate provides a mock IRIS server that speaks the framing layer,
//! answers the handshake and login, replays scripted replies and records
//! what the client sent. No database instance is required.
//!
//! ## Mock Server Example
//!
//! ```rust,ignore
//! use iris_client::Client;
//! use iris_protocol::Opcode;
//! use iris_testing::{MockIrisServer, MockResponse};
//!
//! #[tokio::test]
//! async fn test_with_mock_server() {
//!     let server = MockIrisServer::builder()
//!         .with_response(Opcode::DirectUpdate, MockResponse::update(1, false))
//!         .build()
//!         .await
//!         .unwrap();
//!
//!     let mut client = Client::connect(server.client_config()).await.unwrap();
//!     client.execute("DELETE FROM t WHERE id = ?", &[&1]).await.unwrap();
//!
//!     assert_eq!(server.received_with(Opcode::DirectUpdate).await.len(), 1);
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod mock_server;

pub use mock_server::{
    MockColumn, MockFrame, MockIrisServer, MockResponse, MockServerBuilder, MockServerConfig,
    MockServerError, RecordedMessage,
};

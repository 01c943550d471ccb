//! # iris-codec
//!
//! Async framing layer for IRIS native protocol messages.
//!
//! This crate turns a raw byte stream into whole [`Message`]s, handling
//! frames that arrive split across TCP segments and rejecting streams that
//! end inside a frame.
//!
//! ## Features
//!
//! - Message reassembly across TCP segments
//! - Length validation against a configurable limit
//! - Split read/write halves
//! - Integration with tokio-util's codec framework
//!
//! ## Architecture
//!
//! The codec layer sits between raw TCP streams and the higher-level client:
//!
//! ```text
//! TCP Stream → MessageCodec (14-byte header + payload) → Connection → Client
//! ```
//!
//! [`Message`]: iris_protocol::Message

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod codec;
pub mod connection;
pub mod error;
pub mod framed;

pub use codec::{DEFAULT_MAX_MESSAGE_SIZE, MessageCodec};
pub use connection::Connection;
pub use error::CodecError;
pub use framed::{MessageReader, MessageStream, MessageWriter};

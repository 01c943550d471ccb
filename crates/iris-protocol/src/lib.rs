//! # iris-protocol
//!
//! Pure implementation of the InterSystems IRIS native wire protocol.
//!
//! This crate provides the list-item encoding, message headers, opcodes,
//! login structures and statement metadata used by the IRIS superserver.
//!
//! ## Design Philosophy
//!
//! This crate is intentionally IO-agnostic. It contains no networking logic and
//! makes no assumptions about the async runtime. Higher-level crates build upon
//! this foundation to provide async I/O capabilities.
//!
//! ## Example
//!
//! ```rust
//! use iris_protocol::{ListItem, ListReader, MessageBuilder, Opcode};
//!
//! let mut builder = MessageBuilder::new(Opcode::GetServerError);
//! builder.push_int(-30);
//! let message = builder.finish(4, 0).unwrap();
//! assert_eq!(message.payload.as_ref(), &[0x03, 0x05, 0xe2]);
//!
//! let mut reader = ListReader::new(ListItem::from_text("ok").to_bytes());
//! assert_eq!(reader.read_string().unwrap(), "ok");
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod feature;
pub mod header;
pub mod list;
pub mod login;
pub mod message;
pub mod opcode;
pub mod statement;

pub use error::ProtocolError;
pub use feature::FeatureOptions;
pub use header::{HEADER_SIZE, MessageHeader, SQL_NO_MORE_DATA, SQL_OK, STATUS_AUTH_FAILED};
pub use list::{ItemType, ListItem, ListReader, NULL_ITEM};
pub use login::{HandshakeResponse, Login, LoginResponse, PROTOCOL_VERSION, obfuscate};
pub use message::{Message, MessageBuilder, SQL_TEXT_CHUNK_SIZE};
pub use opcode::Opcode;
pub use statement::{
    ColumnFlags, ColumnMetadata, ParameterDescription, StatementFeature, UpdateParameterInfo,
};

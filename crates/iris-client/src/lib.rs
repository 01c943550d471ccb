//! # iris-client
//!
//! High-level async client for the IRIS native binary protocol.
//!
//! This is the primary public API surface of the workspace. It opens a
//! session over TCP, logs in to a namespace, runs SQL with positional
//! parameters, streams result rows, manages transactions, and reaches
//! globals and class methods.
//!
//! ## Session States
//!
//! The session tracks its state at runtime:
//!
//! ```text
//! Disconnected -> Handshaking -> Ready (via connect())
//! Ready -> InTransaction (via begin())
//! InTransaction -> Ready (via commit() or rollback())
//! any -> Poisoned (transport or decode failure)
//! any -> Disconnected (via close())
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use iris_client::{Client, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_connection_string(
//!         "host=localhost port=1972 namespace=USER user=_SYSTEM password=SYS",
//!     )?;
//!     let mut client = Client::connect(config).await?;
//!
//!     let inserted = client
//!         .execute("INSERT INTO people (name, age) VALUES (?, ?)", &[&"Ada", &36, &"Alan", &41])
//!         .await?;
//!     println!("inserted {} rows", inserted.rows_affected());
//!
//!     let mut rows = client.query("SELECT name FROM people WHERE age > ?", &[&30]).await?;
//!     while let Some(row) = rows.next().await? {
//!         let name: String = row.get(0)?;
//!         println!("{name}");
//!     }
//!
//!     let mut tx = client.begin().await?;
//!     tx.execute("DELETE FROM people WHERE age > ?", &[&40]).await?;
//!     tx.commit().await?;
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod native;
pub mod query;
pub mod row;
pub mod state;
pub mod stream;
pub mod transaction;

pub use client::Client;
pub use config::{Config, DEFAULT_NAMESPACE, DEFAULT_PORT};
pub use error::{Error, Result};
pub use native::NodeInfo;
pub use query::ConflictAction;
pub use row::{Column, Row};
pub use state::SessionState;
pub use stream::{ExecuteResult, ResultSet};
pub use transaction::{IsolationLevel, Transaction, TransactionOptions};

pub use iris_protocol::FeatureOptions;
pub use iris_types::{FromIris, IrisValue, SqlType, ToIris, TypeError};

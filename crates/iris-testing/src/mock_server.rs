//! Mock IRIS server for unit testing.
//!
//! This module provides a mock IRIS server that can be used for testing
//! the client without a real database instance.
//!
//! ## Features
//!
//! - Answers the handshake and login, or rejects the login
//! - Replays scripted responses keyed on the request opcode
//! - Records every received message for wire-level assertions
//! - Supports multiple concurrent connections
//!
//! ## Example
//!
//! ```rust,ignore
//! use iris_testing::mock_server::{MockColumn, MockIrisServer, MockResponse};
//! use iris_protocol::{ListItem, Opcode};
//!
//! #[tokio::test]
//! async fn test_query() {
//!     let server = MockIrisServer::builder()
//!         .with_response(
//!             Opcode::DirectQuery,
//!             MockResponse::query(vec![MockColumn::integer("ID")], vec![vec![ListItem::from_i64(1)]]),
//!         )
//!         .build()
//!         .await
//!         .unwrap();
//!
//!     let client = iris_client::Client::connect(server.client_config()).await.unwrap();
//!     // ...
//! }
//! ```

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use iris_client::Config;
use iris_codec::{CodecError, MessageStream};
use iris_protocol::{
    FeatureOptions, ListItem, Message, MessageHeader, Opcode, PROTOCOL_VERSION, SQL_NO_MORE_DATA,
    SQL_OK, STATUS_AUTH_FAILED, StatementFeature,
};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, broadcast};

/// Error type for mock server operations.
#[derive(Debug, Error)]
pub enum MockServerError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Result type for mock server operations.
pub type Result<T> = std::result::Result<T, MockServerError>;

/// One reply message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockFrame {
    /// Status carried in the header code slot.
    pub status: i16,
    /// Payload bytes.
    pub payload: Bytes,
}

impl MockFrame {
    /// A reply with the given status and list items.
    pub fn new(status: i16, items: &[ListItem]) -> Self {
        Self {
            status,
            payload: encode_items(items),
        }
    }

    /// A successful reply carrying list items.
    pub fn ok(items: &[ListItem]) -> Self {
        Self::new(SQL_OK, items)
    }

    fn into_message(self, sequence: u32, statement_id: u32) -> Message {
        let header = MessageHeader {
            length: self.payload.len() as u32,
            sequence,
            statement_id,
            code: self.status.to_le_bytes(),
        };
        Message::new(header, self.payload)
    }
}

/// Mock response configuration.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Send these frames in order.
    Frames(Vec<MockFrame>),

    /// Send nothing.
    Silent,

    /// Close the connection without replying.
    Close,
}

impl MockResponse {
    /// An empty successful reply.
    pub fn ack() -> Self {
        Self::Frames(vec![MockFrame::ok(&[])])
    }

    /// An empty reply carrying `status`.
    pub fn status(status: i16) -> Self {
        Self::Frames(vec![MockFrame::new(status, &[])])
    }

    /// A successful reply carrying list items.
    pub fn items(items: Vec<ListItem>) -> Self {
        Self::Frames(vec![MockFrame::ok(&items)])
    }

    /// A successful reply carrying one text item, as sent for server error
    /// messages and string results.
    pub fn text(value: &str) -> Self {
        Self::items(vec![ListItem::from_text(value)])
    }

    /// An SQL error status with no payload.
    pub fn sql_error(code: i16) -> Self {
        Self::status(code)
    }

    /// A complete query result: column metadata, then every row in one
    /// chunk marked "no more data".
    pub fn query(columns: Vec<MockColumn>, rows: Vec<Vec<ListItem>>) -> Self {
        Self::query_chunk(columns, rows, SQL_NO_MORE_DATA)
    }

    /// A query result whose first chunk is followed by more data.
    pub fn query_paged(columns: Vec<MockColumn>, rows: Vec<Vec<ListItem>>) -> Self {
        Self::query_chunk(columns, rows, SQL_OK)
    }

    fn query_chunk(columns: Vec<MockColumn>, rows: Vec<Vec<ListItem>>, status: i16) -> Self {
        let head = query_head(&columns, StatementFeature::SIMPLE, 0);
        let mut data = BytesMut::new();
        for row in &rows {
            for item in row {
                item.encode(&mut data);
            }
        }
        Self::Frames(vec![
            MockFrame::ok(&head),
            MockFrame {
                status,
                payload: data.freeze(),
            },
        ])
    }

    /// A query result with each row packed into one nested item.
    ///
    /// Columns read their values from the slot set with
    /// [`MockColumn::with_slot`]; every row must carry `row_items` items.
    pub fn batched_query(columns: Vec<MockColumn>, row_items: usize, rows: Vec<Vec<ListItem>>) -> Self {
        let head = query_head(&columns, StatementFeature::BATCHED_ROWS, row_items);
        let nested: Vec<ListItem> = rows
            .iter()
            .map(|row| ListItem::from_bytes(encode_items(row)))
            .collect();
        Self::Frames(vec![
            MockFrame::ok(&head),
            MockFrame::new(SQL_NO_MORE_DATA, &nested),
        ])
    }

    /// A FETCH_DATA reply carrying more rows.
    pub fn rows(rows: Vec<Vec<ListItem>>, status: i16) -> Self {
        let items: Vec<ListItem> = rows.into_iter().flatten().collect();
        Self::Frames(vec![MockFrame::new(status, &items)])
    }

    /// Reply to the first batch of an update.
    pub fn update(rows_affected: i64, cacheable: bool) -> Self {
        Self::items(vec![
            ListItem::from_i64(0),
            ListItem::from_i64(i64::from(cacheable)),
            ListItem::from_i64(rows_affected),
        ])
    }

    /// Reply to a later batch of an update.
    pub fn affected(rows_affected: i64) -> Self {
        Self::items(vec![ListItem::from_i64(rows_affected)])
    }
}

/// Column definition for mock query results.
#[derive(Debug, Clone)]
pub struct MockColumn {
    /// Column name.
    pub name: String,
    /// Wire type code.
    pub type_code: i64,
    /// Whether the column allows NULL.
    pub nullable: bool,
    /// 1-based item position, sent only with batched rows.
    pub slot: Option<i64>,
}

impl MockColumn {
    /// Create a new column definition.
    pub fn new(name: impl Into<String>, type_code: i64) -> Self {
        Self {
            name: name.into(),
            type_code,
            nullable: true,
            slot: None,
        }
    }

    /// An INTEGER column.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, 4)
    }

    /// A VARCHAR column.
    pub fn varchar(name: impl Into<String>) -> Self {
        Self::new(name, 12)
    }

    /// A DOUBLE column.
    pub fn double(name: impl Into<String>) -> Self {
        Self::new(name, 8)
    }

    /// A TIMESTAMP column.
    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, 93)
    }

    /// Set the nullability.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set the 1-based item position used with batched rows.
    pub fn with_slot(mut self, slot: i64) -> Self {
        self.slot = Some(slot);
        self
    }
}

/// A message received by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedMessage {
    /// Request opcode.
    pub opcode: Opcode,
    /// Message sequence number.
    pub sequence: u32,
    /// Statement id.
    pub statement_id: u32,
    /// Payload bytes.
    pub payload: Bytes,
}

impl RecordedMessage {
    /// A reader over the payload.
    pub fn reader(&self) -> iris_protocol::ListReader {
        iris_protocol::ListReader::new(self.payload.clone())
    }
}

/// Mock server configuration.
#[derive(Debug, Clone)]
pub struct MockServerConfig {
    server_info: String,
    locale: String,
    granted_features: FeatureOptions,
    reject_login: Option<String>,
    responses: HashMap<Opcode, VecDeque<MockResponse>>,
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            server_info: "IRIS for UNIX (Mock) 2024.1".to_string(),
            locale: "enuw".to_string(),
            granted_features: FeatureOptions::DEFAULT_REQUEST,
            reject_login: None,
            responses: HashMap::new(),
        }
    }
}

/// Builder for configuring a mock server.
#[derive(Debug, Default)]
pub struct MockServerBuilder {
    config: MockServerConfig,
}

impl MockServerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next request with `opcode`.
    ///
    /// Responses for the same opcode are replayed in the order they were
    /// added. Once the queue is empty, updates report zero affected rows,
    /// DISCONNECT gets no reply and anything else gets an empty successful
    /// reply.
    pub fn with_response(mut self, opcode: Opcode, response: MockResponse) -> Self {
        self.config
            .responses
            .entry(opcode)
            .or_default()
            .push_back(response);
        self
    }

    /// Set the server identification string sent on login.
    pub fn with_server_info(mut self, info: impl Into<String>) -> Self {
        self.config.server_info = info.into();
        self
    }

    /// Set the feature options granted on login.
    pub fn with_granted_features(mut self, features: FeatureOptions) -> Self {
        self.config.granted_features = features;
        self
    }

    /// Reject every login with status 417 and this message.
    pub fn reject_login(mut self, message: impl Into<String>) -> Self {
        self.config.reject_login = Some(message.into());
        self
    }

    /// Build and start the mock server.
    pub async fn build(self) -> Result<MockIrisServer> {
        MockIrisServer::start(self.config).await
    }
}

/// State shared between the server handle and its connections.
#[derive(Debug)]
struct Shared {
    config: MockServerConfig,
    responses: Mutex<HashMap<Opcode, VecDeque<MockResponse>>>,
    received: Mutex<Vec<RecordedMessage>>,
    connection_count: Mutex<usize>,
}

impl Shared {
    async fn next_response(&self, opcode: Opcode) -> MockResponse {
        let scripted = self
            .responses
            .lock()
            .await
            .get_mut(&opcode)
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(response) => response,
            None => match opcode {
                Opcode::Disconnect => MockResponse::Silent,
                Opcode::DirectUpdate => MockResponse::update(0, false),
                Opcode::PreparedUpdate => MockResponse::affected(0),
                _ => MockResponse::ack(),
            },
        }
    }
}

/// A mock IRIS server for testing.
///
/// The server listens on an ephemeral port on `127.0.0.1` and stops when
/// dropped.
#[derive(Debug)]
pub struct MockIrisServer {
    addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
    shared: Arc<Shared>,
}

impl MockIrisServer {
    /// Create a new builder for the mock server.
    pub fn builder() -> MockServerBuilder {
        MockServerBuilder::new()
    }

    /// Start a mock server with the given configuration.
    pub async fn start(config: MockServerConfig) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, _) = broadcast::channel(1);
        let shared = Arc::new(Shared {
            responses: Mutex::new(config.responses.clone()),
            config,
            received: Mutex::new(Vec::new()),
            connection_count: Mutex::new(0),
        });

        let server = Self {
            addr,
            shutdown_tx: shutdown_tx.clone(),
            shared: shared.clone(),
        };

        let mut shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _peer_addr)) => {
                                let shared = shared.clone();
                                tokio::spawn(async move {
                                    *shared.connection_count.lock().await += 1;
                                    if let Err(e) = handle_connection(stream, &shared).await {
                                        tracing::debug!("connection error: {}", e);
                                    }
                                    let mut count = shared.connection_count.lock().await;
                                    *count = count.saturating_sub(1);
                                });
                            }
                            Err(e) => {
                                tracing::error!("accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Ok(server)
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the server host.
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// Get the server port.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// A client configuration pointing at this server.
    pub fn client_config(&self) -> Config {
        Config::new()
            .host(self.host())
            .port(self.port())
            .credentials("_SYSTEM", "SYS")
    }

    /// Get the number of open connections.
    pub async fn connection_count(&self) -> usize {
        *self.shared.connection_count.lock().await
    }

    /// Every message received so far, in arrival order.
    pub async fn received(&self) -> Vec<RecordedMessage> {
        self.shared.received.lock().await.clone()
    }

    /// Received messages with the given opcode.
    pub async fn received_with(&self, opcode: Opcode) -> Vec<RecordedMessage> {
        self.received()
            .await
            .into_iter()
            .filter(|message| message.opcode == opcode)
            .collect()
    }

    /// Received messages after the handshake and login.
    pub async fn requests(&self) -> Vec<RecordedMessage> {
        self.received()
            .await
            .into_iter()
            .filter(|message| !matches!(message.opcode, Opcode::Handshake | Opcode::Connect))
            .collect()
    }

    /// Stop accepting connections.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

impl Drop for MockIrisServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_connection(stream: TcpStream, shared: &Shared) -> Result<()> {
    let mut messages = MessageStream::new(stream);

    while let Some(message) = messages.recv().await? {
        let opcode = message
            .header
            .opcode()
            .map_err(|e| MockServerError::Protocol(e.to_string()))?;
        let sequence = message.header.sequence;
        let statement_id = message.header.statement_id;

        shared.received.lock().await.push(RecordedMessage {
            opcode,
            sequence,
            statement_id,
            payload: message.payload,
        });

        let response = match opcode {
            Opcode::Handshake => handshake_response(),
            Opcode::Connect => login_response(&shared.config),
            other => shared.next_response(other).await,
        };

        match response {
            MockResponse::Frames(frames) => {
                for frame in frames {
                    messages
                        .send_message(frame.into_message(sequence, statement_id))
                        .await?;
                }
            }
            MockResponse::Silent => {}
            MockResponse::Close => return Ok(()),
        }

        if opcode == Opcode::Disconnect
            || (opcode == Opcode::Connect && shared.config.reject_login.is_some())
        {
            break;
        }
    }

    Ok(())
}

fn handshake_response() -> MockResponse {
    let mut payload = BytesMut::new();
    payload.extend_from_slice(&PROTOCOL_VERSION.to_le_bytes());
    payload.extend_from_slice(&1u16.to_le_bytes());
    ListItem::from_text("enuw").encode(&mut payload);
    MockResponse::Frames(vec![MockFrame {
        status: SQL_OK,
        payload: payload.freeze(),
    }])
}

fn login_response(config: &MockServerConfig) -> MockResponse {
    if let Some(message) = &config.reject_login {
        return MockResponse::Frames(vec![MockFrame::new(
            STATUS_AUTH_FAILED as i16,
            &[ListItem::from_text(message)],
        )]);
    }
    MockResponse::items(vec![
        ListItem::from_text(&config.server_info),
        ListItem::from_bool(false),
        ListItem::from_i64(0),
        ListItem::from_i64(1),
        ListItem::from_text("12345"),
        ListItem::from_i64(0),
        ListItem::from_i64(config.granted_features.to_wire()),
    ])
}

fn query_head(columns: &[MockColumn], feature: i64, row_items: usize) -> Vec<ListItem> {
    let mut items = vec![ListItem::from_i64(feature)];
    if feature == StatementFeature::BATCHED_ROWS {
        items.push(ListItem::from_i64(row_items as i64));
    }
    items.push(ListItem::from_i64(columns.len() as i64));
    for (ordinal, column) in columns.iter().enumerate() {
        items.push(ListItem::from_text(&column.name));
        items.push(ListItem::from_i64(column.type_code));
        items.push(ListItem::from_i64(10));
        items.push(ListItem::from_i64(0));
        items.push(ListItem::from_i64(i64::from(column.nullable)));
        items.push(ListItem::from_text(&column.name));
        items.push(ListItem::from_text("Mock"));
        items.push(ListItem::from_text("SQLUser"));
        items.push(ListItem::from_text(""));
        items.push(ListItem::from_bytes(vec![0u8; 12]));
        if feature & 0x01 == 0x01 {
            let slot = column.slot.unwrap_or(ordinal as i64 + 1);
            items.push(ListItem::from_i64(slot));
        }
    }
    // Parameter block: count and flag.
    items.push(ListItem::from_i64(0));
    items.push(ListItem::from_i64(0));
    items
}

fn encode_items(items: &[ListItem]) -> Bytes {
    let mut buf = BytesMut::new();
    for item in items {
        item.encode(&mut buf);
    }
    buf.freeze()
}

//! Handshake and login message construction.
//!
//! A session opens with a HANDSHAKE exchange that negotiates the protocol
//! version, followed by a CONNECT message carrying the namespace and
//! credentials. Credentials are obfuscated, not encrypted.

use crate::error::ProtocolError;
use crate::feature::FeatureOptions;
use crate::list::ListReader;
use crate::message::MessageBuilder;
use crate::opcode::Opcode;

/// Protocol version requested during the handshake.
pub const PROTOCOL_VERSION: u16 = 69;

/// Obfuscate a credential.
///
/// Byte `i` of an `n`-byte input is XORed with `0xA7`, offset by its
/// distance from the end (`n - i - 1`), rotated left by 5 and stored at
/// that mirrored index.
#[must_use]
pub fn obfuscate(input: &[u8]) -> Vec<u8> {
    let n = input.len();
    let mut out = vec![0u8; n];
    for (i, &byte) in input.iter().enumerate() {
        let distance = n - i - 1;
        let mixed = (byte ^ 0xA7).wrapping_add(distance as u8);
        out[distance] = mixed.rotate_left(5);
    }
    out
}

/// Build the HANDSHAKE request.
#[must_use]
pub fn handshake_request(version: u16) -> MessageBuilder {
    let mut builder = MessageBuilder::new(Opcode::Handshake);
    builder.push_raw_u16(version);
    builder
}

/// Server reply to the HANDSHAKE request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeResponse {
    /// Negotiated protocol version.
    pub version: u16,
    /// Whether the server speaks wide strings.
    pub unicode: bool,
    /// Server locale.
    pub locale: String,
}

impl HandshakeResponse {
    /// Decode the handshake reply payload.
    pub fn decode(reader: &mut ListReader) -> Result<Self, ProtocolError> {
        let version = reader.read_raw_u16()?;
        let unicode = reader.read_raw_u16()? == 1;
        let locale = reader.read_string()?;
        Ok(Self {
            version,
            unicode,
            locale,
        })
    }
}

/// CONNECT message builder.
#[derive(Debug, Clone)]
pub struct Login {
    /// Namespace to open.
    pub namespace: String,
    /// User name, sent obfuscated.
    pub username: String,
    /// Password, sent obfuscated.
    pub password: String,
    /// Operating-system user of the client process.
    pub os_user: String,
    /// Client machine name.
    pub machine_name: String,
    /// Client application name.
    pub application_name: String,
    /// Client kind marker.
    pub client_kind: String,
    /// Event class to attach, empty for none.
    pub event_class: String,
    /// Whether statements autocommit outside explicit transactions.
    pub autocommit: bool,
    /// Initial isolation level code.
    pub isolation_level: i64,
    /// Feature options to request.
    pub feature_options: FeatureOptions,
}

impl Default for Login {
    fn default() -> Self {
        Self {
            namespace: String::from("USER"),
            username: String::new(),
            password: String::new(),
            os_user: String::from("iris-rust"),
            machine_name: String::from("iris-rust-machine"),
            application_name: String::from("iris-rust"),
            client_kind: String::from("rust"),
            event_class: String::new(),
            autocommit: true,
            isolation_level: 0,
            feature_options: FeatureOptions::DEFAULT_REQUEST,
        }
    }
}

impl Login {
    /// Create a login builder with default client identification.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Set the operating-system user name.
    #[must_use]
    pub fn with_os_user(mut self, os_user: impl Into<String>) -> Self {
        self.os_user = os_user.into();
        self
    }

    /// Set the client machine name.
    #[must_use]
    pub fn with_machine_name(mut self, machine_name: impl Into<String>) -> Self {
        self.machine_name = machine_name.into();
        self
    }

    /// Set the application name.
    #[must_use]
    pub fn with_application_name(mut self, application_name: impl Into<String>) -> Self {
        self.application_name = application_name.into();
        self
    }

    /// Set the requested feature options.
    #[must_use]
    pub fn with_feature_options(mut self, options: FeatureOptions) -> Self {
        self.feature_options = options;
        self
    }

    /// Build the CONNECT request.
    #[must_use]
    pub fn to_message(&self) -> MessageBuilder {
        let mut builder = MessageBuilder::new(Opcode::Connect);
        builder
            .push_str(&self.namespace)
            .push_bytes(obfuscate(self.username.as_bytes()))
            .push_bytes(obfuscate(self.password.as_bytes()))
            .push_str(&self.os_user)
            .push_str(&self.machine_name)
            .push_str(&self.application_name)
            .push_str("")
            .push_str(&self.client_kind)
            .push_str(&self.event_class)
            .push_int(if self.autocommit { 1 } else { 2 })
            .push_int(self.isolation_level)
            .push_int(self.feature_options.to_wire());
        builder
    }
}

/// Server reply to a successful CONNECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    /// Server identification string.
    pub server_info: String,
    /// Whether delimited identifiers are enabled.
    pub delimited_ids: bool,
    /// Default isolation level code.
    pub isolation_level: i64,
    /// Server process (job) identifier.
    pub server_job: String,
    /// Marker for the server's empty-string convention.
    pub sql_empty_string: i64,
    /// Feature options granted by the server.
    pub feature_options: FeatureOptions,
}

impl LoginResponse {
    /// Decode a successful login reply payload.
    pub fn decode(reader: &mut ListReader) -> Result<Self, ProtocolError> {
        let server_info = reader.read_string()?;
        let delimited_ids = reader.read_bool()?;
        // Unused by clients.
        reader.next_item()?;
        let isolation_level = reader.read_i64()?;
        let server_job = reader.read_string()?;
        let sql_empty_string = reader.read_i64()?;
        let feature_options = FeatureOptions::from_wire(reader.read_i64()?);
        Ok(Self {
            server_info,
            delimited_ids,
            isolation_level,
            server_job,
            sql_empty_string,
            feature_options,
        })
    }
}

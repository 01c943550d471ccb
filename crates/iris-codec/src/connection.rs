//! Split I/O connection.
//!
//! The transport is split into separate read and write halves, each wrapped
//! in its own framed codec. The protocol is strictly request/response: every
//! [`send_message`](Connection::send_message) is answered by one message,
//! except DISCONNECT which has no reply.

use futures_util::{SinkExt, StreamExt};
use iris_protocol::Message;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};

use crate::codec::MessageCodec;
use crate::error::CodecError;
use crate::framed::{MessageReader, MessageWriter};

/// An IRIS connection with split I/O.
///
/// # Example
///
/// ```rust,ignore
/// use iris_codec::Connection;
/// use tokio::net::TcpStream;
///
/// let stream = TcpStream::connect("localhost:1972").await?;
/// let mut conn = Connection::new(stream);
/// let reply = conn.round_trip(handshake).await?;
/// ```
pub struct Connection<T>
where
    T: AsyncRead + AsyncWrite,
{
    /// Read half wrapped in a message reader.
    reader: MessageReader<ReadHalf<T>>,
    /// Write half wrapped in a message writer.
    writer: MessageWriter<WriteHalf<T>>,
    /// Set once the write half has been shut down.
    shut_down: bool,
}

impl<T> Connection<T>
where
    T: AsyncRead + AsyncWrite,
{
    /// Create a new connection from a transport.
    ///
    /// The transport is immediately split into read and write halves.
    pub fn new(transport: T) -> Self {
        Self::with_codec(transport, MessageCodec::new())
    }

    /// Create a new connection with a custom codec configuration.
    pub fn with_codec(transport: T, codec: MessageCodec) -> Self {
        let (read_half, write_half) = tokio::io::split(transport);

        Self {
            reader: MessageReader::with_codec(read_half, codec.clone()),
            writer: MessageWriter::with_codec(write_half, codec),
            shut_down: false,
        }
    }

    /// Read the next complete message from the connection.
    ///
    /// Returns `Ok(None)` when the peer closed the stream cleanly between
    /// messages, and [`CodecError::ConnectionClosed`] when it closed inside
    /// one.
    pub async fn read_message(&mut self) -> Result<Option<Message>, CodecError> {
        match self.reader.next().await {
            Some(Ok(message)) => Ok(Some(message)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    /// Read the next message, treating end of stream as an error.
    pub async fn recv(&mut self) -> Result<Message, CodecError> {
        self.read_message()
            .await?
            .ok_or(CodecError::ConnectionClosed)
    }

    /// Send a message and flush it.
    pub async fn send_message(&mut self, message: Message) -> Result<(), CodecError> {
        if self.shut_down {
            return Err(CodecError::ConnectionClosed);
        }
        self.writer.send(message).await
    }

    /// Send a message and wait for its reply.
    pub async fn round_trip(&mut self, message: Message) -> Result<Message, CodecError> {
        self.send_message(message).await?;
        self.recv().await
    }

    /// Shut down the write half of the transport.
    ///
    /// Calling this more than once is a no-op.
    pub async fn shutdown(&mut self) -> Result<(), CodecError> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        tracing::debug!("shutting down IRIS transport");
        self.writer.close().await
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Get a reference to the read codec.
    pub fn codec(&self) -> &MessageCodec {
        self.reader.codec()
    }
}

impl<T> std::fmt::Debug for Connection<T>
where
    T: AsyncRead + AsyncWrite,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("buffered", &MessageReader::buffered(&self.reader))
            .field("shut_down", &self.shut_down)
            .finish_non_exhaustive()
    }
}

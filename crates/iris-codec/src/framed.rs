//! Framed message streams for async I/O.
//!
//! This module provides both combined and split stream types:
//! - `MessageStream<T>` - Combined read/write stream, used on the server side
//!   of test harnesses
//! - `MessageReader<T>` - Read-only stream for receiving messages
//! - `MessageWriter<T>` - Write-only sink for sending messages
//!
//! The split types back [`Connection`](crate::Connection).

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_util::{Sink, SinkExt, StreamExt};
use iris_protocol::Message;
use pin_project_lite::pin_project;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, FramedRead, FramedWrite};

use crate::codec::MessageCodec;
use crate::error::CodecError;

pin_project! {
    /// A framed message stream over an async I/O transport.
    ///
    /// This wraps a tokio-util `Framed` codec and yields whole IRIS messages.
    pub struct MessageStream<T> {
        #[pin]
        inner: Framed<T, MessageCodec>,
    }
}

impl<T> MessageStream<T>
where
    T: AsyncRead + AsyncWrite,
{
    /// Create a new message stream over the given transport.
    pub fn new(transport: T) -> Self {
        Self::with_codec(transport, MessageCodec::new())
    }

    /// Create a new message stream with a custom codec.
    pub fn with_codec(transport: T, codec: MessageCodec) -> Self {
        Self {
            inner: Framed::new(transport, codec),
        }
    }

    /// Get a reference to the underlying transport.
    pub fn get_ref(&self) -> &T {
        self.inner.get_ref()
    }

    /// Consume the stream and return the underlying transport.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T> MessageStream<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Receive the next message, or `None` on a clean end of stream.
    pub async fn recv(&mut self) -> Result<Option<Message>, CodecError> {
        self.next().await.transpose()
    }

    /// Send a message and flush it.
    pub async fn send_message(&mut self, message: Message) -> Result<(), CodecError> {
        self.send(message).await
    }
}

impl<T> Stream for MessageStream<T>
where
    T: AsyncRead + Unpin,
{
    type Item = Result<Message, CodecError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }
}

impl<T> Sink<Message> for MessageStream<T>
where
    T: AsyncWrite + Unpin,
{
    type Error = CodecError;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_ready(cx)
    }

    fn start_send(self: Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
        self.project().inner.start_send(item)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_flush(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_close(cx)
    }
}

impl<T> std::fmt::Debug for MessageStream<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStream")
            .field("transport", self.inner.get_ref())
            .finish()
    }
}

// =============================================================================
// Split stream types
// =============================================================================

pin_project! {
    /// A read-only stream of IRIS messages.
    ///
    /// Used for the read half of a split connection.
    pub struct MessageReader<T> {
        #[pin]
        inner: FramedRead<T, MessageCodec>,
    }
}

impl<T> MessageReader<T>
where
    T: AsyncRead,
{
    /// Create a new message reader with a custom codec.
    pub fn with_codec(transport: T, codec: MessageCodec) -> Self {
        Self {
            inner: FramedRead::new(transport, codec),
        }
    }

    /// Get a reference to the codec.
    pub fn codec(&self) -> &MessageCodec {
        self.inner.decoder()
    }

    /// Number of bytes buffered but not yet decoded.
    pub fn buffered(&self) -> usize {
        self.inner.read_buffer().len()
    }
}

impl<T> Stream for MessageReader<T>
where
    T: AsyncRead + Unpin,
{
    type Item = Result<Message, CodecError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }
}

impl<T> std::fmt::Debug for MessageReader<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageReader")
            .field("transport", self.inner.get_ref())
            .finish()
    }
}

pin_project! {
    /// A write-only sink of IRIS messages.
    ///
    /// Used for the write half of a split connection.
    pub struct MessageWriter<T> {
        #[pin]
        inner: FramedWrite<T, MessageCodec>,
    }
}

impl<T> MessageWriter<T>
where
    T: AsyncWrite,
{
    /// Create a new message writer with a custom codec.
    pub fn with_codec(transport: T, codec: MessageCodec) -> Self {
        Self {
            inner: FramedWrite::new(transport, codec),
        }
    }
}

impl<T> Sink<Message> for MessageWriter<T>
where
    T: AsyncWrite + Unpin,
{
    type Error = CodecError;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_ready(cx)
    }

    fn start_send(self: Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
        self.project().inner.start_send(item)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_flush(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_close(cx)
    }
}

impl<T> std::fmt::Debug for MessageWriter<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageWriter")
            .field("transport", self.inner.get_ref())
            .finish()
    }
}

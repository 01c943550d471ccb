//! IRIS message codec implementation.

use bytes::BytesMut;
use iris_protocol::{HEADER_SIZE, Message, MessageHeader};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CodecError;

/// Default upper bound on a single message payload.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 256 * 1024 * 1024;

/// IRIS message codec for tokio-util framing.
///
/// Each frame is a 14-byte header followed by exactly `length` payload
/// bytes. The codec is stateless with respect to session counters; the
/// caller stamps sequence numbers and statement ids before encoding.
#[derive(Debug, Clone)]
pub struct MessageCodec {
    /// Maximum payload size to accept.
    max_message_size: usize,
}

impl MessageCodec {
    /// Create a new codec with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Create a new codec with a custom maximum payload size.
    #[must_use]
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Maximum payload size accepted by this codec.
    #[must_use]
    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < HEADER_SIZE {
            return Ok(None);
        }

        let length = u32::from_le_bytes([src[0], src[1], src[2], src[3]]) as usize;
        if length > self.max_message_size {
            return Err(CodecError::FrameTooLarge {
                size: length,
                max: self.max_message_size,
            });
        }

        let total = HEADER_SIZE + length;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        let mut frame = src.split_to(total);
        let header = MessageHeader::decode(&mut frame)?;
        let payload = frame.freeze();

        tracing::trace!(
            code = ?header.code,
            status = header.status(),
            length = length,
            sequence = header.sequence,
            statement_id = header.statement_id,
            "decoded IRIS message"
        );

        Ok(Some(Message::new(header, payload)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if src.is_empty() => Ok(None),
            None => {
                tracing::debug!(buffered = src.len(), "stream ended inside a message");
                Err(CodecError::ConnectionClosed)
            }
        }
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let length = item.payload.len();
        if length > self.max_message_size {
            return Err(CodecError::FrameTooLarge {
                size: length,
                max: self.max_message_size,
            });
        }

        dst.reserve(item.total_size());
        item.encode(dst);

        tracing::trace!(
            code = ?item.header.code,
            length = length,
            sequence = item.header.sequence,
            statement_id = item.header.statement_id,
            "encoded IRIS message"
        );

        Ok(())
    }
}

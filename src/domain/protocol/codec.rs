//! Message codec: frame ⇄ typed message, with validation on both sides.
//!
//! Decoding dispatches on the frame kind (text → JSON, binary →
//! MessagePack), then runs [`MessageSchema::validate`]. Structural and
//! schema failures are both "invalid message" to callers; the variants only
//! exist so logs can tell them apart.
//!
//! Encoding re-validates so an outbound value that violates its own schema
//! surfaces as an error instead of reaching the wire.

use thiserror::Error;

use super::{Frame, MessageSchema, SchemaValidationError, WireFormat};

/// Errors produced by [`decode`] and [`encode`].
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload could not be parsed in its wire format.
    #[error("malformed {format} payload: {reason}")]
    Malformed { format: WireFormat, reason: String },

    /// The payload parsed but violates the message schema.
    #[error("message failed validation: {0}")]
    Invalid(#[from] SchemaValidationError),

    /// Serialization of an already-valid value failed.
    #[error("failed to encode {format} payload: {reason}")]
    Encode { format: WireFormat, reason: String },
}

impl CodecError {
    /// True for both structural and schema failures of an inbound message.
    pub fn is_invalid_message(&self) -> bool {
        matches!(self, CodecError::Malformed { .. } | CodecError::Invalid(_))
    }

    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            CodecError::Malformed { .. } => "malformed",
            CodecError::Invalid(_) => "schema",
            CodecError::Encode { .. } => "encode",
        }
    }

    /// Client-safe description of the failure.
    pub fn to_client_message(&self) -> String {
        match self {
            CodecError::Malformed { format, .. } => {
                format!("Message is not valid {}", format.name())
            }
            CodecError::Invalid(err) => err.to_client_message(),
            CodecError::Encode { .. } => "Message could not be encoded".to_string(),
        }
    }
}

/// Decode and validate one inbound frame.
pub fn decode<M: MessageSchema>(frame: &Frame) -> Result<M, CodecError> {
    let message: M = match frame {
        Frame::Text(text) => {
            serde_json::from_str(text).map_err(|e| CodecError::Malformed {
                format: WireFormat::Json,
                reason: e.to_string(),
            })?
        }
        Frame::Binary(bytes) => {
            rmp_serde::from_slice(bytes).map_err(|e| CodecError::Malformed {
                format: WireFormat::MsgPack,
                reason: e.to_string(),
            })?
        }
    };

    message.validate()?;
    Ok(message)
}

/// Validate and encode one outbound message.
pub fn encode<M: MessageSchema>(format: WireFormat, message: &M) -> Result<Frame, CodecError> {
    message.validate()?;
    encode_validated(format, message)
}

/// Serialize a message the caller has already validated.
fn encode_validated<M: MessageSchema>(format: WireFormat, message: &M) -> Result<Frame, CodecError> {
    match format {
        WireFormat::Json => serde_json::to_string(message)
            .map(Frame::Text)
            .map_err(|e| CodecError::Encode {
                format,
                reason: e.to_string(),
            }),
        WireFormat::MsgPack => rmp_serde::to_vec_named(message)
            .map(Frame::Binary)
            .map_err(|e| CodecError::Encode {
                format,
                reason: e.to_string(),
            }),
    }
}

/// One outbound message encoded lazily, at most once per format.
///
/// Broadcasts reach connections with different formats; this validates the
/// message once up front and then caches each encoding the first time a
/// recipient needs it.
pub struct EncodedMessage<'a, M: MessageSchema> {
    message: &'a M,
    json: Option<Frame>,
    msgpack: Option<Frame>,
}

impl<'a, M: MessageSchema> EncodedMessage<'a, M> {
    /// Validate `message` and prepare an empty encoding cache.
    pub fn new(message: &'a M) -> Result<Self, CodecError> {
        message.validate()?;
        Ok(Self {
            message,
            json: None,
            msgpack: None,
        })
    }

    /// The encoded frame for `format`, encoding on first use.
    pub fn frame(&mut self, format: WireFormat) -> Result<Frame, CodecError> {
        let slot = match format {
            WireFormat::Json => &mut self.json,
            WireFormat::MsgPack => &mut self.msgpack,
        };
        if let Some(frame) = slot {
            return Ok(frame.clone());
        }
        let frame = encode_validated(format, self.message)?;
        *slot = Some(frame.clone());
        Ok(frame)
    }

    /// The message's `type` discriminant.
    pub fn message_type(&self) -> &'static str {
        self.message.message_type()
    }
}

//! Wire protocol: formats, frames, message schemas, and the codec.
//!
//! - [`WireFormat`] - per-connection encoding (JSON text or MessagePack binary)
//! - [`Frame`] - one raw message at the transport boundary
//! - [`MessageSchema`] - contract for typed, validated messages
//! - [`codec`] - decode/encode with validation on both directions

pub mod codec;
mod format;
mod frame;
mod schema;

pub use codec::{decode, encode, CodecError, EncodedMessage};
pub use format::WireFormat;
pub use frame::{Frame, TEXT_NOT_ALLOWED};
pub use schema::{rules, MessageSchema, SchemaValidationError};

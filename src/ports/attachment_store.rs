//! Attachment Store Port - opaque per-connection bytes that outlive a room.
//!
//! The attachment is the only state that survives a coordinator restart.
//! Any backing store satisfies the contract as long as the bytes are still
//! there when the same connection id is handed back after a restart.

use thiserror::Error;

use crate::domain::foundation::ConnectionId;

/// Errors that can occur during attachment storage operations
#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("Failed to serialize attachment: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize attachment: {0}")]
    DeserializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Attachment store unavailable: {0}")]
    Unavailable(String),
}

/// Port for persisting and loading connection attachments
///
/// Calls are synchronous: persistence is treated as a host call that
/// completes before the caller continues.
pub trait AttachmentStore: Send + Sync {
    /// Store `bytes` for `connection_id`, replacing any previous value.
    fn persist(&self, connection_id: ConnectionId, bytes: Vec<u8>) -> Result<(), AttachmentError>;

    /// Load the attachment, or `None` if nothing was ever persisted.
    fn load(&self, connection_id: ConnectionId) -> Result<Option<Vec<u8>>, AttachmentError>;

    /// Forget the attachment. Clearing a missing attachment is not an error.
    fn clear(&self, connection_id: ConnectionId) -> Result<(), AttachmentError>;
}

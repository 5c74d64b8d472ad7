//! Session error types.

use thiserror::Error;

use crate::domain::foundation::ConnectionId;
use crate::domain::protocol::CodecError;
use crate::ports::AttachmentError;

/// Errors raised by [`Session`](super::Session) operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Resume was attempted on a connection that never persisted anything.
    ///
    /// The host handed back a connection this room has no record of
    /// initializing. Fatal for that connection only.
    #[error("no data to resume for connection {0}")]
    NoDataToResume(ConnectionId),

    /// The attachment exists but does not deserialize into session data.
    #[error("attachment for connection {connection_id} is corrupt: {reason}")]
    CorruptAttachment {
        connection_id: ConnectionId,
        reason: String,
    },

    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The session's connection has closed; it accepts no further work.
    #[error("session for connection {0} is terminated")]
    Terminated(ConnectionId),
}

impl SessionError {
    /// Whether this error means the session could not be resumed.
    pub fn is_resume_failure(&self) -> bool {
        matches!(
            self,
            SessionError::NoDataToResume(_) | SessionError::CorruptAttachment { .. }
        )
    }
}

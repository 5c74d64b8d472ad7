//! Connection wrapper: typed sends plus the connection's attachment slot.
//!
//! Wraps a host [`Connection`] and the [`AttachmentStore`] so a session can
//! say "send this message" and "persist these bytes" without knowing either
//! the transport or the storage technology.

use std::fmt;
use std::sync::Arc;

use crate::domain::foundation::ConnectionId;
use crate::domain::protocol::{encode, CodecError, Frame, MessageSchema, WireFormat};
use crate::ports::{AttachmentError, AttachmentStore, Connection};

/// What happened to one outbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Handed to the connection's outbound queue.
    Queued,
    /// The connection was no longer open; nothing was attempted.
    Skipped,
    /// The connection refused the frame (closed mid-send or queue full).
    Dropped,
}

impl SendOutcome {
    /// Whether the frame reached the outbound queue.
    pub fn is_queued(self) -> bool {
        matches!(self, SendOutcome::Queued)
    }
}

/// Cheap, cloneable handle to one connection and its attachment.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    format: WireFormat,
    connection: Arc<dyn Connection>,
    attachments: Arc<dyn AttachmentStore>,
}

impl ConnectionHandle {
    /// Wrap a host connection. The id and format are read once here.
    pub fn new(connection: Arc<dyn Connection>, attachments: Arc<dyn AttachmentStore>) -> Self {
        Self {
            id: connection.id(),
            format: connection.format(),
            connection,
            attachments,
        }
    }

    /// Connection identity.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Format fixed at upgrade time.
    pub fn format(&self) -> WireFormat {
        self.format
    }

    /// Whether the underlying channel still accepts frames.
    pub fn is_open(&self) -> bool {
        self.connection.is_open()
    }

    /// Validate, encode in this connection's format, and queue `message`.
    ///
    /// Sending on a closed connection is a no-op, not an error. The only
    /// error is a message that fails its own schema.
    pub fn send<M: MessageSchema>(&self, message: &M) -> Result<SendOutcome, CodecError> {
        if !self.is_open() {
            return Ok(SendOutcome::Skipped);
        }
        let frame = encode(self.format, message)?;
        Ok(self.send_frame(frame))
    }

    /// Queue an already-encoded frame. Best effort; never retried.
    pub fn send_frame(&self, frame: Frame) -> SendOutcome {
        if !self.is_open() {
            return SendOutcome::Skipped;
        }
        match self.connection.send_frame(frame) {
            Ok(()) => SendOutcome::Queued,
            Err(e) => {
                tracing::debug!(connection_id = %self.id, error = %e, "Dropped outbound frame");
                SendOutcome::Dropped
            }
        }
    }

    /// Ask the host to tear the connection down.
    pub fn close(&self) {
        self.connection.close();
    }

    /// Store the attachment bytes for this connection.
    pub fn persist_attachment(&self, bytes: Vec<u8>) -> Result<(), AttachmentError> {
        self.attachments.persist(self.id, bytes)
    }

    /// Load this connection's attachment, if one was ever persisted.
    pub fn load_attachment(&self) -> Result<Option<Vec<u8>>, AttachmentError> {
        self.attachments.load(self.id)
    }

    /// Forget this connection's attachment.
    pub fn clear_attachment(&self) -> Result<(), AttachmentError> {
        self.attachments.clear(self.id)
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("format", &self.format)
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::attachments::InMemoryAttachmentStore;
    use crate::adapters::websocket::ChannelConnection;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "camelCase")]
    enum Note {
        Text { body: String },
    }

    impl MessageSchema for Note {
        fn message_type(&self) -> &'static str {
            "text"
        }

        fn validate(&self) -> Result<(), crate::domain::protocol::SchemaValidationError> {
            match self {
                Note::Text { body } => crate::domain::protocol::rules::non_empty("body", body),
            }
        }
    }

    fn handle(
        format: WireFormat,
    ) -> (
        ConnectionHandle,
        Arc<ChannelConnection>,
        tokio::sync::mpsc::Receiver<Frame>,
    ) {
        let (conn, rx) = ChannelConnection::new(format, 8);
        let conn = Arc::new(conn);
        let store = Arc::new(InMemoryAttachmentStore::new());
        (ConnectionHandle::new(conn.clone(), store), conn, rx)
    }

    #[test]
    fn reads_identity_and_format_from_connection() {
        let (handle, conn, _rx) = handle(WireFormat::MsgPack);
        assert_eq!(handle.id(), conn.id());
        assert_eq!(handle.format(), WireFormat::MsgPack);
    }

    #[test]
    fn send_encodes_in_connection_format() {
        let (handle, _conn, mut rx) = handle(WireFormat::Json);
        let outcome = handle
            .send(&Note::Text {
                body: "hi".into(),
            })
            .unwrap();
        assert_eq!(outcome, SendOutcome::Queued);
        assert_eq!(
            rx.try_recv().unwrap(),
            Frame::Text(r#"{"type":"text","body":"hi"}"#.into())
        );
    }

    #[test]
    fn send_on_closed_connection_is_a_noop() {
        let (handle, conn, mut rx) = handle(WireFormat::Json);
        conn.close();
        let outcome = handle
            .send(&Note::Text {
                body: "hi".into(),
            })
            .unwrap();
        assert_eq!(outcome, SendOutcome::Skipped);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn send_surfaces_schema_violation() {
        let (handle, _conn, mut rx) = handle(WireFormat::MsgPack);
        let result = handle.send(&Note::Text {
            body: "  ".into(),
        });
        assert!(matches!(result, Err(CodecError::Invalid(_))));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn full_queue_drops_frame() {
        let (conn, _rx) = ChannelConnection::new(WireFormat::Json, 1);
        let conn = Arc::new(conn);
        let handle = ConnectionHandle::new(conn, Arc::new(InMemoryAttachmentStore::new()));

        assert_eq!(handle.send_frame(Frame::Text("1".into())), SendOutcome::Queued);
        assert_eq!(handle.send_frame(Frame::Text("2".into())), SendOutcome::Dropped);
    }

    #[test]
    fn attachment_roundtrip_through_handle() {
        let (handle, _conn, _rx) = handle(WireFormat::Json);
        assert_eq!(handle.load_attachment().unwrap(), None);

        handle.persist_attachment(b"state".to_vec()).unwrap();
        assert_eq!(handle.load_attachment().unwrap(), Some(b"state".to_vec()));

        handle.clear_attachment().unwrap();
        assert_eq!(handle.load_attachment().unwrap(), None);
    }
}

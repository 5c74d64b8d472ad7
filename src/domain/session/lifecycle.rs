//! The per-connection session and its inbound gate.

use serde::{de::DeserializeOwned, Serialize};

use crate::domain::connection::{ConnectionHandle, SendOutcome};
use crate::domain::foundation::{ConnectionId, RoomId};
use crate::domain::protocol::{decode, Frame, MessageSchema, WireFormat, TEXT_NOT_ALLOWED};
use crate::domain::room::RoomHandlers;
use crate::ports::AttachmentError;

use super::{BroadcastReport, Peers, SessionContext, SessionError};

/// Lifecycle state. Construction is the only way into `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Terminated,
}

/// What [`Session::handle_inbound`] did with one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Decoded and handed to `on_message`.
    Dispatched,
    /// Failed decode or validation; handed to `on_validation_error`.
    Rejected,
    /// Text on a binary session; the JSON error notice was sent.
    ProtocolViolation,
    /// Binary on a text session; ignored without reply.
    Dropped,
    /// The session is terminated.
    Inactive,
}

/// Application state for one connection.
///
/// `data` belongs to the room's hooks. The session only reads it to
/// serialize it into the attachment.
#[derive(Debug)]
pub struct Session<D> {
    handle: ConnectionHandle,
    format: WireFormat,
    data: D,
    state: SessionState,
}

impl<D> Session<D> {
    pub fn id(&self) -> ConnectionId {
        self.handle.id()
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Move to `Terminated`. There is no way back.
    pub fn terminate(&mut self) {
        self.state = SessionState::Terminated;
    }
}

impl<D> Session<D>
where
    D: Serialize + DeserializeOwned,
{
    /// Start a session for a connection with no prior attachment.
    ///
    /// `data` is persisted before the session is returned.
    pub fn start_fresh(handle: ConnectionHandle, data: D) -> Result<Self, SessionError> {
        let session = Self {
            format: handle.format(),
            handle,
            data,
            state: SessionState::Active,
        };
        session.persist()?;
        Ok(session)
    }

    /// Rebuild a session from the connection's attachment.
    ///
    /// The attachment is deserialized verbatim. A missing attachment is
    /// [`SessionError::NoDataToResume`].
    pub fn resume(handle: ConnectionHandle) -> Result<Self, SessionError> {
        let connection_id = handle.id();
        let bytes = handle
            .load_attachment()?
            .ok_or(SessionError::NoDataToResume(connection_id))?;
        let data = serde_json::from_slice(&bytes).map_err(|e| SessionError::CorruptAttachment {
            connection_id,
            reason: e.to_string(),
        })?;

        Ok(Self {
            format: handle.format(),
            handle,
            data,
            state: SessionState::Active,
        })
    }

    /// Re-persist the current data. Never called implicitly.
    pub fn update(&self) -> Result<(), SessionError> {
        self.ensure_active()?;
        self.persist()
    }

    /// Validate, encode in this session's format, and send to its own
    /// connection.
    pub fn send<M: MessageSchema>(&self, message: &M) -> Result<SendOutcome, SessionError> {
        self.ensure_active()?;
        Ok(self.handle.send(message)?)
    }

    /// Send to every peer in the snapshot. With `exclude_self` this
    /// session's connection is never sent to.
    pub fn broadcast<M: MessageSchema>(
        &self,
        peers: &Peers,
        message: &M,
        exclude_self: bool,
    ) -> Result<BroadcastReport, SessionError> {
        self.ensure_active()?;
        let exclude = exclude_self.then(|| self.id());
        Ok(peers.broadcast(message, exclude)?)
    }

    /// Gate one inbound frame on this session's format, then decode and
    /// dispatch it.
    ///
    /// - binary session, text frame: one JSON `{"error": ...}` notice, no hook
    /// - text session, binary frame: silence, no hook
    /// - matching format: `on_message` or `on_validation_error`
    ///
    /// Hook failures are logged and never escape.
    pub fn handle_inbound<H>(
        &mut self,
        handlers: &mut H,
        peers: &Peers,
        room_id: &RoomId,
        frame: Frame,
    ) -> InboundOutcome
    where
        H: RoomHandlers<Data = D>,
    {
        if !self.is_active() {
            tracing::debug!(connection_id = %self.id(), "Inbound frame for terminated session");
            return InboundOutcome::Inactive;
        }

        match (self.format, &frame) {
            (WireFormat::MsgPack, Frame::Text(_)) => {
                let outcome = self.handle.send_frame(Frame::protocol_error(TEXT_NOT_ALLOWED));
                tracing::debug!(
                    connection_id = %self.id(),
                    notice = ?outcome,
                    "Text frame on binary session"
                );
                return InboundOutcome::ProtocolViolation;
            }
            (WireFormat::Json, Frame::Binary(bytes)) => {
                tracing::debug!(
                    connection_id = %self.id(),
                    bytes = bytes.len(),
                    "Binary frame on text session dropped"
                );
                return InboundOutcome::Dropped;
            }
            _ => {}
        }

        match decode::<H::Inbound>(&frame) {
            Ok(message) => {
                let message_type = message.message_type();
                let connection_id = self.id();
                let mut ctx = SessionContext::<H>::new(self, peers, room_id);
                if let Err(e) = handlers.on_message(&mut ctx, message) {
                    tracing::warn!(
                        %connection_id,
                        message_type,
                        error = %e,
                        "Message hook failed"
                    );
                }
                InboundOutcome::Dispatched
            }
            Err(error) => {
                tracing::debug!(
                    connection_id = %self.id(),
                    kind = error.kind(),
                    error = %error,
                    "Inbound message rejected"
                );
                let connection_id = self.id();
                let mut ctx = SessionContext::<H>::new(self, peers, room_id);
                if let Err(e) = handlers.on_validation_error(&mut ctx, error) {
                    tracing::warn!(%connection_id, error = %e, "Validation error hook failed");
                }
                InboundOutcome::Rejected
            }
        }
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Active => Ok(()),
            SessionState::Terminated => Err(SessionError::Terminated(self.id())),
        }
    }

    fn persist(&self) -> Result<(), SessionError> {
        let bytes = serde_json::to_vec(&self.data)
            .map_err(|e| AttachmentError::SerializationFailed(e.to_string()))?;
        self.handle.persist_attachment(bytes)?;
        Ok(())
    }
}

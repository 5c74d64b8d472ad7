//! What a room hook sees while it runs: its own session plus the room.
//!
//! [`Peers`] is a point-in-time snapshot of every connection handle in the
//! room, taken before the hook runs. Broadcasting iterates the snapshot, so
//! a peer closing mid-broadcast only turns its send into a no-op.

use crate::domain::connection::{ConnectionHandle, SendOutcome};
use crate::domain::foundation::{ConnectionId, RoomId};
use crate::domain::protocol::{CodecError, EncodedMessage, MessageSchema, WireFormat};
use crate::domain::room::RoomHandlers;

use super::{Session, SessionError};

/// Tally of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub queued: usize,
    pub skipped: usize,
    pub dropped: usize,
}

impl BroadcastReport {
    fn record(&mut self, outcome: SendOutcome) {
        match outcome {
            SendOutcome::Queued => self.queued += 1,
            SendOutcome::Skipped => self.skipped += 1,
            SendOutcome::Dropped => self.dropped += 1,
        }
    }

    /// Recipients that were attempted, excluding the excluded one.
    pub fn attempted(&self) -> usize {
        self.queued + self.skipped + self.dropped
    }
}

/// Snapshot of the room's connections.
#[derive(Debug, Clone, Default)]
pub struct Peers {
    handles: Vec<ConnectionHandle>,
}

impl Peers {
    pub fn new(handles: Vec<ConnectionHandle>) -> Self {
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectionHandle> {
        self.handles.iter()
    }

    pub fn get(&self, id: ConnectionId) -> Option<&ConnectionHandle> {
        self.handles.iter().find(|h| h.id() == id)
    }

    /// Send `message` to every peer except `exclude`.
    ///
    /// The message is validated once and encoded at most once per format.
    /// Every format a recipient needs is encoded before the first send, so
    /// an encoding failure reaches nobody. The excluded connection is never
    /// touched. One recipient failing does not stop delivery to the rest.
    pub fn broadcast<M: MessageSchema>(
        &self,
        message: &M,
        exclude: Option<ConnectionId>,
    ) -> Result<BroadcastReport, CodecError> {
        let mut encoded = EncodedMessage::new(message)?;
        let mut report = BroadcastReport::default();

        let recipients: Vec<&ConnectionHandle> = self
            .handles
            .iter()
            .filter(|h| Some(h.id()) != exclude)
            .collect();
        for format in [WireFormat::Json, WireFormat::MsgPack] {
            if recipients.iter().any(|h| h.format() == format && h.is_open()) {
                encoded.frame(format)?;
            }
        }

        for handle in recipients {
            if !handle.is_open() {
                report.record(SendOutcome::Skipped);
                continue;
            }
            match encoded.frame(handle.format()) {
                Ok(frame) => report.record(handle.send_frame(frame)),
                Err(e) => {
                    tracing::warn!(connection_id = %handle.id(), error = %e, "Broadcast encode failed");
                    report.record(SendOutcome::Dropped);
                }
            }
        }

        tracing::trace!(
            message_type = encoded.message_type(),
            queued = report.queued,
            skipped = report.skipped,
            dropped = report.dropped,
            "Broadcast complete"
        );
        Ok(report)
    }
}

/// Mutable view handed to every per-session hook.
///
/// Sends are typed against the room's outbound schema.
pub struct SessionContext<'a, H: RoomHandlers> {
    session: &'a mut Session<H::Data>,
    peers: &'a Peers,
    room_id: &'a RoomId,
}

impl<'a, H: RoomHandlers> SessionContext<'a, H> {
    pub fn new(session: &'a mut Session<H::Data>, peers: &'a Peers, room_id: &'a RoomId) -> Self {
        Self {
            session,
            peers,
            room_id,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.session.id()
    }

    pub fn format(&self) -> WireFormat {
        self.session.format()
    }

    pub fn room_id(&self) -> &RoomId {
        self.room_id
    }

    pub fn data(&self) -> &H::Data {
        self.session.data()
    }

    /// Mutate session data. Call [`update`](Self::update) afterwards if the
    /// change must survive a restart.
    pub fn data_mut(&mut self) -> &mut H::Data {
        self.session.data_mut()
    }

    /// Persist the current data to the attachment.
    pub fn update(&self) -> Result<(), SessionError> {
        self.session.update()
    }

    /// Send to this session's own connection.
    pub fn send(&self, message: &H::Outbound) -> Result<SendOutcome, SessionError> {
        self.session.send(message)
    }

    /// Send to every session in the room, optionally skipping this one.
    pub fn broadcast(
        &self,
        message: &H::Outbound,
        exclude_self: bool,
    ) -> Result<BroadcastReport, SessionError> {
        self.session.broadcast(self.peers, message, exclude_self)
    }

    /// Send to one other connection in the room.
    ///
    /// A target that is not in the room is skipped, not an error.
    pub fn send_to(
        &self,
        target: ConnectionId,
        message: &H::Outbound,
    ) -> Result<SendOutcome, SessionError> {
        if target == self.connection_id() {
            return self.send(message);
        }
        match self.peers.get(target) {
            Some(handle) => Ok(handle.send(message)?),
            None => Ok(SendOutcome::Skipped),
        }
    }

    /// Number of sessions in the room when this hook started.
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }
}

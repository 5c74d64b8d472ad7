//! Room coordinator: owns the registry and routes every lifecycle event.
//!
//! # Routing
//!
//! ```text
//! new connection ──► attachment? ──yes──► Session::resume ──► registry
//!                         │
//!                         no ──► on_fresh_init ──► Session::start_fresh ──► registry ──► on_open
//!
//! inbound frame  ──► registry lookup ──► Session::handle_inbound
//! close / error  ──► on_close | on_error ──► remove ──► clear attachment
//! ```
//!
//! No failure here is fatal to the room. Each one is scoped to the single
//! connection that caused it.

use std::sync::Arc;

use crate::domain::connection::ConnectionHandle;
use crate::domain::foundation::{ConnectionId, RoomId};
use crate::domain::protocol::{CodecError, Frame};
use crate::domain::room::{CloseInfo, InitContext, RoomHandlers};
use crate::domain::session::{BroadcastReport, InboundOutcome, Session, SessionContext, SessionError};
use crate::ports::{AttachmentStore, Connection};

use super::SessionRegistry;

/// How a new connection was admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// No attachment; the init hook synthesized data.
    Fresh,
    /// Data came back from the attachment.
    Resumed,
    /// The connection already has a session; nothing changed.
    AlreadyRegistered,
    /// The session could not be built; the connection was closed.
    Excluded,
}

impl RouteOutcome {
    pub fn is_admitted(self) -> bool {
        matches!(self, RouteOutcome::Fresh | RouteOutcome::Resumed)
    }
}

/// Result of repopulating the registry after a restart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub resumed: usize,
    pub excluded: usize,
}

/// Owns one room's registry and its handlers.
///
/// Exactly one task owns a coordinator and feeds it events one at a time
/// (see `room_actor`).
pub struct RoomCoordinator<H: RoomHandlers> {
    room_id: RoomId,
    handlers: H,
    registry: SessionRegistry<H::Data>,
    attachments: Arc<dyn AttachmentStore>,
}

impl<H: RoomHandlers> RoomCoordinator<H> {
    pub fn new(room_id: RoomId, handlers: H, attachments: Arc<dyn AttachmentStore>) -> Self {
        Self {
            room_id,
            handlers,
            registry: SessionRegistry::new(),
            attachments,
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn handlers(&self) -> &H {
        &self.handlers
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.registry.contains(id)
    }

    pub fn session(&self, id: ConnectionId) -> Option<&Session<H::Data>> {
        self.registry.get(id)
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.registry.ids().collect()
    }

    /// Admit a connection: resume it if it has an attachment, otherwise
    /// start it fresh and run `on_open`.
    ///
    /// The session is in the registry before this returns, so no inbound
    /// frame can be routed ahead of it.
    pub fn route_new_connection(
        &mut self,
        connection: Arc<dyn Connection>,
        init: &InitContext,
    ) -> RouteOutcome {
        let handle = ConnectionHandle::new(connection, self.attachments.clone());
        let id = handle.id();

        if self.registry.contains(id) {
            tracing::warn!(
                room_id = %self.room_id,
                connection_id = %id,
                "Connection routed twice; keeping existing session"
            );
            return RouteOutcome::AlreadyRegistered;
        }

        match handle.load_attachment() {
            Ok(Some(_)) => return self.resume_connection(handle),
            Ok(None) => {}
            Err(e) => return self.exclude(&handle, &SessionError::from(e)),
        }

        let data = self.handlers.on_fresh_init(init);
        let session = match Session::start_fresh(handle.clone(), data) {
            Ok(session) => session,
            Err(e) => return self.exclude(&handle, &e),
        };
        if !self.admit(session) {
            return RouteOutcome::AlreadyRegistered;
        }

        let peers = self.registry.peers();
        if let Some(session) = self.registry.get_mut(id) {
            let mut ctx = SessionContext::<H>::new(session, &peers, &self.room_id);
            if let Err(e) = self.handlers.on_open(&mut ctx) {
                tracing::warn!(
                    room_id = %self.room_id,
                    connection_id = %id,
                    error = %e,
                    "Open hook failed"
                );
            }
        }

        tracing::info!(
            room_id = %self.room_id,
            connection_id = %id,
            format = %init.format,
            sessions = self.registry.len(),
            "Session started"
        );
        RouteOutcome::Fresh
    }

    /// Route one inbound frame. Returns `None` for an untracked connection.
    pub fn route_inbound_message(
        &mut self,
        id: ConnectionId,
        frame: Frame,
    ) -> Option<InboundOutcome> {
        if !self.registry.contains(id) {
            tracing::warn!(
                room_id = %self.room_id,
                connection_id = %id,
                "Inbound frame for untracked connection dropped"
            );
            return None;
        }

        let peers = self.registry.peers();
        let session = self.registry.get_mut(id)?;
        Some(session.handle_inbound(&mut self.handlers, &peers, &self.room_id, frame))
    }

    /// Run `on_close`, then remove the session and clear its attachment.
    ///
    /// Returns whether the connection was tracked.
    pub fn route_close(&mut self, id: ConnectionId, close: &CloseInfo) -> bool {
        if !self.registry.contains(id) {
            tracing::debug!(room_id = %self.room_id, connection_id = %id, "Close for untracked connection");
            return false;
        }

        let peers = self.registry.peers();
        if let Some(session) = self.registry.get_mut(id) {
            let mut ctx = SessionContext::<H>::new(session, &peers, &self.room_id);
            if let Err(e) = self.handlers.on_close(&mut ctx, close) {
                tracing::warn!(
                    room_id = %self.room_id,
                    connection_id = %id,
                    error = %e,
                    "Close hook failed"
                );
            }
        }

        self.remove(id);
        tracing::info!(
            room_id = %self.room_id,
            connection_id = %id,
            code = close.code,
            sessions = self.registry.len(),
            "Session closed"
        );
        true
    }

    /// Run `on_error`, then remove the session the same way as a close.
    pub fn route_error(&mut self, id: ConnectionId, error: &str) -> bool {
        if !self.registry.contains(id) {
            tracing::debug!(room_id = %self.room_id, connection_id = %id, error, "Error for untracked connection");
            return false;
        }

        let peers = self.registry.peers();
        if let Some(session) = self.registry.get_mut(id) {
            let mut ctx = SessionContext::<H>::new(session, &peers, &self.room_id);
            if let Err(e) = self.handlers.on_error(&mut ctx, error) {
                tracing::warn!(
                    room_id = %self.room_id,
                    connection_id = %id,
                    error = %e,
                    "Error hook failed"
                );
            }
        }

        self.remove(id);
        true
    }

    /// Repopulate the registry after a restart.
    ///
    /// Every connection goes through the resume path, in whatever order it
    /// arrives. A connection that cannot be resumed is excluded; the rest
    /// of the room is unaffected.
    pub fn restore<I>(&mut self, connections: I) -> RestoreReport
    where
        I: IntoIterator<Item = Arc<dyn Connection>>,
    {
        let mut report = RestoreReport::default();
        for connection in connections {
            let handle = ConnectionHandle::new(connection, self.attachments.clone());
            if self.registry.contains(handle.id()) {
                continue;
            }
            match self.resume_connection(handle) {
                RouteOutcome::Resumed => report.resumed += 1,
                _ => report.excluded += 1,
            }
        }

        tracing::info!(
            room_id = %self.room_id,
            resumed = report.resumed,
            excluded = report.excluded,
            "Room restored"
        );
        report
    }

    /// Room-level fan-out, for announcements that originate outside any
    /// session.
    pub fn broadcast(
        &self,
        message: &H::Outbound,
        exclude: Option<ConnectionId>,
    ) -> Result<BroadcastReport, CodecError> {
        self.registry.peers().broadcast(message, exclude)
    }

    fn resume_connection(&mut self, handle: ConnectionHandle) -> RouteOutcome {
        let id = handle.id();
        match Session::resume(handle.clone()) {
            Ok(session) => {
                if !self.admit(session) {
                    return RouteOutcome::AlreadyRegistered;
                }
                tracing::debug!(room_id = %self.room_id, connection_id = %id, "Session resumed");
                RouteOutcome::Resumed
            }
            Err(e) => self.exclude(&handle, &e),
        }
    }

    fn admit(&mut self, session: Session<H::Data>) -> bool {
        match self.registry.insert(session) {
            Ok(()) => true,
            Err(rejected) => {
                tracing::warn!(
                    room_id = %self.room_id,
                    connection_id = %rejected.id(),
                    "Session already registered"
                );
                false
            }
        }
    }

    fn exclude(&self, handle: &ConnectionHandle, error: &SessionError) -> RouteOutcome {
        tracing::error!(
            room_id = %self.room_id,
            connection_id = %handle.id(),
            resume_failure = error.is_resume_failure(),
            error = %error,
            "Excluding connection from room"
        );
        handle.close();
        RouteOutcome::Excluded
    }

    fn remove(&mut self, id: ConnectionId) {
        if let Some(mut session) = self.registry.remove(id) {
            session.terminate();
            if let Err(e) = session.handle().clear_attachment() {
                tracing::warn!(
                    room_id = %self.room_id,
                    connection_id = %id,
                    error = %e,
                    "Failed to clear attachment"
                );
            }
        }
    }
}

//! Host-side directory of rooms.
//!
//! Maps a room id to its running task and remembers which connections are
//! open in it. That open set is what the host hands back when a hibernated
//! room wakes up: a fresh coordinator is built and restores every open
//! connection before it handles the event that woke it.
//!
//! ```text
//! RoomDirectory
//! ├── lobby      task: live       open: {c1, c2}
//! ├── support    task: hibernated open: {c3}      ← next event respawns + restores c3
//! └── ...
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::application::{
    spawn_room, RoomActorSettings, RoomCommand, RoomCoordinator, RoomError, RoomHandle,
    RouteOutcome,
};
use crate::domain::foundation::{ConnectionId, RoomId};
use crate::domain::protocol::Frame;
use crate::domain::room::{CloseInfo, InitContext, RoomHandlers};
use crate::ports::{AttachmentStore, Connection};

/// Builds the handlers for a room when its task is (re)started.
pub type HandlersFactory<H> = Arc<dyn Fn(&RoomId) -> H + Send + Sync>;

#[derive(Default)]
struct RoomEntry {
    task: Option<RoomHandle>,
    open: HashMap<ConnectionId, Arc<dyn Connection>>,
    wakes: u64,
    /// Set once the entry has been removed from the directory.
    retired: bool,
}

/// Counts for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryStats {
    pub rooms: usize,
    pub live_rooms: usize,
    pub connections: usize,
    pub wakes: u64,
}

/// Manages room tasks for the WebSocket host.
///
/// # Thread Safety
///
/// The outer `RwLock` only guards the room map and is never held across an
/// await. Each room has its own `Mutex`, held while an event is handed to
/// that room's task, so events for one room are ordered and a wake-up never
/// races a connect.
pub struct RoomDirectory<H: RoomHandlers> {
    factory: HandlersFactory<H>,
    attachments: Arc<dyn AttachmentStore>,
    settings: RoomActorSettings,
    rooms: RwLock<HashMap<RoomId, Arc<Mutex<RoomEntry>>>>,
}

impl<H: RoomHandlers> RoomDirectory<H> {
    pub fn new(
        factory: HandlersFactory<H>,
        attachments: Arc<dyn AttachmentStore>,
        settings: RoomActorSettings,
    ) -> Self {
        Self {
            factory,
            attachments,
            settings,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Admit a connection into `room_id`, starting the room if needed.
    pub async fn connect(
        &self,
        room_id: &RoomId,
        connection: Arc<dyn Connection>,
        init: InitContext,
    ) -> Result<RouteOutcome, RoomError> {
        let (entry, mut guard) = self.lock_room(room_id).await;
        let handle = self.live_task(room_id, &mut guard, None);
        let outcome = match handle.connect(connection.clone(), init.clone()).await {
            Err(RoomError::RoomClosed(_)) => {
                guard.task = None;
                self.live_task(room_id, &mut guard, None)
                    .connect(connection.clone(), init)
                    .await?
            }
            other => other?,
        };

        if outcome.is_admitted() {
            guard.open.insert(connection.id(), connection);
        } else if guard.open.is_empty() {
            self.retire(room_id, &entry, guard).await;
        }
        Ok(outcome)
    }

    /// Route one inbound frame.
    pub async fn inbound(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        frame: Frame,
    ) -> Result<(), RoomError> {
        let (_entry, mut guard) = self.lock_room(room_id).await;
        self.deliver(
            room_id,
            &mut guard,
            None,
            RoomCommand::Inbound {
                connection_id,
                frame,
            },
        )
        .await
    }

    /// Route a close, then forget the connection. A room left with no open
    /// connections is shut down and removed.
    pub async fn close(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        close: CloseInfo,
    ) -> Result<(), RoomError> {
        self.depart(
            room_id,
            connection_id,
            RoomCommand::Close {
                connection_id,
                close,
            },
        )
        .await
    }

    /// Route a transport error; the connection leaves the room as on close.
    pub async fn error(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        error: String,
    ) -> Result<(), RoomError> {
        self.depart(
            room_id,
            connection_id,
            RoomCommand::Error {
                connection_id,
                error,
            },
        )
        .await
    }

    pub async fn stats(&self) -> DirectoryStats {
        let entries: Vec<_> = self.rooms.read().await.values().cloned().collect();
        let mut stats = DirectoryStats {
            rooms: entries.len(),
            ..DirectoryStats::default()
        };
        for entry in entries {
            let entry = entry.lock().await;
            if entry.task.as_ref().is_some_and(|t| !t.is_closed()) {
                stats.live_rooms += 1;
            }
            stats.connections += entry.open.len();
            stats.wakes += entry.wakes;
        }
        stats
    }

    async fn depart(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        command: RoomCommand,
    ) -> Result<(), RoomError> {
        let (entry, mut guard) = self.lock_room(room_id).await;
        if !guard.open.contains_key(&connection_id) {
            return Ok(());
        }

        // Deliver first: a hibernated room must restore this connection so
        // its close hook still sees the session, even if the host has already
        // closed the socket.
        let delivered = self
            .deliver(room_id, &mut guard, Some(connection_id), command)
            .await;
        guard.open.remove(&connection_id);
        if guard.open.is_empty() {
            self.retire(room_id, &entry, guard).await;
        }
        delivered
    }

    async fn deliver(
        &self,
        room_id: &RoomId,
        entry: &mut RoomEntry,
        departing: Option<ConnectionId>,
        command: RoomCommand,
    ) -> Result<(), RoomError> {
        let handle = self.live_task(room_id, entry, departing);
        match handle.dispatch(command).await {
            Ok(()) => Ok(()),
            Err(command) => {
                entry.task = None;
                self.live_task(room_id, entry, departing)
                    .dispatch(command)
                    .await
                    .map_err(|_| RoomError::RoomClosed(room_id.clone()))
            }
        }
    }

    /// The room's running task, spawning and restoring one if it has exited.
    ///
    /// Open connections are restored, plus `departing` whatever its state.
    fn live_task(
        &self,
        room_id: &RoomId,
        entry: &mut RoomEntry,
        departing: Option<ConnectionId>,
    ) -> RoomHandle {
        if let Some(task) = &entry.task {
            if !task.is_closed() {
                return task.clone();
            }
        }

        let restore: Vec<Arc<dyn Connection>> = entry
            .open
            .values()
            .filter(|c| c.is_open() || Some(c.id()) == departing)
            .cloned()
            .collect();
        if entry.task.is_some() || !restore.is_empty() {
            entry.wakes += 1;
            tracing::info!(room_id = %room_id, restoring = restore.len(), "Waking room");
        }

        let handlers = (self.factory)(room_id);
        let coordinator = RoomCoordinator::new(room_id.clone(), handlers, self.attachments.clone());
        let (handle, _task) = spawn_room(coordinator, restore, &self.settings);
        entry.task = Some(handle.clone());
        handle
    }

    async fn lock_room(&self, room_id: &RoomId) -> (Arc<Mutex<RoomEntry>>, OwnedMutexGuard<RoomEntry>) {
        loop {
            let entry = self
                .rooms
                .write()
                .await
                .entry(room_id.clone())
                .or_default()
                .clone();
            let guard = entry.clone().lock_owned().await;
            if !guard.retired {
                return (entry, guard);
            }
        }
    }

    async fn retire(
        &self,
        room_id: &RoomId,
        entry: &Arc<Mutex<RoomEntry>>,
        mut guard: OwnedMutexGuard<RoomEntry>,
    ) {
        guard.retired = true;
        if let Some(task) = guard.task.take() {
            let _ = task.shutdown().await;
        }
        drop(guard);

        let mut rooms = self.rooms.write().await;
        if rooms.get(room_id).is_some_and(|current| Arc::ptr_eq(current, entry)) {
            rooms.remove(room_id);
        }
        tracing::debug!(room_id = %room_id, "Room emptied");
    }
}

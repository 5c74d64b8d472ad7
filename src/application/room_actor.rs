//! The task that owns one room's coordinator.
//!
//! Every event for a room goes through a bounded command queue into a single
//! task, so the registry is never touched concurrently and each hook runs to
//! completion before the next command is read.
//!
//! A room that receives no command for the configured idle period
//! hibernates: the task exits and the coordinator with all in-memory session
//! state is dropped. Only attachments survive. The next spawn is handed the
//! still-open connections and restores them before reading any command.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::domain::foundation::{ConnectionId, RoomId};
use crate::domain::protocol::Frame;
use crate::domain::room::{CloseInfo, InitContext, RoomHandlers};
use crate::ports::Connection;

use super::{RoomCoordinator, RouteOutcome};

/// Errors talking to a room task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// The room task has exited (hibernated or shut down).
    #[error("room {0} is not running")]
    RoomClosed(RoomId),

    /// The room task exited before answering.
    #[error("room {0} stopped before replying")]
    NoReply(RoomId),
}

/// One event for a room.
pub enum RoomCommand {
    Connect {
        connection: Arc<dyn Connection>,
        init: InitContext,
        reply: oneshot::Sender<RouteOutcome>,
    },
    Inbound {
        connection_id: ConnectionId,
        frame: Frame,
    },
    Close {
        connection_id: ConnectionId,
        close: CloseInfo,
    },
    Error {
        connection_id: ConnectionId,
        error: String,
    },
    SessionCount {
        reply: oneshot::Sender<usize>,
    },
    Shutdown,
}

impl RoomCommand {
    fn kind(&self) -> &'static str {
        match self {
            RoomCommand::Connect { .. } => "connect",
            RoomCommand::Inbound { .. } => "inbound",
            RoomCommand::Close { .. } => "close",
            RoomCommand::Error { .. } => "error",
            RoomCommand::SessionCount { .. } => "session_count",
            RoomCommand::Shutdown => "shutdown",
        }
    }
}

/// Why a room task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomExit {
    /// No command arrived within the idle timeout.
    Hibernated,
    /// A `Shutdown` command was received.
    Shutdown,
    /// Every handle was dropped.
    Abandoned,
}

/// Tuning for room tasks.
#[derive(Debug, Clone)]
pub struct RoomActorSettings {
    /// Capacity of the command queue.
    pub command_buffer: usize,
    /// Hibernate after this long without a command. `None` never hibernates.
    pub idle_timeout: Option<Duration>,
}

impl Default for RoomActorSettings {
    fn default() -> Self {
        Self {
            command_buffer: 256,
            idle_timeout: None,
        }
    }
}

/// Sending side of a room task.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    commands: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Whether the task behind this handle has exited.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Queue a command, handing it back if the task is gone.
    pub async fn dispatch(&self, command: RoomCommand) -> Result<(), RoomCommand> {
        self.commands
            .send(command)
            .await
            .map_err(|mpsc::error::SendError(command)| command)
    }

    pub async fn connect(
        &self,
        connection: Arc<dyn Connection>,
        init: InitContext,
    ) -> Result<RouteOutcome, RoomError> {
        let (reply, outcome) = oneshot::channel();
        self.send(RoomCommand::Connect {
            connection,
            init,
            reply,
        })
        .await?;
        outcome
            .await
            .map_err(|_| RoomError::NoReply(self.room_id.clone()))
    }

    pub async fn inbound(&self, connection_id: ConnectionId, frame: Frame) -> Result<(), RoomError> {
        self.send(RoomCommand::Inbound {
            connection_id,
            frame,
        })
        .await
    }

    pub async fn close(&self, connection_id: ConnectionId, close: CloseInfo) -> Result<(), RoomError> {
        self.send(RoomCommand::Close {
            connection_id,
            close,
        })
        .await
    }

    pub async fn error(&self, connection_id: ConnectionId, error: String) -> Result<(), RoomError> {
        self.send(RoomCommand::Error {
            connection_id,
            error,
        })
        .await
    }

    pub async fn session_count(&self) -> Result<usize, RoomError> {
        let (reply, count) = oneshot::channel();
        self.send(RoomCommand::SessionCount { reply }).await?;
        count
            .await
            .map_err(|_| RoomError::NoReply(self.room_id.clone()))
    }

    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, command: RoomCommand) -> Result<(), RoomError> {
        self.dispatch(command)
            .await
            .map_err(|_| RoomError::RoomClosed(self.room_id.clone()))
    }
}

/// Start a task that owns `coordinator`.
///
/// `restore` lists the connections the host still considers open. They are
/// all routed through the resume path before the first command is read.
pub fn spawn_room<H: RoomHandlers>(
    coordinator: RoomCoordinator<H>,
    restore: Vec<Arc<dyn Connection>>,
    settings: &RoomActorSettings,
) -> (RoomHandle, JoinHandle<RoomExit>) {
    let (commands, inbox) = mpsc::channel(settings.command_buffer.max(1));
    let handle = RoomHandle {
        room_id: coordinator.room_id().clone(),
        commands,
    };
    let task = tokio::spawn(run_room(coordinator, restore, inbox, settings.idle_timeout));
    (handle, task)
}

async fn run_room<H: RoomHandlers>(
    mut coordinator: RoomCoordinator<H>,
    restore: Vec<Arc<dyn Connection>>,
    mut inbox: mpsc::Receiver<RoomCommand>,
    idle_timeout: Option<Duration>,
) -> RoomExit {
    if !restore.is_empty() {
        coordinator.restore(restore);
    }
    tracing::debug!(room_id = %coordinator.room_id(), sessions = coordinator.len(), "Room task started");

    loop {
        let next = match idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, inbox.recv()).await {
                Ok(next) => next,
                Err(_) => {
                    hibernate(&mut coordinator, &mut inbox);
                    return RoomExit::Hibernated;
                }
            },
            None => inbox.recv().await,
        };

        match next {
            Some(RoomCommand::Shutdown) => {
                tracing::debug!(room_id = %coordinator.room_id(), "Room shut down");
                return RoomExit::Shutdown;
            }
            Some(command) => apply(&mut coordinator, command),
            None => return RoomExit::Abandoned,
        }
    }
}

/// Stop accepting commands, then finish whatever was already queued.
fn hibernate<H: RoomHandlers>(
    coordinator: &mut RoomCoordinator<H>,
    inbox: &mut mpsc::Receiver<RoomCommand>,
) {
    inbox.close();
    while let Ok(command) = inbox.try_recv() {
        if !matches!(command, RoomCommand::Shutdown) {
            apply(coordinator, command);
        }
    }
    tracing::info!(
        room_id = %coordinator.room_id(),
        sessions = coordinator.len(),
        "Room hibernating"
    );
}

fn apply<H: RoomHandlers>(coordinator: &mut RoomCoordinator<H>, command: RoomCommand) {
    tracing::trace!(room_id = %coordinator.room_id(), command = command.kind(), "Room command");
    match command {
        RoomCommand::Connect {
            connection,
            init,
            reply,
        } => {
            let outcome = coordinator.route_new_connection(connection, &init);
            let _ = reply.send(outcome);
        }
        RoomCommand::Inbound {
            connection_id,
            frame,
        } => {
            coordinator.route_inbound_message(connection_id, frame);
        }
        RoomCommand::Close {
            connection_id,
            close,
        } => {
            coordinator.route_close(connection_id, &close);
        }
        RoomCommand::Error {
            connection_id,
            error,
        } => {
            coordinator.route_error(connection_id, &error);
        }
        RoomCommand::SessionCount { reply } => {
            let _ = reply.send(coordinator.len());
        }
        RoomCommand::Shutdown => {}
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::adapters::attachments::InMemoryAttachmentStore;
    use crate::adapters::websocket::ChannelConnection;
    use crate::domain::protocol::{decode, MessageSchema, WireFormat};
    use crate::domain::room::HookResult;
    use crate::domain::session::SessionContext;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "camelCase")]
    enum Msg {
        Add { amount: u32 },
        Total { total: u32 },
    }

    impl MessageSchema for Msg {
        fn message_type(&self) -> &'static str {
            match self {
                Msg::Add { .. } => "add",
                Msg::Total { .. } => "total",
            }
        }
    }

    struct Adder;

    impl RoomHandlers for Adder {
        type Data = u32;
        type Inbound = Msg;
        type Outbound = Msg;

        fn on_fresh_init(&mut self, _init: &InitContext) -> u32 {
            0
        }

        fn on_message(&mut self, ctx: &mut SessionContext<'_, Self>, message: Msg) -> HookResult {
            if let Msg::Add { amount } = message {
                *ctx.data_mut() += amount;
                ctx.update()?;
                let total = *ctx.data();
                ctx.send(&Msg::Total { total })?;
            }
            Ok(())
        }
    }

    fn room_id() -> RoomId {
        "actor-room".parse().unwrap()
    }

    fn add(amount: u32) -> Frame {
        Frame::Text(format!(r#"{{"type":"add","amount":{amount}}}"#))
    }

    #[tokio::test]
    async fn commands_are_routed_in_order() {
        let store = Arc::new(InMemoryAttachmentStore::new());
        let coordinator = RoomCoordinator::new(room_id(), Adder, store);
        let (room, _task) = spawn_room(coordinator, Vec::new(), &RoomActorSettings::default());

        let (conn, mut rx) = ChannelConnection::new(WireFormat::Json, 8);
        let conn = Arc::new(conn);
        let init = InitContext::new(room_id(), conn.id(), WireFormat::Json);
        assert_eq!(room.connect(conn.clone(), init).await.unwrap(), RouteOutcome::Fresh);

        room.inbound(conn.id(), add(2)).await.unwrap();
        room.inbound(conn.id(), add(3)).await.unwrap();
        assert_eq!(room.session_count().await.unwrap(), 1);

        let first: Msg = decode(&rx.recv().await.unwrap()).unwrap();
        let second: Msg = decode(&rx.recv().await.unwrap()).unwrap();
        assert!(matches!(first, Msg::Total { total: 2 }));
        assert!(matches!(second, Msg::Total { total: 5 }));
    }

    #[tokio::test]
    async fn shutdown_stops_the_task() {
        let store = Arc::new(InMemoryAttachmentStore::new());
        let coordinator = RoomCoordinator::new(room_id(), Adder, store);
        let (room, task) = spawn_room(coordinator, Vec::new(), &RoomActorSettings::default());

        room.shutdown().await.unwrap();

        assert_eq!(task.await.unwrap(), RoomExit::Shutdown);
        assert_eq!(room.session_count().await, Err(RoomError::RoomClosed(room_id())));
    }

    #[tokio::test]
    async fn idle_room_hibernates_and_restores_on_respawn() {
        let store = Arc::new(InMemoryAttachmentStore::new());
        let settings = RoomActorSettings {
            command_buffer: 8,
            idle_timeout: Some(Duration::from_millis(50)),
        };
        let coordinator = RoomCoordinator::new(room_id(), Adder, store.clone());
        let (room, task) = spawn_room(coordinator, Vec::new(), &settings);

        let (conn, mut rx) = ChannelConnection::new(WireFormat::MsgPack, 8);
        let conn = Arc::new(conn);
        let init = InitContext::new(room_id(), conn.id(), WireFormat::MsgPack);
        room.connect(conn.clone(), init).await.unwrap();
        let payload = rmp_serde::to_vec_named(&Msg::Add { amount: 4 }).unwrap();
        room.inbound(conn.id(), Frame::Binary(payload)).await.unwrap();
        let _ = rx.recv().await.unwrap();

        assert_eq!(task.await.unwrap(), RoomExit::Hibernated);
        assert!(room.is_closed());

        let coordinator = RoomCoordinator::new(room_id(), Adder, store);
        let (room, _task) = spawn_room(coordinator, vec![conn.clone() as Arc<dyn Connection>], &settings);
        let payload = rmp_serde::to_vec_named(&Msg::Add { amount: 1 }).unwrap();
        room.inbound(conn.id(), Frame::Binary(payload)).await.unwrap();

        let reply: Msg = decode(&rx.recv().await.unwrap()).unwrap();
        assert!(matches!(reply, Msg::Total { total: 5 }));
    }
}

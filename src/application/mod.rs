//! Application layer - room coordination.
//!
//! Wires domain sessions into rooms: a registry per room, the coordinator
//! that routes lifecycle events into it, and the task that owns each
//! coordinator.

mod coordinator;
mod registry;
mod room_actor;

pub use coordinator::{RestoreReport, RoomCoordinator, RouteOutcome};
pub use registry::SessionRegistry;
pub use room_actor::{
    spawn_room, RoomActorSettings, RoomCommand, RoomError, RoomExit, RoomHandle,
};

//! Roomcast - stateful real-time rooms over WebSockets.
//!
//! Each connection in a room owns a session: typed per-connection data
//! that is persisted as an attachment and restored when the room's task
//! is woken after hibernation. Clients speak either JSON (text frames) or
//! MessagePack (binary frames), chosen once at upgrade.
//!
//! Rooms are written by implementing [`domain::room::RoomHandlers`]; the
//! bundled [`rooms::ChatRoom`] is what the binary serves.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod rooms;

pub use application::{RoomCoordinator, RouteOutcome};
pub use domain::protocol::{Frame, WireFormat};
pub use domain::room::{CloseInfo, InitContext, RoomHandlers};
pub use domain::session::{Session, SessionContext};

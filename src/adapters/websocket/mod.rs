//! WebSocket adapters - the host side of rooms.
//!
//! ```text
//!  client ──ws──► handler ──► RoomDirectory ──► room task ──► RoomCoordinator
//!     ▲                                                           │
//!     └──── writer task ◄── ChannelConnection (bounded queue) ◄───┘
//! ```
//!
//! # Components
//!
//! - [`connection`] - `Connection` port over a bounded frame queue
//! - [`directory`] - room tasks, open connections, wake-up after hibernation
//! - [`handler`] - Axum WebSocket upgrade handler

pub mod connection;
pub mod directory;
pub mod handler;

pub use connection::ChannelConnection;
pub use directory::{DirectoryStats, HandlersFactory, RoomDirectory};
pub use handler::{websocket_router, ws_handler, ConnectionSettings, WebSocketState};

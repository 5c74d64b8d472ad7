//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the room domain to external systems:
//! - `attachments` - Attachment stores (in-memory, file)
//! - `websocket` - Axum WebSocket host, room directory
//! - `http` - Application router and health endpoint

pub mod attachments;
pub mod http;
pub mod websocket;

pub use attachments::{FileAttachmentStore, InMemoryAttachmentStore};
pub use http::app_router;
pub use websocket::{ChannelConnection, ConnectionSettings, RoomDirectory, WebSocketState};

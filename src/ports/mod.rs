//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the room domain and the host it runs in. Adapters implement these ports.
//!
//! - `Connection` - host-provided bidirectional channel to one peer
//! - `AttachmentStore` - per-connection bytes that survive a room restart

mod attachment_store;
mod connection;

pub use attachment_store::{AttachmentError, AttachmentStore};
pub use connection::{Connection, ConnectionError};

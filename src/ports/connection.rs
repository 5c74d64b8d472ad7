//! Connection port - the host's bidirectional channel to one peer.
//!
//! The transport layer (WebSocket upgrade, TCP, an in-process test double)
//! implements this trait. Everything above it deals in [`Frame`]s and never
//! sees the transport.

use thiserror::Error;

use crate::domain::foundation::ConnectionId;
use crate::domain::protocol::{Frame, WireFormat};

/// Errors a connection reports when a frame cannot be queued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// The peer is gone; nothing will be delivered again.
    #[error("connection {0} is closed")]
    Closed(ConnectionId),

    /// The outbound queue is full and the frame was dropped.
    #[error("outbound queue for connection {0} is full")]
    Backpressure(ConnectionId),
}

/// Port for a host-provided connection.
///
/// # Contract
///
/// Implementations must:
/// - Return a stable [`ConnectionId`] for the connection's whole life
/// - Report the format negotiated at upgrade, which never changes
/// - Never block in `send_frame`; queue or fail immediately
pub trait Connection: Send + Sync {
    /// Identity of this connection.
    fn id(&self) -> ConnectionId;

    /// Wire format negotiated when the connection was accepted.
    fn format(&self) -> WireFormat;

    /// Whether frames can still be delivered.
    fn is_open(&self) -> bool;

    /// Queue one frame for delivery.
    fn send_frame(&self, frame: Frame) -> Result<(), ConnectionError>;

    /// Ask the host to tear the connection down. Idempotent.
    fn close(&self);
}

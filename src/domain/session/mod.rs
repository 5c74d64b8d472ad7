//! Session domain module.
//!
//! A session is the application state for one connection: typed data the
//! room's hooks own, the connection it belongs to, and the wire format fixed
//! when it was created.
//!
//! # Lifecycle
//!
//! - `Session::start_fresh` - no attachment; data comes from the room's init hook
//! - `Session::resume` - attachment bytes are deserialized verbatim
//! - `Session::terminate` - connection gone; no way back

mod context;
mod errors;
mod lifecycle;

pub use context::{BroadcastReport, Peers, SessionContext};
pub use errors::SessionError;
pub use lifecycle::{InboundOutcome, Session, SessionState};

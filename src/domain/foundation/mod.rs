//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types
//! that form the vocabulary of the room domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{ConnectionId, RoomId, MAX_ROOM_ID_LENGTH};
pub use timestamp::Timestamp;

//! Room-level application hooks.
//!
//! A room's behaviour is a [`RoomHandlers`] value handed to the coordinator
//! at construction. The framework calls into it; it never subclasses it.

mod events;
mod handlers;

pub use events::{CloseInfo, InitContext, NORMAL_CLOSURE};
pub use handlers::{HookResult, RoomHandlers};

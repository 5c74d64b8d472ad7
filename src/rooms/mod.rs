//! Room implementations served by the binary.

pub mod chat;

pub use chat::{ChatInbound, ChatMember, ChatOutbound, ChatRoom};

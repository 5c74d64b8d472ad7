//! Domain layer: rooms, sessions, and the wire protocol.
//!
//! # Module Organization
//!
//! - `foundation` - Identifiers, timestamps, validation errors
//! - `protocol` - Wire formats, frames, message schemas, codec
//! - `connection` - Typed sends and attachments over one connection
//! - `session` - Per-connection state and the inbound format gate
//! - `room` - Pluggable room hooks and their lifecycle inputs

pub mod connection;
pub mod foundation;
pub mod protocol;
pub mod room;
pub mod session;

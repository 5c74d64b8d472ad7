//! Lifecycle inputs the host hands to a room.

use std::collections::HashMap;

use crate::domain::foundation::{ConnectionId, RoomId, Timestamp};
use crate::domain::protocol::WireFormat;

/// WebSocket close code for a normal closure.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Everything known about a brand-new connection, passed to the init hook.
#[derive(Debug, Clone)]
pub struct InitContext {
    pub room_id: RoomId,
    pub connection_id: ConnectionId,
    pub format: WireFormat,
    /// Query parameters from the upgrade request.
    pub params: HashMap<String, String>,
    pub connected_at: Timestamp,
}

impl InitContext {
    pub fn new(room_id: RoomId, connection_id: ConnectionId, format: WireFormat) -> Self {
        Self {
            room_id,
            connection_id,
            format,
            params: HashMap::new(),
            connected_at: Timestamp::now(),
        }
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_connected_at(mut self, at: Timestamp) -> Self {
        self.connected_at = at;
        self
    }

    /// A non-blank query parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Why a connection went away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: u16,
    pub reason: String,
}

impl CloseInfo {
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    pub fn normal() -> Self {
        Self::new(NORMAL_CLOSURE, "")
    }
}

impl Default for CloseInfo {
    fn default() -> Self {
        Self::normal()
    }
}

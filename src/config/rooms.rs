//! Room and connection tuning

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::websocket::ConnectionSettings;
use crate::application::RoomActorSettings;
use crate::domain::protocol::WireFormat;

const MAX_BUFFER: usize = 65_536;
const MIN_MESSAGE_BYTES: usize = 1024;
const MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

/// Room configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RoomsConfig {
    /// Format used when a client omits `?format=`
    #[serde(default)]
    pub default_format: WireFormat,

    /// Outbound frames queued per connection before sends are dropped
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,

    /// Commands queued per room task
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,

    /// Largest inbound WebSocket message accepted
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,

    /// Idle seconds before a room hibernates (0 disables hibernation)
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Directory for file-backed attachments. In-memory when unset.
    pub attachment_dir: Option<PathBuf>,
}

impl RoomsConfig {
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }

    pub fn actor_settings(&self) -> RoomActorSettings {
        RoomActorSettings {
            command_buffer: self.command_buffer,
            idle_timeout: self.idle_timeout(),
        }
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            default_format: self.default_format,
            outbound_buffer: self.outbound_buffer,
            max_message_bytes: self.max_message_bytes,
        }
    }

    /// Validate room configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=MAX_BUFFER).contains(&self.outbound_buffer) {
            return Err(ValidationError::InvalidBufferSize("outbound_buffer"));
        }
        if !(1..=MAX_BUFFER).contains(&self.command_buffer) {
            return Err(ValidationError::InvalidBufferSize("command_buffer"));
        }
        if !(MIN_MESSAGE_BYTES..=MAX_MESSAGE_BYTES).contains(&self.max_message_bytes) {
            return Err(ValidationError::InvalidMessageLimit);
        }
        if self
            .attachment_dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            return Err(ValidationError::EmptyAttachmentDir);
        }
        Ok(())
    }
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            default_format: WireFormat::default(),
            outbound_buffer: default_outbound_buffer(),
            command_buffer: default_command_buffer(),
            max_message_bytes: default_max_message_bytes(),
            idle_timeout_secs: default_idle_timeout(),
            attachment_dir: None,
        }
    }
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_command_buffer() -> usize {
    256
}

fn default_max_message_bytes() -> usize {
    64 * 1024
}

fn default_idle_timeout() -> u64 {
    300
}

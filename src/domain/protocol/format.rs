//! Wire format negotiated per connection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Encoding a connection speaks for its whole lifetime.
///
/// Resolved once at upgrade time (usually from a `format` query parameter)
/// and never changed afterwards. A `Json` connection is text-only; a
/// `MsgPack` connection is binary-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// UTF-8 JSON text frames.
    #[default]
    Json,
    /// MessagePack binary frames (map-encoded structs).
    #[serde(alias = "binary")]
    MsgPack,
}

impl WireFormat {
    /// Human-readable name, used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            WireFormat::Json => "JSON",
            WireFormat::MsgPack => "MessagePack",
        }
    }

    /// Whether this format travels in binary frames.
    pub fn is_binary(self) -> bool {
        matches!(self, WireFormat::MsgPack)
    }

    /// Resolve a format from an optional query value, falling back to
    /// `default` when the parameter is absent.
    pub fn from_query(value: Option<&str>, default: WireFormat) -> Result<Self, ValidationError> {
        match value {
            None => Ok(default),
            Some(v) => v.parse(),
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WireFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" | "text" => Ok(WireFormat::Json),
            "msgpack" | "messagepack" | "binary" => Ok(WireFormat::MsgPack),
            other => Err(ValidationError::invalid_format(
                "format",
                format!("unknown wire format '{}', expected 'json' or 'msgpack'", other),
            )),
        }
    }
}

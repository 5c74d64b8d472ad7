//! Raw frames exchanged with a connection.

use serde_json::json;

use super::WireFormat;

/// Error text sent to a binary-only connection that sent a text frame.
pub const TEXT_NOT_ALLOWED: &str = "text messages are not allowed; use binary messages";

/// One raw message as it crosses the transport boundary.
///
/// The variant carries the is-binary bit the transport reports; nothing
/// about the payload's contents is inspected here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame.
    Binary(Vec<u8>),
}

impl Frame {
    /// Whether the frame arrived (or will leave) as binary.
    pub fn is_binary(&self) -> bool {
        matches!(self, Frame::Binary(_))
    }

    /// The wire format this frame's kind belongs to.
    pub fn format(&self) -> WireFormat {
        match self {
            Frame::Text(_) => WireFormat::Json,
            Frame::Binary(_) => WireFormat::MsgPack,
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        match self {
            Frame::Text(text) => text.len(),
            Frame::Binary(bytes) => bytes.len(),
        }
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Schema-free `{"error": "..."}` text frame.
    ///
    /// Always JSON regardless of the receiving connection's format, and built
    /// without the codec so it can be sent even if the outbound schema is
    /// broken.
    pub fn protocol_error(message: &str) -> Self {
        Frame::Text(json!({ "error": message }).to_string())
    }
}

impl From<String> for Frame {
    fn from(text: String) -> Self {
        Frame::Text(text)
    }
}

impl From<Vec<u8>> for Frame {
    fn from(bytes: Vec<u8>) -> Self {
        Frame::Binary(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_frame_belongs_to_json() {
        let frame = Frame::Text("{}".into());
        assert!(!frame.is_binary());
        assert_eq!(frame.format(), WireFormat::Json);
        assert_eq!(frame.len(), 2);
    }

    #[test]
    fn binary_frame_belongs_to_msgpack() {
        let frame = Frame::Binary(vec![0x80]);
        assert!(frame.is_binary());
        assert_eq!(frame.format(), WireFormat::MsgPack);
    }

    #[test]
    fn protocol_error_is_json_object_with_error_field() {
        let frame = Frame::protocol_error(TEXT_NOT_ALLOWED);
        let Frame::Text(text) = frame else {
            panic!("protocol error must be a text frame");
        };
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["error"], TEXT_NOT_ALLOWED);
        assert_eq!(value.as_object().unwrap().len(), 1);
    }
}

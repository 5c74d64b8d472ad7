//! WebSocket upgrade handler for room connections.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Validate the room id and negotiate the wire format
//! 2. Upgrade to WebSocket
//! 3. Admit the connection into its room
//! 4. Forward frames both ways until disconnect
//! 5. Route the close (or transport error) back to the room

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};

use crate::domain::foundation::{ConnectionId, RoomId};
use crate::domain::protocol::{Frame, WireFormat};
use crate::domain::room::{CloseInfo, InitContext, RoomHandlers};
use crate::ports::Connection;

use super::{ChannelConnection, RoomDirectory};

/// Close code reported when the peer vanished without a close frame.
const NO_STATUS_RECEIVED: u16 = 1005;

/// Per-connection limits applied at upgrade.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub default_format: WireFormat,
    pub outbound_buffer: usize,
    pub max_message_bytes: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            default_format: WireFormat::Json,
            outbound_buffer: 256,
            max_message_bytes: 64 * 1024,
        }
    }
}

/// State required for WebSocket handling.
pub struct WebSocketState<H: RoomHandlers> {
    pub directory: Arc<RoomDirectory<H>>,
    pub settings: ConnectionSettings,
}

impl<H: RoomHandlers> WebSocketState<H> {
    pub fn new(directory: Arc<RoomDirectory<H>>, settings: ConnectionSettings) -> Self {
        Self {
            directory,
            settings,
        }
    }
}

impl<H: RoomHandlers> Clone for WebSocketState<H> {
    fn clone(&self) -> Self {
        Self {
            directory: self.directory.clone(),
            settings: self.settings.clone(),
        }
    }
}

/// Handle WebSocket upgrade requests for a room.
///
/// Route: `GET /rooms/:room_id/ws?format=json|msgpack`
///
/// Remaining query parameters are passed to the room's init hook.
pub async fn ws_handler<H: RoomHandlers>(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<WebSocketState<H>>,
) -> Response {
    let room_id: RoomId = match room_id.parse() {
        Ok(id) => id,
        Err(e) => return (StatusCode::BAD_REQUEST, format!("Invalid room id: {e}")).into_response(),
    };

    let format = match WireFormat::from_query(
        params.get("format").map(String::as_str),
        state.settings.default_format,
    ) {
        Ok(format) => format,
        Err(e) => return (StatusCode::BAD_REQUEST, format!("Invalid format: {e}")).into_response(),
    };

    ws.max_message_size(state.settings.max_message_bytes)
        .on_upgrade(move |socket| handle_socket(socket, room_id, format, params, state))
}

/// Run one established connection until either side ends it.
async fn handle_socket<H: RoomHandlers>(
    socket: WebSocket,
    room_id: RoomId,
    format: WireFormat,
    params: HashMap<String, String>,
    state: WebSocketState<H>,
) {
    let (mut sink, mut stream) = socket.split();
    let (connection, mut outbound) = ChannelConnection::new(format, state.settings.outbound_buffer);
    let connection = Arc::new(connection);
    let connection_id = connection.id();

    // Writer first, so frames sent from the open hook are not lost.
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            let message = match frame {
                Frame::Text(text) => Message::Text(text),
                Frame::Binary(bytes) => Message::Binary(bytes),
            };
            if let Err(e) = sink.send(message).await {
                tracing::debug!(connection_id = %connection_id, "Send error, closing connection: {}", e);
                break;
            }
        }
        let _ = sink.send(Message::Close(None)).await;
    });

    let init = InitContext::new(room_id.clone(), connection_id, format).with_params(params);
    match state
        .directory
        .connect(&room_id, connection.clone(), init)
        .await
    {
        Ok(outcome) if outcome.is_admitted() => {
            tracing::debug!(room_id = %room_id, connection_id = %connection_id, ?outcome, "Connection admitted");
        }
        Ok(outcome) => {
            tracing::warn!(room_id = %room_id, connection_id = %connection_id, ?outcome, "Connection refused");
            connection.close();
            let _ = writer.await;
            return;
        }
        Err(e) => {
            tracing::warn!(room_id = %room_id, connection_id = %connection_id, error = %e, "Room unavailable");
            connection.close();
            let _ = writer.await;
            return;
        }
    }

    let ending = read_frames(&mut stream, &room_id, connection_id, &connection, &state).await;

    // Route the departure while the connection is still registered as open,
    // then let the writer flush and end.
    let routed = match ending {
        Ending::Closed(close) => state.directory.close(&room_id, connection_id, close).await,
        Ending::Failed(error) => state.directory.error(&room_id, connection_id, error).await,
    };
    if let Err(e) = routed {
        tracing::warn!(room_id = %room_id, connection_id = %connection_id, error = %e, "Failed to route disconnect");
    }
    connection.close();
    let _ = writer.await;
}

enum Ending {
    Closed(CloseInfo),
    Failed(String),
}

async fn read_frames<H: RoomHandlers>(
    stream: &mut futures::stream::SplitStream<WebSocket>,
    room_id: &RoomId,
    connection_id: ConnectionId,
    connection: &ChannelConnection,
    state: &WebSocketState<H>,
) -> Ending {
    while let Some(result) = stream.next().await {
        let frame = match result {
            Ok(Message::Text(text)) => Frame::Text(text),
            Ok(Message::Binary(bytes)) => Frame::Binary(bytes),
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Ok(Message::Close(frame)) => {
                tracing::debug!(connection_id = %connection_id, "Client sent close frame");
                return Ending::Closed(close_info(frame));
            }
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, "Receive error: {}", e);
                return Ending::Failed(e.to_string());
            }
        };

        if let Err(e) = state.directory.inbound(room_id, connection_id, frame).await {
            tracing::warn!(connection_id = %connection_id, error = %e, "Failed to route inbound frame");
            return Ending::Failed(e.to_string());
        }
        if !connection.is_open() {
            return Ending::Closed(CloseInfo::new(NO_STATUS_RECEIVED, "closed by room"));
        }
    }

    Ending::Closed(CloseInfo::new(NO_STATUS_RECEIVED, ""))
}

fn close_info(frame: Option<CloseFrame<'static>>) -> CloseInfo {
    match frame {
        Some(frame) => CloseInfo::new(frame.code, frame.reason.into_owned()),
        None => CloseInfo::new(NO_STATUS_RECEIVED, ""),
    }
}

/// Create axum router for the WebSocket endpoint.
pub fn websocket_router<H: RoomHandlers>() -> axum::Router<WebSocketState<H>> {
    use axum::routing::get;

    axum::Router::new().route("/rooms/:room_id/ws", get(ws_handler::<H>))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::attachments::InMemoryAttachmentStore;
    use crate::application::RoomActorSettings;
    use crate::rooms::ChatRoom;

    #[test]
    fn close_info_defaults_to_no_status() {
        assert_eq!(close_info(None).code, NO_STATUS_RECEIVED);
    }

    #[test]
    fn close_info_keeps_code_and_reason() {
        let info = close_info(Some(CloseFrame {
            code: 4001,
            reason: "bye".into(),
        }));
        assert_eq!(info, CloseInfo::new(4001, "bye"));
    }

    #[tokio::test]
    async fn websocket_state_shares_directory() {
        let directory = Arc::new(RoomDirectory::<ChatRoom>::new(
            Arc::new(|_: &RoomId| ChatRoom::default()),
            Arc::new(InMemoryAttachmentStore::new()),
            RoomActorSettings::default(),
        ));
        let state = WebSocketState::new(directory.clone(), ConnectionSettings::default());
        let cloned = state.clone();

        assert!(Arc::ptr_eq(&cloned.directory, &directory));
        let _router: axum::Router = websocket_router::<ChatRoom>().with_state(state);
    }
}

//! Health endpoint.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::adapters::websocket::{DirectoryStats, WebSocketState};
use crate::domain::room::RoomHandlers;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(flatten)]
    pub rooms: DirectoryStats,
}

pub async fn health<H: RoomHandlers>(State(state): State<WebSocketState<H>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        rooms: state.directory.stats().await,
    })
}

pub fn health_router<H: RoomHandlers>() -> Router<WebSocketState<H>> {
    Router::new().route("/health", get(health::<H>))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_flattens_room_counts() {
        let body = HealthResponse {
            status: "ok",
            version: "0.0.0",
            rooms: DirectoryStats {
                rooms: 2,
                live_rooms: 1,
                connections: 5,
                wakes: 3,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["rooms"], 2);
        assert_eq!(json["live_rooms"], 1);
        assert_eq!(json["connections"], 5);
    }
}

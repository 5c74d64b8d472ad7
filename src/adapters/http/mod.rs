//! HTTP adapters - the router the binary serves.
//!
//! Combines the WebSocket endpoint and the health endpoint behind the
//! shared middleware stack: request ids, tracing, CORS and a timeout on
//! plain HTTP requests.

pub mod health;

use axum::Router;
use http::{HeaderName, HeaderValue, Method};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::adapters::websocket::{websocket_router, WebSocketState};
use crate::config::ServerConfig;
use crate::domain::room::RoomHandlers;

pub use health::{health_router, HealthResponse};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Full application router.
pub fn app_router<H: RoomHandlers>(state: WebSocketState<H>, server: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id))
        .layer(cors_layer(server))
        .layer(TimeoutLayer::new(server.request_timeout()));

    Router::new()
        .merge(websocket_router::<H>())
        .merge(health_router::<H>())
        .layer(middleware)
        .with_state(state)
}

/// CORS from the configured origin list. Without one, development allows
/// any origin and production allows none.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() && !server.is_production() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::adapters::attachments::InMemoryAttachmentStore;
    use crate::adapters::websocket::{ConnectionSettings, RoomDirectory};
    use crate::application::RoomActorSettings;
    use crate::domain::foundation::RoomId;
    use crate::rooms::ChatRoom;

    fn app() -> Router {
        let directory = Arc::new(RoomDirectory::<ChatRoom>::new(
            Arc::new(|_: &RoomId| ChatRoom),
            Arc::new(InMemoryAttachmentStore::new()),
            RoomActorSettings::default(),
        ));
        app_router(
            WebSocketState::new(directory, ConnectionSettings::default()),
            &ServerConfig::default(),
        )
    }

    #[tokio::test]
    async fn health_reports_empty_directory() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["rooms"], 0);
    }

    #[tokio::test]
    async fn plain_get_on_socket_route_is_rejected() {
        let response = app()
            .oneshot(
                Request::get("/rooms/lobby/ws")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let response = app()
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

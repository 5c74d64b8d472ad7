//! Roomcast server binary.
//!
//! Serves the chat room at `/rooms/:room_id/ws` and a health check at
//! `/health`. All settings come from `ROOMCAST__*` environment variables.

use std::sync::Arc;

use roomcast::adapters::{
    app_router, FileAttachmentStore, InMemoryAttachmentStore, RoomDirectory, WebSocketState,
};
use roomcast::config::{RoomcastConfig, ServerConfig};
use roomcast::domain::foundation::RoomId;
use roomcast::ports::AttachmentStore;
use roomcast::rooms::ChatRoom;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = RoomcastConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let addr = config.server.socket_addr()?;
    tracing::info!(
        environment = ?config.server.environment,
        default_format = config.rooms.default_format.name(),
        idle_timeout = ?config.rooms.idle_timeout(),
        "Roomcast starting"
    );

    let attachments: Arc<dyn AttachmentStore> = match &config.rooms.attachment_dir {
        Some(dir) => {
            tracing::info!(path = %dir.display(), "Using file attachment store");
            Arc::new(FileAttachmentStore::new(dir))
        }
        None => {
            tracing::info!("Using in-memory attachment store");
            Arc::new(InMemoryAttachmentStore::new())
        }
    };

    let directory = Arc::new(RoomDirectory::<ChatRoom>::new(
        Arc::new(|_: &RoomId| ChatRoom),
        attachments,
        config.rooms.actor_settings(),
    ));
    let state = WebSocketState::new(directory, config.rooms.connection_settings());
    let app = app_router(state, &config.server);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Roomcast stopped");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if server.log_json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

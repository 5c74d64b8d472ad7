//! The pluggable room behaviour.

use serde::{de::DeserializeOwned, Serialize};

use crate::domain::protocol::{CodecError, MessageSchema};
use crate::domain::session::{SessionContext, SessionError};

use super::{CloseInfo, InitContext};

/// Result of a hook. Errors are logged by the caller and never fatal.
pub type HookResult = Result<(), SessionError>;

/// Room-specific logic: what a session holds and what messages mean.
///
/// # Contract
///
/// - `on_fresh_init` runs only for connections with no attachment. Resumed
///   sessions get their data back verbatim and no hook runs.
/// - Hooks that mutate data which must survive a restart call
///   [`SessionContext::update`] themselves.
/// - `on_close` runs while the session is still in the room, so it can read
///   its own data and broadcast a farewell.
pub trait RoomHandlers: Sized + Send + 'static {
    /// Per-connection data, persisted as the attachment.
    type Data: Serialize + DeserializeOwned + Send + 'static;
    /// Messages clients may send.
    type Inbound: MessageSchema;
    /// Messages the room sends.
    type Outbound: MessageSchema;

    /// Synthesize initial data for a new connection.
    fn on_fresh_init(&mut self, init: &InitContext) -> Self::Data;

    /// A fresh session has joined the room.
    fn on_open(&mut self, ctx: &mut SessionContext<'_, Self>) -> HookResult {
        let _ = ctx;
        Ok(())
    }

    /// A decoded, validated inbound message.
    fn on_message(&mut self, ctx: &mut SessionContext<'_, Self>, message: Self::Inbound)
        -> HookResult;

    /// An inbound message that failed to decode or validate.
    fn on_validation_error(
        &mut self,
        ctx: &mut SessionContext<'_, Self>,
        error: CodecError,
    ) -> HookResult {
        tracing::warn!(
            connection_id = %ctx.connection_id(),
            room_id = %ctx.room_id(),
            kind = error.kind(),
            error = %error,
            "Invalid inbound message"
        );
        Ok(())
    }

    /// The connection closed. Runs before the session leaves the room.
    fn on_close(&mut self, ctx: &mut SessionContext<'_, Self>, close: &CloseInfo) -> HookResult {
        let _ = (ctx, close);
        Ok(())
    }

    /// The transport reported an error. The session is removed afterwards.
    fn on_error(&mut self, ctx: &mut SessionContext<'_, Self>, error: &str) -> HookResult {
        tracing::warn!(
            connection_id = %ctx.connection_id(),
            room_id = %ctx.room_id(),
            error,
            "Connection error"
        );
        Ok(())
    }
}

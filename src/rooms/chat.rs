//! Chat room: members with display names, chat relay, ping.
//!
//! Protocol (JSON shown; MessagePack carries the same maps):
//!
//! ```text
//! client → server   {"type":"setName","name":"Alice"}
//!                   {"type":"chat","text":"hi"}
//!                   {"type":"ping"}
//!
//! server → client   welcome, userJoined, nameChanged, chat, userLeft,
//!                   pong, invalidMessage
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::domain::protocol::{rules, CodecError, MessageSchema, SchemaValidationError};
use crate::domain::room::{CloseInfo, HookResult, InitContext, RoomHandlers};
use crate::domain::session::SessionContext;

pub const MAX_NAME_CHARS: usize = 32;
pub const MAX_TEXT_CHARS: usize = 2000;

/// Session data for one chat member. This is what the attachment holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMember {
    pub user_id: String,
    pub name: String,
    /// Unix milliseconds.
    pub joined_at: i64,
}

// ============================================
// Client → Server Messages
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChatInbound {
    SetName { name: String },
    Chat { text: String },
    Ping,
}

impl MessageSchema for ChatInbound {
    fn message_type(&self) -> &'static str {
        match self {
            ChatInbound::SetName { .. } => "setName",
            ChatInbound::Chat { .. } => "chat",
            ChatInbound::Ping => "ping",
        }
    }

    fn validate(&self) -> Result<(), SchemaValidationError> {
        match self {
            ChatInbound::SetName { name } => validate_name("name", name),
            ChatInbound::Chat { text } => SchemaValidationError::collect(
                [
                    rules::non_empty("text", text),
                    rules::max_chars("text", text, MAX_TEXT_CHARS),
                ]
                .into_iter()
                .filter_map(Result::err)
                .collect(),
            ),
            ChatInbound::Ping => Ok(()),
        }
    }
}

// ============================================
// Server → Client Messages
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChatOutbound {
    #[serde(rename_all = "camelCase")]
    Welcome {
        user_id: String,
        name: String,
        members: usize,
    },
    #[serde(rename_all = "camelCase")]
    UserJoined { user_id: String, name: String },
    #[serde(rename_all = "camelCase")]
    NameChanged {
        user_id: String,
        old_name: String,
        new_name: String,
    },
    #[serde(rename_all = "camelCase")]
    Chat {
        user_id: String,
        name: String,
        text: String,
        sent_at: i64,
    },
    #[serde(rename_all = "camelCase")]
    UserLeft { user_id: String, name: String },
    Pong { timestamp: i64 },
    InvalidMessage { reason: String },
}

impl MessageSchema for ChatOutbound {
    fn message_type(&self) -> &'static str {
        match self {
            ChatOutbound::Welcome { .. } => "welcome",
            ChatOutbound::UserJoined { .. } => "userJoined",
            ChatOutbound::NameChanged { .. } => "nameChanged",
            ChatOutbound::Chat { .. } => "chat",
            ChatOutbound::UserLeft { .. } => "userLeft",
            ChatOutbound::Pong { .. } => "pong",
            ChatOutbound::InvalidMessage { .. } => "invalidMessage",
        }
    }

    fn validate(&self) -> Result<(), SchemaValidationError> {
        match self {
            ChatOutbound::NameChanged { new_name, .. } => validate_name("newName", new_name),
            ChatOutbound::Chat { text, .. } => rules::max_chars("text", text, MAX_TEXT_CHARS),
            ChatOutbound::InvalidMessage { reason } => rules::non_empty("reason", reason),
            _ => Ok(()),
        }
    }
}

fn validate_name(field: &str, name: &str) -> Result<(), SchemaValidationError> {
    rules::non_empty(field, name)?;
    rules::max_chars(field, name, MAX_NAME_CHARS)
}

/// The chat room's hooks.
#[derive(Debug, Clone, Default)]
pub struct ChatRoom;

impl ChatRoom {
    fn guest_name(init: &InitContext) -> String {
        let id = init.connection_id.to_string();
        format!("Guest-{}", &id[..4])
    }
}

impl RoomHandlers for ChatRoom {
    type Data = ChatMember;
    type Inbound = ChatInbound;
    type Outbound = ChatOutbound;

    fn on_fresh_init(&mut self, init: &InitContext) -> ChatMember {
        let name = init
            .param("name")
            .filter(|n| validate_name("name", n).is_ok())
            .map(str::to_string)
            .unwrap_or_else(|| Self::guest_name(init));

        ChatMember {
            user_id: init
                .param("userId")
                .map(str::to_string)
                .unwrap_or_else(|| init.connection_id.to_string()),
            name,
            joined_at: init.connected_at.as_unix_millis(),
        }
    }

    fn on_open(&mut self, ctx: &mut SessionContext<'_, Self>) -> HookResult {
        let member = ctx.data().clone();
        ctx.send(&ChatOutbound::Welcome {
            user_id: member.user_id.clone(),
            name: member.name.clone(),
            members: ctx.peer_count(),
        })?;
        ctx.broadcast(
            &ChatOutbound::UserJoined {
                user_id: member.user_id,
                name: member.name,
            },
            true,
        )?;
        Ok(())
    }

    fn on_message(&mut self, ctx: &mut SessionContext<'_, Self>, message: ChatInbound) -> HookResult {
        match message {
            ChatInbound::SetName { name } => {
                let old_name = std::mem::replace(&mut ctx.data_mut().name, name.clone());
                ctx.update()?;
                tracing::debug!(
                    room_id = %ctx.room_id(),
                    connection_id = %ctx.connection_id(),
                    "Member renamed"
                );
                ctx.broadcast(
                    &ChatOutbound::NameChanged {
                        user_id: ctx.data().user_id.clone(),
                        old_name,
                        new_name: name,
                    },
                    false,
                )?;
            }
            ChatInbound::Chat { text } => {
                let member = ctx.data();
                let message = ChatOutbound::Chat {
                    user_id: member.user_id.clone(),
                    name: member.name.clone(),
                    text,
                    sent_at: Timestamp::now().as_unix_millis(),
                };
                ctx.broadcast(&message, false)?;
            }
            ChatInbound::Ping => {
                ctx.send(&ChatOutbound::Pong {
                    timestamp: Timestamp::now().as_unix_millis(),
                })?;
            }
        }
        Ok(())
    }

    fn on_validation_error(
        &mut self,
        ctx: &mut SessionContext<'_, Self>,
        error: CodecError,
    ) -> HookResult {
        tracing::warn!(
            room_id = %ctx.room_id(),
            connection_id = %ctx.connection_id(),
            kind = error.kind(),
            error = %error,
            "Invalid chat message"
        );
        ctx.send(&ChatOutbound::InvalidMessage {
            reason: error.to_client_message(),
        })?;
        Ok(())
    }

    fn on_close(&mut self, ctx: &mut SessionContext<'_, Self>, _close: &CloseInfo) -> HookResult {
        let member = ctx.data().clone();
        ctx.broadcast(
            &ChatOutbound::UserLeft {
                user_id: member.user_id,
                name: member.name,
            },
            true,
        )?;
        Ok(())
    }
}

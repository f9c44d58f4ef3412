//! Telegram update handlers.
//!
//! Each handler is a thin adapter: it maps the update into `sw-core` domain
//! types and hands it to the `InteractionController`. Failures never reach
//! the dispatcher; the controller reports them to the chat itself.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use sw_core::domain::{ChatId, MessageId, MessageRef};

use crate::router::AppState;
mod callback;
mod commands;
mod text;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    callback::handle_callback(q, state).await
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        tracing::debug!(chat = msg.chat.id.0, "ignoring non-text message");
        return Ok(());
    };

    if text.starts_with('/') {
        return commands::handle_command(&msg, text, state).await;
    }
    text::handle_text(&msg, text, state).await
}

fn message_ref(msg: &Message) -> MessageRef {
    MessageRef {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
    }
}

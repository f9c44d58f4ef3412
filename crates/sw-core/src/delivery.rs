//! Best-effort message delivery shared by the sweep and the chat workflow.

use std::path::Path;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::{port::MessagingPort, types::InlineKeyboard},
};

/// Send `caption` as a photo caption when an artifact is available, falling
/// back to a plain text message. Failures are logged; `None` means nothing
/// reached the chat.
pub(crate) async fn send_photo_or_text(
    messenger: &dyn MessagingPort,
    chat: ChatId,
    photo: Option<&str>,
    caption: &str,
    keyboard: InlineKeyboard,
) -> Option<MessageRef> {
    if let Some(path) = photo.map(Path::new).filter(|p| p.exists()) {
        match messenger
            .send_photo(chat, path, caption, Some(keyboard.clone()))
            .await
        {
            Ok(msg) => return Some(msg),
            Err(e) => {
                tracing::warn!(chat = %chat, photo = %path.display(), "photo delivery failed, sending text: {e}");
            }
        }
    }
    send_text(messenger, chat, caption, keyboard).await
}

pub(crate) async fn send_text(
    messenger: &dyn MessagingPort,
    chat: ChatId,
    text: &str,
    keyboard: InlineKeyboard,
) -> Option<MessageRef> {
    match messenger.send_text(chat, text, Some(keyboard)).await {
        Ok(msg) => Some(msg),
        Err(e) => {
            tracing::warn!(chat = %chat, "message delivery failed: {e}");
            None
        }
    }
}

/// Delete a message; failures are logged and ignored.
pub(crate) async fn delete_quietly(messenger: &dyn MessagingPort, msg: MessageRef) {
    if let Err(e) = messenger.delete_message(msg).await {
        tracing::debug!(
            chat = %msg.chat_id,
            message_id = msg.message_id.0,
            "failed to delete message: {e}"
        );
    }
}

use std::sync::Arc;

use teloxide::prelude::*;

use sw_core::{
    domain::{ChatId, MessageId, MessageRef},
    menu::MenuAction,
};

use crate::router::AppState;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let messenger = state.controller.services().messenger.clone();

    // Always answer so the client stops its spinner.
    if let Err(e) = messenger.answer_callback_query(&q.id, None).await {
        tracing::debug!("answer_callback_query failed: {e}");
    }

    let Some(source) = q.message.as_ref().map(|m| MessageRef {
        chat_id: ChatId(m.chat.id.0),
        message_id: MessageId(m.id.0),
    }) else {
        return Ok(());
    };
    let data = q.data.as_deref().unwrap_or_default();

    let Some(action) = MenuAction::parse(data) else {
        tracing::warn!(chat = %source.chat_id, data = %data, "unknown callback data");
        return Ok(());
    };

    tracing::debug!(chat = %source.chat_id, ?action, "callback");
    state
        .controller
        .handle_action(source.chat_id, action, Some(source))
        .await;
    Ok(())
}

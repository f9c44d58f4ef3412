use std::sync::Arc;

use teloxide::prelude::*;

use crate::router::AppState;

use super::message_ref;

pub async fn handle_text(msg: &Message, text: &str, state: Arc<AppState>) -> ResponseResult<()> {
    let user_msg = message_ref(msg);
    let handled = state
        .controller
        .handle_text(user_msg.chat_id, user_msg, text)
        .await;
    if !handled {
        // Free text only means something right after "Add site".
        tracing::debug!(chat = %user_msg.chat_id, "ignoring text outside url capture");
    }
    Ok(())
}

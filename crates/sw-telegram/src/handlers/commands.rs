use std::sync::Arc;

use teloxide::prelude::*;

use sw_core::domain::ChatId;

use crate::router::AppState;

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub async fn handle_command(msg: &Message, text: &str, state: Arc<AppState>) -> ResponseResult<()> {
    let chat = ChatId(msg.chat.id.0);
    let (cmd, _args) = parse_command(text);

    match cmd.as_str() {
        "start" | "menu" | "help" => state.controller.start_session(chat).await,
        other => tracing::debug!(chat = %chat, command = other, "unknown command"),
    }
    Ok(())
}

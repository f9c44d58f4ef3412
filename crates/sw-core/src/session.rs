//! Per-chat transient UI state.
//!
//! Tracks which bot message is "current" (dismissed on the next menu
//! transition), the user's URL message, the one-shot "awaiting URL" capture
//! and the ids site buttons carry. Nothing here is persisted.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::{ChatId, MessageRef};

#[derive(Debug, Default)]
struct ChatState {
    last_bot_message: Option<MessageRef>,
    user_message: Option<MessageRef>,
    awaiting_url: bool,
    site_ids: HashMap<String, usize>,
    site_urls: HashMap<usize, String>,
    next_site_id: usize,
}

#[derive(Debug, Default)]
pub struct ChatSessions {
    chats: Mutex<HashMap<ChatId, ChatState>>,
}

impl ChatSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the message just sent; it will be dismissed on the next transition.
    pub async fn set_last_bot_message(&self, msg: MessageRef) {
        let mut chats = self.chats.lock().await;
        chats.entry(msg.chat_id).or_default().last_bot_message = Some(msg);
    }

    pub async fn take_last_bot_message(&self, chat: ChatId) -> Option<MessageRef> {
        let mut chats = self.chats.lock().await;
        chats.get_mut(&chat)?.last_bot_message.take()
    }

    pub async fn last_bot_message(&self, chat: ChatId) -> Option<MessageRef> {
        let chats = self.chats.lock().await;
        chats.get(&chat)?.last_bot_message
    }

    /// Forget `msg` if it is still the current one (e.g. the user dismissed it).
    pub async fn forget_bot_message(&self, msg: MessageRef) {
        let mut chats = self.chats.lock().await;
        if let Some(st) = chats.get_mut(&msg.chat_id) {
            if st.last_bot_message == Some(msg) {
                st.last_bot_message = None;
            }
        }
    }

    pub async fn set_user_message(&self, msg: MessageRef) {
        let mut chats = self.chats.lock().await;
        chats.entry(msg.chat_id).or_default().user_message = Some(msg);
    }

    pub async fn take_user_message(&self, chat: ChatId) -> Option<MessageRef> {
        let mut chats = self.chats.lock().await;
        chats.get_mut(&chat)?.user_message.take()
    }

    /// Arm the one-shot URL capture. A capture that is already armed is
    /// superseded, never queued; returns whether that happened.
    pub async fn begin_capture(&self, chat: ChatId) -> bool {
        let mut chats = self.chats.lock().await;
        let st = chats.entry(chat).or_default();
        std::mem::replace(&mut st.awaiting_url, true)
    }

    /// Consume the capture. True exactly once per `begin_capture`.
    pub async fn take_capture(&self, chat: ChatId) -> bool {
        let mut chats = self.chats.lock().await;
        chats
            .get_mut(&chat)
            .map(|st| std::mem::replace(&mut st.awaiting_url, false))
            .unwrap_or(false)
    }

    pub async fn is_awaiting_url(&self, chat: ChatId) -> bool {
        let chats = self.chats.lock().await;
        chats.get(&chat).map(|st| st.awaiting_url).unwrap_or(false)
    }

    /// Button id for `url`. A url keeps its id for the life of the session
    /// and an id never names another url.
    pub async fn site_id(&self, chat: ChatId, url: &str) -> usize {
        let mut chats = self.chats.lock().await;
        let st = chats.entry(chat).or_default();
        if let Some(&id) = st.site_ids.get(url) {
            return id;
        }
        let id = st.next_site_id;
        st.next_site_id += 1;
        st.site_ids.insert(url.to_string(), id);
        st.site_urls.insert(id, url.to_string());
        id
    }

    pub async fn site_url(&self, chat: ChatId, id: usize) -> Option<String> {
        let chats = self.chats.lock().await;
        chats.get(&chat)?.site_urls.get(&id).cloned()
    }
}

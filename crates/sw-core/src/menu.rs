//! Callback payloads and the inline keyboards built from them.
//!
//! Telegram caps callback data at 64 bytes, so site buttons carry the chat's
//! session id for the url (see `ChatSessions::site_id`) instead of the url itself.

use crate::messaging::types::{InlineButton, InlineKeyboard};

pub const MAX_CALLBACK_DATA_LEN: usize = 64;
const SITE_LABEL_MAX_LEN: usize = 48;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    AddSite,
    CancelAddSite,
    MySites,
    ClearAll,
    ConfirmClearAll,
    CancelClearAll,
    Back,
    /// "OK" under a change notification: delete that message.
    Dismiss,
    ViewSite(usize),
    DeleteSite(usize),
    RefreshSite(usize),
}

impl MenuAction {
    pub fn parse(data: &str) -> Option<Self> {
        let action = match data {
            "add_site" => MenuAction::AddSite,
            "cancel_add_site" => MenuAction::CancelAddSite,
            "my_sites" => MenuAction::MySites,
            "clear_all" => MenuAction::ClearAll,
            "confirm_clear_all" => MenuAction::ConfirmClearAll,
            "cancel_clear_all" => MenuAction::CancelClearAll,
            "back" => MenuAction::Back,
            "dismiss" => MenuAction::Dismiss,
            _ => {
                let (kind, id) = data.split_once(':')?;
                let id = id.parse::<usize>().ok()?;
                match kind {
                    "site" => MenuAction::ViewSite(id),
                    "delete" => MenuAction::DeleteSite(id),
                    "refresh" => MenuAction::RefreshSite(id),
                    _ => return None,
                }
            }
        };
        Some(action)
    }

    pub fn callback_data(&self) -> String {
        match self {
            MenuAction::AddSite => "add_site".to_string(),
            MenuAction::CancelAddSite => "cancel_add_site".to_string(),
            MenuAction::MySites => "my_sites".to_string(),
            MenuAction::ClearAll => "clear_all".to_string(),
            MenuAction::ConfirmClearAll => "confirm_clear_all".to_string(),
            MenuAction::CancelClearAll => "cancel_clear_all".to_string(),
            MenuAction::Back => "back".to_string(),
            MenuAction::Dismiss => "dismiss".to_string(),
            MenuAction::ViewSite(i) => format!("site:{i}"),
            MenuAction::DeleteSite(i) => format!("delete:{i}"),
            MenuAction::RefreshSite(i) => format!("refresh:{i}"),
        }
    }

    fn button(self, label: &str) -> InlineButton {
        InlineButton::new(label, self.callback_data())
    }
}

pub fn main_menu() -> InlineKeyboard {
    InlineKeyboard::new(vec![
        MenuAction::AddSite.button("Add site"),
        MenuAction::MySites.button("My sites"),
        MenuAction::ClearAll.button("Clear all"),
    ])
}

pub fn cancel_add() -> InlineKeyboard {
    InlineKeyboard::new(vec![MenuAction::CancelAddSite.button("Cancel")])
}

pub fn back() -> InlineKeyboard {
    InlineKeyboard::new(vec![MenuAction::Back.button("Back")])
}

pub fn acknowledge() -> InlineKeyboard {
    InlineKeyboard::new(vec![MenuAction::Dismiss.button("OK")])
}

pub fn confirm_clear_all() -> InlineKeyboard {
    InlineKeyboard::new(vec![
        MenuAction::ConfirmClearAll.button("Confirm"),
        MenuAction::CancelClearAll.button("Cancel"),
    ])
}

/// Actions for the site with button id `id`.
pub fn site_actions(id: usize) -> InlineKeyboard {
    InlineKeyboard::new(vec![
        MenuAction::DeleteSite(id).button("Delete site"),
        MenuAction::RefreshSite(id).button("Refresh all data"),
        MenuAction::Back.button("Back"),
    ])
}

/// One button per `(url, id)` pair, then "Back".
pub fn site_list<'a>(sites: impl IntoIterator<Item = (&'a str, usize)>) -> InlineKeyboard {
    let mut kb = InlineKeyboard::one_per_row(
        sites
            .into_iter()
            .map(|(url, id)| (url, MenuAction::ViewSite(id).callback_data())),
        SITE_LABEL_MAX_LEN,
    );
    kb.buttons.push(MenuAction::Back.button("Back"));
    kb
}

//! Chat workflow on top of the registry: menus, add/list/view/refresh/remove
//! and the two-step clear-all.
//!
//! Every transition dismisses the chat's current bot message and records the
//! new one. Collaborator failures end in a generic message to the user; they
//! never escape to the transport layer.

use crate::{
    delivery::{delete_quietly, send_photo_or_text},
    domain::{ChatId, MessageRef},
    errors::with_timeout,
    formatting,
    menu::{self, MenuAction},
    messaging::types::InlineKeyboard,
    model::{Observation, Site},
    services::Services,
    Error, Result,
};

pub struct InteractionController {
    svc: Services,
}

impl InteractionController {
    pub fn new(services: Services) -> Self {
        Self { svc: services }
    }

    pub fn services(&self) -> &Services {
        &self.svc
    }

    /// `/start`: drop any pending URL capture and show the main menu.
    pub async fn start_session(&self, chat: ChatId) {
        self.svc.sessions.take_capture(chat).await;
        self.show_main_menu(chat).await;
    }

    pub async fn show_main_menu(&self, chat: ChatId) {
        self.show(chat, formatting::WELCOME, menu::main_menu()).await;
    }

    /// Ask for a URL; the chat's next text message is taken as the answer.
    pub async fn begin_add_site(&self, chat: ChatId) {
        self.show(chat, formatting::ENTER_URL, menu::cancel_add())
            .await;
        if self.svc.sessions.begin_capture(chat).await {
            tracing::debug!(chat = %chat, "pending url capture superseded");
        }
    }

    pub async fn cancel_add_site(&self, chat: ChatId) {
        self.svc.sessions.take_capture(chat).await;
        self.show_main_menu(chat).await;
    }

    /// Free text from the user. Returns false when no URL capture was pending.
    pub async fn handle_text(&self, chat: ChatId, msg: MessageRef, text: &str) -> bool {
        if !self.svc.sessions.take_capture(chat).await {
            return false;
        }
        self.svc.sessions.set_user_message(msg).await;
        if let Err(e) = self.add_site(chat, text).await {
            tracing::info!(chat = %chat, "add site rejected: {e}");
        }
        true
    }

    /// Validate, inspect and register `raw_url`; the user sees the outcome.
    pub async fn add_site(&self, chat: ChatId, raw_url: &str) -> Result<Site> {
        let url = match normalize_url(raw_url) {
            Ok(u) => u,
            Err(e) => {
                self.show(chat, formatting::INVALID_URL, menu::back()).await;
                return Err(e);
            }
        };

        match self.svc.registry.get_site(chat, &url).await {
            Ok(_) => {
                self.show(chat, formatting::ALREADY_ADDED, menu::cancel_add())
                    .await;
                return Err(Error::AlreadyExists(url));
            }
            Err(Error::NotFound(_)) => {}
            Err(e) => {
                self.show(chat, formatting::ADD_FAILED, menu::back()).await;
                return Err(e);
            }
        }

        let added = match self.observe(&url).await {
            Ok(obs) => self.svc.registry.add_site(chat, &url, obs).await,
            Err(e) => Err(e),
        };
        let site = match added {
            Ok(site) => site,
            Err(e @ Error::AlreadyExists(_)) => {
                self.show(chat, formatting::ALREADY_ADDED, menu::cancel_add())
                    .await;
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(chat = %chat, url = %url, "adding site failed: {e}");
                self.show(chat, formatting::ADD_FAILED, menu::back()).await;
                return Err(e);
            }
        };
        tracing::info!(chat = %chat, url = %url, "site added");

        if let Some(user_msg) = self.svc.sessions.take_user_message(chat).await {
            delete_quietly(self.svc.messenger.as_ref(), user_msg).await;
        }
        self.show_photo(
            chat,
            site.screenshot_path.as_deref(),
            &formatting::site_added(&site),
            menu::back(),
        )
        .await;
        Ok(site)
    }

    pub async fn list_sites(&self, chat: ChatId) {
        let sites = match self.svc.registry.list_sites(chat).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(chat = %chat, "listing sites failed: {e}");
                self.show(chat, formatting::GENERIC_FAILURE, menu::back())
                    .await;
                return;
            }
        };

        if sites.is_empty() {
            self.show(chat, formatting::NO_SITES, menu::back()).await;
            return;
        }

        let mut ids = Vec::with_capacity(sites.len());
        for site in &sites {
            ids.push(self.svc.sessions.site_id(chat, &site.url).await);
        }
        let kb = menu::site_list(sites.iter().map(|s| s.url.as_str()).zip(ids));
        self.show(chat, formatting::CHOOSE_SITE, kb).await;
    }

    pub async fn view_site(&self, chat: ChatId, url: &str) {
        match self.svc.registry.get_site(chat, url).await {
            Ok(site) => {
                let id = self.svc.sessions.site_id(chat, url).await;
                self.show_photo(
                    chat,
                    site.screenshot_path.as_deref(),
                    &formatting::site_info(&site),
                    menu::site_actions(id),
                )
                .await;
            }
            Err(Error::NotFound(_)) => self.list_sites(chat).await,
            Err(e) => {
                tracing::warn!(chat = %chat, url = %url, "loading site failed: {e}");
                self.show(chat, formatting::GENERIC_FAILURE, menu::back())
                    .await;
            }
        }
    }

    /// Full re-inspection, certificate expiry and screenshot included; the
    /// stored site is replaced whether or not anything changed.
    pub async fn refresh_site(&self, chat: ChatId, url: &str) -> Result<Site> {
        if let Err(e) = self.svc.registry.get_site(chat, url).await {
            if matches!(e, Error::NotFound(_)) {
                self.list_sites(chat).await;
            } else {
                self.show(chat, formatting::REFRESH_FAILED, menu::back())
                    .await;
            }
            return Err(e);
        }

        let updated = match self.observe(url).await {
            Ok(obs) => self.svc.registry.update_site(chat, url, obs).await,
            Err(e) => Err(e),
        };
        match updated {
            Ok(site) => {
                tracing::info!(chat = %chat, url = %url, "site refreshed");
                self.view_site(chat, url).await;
                Ok(site)
            }
            Err(e) => {
                tracing::warn!(chat = %chat, url = %url, "refreshing site failed: {e}");
                self.show(chat, formatting::REFRESH_FAILED, menu::back())
                    .await;
                Err(e)
            }
        }
    }

    pub async fn remove_site(&self, chat: ChatId, url: &str) {
        match self.svc.registry.remove_site(chat, url).await {
            Ok(()) => {
                tracing::info!(chat = %chat, url = %url, "site removed");
                self.show(chat, &formatting::site_removed(url), menu::back())
                    .await;
            }
            Err(e) => {
                tracing::warn!(chat = %chat, url = %url, "removing site failed: {e}");
                self.show(chat, formatting::GENERIC_FAILURE, menu::back())
                    .await;
            }
        }
    }

    /// First step of clear-all: ask for confirmation.
    pub async fn prompt_clear_all(&self, chat: ChatId) {
        self.show(
            chat,
            formatting::CONFIRM_CLEAR_ALL,
            menu::confirm_clear_all(),
        )
        .await;
    }

    pub async fn clear_all(&self, chat: ChatId) {
        match self.svc.registry.clear_all(chat).await {
            Ok(()) => {
                tracing::info!(chat = %chat, "all sites cleared");
                self.show(chat, formatting::ALL_CLEARED, menu::back()).await;
            }
            Err(e) => {
                tracing::warn!(chat = %chat, "clearing sites failed: {e}");
                self.show(chat, formatting::GENERIC_FAILURE, menu::back())
                    .await;
            }
        }
    }

    /// Delete a bot message the user acknowledged.
    pub async fn dismiss(&self, msg: MessageRef) {
        delete_quietly(self.svc.messenger.as_ref(), msg).await;
        self.svc.sessions.forget_bot_message(msg).await;
    }

    /// Route a button press. `source` is the message carrying the button.
    pub async fn handle_action(&self, chat: ChatId, action: MenuAction, source: Option<MessageRef>) {
        match action {
            MenuAction::AddSite => self.begin_add_site(chat).await,
            MenuAction::CancelAddSite => self.cancel_add_site(chat).await,
            MenuAction::MySites => self.list_sites(chat).await,
            MenuAction::ClearAll => self.prompt_clear_all(chat).await,
            MenuAction::ConfirmClearAll => self.clear_all(chat).await,
            MenuAction::CancelClearAll | MenuAction::Back => self.show_main_menu(chat).await,
            MenuAction::Dismiss => {
                if let Some(msg) = source {
                    self.dismiss(msg).await;
                }
            }
            MenuAction::ViewSite(id) | MenuAction::DeleteSite(id) | MenuAction::RefreshSite(id) => {
                let Some(url) = self.svc.sessions.site_url(chat, id).await else {
                    // Id from an earlier session: show the current list.
                    self.list_sites(chat).await;
                    return;
                };
                match action {
                    MenuAction::ViewSite(_) => self.view_site(chat, &url).await,
                    MenuAction::DeleteSite(_) => self.remove_site(chat, &url).await,
                    _ => {
                        if let Err(e) = self.refresh_site(chat, &url).await {
                            tracing::debug!(chat = %chat, url = %url, "refresh from button failed: {e}");
                        }
                    }
                }
            }
        }
    }

    async fn observe(&self, url: &str) -> Result<Observation> {
        let t = self.svc.timeouts;
        let probe = with_timeout(t.inspect, "page inspection", async {
            Ok(self.svc.inspector.probe(url).await)
        })
        .await?;
        let cert_expiry = with_timeout(
            t.inspect,
            "certificate lookup",
            self.svc.inspector.fetch_cert_expiry(url),
        )
        .await?;

        let screenshot = match self
            .svc
            .artifacts
            .capture(self.svc.screenshotter.as_ref(), url, t.screenshot)
            .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(url = %url, "screenshot failed, continuing without it: {e}");
                None
            }
        };

        Ok(Observation::from_probe(probe, cert_expiry, screenshot))
    }

    async fn dismiss_last(&self, chat: ChatId) {
        if let Some(prev) = self.svc.sessions.take_last_bot_message(chat).await {
            delete_quietly(self.svc.messenger.as_ref(), prev).await;
        }
    }

    async fn show(&self, chat: ChatId, text: &str, keyboard: InlineKeyboard) {
        self.show_photo(chat, None, text, keyboard).await;
    }

    async fn show_photo(
        &self,
        chat: ChatId,
        photo: Option<&str>,
        caption: &str,
        keyboard: InlineKeyboard,
    ) {
        self.dismiss_last(chat).await;
        let sent = send_photo_or_text(
            self.svc.messenger.as_ref(),
            chat,
            photo,
            caption,
            keyboard,
        )
        .await;
        if let Some(msg) = sent {
            self.svc.sessions.set_last_bot_message(msg).await;
        }
    }
}

/// Trimmed absolute http(s) URL, otherwise `Error::InvalidUrl`.
///
/// The text is kept as typed (no re-serialization) because it is the
/// registry key the user will recognize.
pub fn normalize_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let parsed =
        url::Url::parse(trimmed).map_err(|e| Error::InvalidUrl(format!("{trimmed}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(Error::InvalidUrl(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

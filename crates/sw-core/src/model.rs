//! Persisted data model: monitored sites and the whole-registry document.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::domain::ChatId;

pub const TITLE_NOT_FOUND: &str = "Title not found";
pub const TITLE_FETCH_ERROR: &str = "Error fetching title";
pub const STATUS_FETCH_ERROR: &str = "Error fetching status";
pub const CERT_NOT_REQUIRED: &str = "Certificate not required";
pub const CERT_NOT_FOUND: &str = "Certificate not found";

/// Title sentinel for a page that answered with a non-success HTTP status.
pub fn title_http_error(status: u16) -> String {
    format!("Error: {status}")
}

/// Last observed HTTP status: a numeric code, or a sentinel string when the
/// request never produced a response.
///
/// Serialized untagged so the document keeps `200` / `"Error fetching status"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HttpStatus {
    Code(u16),
    Unavailable(String),
}

impl HttpStatus {
    pub fn fetch_error() -> Self {
        HttpStatus::Unavailable(STATUS_FETCH_ERROR.to_string())
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpStatus::Code(c) => write!(f, "{c}"),
            HttpStatus::Unavailable(s) => f.write_str(s),
        }
    }
}

/// One monitored URL for one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub url: String,
    pub title: String,
    pub status: HttpStatus,
    pub cert_expiry: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_path: Option<String>,
}

impl Site {
    pub fn new(url: impl Into<String>, obs: Observation) -> Self {
        Self {
            url: url.into(),
            title: obs.title,
            status: obs.status,
            cert_expiry: obs.cert_expiry,
            screenshot_path: obs.screenshot_path,
        }
    }

    /// Replace every observed field together.
    pub(crate) fn apply_observation(&mut self, obs: Observation) {
        self.title = obs.title;
        self.status = obs.status;
        self.cert_expiry = obs.cert_expiry;
        if obs.screenshot_path.is_some() {
            self.screenshot_path = obs.screenshot_path;
        }
    }

    /// Sweep write path: title and status only; certificate expiry is left as-is.
    pub(crate) fn apply_probe(&mut self, probe: Probe, screenshot_path: Option<String>) {
        self.title = probe.title;
        self.status = probe.status;
        if screenshot_path.is_some() {
            self.screenshot_path = screenshot_path;
        }
    }
}

/// Title + status, as refreshed by the periodic sweep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Probe {
    pub title: String,
    pub status: HttpStatus,
}

/// A full inspection: probe plus certificate expiry and the captured artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    pub title: String,
    pub status: HttpStatus,
    pub cert_expiry: String,
    pub screenshot_path: Option<String>,
}

impl Observation {
    pub fn from_probe(probe: Probe, cert_expiry: String, screenshot_path: Option<String>) -> Self {
        Self {
            title: probe.title,
            status: probe.status,
            cert_expiry,
            screenshot_path,
        }
    }
}

/// The whole persisted registry: chat id key -> sites in insertion order.
///
/// Keys are iterated in sorted order, which fixes the sweep order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteDocument {
    users: BTreeMap<String, Vec<Site>>,
}

impl SiteDocument {
    pub fn sites(&self, chat: ChatId) -> &[Site] {
        self.users
            .get(&chat.store_key())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn sites_mut(&mut self, chat: ChatId) -> Option<&mut Vec<Site>> {
        self.users.get_mut(&chat.store_key())
    }

    pub fn find(&self, chat: ChatId, url: &str) -> Option<&Site> {
        self.sites(chat).iter().find(|s| s.url == url)
    }

    pub fn find_mut(&mut self, chat: ChatId, url: &str) -> Option<&mut Site> {
        self.sites_mut(chat)?.iter_mut().find(|s| s.url == url)
    }

    /// Append to the user's list, creating the entry on first use.
    pub fn push(&mut self, chat: ChatId, site: Site) {
        self.users.entry(chat.store_key()).or_default().push(site);
    }

    /// Drop the user's entry entirely. Returns whether it existed.
    pub fn remove_user(&mut self, chat: ChatId) -> bool {
        self.users.remove(&chat.store_key()).is_some()
    }

    pub fn contains_user(&self, chat: ChatId) -> bool {
        self.users.contains_key(&chat.store_key())
    }

    /// Users in sweep order. Keys that are not chat ids are skipped.
    pub fn users(&self) -> impl Iterator<Item = (ChatId, &[Site])> {
        self.users
            .iter()
            .filter_map(|(k, v)| ChatId::from_store_key(k).map(|c| (c, v.as_slice())))
    }

    pub fn site_count(&self) -> usize {
        self.users.values().map(Vec::len).sum()
    }
}

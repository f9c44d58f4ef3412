//! Change detection between a stored site and a fresh probe.

use crate::model::{HttpStatus, Probe, Site};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeResult {
    NoChange,
    TitleChanged(String),
    StatusChanged(HttpStatus),
    BothChanged(String, HttpStatus),
}

/// Compare by exact equality. Sentinels are ordinary values here, and the
/// certificate expiry never takes part.
pub fn detect(stored: &Site, fresh: &Probe) -> ChangeResult {
    let title_changed = fresh.title != stored.title;
    let status_changed = fresh.status != stored.status;

    match (title_changed, status_changed) {
        (false, false) => ChangeResult::NoChange,
        (true, false) => ChangeResult::TitleChanged(fresh.title.clone()),
        (false, true) => ChangeResult::StatusChanged(fresh.status.clone()),
        (true, true) => ChangeResult::BothChanged(fresh.title.clone(), fresh.status.clone()),
    }
}

impl ChangeResult {
    pub fn is_change(&self) -> bool {
        !matches!(self, ChangeResult::NoChange)
    }

    /// Notification text; `None` when nothing changed.
    pub fn caption(&self, url: &str) -> Option<String> {
        let mut lines = vec![format!("Site: {url}")];
        match self {
            ChangeResult::NoChange => return None,
            ChangeResult::TitleChanged(t) => lines.push(format!("Title changed: {t}")),
            ChangeResult::StatusChanged(s) => lines.push(format!("Status changed: {s}")),
            ChangeResult::BothChanged(t, s) => {
                lines.push(format!("Title changed: {t}"));
                lines.push(format!("Status changed: {s}"));
            }
        }
        Some(lines.join("\n"))
    }
}

use std::{sync::Arc, time::Duration};

use crate::{
    artifacts::ArtifactStore,
    config::Config,
    messaging::port::MessagingPort,
    ports::{PageInspector, Screenshotter},
    registry::SiteRegistry,
    session::ChatSessions,
};

/// Upper bounds on the slow collaborator calls, per site.
#[derive(Clone, Copy, Debug)]
pub struct Timeouts {
    pub inspect: Duration,
    pub screenshot: Duration,
}

impl Timeouts {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            inspect: cfg.inspect_timeout,
            screenshot: cfg.screenshot_timeout,
        }
    }
}

/// Everything the sweep and the chat workflow share.
#[derive(Clone)]
pub struct Services {
    pub registry: Arc<SiteRegistry>,
    pub inspector: Arc<dyn PageInspector>,
    pub screenshotter: Arc<dyn Screenshotter>,
    pub artifacts: Arc<ArtifactStore>,
    pub messenger: Arc<dyn MessagingPort>,
    pub sessions: Arc<ChatSessions>,
    pub timeouts: Timeouts,
}

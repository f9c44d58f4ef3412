//! Periodic sweep over every monitored site.
//!
//! - Ticks on a fixed interval (first sweep one interval after start)
//! - Sweeps never overlap: a tick that fires mid-sweep is skipped, not queued
//! - Sites are checked one at a time, users in key order, sites in insertion order
//! - A failure on one site is logged and the sweep moves on

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    delivery::send_photo_or_text,
    detector::detect,
    domain::ChatId,
    errors::with_timeout,
    menu,
    model::Site,
    services::Services,
    Error, Result,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub checked: usize,
    pub changed: usize,
    pub notified: usize,
    pub failed: usize,
    /// Changed sites that were removed by their user while the sweep ran.
    pub removed: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Another sweep was still running.
    Skipped,
    Completed(SweepReport),
}

#[derive(Debug, PartialEq, Eq)]
enum SiteOutcome {
    Unchanged,
    Changed { notified: bool },
    Removed,
}

#[derive(Clone)]
pub struct SweepScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    services: Services,
    interval: Duration,
    sweeping: AtomicBool,
    state: tokio::sync::Mutex<SchedulerState>,
}

#[derive(Default)]
struct SchedulerState {
    ticker: Option<JoinHandle<()>>,
    cancel: Option<CancellationToken>,
}

/// Held for the duration of one sweep.
struct SweepGuard<'a>(&'a AtomicBool);

impl<'a> SweepGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| SweepGuard(flag))
    }
}

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SweepScheduler {
    pub fn new(services: Services, interval: Duration) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                services,
                interval,
                sweeping: AtomicBool::new(false),
                state: tokio::sync::Mutex::new(SchedulerState::default()),
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    pub fn is_sweeping(&self) -> bool {
        self.inner.sweeping.load(Ordering::SeqCst)
    }

    /// Start the ticker task, if not already running.
    pub async fn start(&self) {
        let mut st = self.inner.state.lock().await;
        if st.ticker.is_some() {
            return;
        }

        let tok = CancellationToken::new();
        st.cancel = Some(tok.clone());
        let scheduler = self.clone();
        let period = self.inner.interval;
        let handle = tokio::spawn(async move {
            let mut tick = interval_at(Instant::now() + period, period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                  _ = tok.cancelled() => break,
                  _ = tick.tick() => {
                    // Overlapping ticks become no-ops via the sweep guard.
                    let scheduler = scheduler.clone();
                    tokio::spawn(async move {
                      if let Err(e) = scheduler.run_sweep().await {
                        tracing::error!("sweep failed: {e}");
                      }
                    });
                  }
                }
            }
        });

        st.ticker = Some(handle);
        tracing::info!(interval_secs = period.as_secs(), "sweep scheduler started");
    }

    pub async fn stop(&self) {
        let mut st = self.inner.state.lock().await;
        if let Some(tok) = st.cancel.take() {
            tok.cancel();
        }
        st.ticker.take(); // let the task exit on cancellation
    }

    /// Run one sweep now, unless one is already in progress.
    pub async fn run_sweep(&self) -> Result<SweepOutcome> {
        let Some(_guard) = SweepGuard::acquire(&self.inner.sweeping) else {
            tracing::info!("previous sweep still running, skipping tick");
            return Ok(SweepOutcome::Skipped);
        };

        let started = Instant::now();
        let doc = self.inner.services.registry.snapshot().await?;

        let mut report = SweepReport::default();
        for (chat, sites) in doc.users() {
            for site in sites {
                report.checked += 1;
                match self.check_site(chat, site).await {
                    Ok(SiteOutcome::Unchanged) => {}
                    Ok(SiteOutcome::Changed { notified }) => {
                        report.changed += 1;
                        if notified {
                            report.notified += 1;
                        }
                    }
                    Ok(SiteOutcome::Removed) => {
                        report.changed += 1;
                        report.removed += 1;
                    }
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(chat = %chat, url = %site.url, "site check failed: {e}");
                    }
                }
            }
        }

        tracing::info!(
            checked = report.checked,
            changed = report.changed,
            notified = report.notified,
            failed = report.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "sweep finished"
        );
        Ok(SweepOutcome::Completed(report))
    }

    async fn check_site(&self, chat: ChatId, site: &Site) -> Result<SiteOutcome> {
        let svc = &self.inner.services;

        let probe = with_timeout(svc.timeouts.inspect, "page inspection", async {
            Ok(svc.inspector.probe(&site.url).await)
        })
        .await?;

        let change = detect(site, &probe);
        let Some(caption) = change.caption(&site.url) else {
            return Ok(SiteOutcome::Unchanged);
        };
        tracing::info!(chat = %chat, url = %site.url, ?change, "site changed");

        let screenshot = match svc
            .artifacts
            .capture(svc.screenshotter.as_ref(), &site.url, svc.timeouts.screenshot)
            .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(url = %site.url, "screenshot failed, notifying without it: {e}");
                None
            }
        };

        let delivered = send_photo_or_text(
            svc.messenger.as_ref(),
            chat,
            screenshot.as_deref(),
            &caption,
            menu::acknowledge(),
        )
        .await;
        if let Some(msg) = delivered {
            svc.sessions.set_last_bot_message(msg).await;
        }

        match svc
            .registry
            .record_probe(chat, &site.url, probe, screenshot)
            .await
        {
            Ok(_) => Ok(SiteOutcome::Changed {
                notified: delivered.is_some(),
            }),
            Err(Error::NotFound(_)) => {
                tracing::debug!(chat = %chat, url = %site.url, "site removed during sweep");
                Ok(SiteOutcome::Removed)
            }
            Err(e) => Err(e),
        }
    }
}

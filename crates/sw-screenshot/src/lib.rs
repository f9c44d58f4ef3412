//! Headless Chromium screenshot adapter.
//!
//! Each capture runs one `chromium --headless --screenshot=<tmp>` process,
//! reads the PNG it wrote and removes the temp file.

use std::{
    collections::VecDeque,
    path::PathBuf,
    process::Stdio,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use sw_core::{config::Config, errors::Error, ports::Screenshotter, Result};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
    sync::Mutex,
};

const STDERR_TAIL_MAX_BYTES: usize = 8 * 1024;
const STDERR_TAIL_MAX_LINES: usize = 50;

/// Extra wall time the page gets to settle after load, in milliseconds.
const VIRTUAL_TIME_BUDGET_MS: u64 = 5_000;

#[derive(Clone, Debug)]
pub struct ChromiumConfig {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub timeout: Duration,
    pub temp_dir: PathBuf,
}

impl ChromiumConfig {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            path: cfg.chromium_path.clone(),
            width: cfg.screenshot_width,
            height: cfg.screenshot_height,
            timeout: cfg.screenshot_timeout,
            temp_dir: cfg.temp_dir.clone(),
        }
    }
}

#[derive(Debug)]
pub struct ChromiumScreenshotter {
    cfg: ChromiumConfig,
    seq: AtomicU64,
}

#[derive(Clone, Debug, Default)]
struct StderrTail {
    lines: VecDeque<String>,
    bytes: usize,
}

impl StderrTail {
    fn push_line(&mut self, line: String) {
        // +1 for the '\n' we join with later.
        self.bytes = self.bytes.saturating_add(line.len() + 1);
        self.lines.push_back(line);

        while self.lines.len() > STDERR_TAIL_MAX_LINES || self.bytes > STDERR_TAIL_MAX_BYTES {
            if let Some(front) = self.lines.pop_front() {
                self.bytes = self.bytes.saturating_sub(front.len() + 1);
            } else {
                break;
            }
        }
    }

    fn snapshot(&self) -> String {
        self.lines.iter().cloned().collect::<Vec<_>>().join("\n")
    }
}

impl ChromiumScreenshotter {
    pub fn new(cfg: ChromiumConfig) -> Self {
        Self {
            cfg,
            seq: AtomicU64::new(0),
        }
    }

    fn temp_target(&self) -> PathBuf {
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        self.cfg
            .temp_dir
            .join(format!("shot-{}-{n}.png", std::process::id()))
    }

    fn build_args(&self, url: &str, target: &std::path::Path) -> Vec<String> {
        vec![
            "--headless=new".to_string(),
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--hide-scrollbars".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--no-first-run".to_string(),
            format!("--window-size={},{}", self.cfg.width, self.cfg.height),
            format!("--virtual-time-budget={VIRTUAL_TIME_BUDGET_MS}"),
            format!("--screenshot={}", target.display()),
            url.to_string(),
        ]
    }

    async fn run(&self, url: &str, target: &std::path::Path) -> Result<Vec<u8>> {
        let mut cmd = Command::new(&self.cfg.path);
        cmd.args(self.build_args(url, target))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            Error::External(format!(
                "failed to start browser {}: {e}",
                self.cfg.path.display()
            ))
        })?;

        // Drain stderr in background to avoid blocking on a full pipe.
        let stderr_tail = Arc::new(Mutex::new(StderrTail::default()));
        let drain = child.stderr.take().map(|stderr| {
            let tail = stderr_tail.clone();
            tokio::spawn(async move {
                let mut r = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = r.next_line().await {
                    tail.lock().await.push_line(line);
                }
            })
        });

        let status = match tokio::time::timeout(self.cfg.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(url = %url, "failed to kill browser process: {e}");
                }
                return Err(Error::Timeout(
                    self.cfg.timeout,
                    format!("screenshot of {url}"),
                ));
            }
        };

        if !status.success() {
            if let Some(drain) = drain {
                // The pipe closes with the process; give the reader a moment to finish.
                let _ = tokio::time::timeout(Duration::from_secs(1), drain).await;
            }
            let stderr = stderr_tail.lock().await.snapshot();
            if !stderr.trim().is_empty() {
                return Err(Error::External(format!(
                    "browser exited with status {status}\nstderr (tail):\n{stderr}"
                )));
            }
            return Err(Error::External(format!("browser exited with status {status}")));
        }

        let png = match tokio::fs::read(target).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::External(format!(
                    "browser wrote no screenshot for {url}"
                )))
            }
            Err(e) => return Err(Error::Io(e)),
        };
        if png.is_empty() {
            return Err(Error::External(format!("empty screenshot for {url}")));
        }
        Ok(png)
    }
}

#[async_trait]
impl Screenshotter for ChromiumScreenshotter {
    async fn capture(&self, url: &str) -> Result<Vec<u8>> {
        let target = self.temp_target();
        tracing::debug!(url = %url, target = %target.display(), "capturing screenshot");

        let res = self.run(url, &target).await;
        let _ = tokio::fs::remove_file(&target).await;
        res
    }
}

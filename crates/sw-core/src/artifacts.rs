//! Screenshot artifacts: one PNG per url, overwritten on every capture.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::{errors::with_timeout, ports::Screenshotter, Result};

#[derive(Clone, Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the artifact directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.png", sanitize_url(url)))
    }

    pub async fn save(&self, url: &str, png: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(url);
        tokio::fs::write(&path, png).await?;
        Ok(path)
    }

    /// Capture `url` under `limit` and store the result. Returns the stored path.
    pub async fn capture(
        &self,
        screenshotter: &dyn Screenshotter,
        url: &str,
        limit: Duration,
    ) -> Result<String> {
        let png = with_timeout(limit, "screenshot", screenshotter.capture(url)).await?;
        let path = self.save(url, &png).await?;
        Ok(path.to_string_lossy().into_owned())
    }
}

/// Every non-alphanumeric character becomes `_`.
pub fn sanitize_url(url: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let re = NON_ALNUM.get_or_init(|| Regex::new("[^a-zA-Z0-9]").expect("static regex"));
    re.replace_all(url, "_").into_owned()
}

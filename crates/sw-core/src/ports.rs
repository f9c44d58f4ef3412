//! Hexagonal ports for the collaborators the monitor drives.

use async_trait::async_trait;

use crate::{model::Probe, Result};

/// Fetches what the monitor compares: page title, HTTP status, certificate expiry.
///
/// `fetch_title` and `fetch_status` never fail: transport and HTTP failures
/// come back as sentinel values (see `crate::model`).
#[async_trait]
pub trait PageInspector: Send + Sync {
    async fn fetch_title(&self, url: &str) -> String;

    async fn fetch_status(&self, url: &str) -> crate::model::HttpStatus;

    /// Expiry of the TLS certificate, `CERT_NOT_REQUIRED` for non-https urls.
    /// Failing to reach the host at all is an error the caller reports.
    async fn fetch_cert_expiry(&self, url: &str) -> Result<String>;

    /// Title + status, in that order.
    async fn probe(&self, url: &str) -> Probe {
        let title = self.fetch_title(url).await;
        let status = self.fetch_status(url).await;
        Probe { title, status }
    }
}

/// Renders a page to an image (PNG bytes).
#[async_trait]
pub trait Screenshotter: Send + Sync {
    async fn capture(&self, url: &str) -> Result<Vec<u8>>;
}

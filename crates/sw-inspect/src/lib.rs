//! HTTP page inspector: title, status and TLS certificate expiry.
//!
//! Title and status failures are reported as sentinel values (the same text
//! the user sees); only a failed certificate lookup is an error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect::Policy, tls::TlsInfo, Client, Url};
use scraper::{Html, Selector};
use sw_core::{
    errors::Error,
    model::{
        title_http_error, HttpStatus, CERT_NOT_FOUND, CERT_NOT_REQUIRED, TITLE_FETCH_ERROR,
        TITLE_NOT_FOUND,
    },
    ports::PageInspector,
    Result,
};

/// `valid_to` layout, e.g. `Jan  1 00:00:00 2030 GMT`.
const CERT_TIME_FORMAT: &str = "%b %e %H:%M:%S %Y GMT";

#[derive(Clone, Debug)]
pub struct HttpPageInspector {
    http: Client,
    tls: Client,
}

impl HttpPageInspector {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .redirect(Policy::limited(10))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client: {e}")))?;

        // Expiry is reported for invalid certificates too.
        let tls = Client::builder()
            .user_agent(user_agent)
            .redirect(Policy::none())
            .timeout(timeout)
            .tls_info(true)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| Error::Config(format!("tls client: {e}")))?;

        Ok(Self { http, tls })
    }
}

#[async_trait]
impl PageInspector for HttpPageInspector {
    async fn fetch_title(&self, url: &str) -> String {
        let resp = match self.http.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(url = %url, "title request failed: {e}");
                return TITLE_FETCH_ERROR.to_string();
            }
        };

        let status = resp.status();
        if !status.is_success() {
            return title_http_error(status.as_u16());
        }

        match resp.text().await {
            Ok(body) => extract_title(&body),
            Err(e) => {
                tracing::warn!(url = %url, "reading page body failed: {e}");
                TITLE_FETCH_ERROR.to_string()
            }
        }
    }

    async fn fetch_status(&self, url: &str) -> HttpStatus {
        match self.http.get(url).send().await {
            Ok(resp) => HttpStatus::Code(resp.status().as_u16()),
            Err(e) => {
                tracing::warn!(url = %url, "status request failed: {e}");
                HttpStatus::fetch_error()
            }
        }
    }

    async fn fetch_cert_expiry(&self, url: &str) -> Result<String> {
        let Some(target) = cert_target(url)? else {
            return Ok(CERT_NOT_REQUIRED.to_string());
        };

        let resp = self
            .tls
            .get(target.clone())
            .send()
            .await
            .map_err(|e| Error::External(format!("tls request to {target} failed: {e}")))?;

        let der = resp
            .extensions()
            .get::<TlsInfo>()
            .and_then(|info| info.peer_certificate());
        let Some(der) = der else {
            return Ok(CERT_NOT_FOUND.to_string());
        };

        Ok(expiry_from_der(der).unwrap_or_else(|| {
            tracing::warn!(url = %url, "unreadable peer certificate");
            CERT_NOT_FOUND.to_string()
        }))
    }
}

/// Trimmed text of the first `<title>`, `TITLE_NOT_FOUND` when absent or blank.
pub fn extract_title(html: &str) -> String {
    let doc = Html::parse_document(html);
    let Ok(sel) = Selector::parse("title") else {
        return TITLE_NOT_FOUND.to_string();
    };
    doc.select(&sel)
        .next()
        .map(|n| n.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| TITLE_NOT_FOUND.to_string())
}

/// Root of the https host on port 443; `None` for any other scheme.
fn cert_target(url: &str) -> Result<Option<Url>> {
    if !url.starts_with("https") {
        return Ok(None);
    }
    let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| Error::InvalidUrl(url.to_string()))?;
    let target = Url::parse(&format!("https://{host}:443/"))
        .map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
    Ok(Some(target))
}

fn expiry_from_der(der: &[u8]) -> Option<String> {
    let (_, cert) = x509_parser::parse_x509_certificate(der).ok()?;
    format_expiry(cert.validity().not_after.timestamp())
}

fn format_expiry(unix_secs: i64) -> Option<String> {
    let at = chrono::DateTime::from_timestamp(unix_secs, 0)?;
    Some(at.format(CERT_TIME_FORMAT).to_string())
}

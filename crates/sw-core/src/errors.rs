/// Core error type for sitewatch.
///
/// Adapter crates map their specific errors into this type so the monitor
/// core can handle failures consistently (generic user-facing message vs
/// logged-and-skipped in the background sweep).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),

    #[error("timed out after {0:?}: {1}")]
    Timeout(std::time::Duration, String),

    #[error("site already registered: {0}")]
    AlreadyExists(String),

    #[error("site not found: {0}")]
    NotFound(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Run `fut` with an upper bound; elapsed deadlines become `Error::Timeout`.
pub async fn with_timeout<T, F>(limit: std::time::Duration, what: &str, fut: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(Error::Timeout(limit, what.to_string())),
    }
}

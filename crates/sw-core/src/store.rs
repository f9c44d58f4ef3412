//! Durable whole-document storage for the site registry.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{model::SiteDocument, Result};

/// Whole-document persistence port: load everything, save everything.
///
/// Implementations do not serialize callers; `SiteRegistry` holds the lock.
#[async_trait]
pub trait Store: Send + Sync {
    async fn load(&self) -> Result<SiteDocument>;
    async fn save(&self, doc: &SiteDocument) -> Result<()>;
}

/// Pretty-printed JSON file. A missing or blank file reads as an empty registry.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "userData.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl Store for JsonFileStore {
    async fn load(&self) -> Result<SiteDocument> {
        let txt = match tokio::fs::read_to_string(&self.path).await {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SiteDocument::default())
            }
            Err(e) => return Err(e.into()),
        };
        if txt.trim().is_empty() {
            return Ok(SiteDocument::default());
        }
        Ok(serde_json::from_str(&txt)?)
    }

    async fn save(&self, doc: &SiteDocument) -> Result<()> {
        let txt = serde_json::to_string_pretty(doc)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        // Readers never see a half-written document.
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, txt).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::ChatId,
        model::{HttpStatus, Observation, Site},
    };

    #[tokio::test]
    async fn missing_file_loads_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("userData.json"));
        assert_eq!(store.load().await.unwrap(), SiteDocument::default());
    }

    #[tokio::test]
    async fn saved_document_reads_back_and_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("userData.json");
        let store = JsonFileStore::new(&path);

        let mut doc = SiteDocument::default();
        doc.push(
            ChatId(42),
            Site::new(
                "http://example.com",
                Observation {
                    title: "Example".to_string(),
                    status: HttpStatus::Code(200),
                    cert_expiry: "Certificate not required".to_string(),
                    screenshot_path: Some("screenshots/http___example_com.png".to_string()),
                },
            ),
        );
        store.save(&doc).await.unwrap();

        assert_eq!(store.load().await.unwrap(), doc);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  \"42\": ["), "expected pretty JSON, got {raw}");
        assert!(raw.contains("\"screenshotPath\""));
        assert!(!store.tmp_path().exists());
    }

    #[tokio::test]
    async fn corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("userData.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = JsonFileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, crate::Error::Json(_)));
    }
}

//! Site registry over the whole-document `Store`.
//!
//! Every operation takes the single registry lock, loads the full document,
//! applies its change and saves the full document before releasing the lock.
//! Sweeps and chat interactions therefore never interleave at the document
//! level; the later writer wins.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    domain::ChatId,
    model::{Observation, Probe, Site, SiteDocument},
    store::Store,
    Error, Result,
};

pub struct SiteRegistry {
    store: Arc<dyn Store>,
    lock: Mutex<()>,
}

impl SiteRegistry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Full copy of the registry, as the sweep sees it at its start.
    pub async fn snapshot(&self) -> Result<SiteDocument> {
        let _guard = self.lock.lock().await;
        self.store.load().await
    }

    pub async fn list_sites(&self, chat: ChatId) -> Result<Vec<Site>> {
        let _guard = self.lock.lock().await;
        let doc = self.store.load().await?;
        Ok(doc.sites(chat).to_vec())
    }

    pub async fn get_site(&self, chat: ChatId, url: &str) -> Result<Site> {
        let _guard = self.lock.lock().await;
        let doc = self.store.load().await?;
        doc.find(chat, url)
            .cloned()
            .ok_or_else(|| Error::NotFound(url.to_string()))
    }

    /// Append a new site. A url the user already monitors is rejected untouched.
    pub async fn add_site(&self, chat: ChatId, url: &str, obs: Observation) -> Result<Site> {
        let _guard = self.lock.lock().await;
        let mut doc = self.store.load().await?;
        if doc.find(chat, url).is_some() {
            return Err(Error::AlreadyExists(url.to_string()));
        }
        let site = Site::new(url, obs);
        doc.push(chat, site.clone());
        self.store.save(&doc).await?;
        Ok(site)
    }

    /// Idempotent: an unknown url (or user) leaves the document as it was.
    pub async fn remove_site(&self, chat: ChatId, url: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.store.load().await?;
        let Some(sites) = doc.sites_mut(chat) else {
            return Ok(());
        };
        let before = sites.len();
        sites.retain(|s| s.url != url);
        if sites.len() == before {
            return Ok(());
        }
        if sites.is_empty() {
            doc.remove_user(chat);
        }
        self.store.save(&doc).await
    }

    pub async fn clear_all(&self, chat: ChatId) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.store.load().await?;
        if doc.remove_user(chat) {
            self.store.save(&doc).await?;
        }
        Ok(())
    }

    /// Replace title, status, certificate expiry (and screenshot, if one was
    /// captured) together.
    pub async fn update_site(&self, chat: ChatId, url: &str, obs: Observation) -> Result<Site> {
        self.mutate_site(chat, url, |site| site.apply_observation(obs))
            .await
    }

    /// Sweep write path: title and status only, screenshot when captured.
    pub async fn record_probe(
        &self,
        chat: ChatId,
        url: &str,
        probe: Probe,
        screenshot_path: Option<String>,
    ) -> Result<Site> {
        self.mutate_site(chat, url, |site| site.apply_probe(probe, screenshot_path))
            .await
    }

    async fn mutate_site(
        &self,
        chat: ChatId,
        url: &str,
        f: impl FnOnce(&mut Site),
    ) -> Result<Site> {
        let _guard = self.lock.lock().await;
        let mut doc = self.store.load().await?;
        let site = doc
            .find_mut(chat, url)
            .ok_or_else(|| Error::NotFound(url.to_string()))?;
        f(site);
        let updated = site.clone();
        self.store.save(&doc).await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{HttpStatus, CERT_NOT_REQUIRED},
        testing::MemoryStore,
    };

    fn obs(title: &str, status: u16) -> Observation {
        Observation {
            title: title.to_string(),
            status: HttpStatus::Code(status),
            cert_expiry: CERT_NOT_REQUIRED.to_string(),
            screenshot_path: Some(format!("screenshots/{title}.png")),
        }
    }

    fn registry() -> (Arc<MemoryStore>, SiteRegistry) {
        let store = Arc::new(MemoryStore::default());
        let reg = SiteRegistry::new(store.clone());
        (store, reg)
    }

    #[tokio::test]
    async fn add_then_get_returns_observed_values() {
        let (_, reg) = registry();
        let chat = ChatId(1);
        reg.add_site(chat, "http://example.com", obs("Example", 200))
            .await
            .unwrap();

        let site = reg.get_site(chat, "http://example.com").await.unwrap();
        assert_eq!(site.url, "http://example.com");
        assert_eq!(site.title, "Example");
        assert_eq!(site.status, HttpStatus::Code(200));
        assert_eq!(reg.list_sites(chat).await.unwrap(), vec![site]);
    }

    #[tokio::test]
    async fn duplicate_add_is_rejected_and_leaves_existing_site() {
        let (store, reg) = registry();
        let chat = ChatId(1);
        reg.add_site(chat, "http://a", obs("First", 200)).await.unwrap();
        let saves = store.save_count();

        let err = reg
            .add_site(chat, "http://a", obs("Second", 500))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(ref u) if u == "http://a"));

        let site = reg.get_site(chat, "http://a").await.unwrap();
        assert_eq!(site.title, "First");
        assert_eq!(site.status, HttpStatus::Code(200));
        assert_eq!(store.save_count(), saves);
    }

    #[tokio::test]
    async fn same_url_may_be_monitored_by_different_users() {
        let (_, reg) = registry();
        reg.add_site(ChatId(1), "http://a", obs("A", 200)).await.unwrap();
        reg.add_site(ChatId(2), "http://a", obs("A", 200)).await.unwrap();
        assert_eq!(reg.list_sites(ChatId(2)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sites_keep_insertion_order() {
        let (_, reg) = registry();
        let chat = ChatId(7);
        for url in ["http://c", "http://a", "http://b"] {
            reg.add_site(chat, url, obs("t", 200)).await.unwrap();
        }
        let urls: Vec<_> = reg
            .list_sites(chat)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.url)
            .collect();
        assert_eq!(urls, vec!["http://c", "http://a", "http://b"]);
    }

    #[tokio::test]
    async fn removing_unknown_url_is_a_no_op() {
        let (store, reg) = registry();
        let chat = ChatId(1);
        reg.add_site(chat, "http://a", obs("A", 200)).await.unwrap();
        let before = store.document();

        reg.remove_site(chat, "http://missing").await.unwrap();
        reg.remove_site(ChatId(99), "http://a").await.unwrap();

        assert_eq!(store.document(), before);
    }

    #[tokio::test]
    async fn removing_last_site_drops_user_entry() {
        let (store, reg) = registry();
        let chat = ChatId(1);
        reg.add_site(chat, "http://a", obs("A", 200)).await.unwrap();
        reg.add_site(chat, "http://b", obs("B", 200)).await.unwrap();

        reg.remove_site(chat, "http://a").await.unwrap();
        assert_eq!(reg.list_sites(chat).await.unwrap().len(), 1);

        reg.remove_site(chat, "http://b").await.unwrap();
        assert!(!store.document().contains_user(chat));
    }

    #[tokio::test]
    async fn clear_all_removes_user_key() {
        let (store, reg) = registry();
        let chat = ChatId(5);
        for url in ["http://a", "http://b", "http://c"] {
            reg.add_site(chat, url, obs("t", 200)).await.unwrap();
        }
        reg.add_site(ChatId(6), "http://a", obs("t", 200)).await.unwrap();

        reg.clear_all(chat).await.unwrap();

        assert!(reg.list_sites(chat).await.unwrap().is_empty());
        let doc = store.document();
        assert!(!doc.contains_user(chat));
        assert!(doc.contains_user(ChatId(6)));
    }

    #[tokio::test]
    async fn update_replaces_all_observed_fields() {
        let (_, reg) = registry();
        let chat = ChatId(1);
        reg.add_site(chat, "https://a", obs("Old", 200)).await.unwrap();

        let updated = reg
            .update_site(
                chat,
                "https://a",
                Observation {
                    title: "New".to_string(),
                    status: HttpStatus::Code(301),
                    cert_expiry: "Jun  1 00:00:00 2027 GMT".to_string(),
                    screenshot_path: Some("screenshots/new.png".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated, reg.get_site(chat, "https://a").await.unwrap());
        assert_eq!(updated.title, "New");
        assert_eq!(updated.status, HttpStatus::Code(301));
        assert_eq!(updated.cert_expiry, "Jun  1 00:00:00 2027 GMT");
        assert_eq!(updated.screenshot_path.as_deref(), Some("screenshots/new.png"));
    }

    #[tokio::test]
    async fn update_and_probe_on_missing_site_are_not_found() {
        let (_, reg) = registry();
        let err = reg
            .update_site(ChatId(1), "http://nope", obs("x", 200))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let err = reg
            .record_probe(
                ChatId(1),
                "http://nope",
                Probe {
                    title: "x".to_string(),
                    status: HttpStatus::Code(200),
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn failed_save_is_surfaced_and_not_applied() {
        let (store, reg) = registry();
        store.fail_saves(true);
        let err = reg
            .add_site(ChatId(1), "http://a", obs("A", 200))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));

        store.fail_saves(false);
        assert!(reg.list_sites(ChatId(1)).await.unwrap().is_empty());
    }
}

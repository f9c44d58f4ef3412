//! In-memory fakes for the ports, shared by the unit tests.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    messaging::{port::MessagingPort, types::InlineKeyboard},
    model::{HttpStatus, SiteDocument, CERT_NOT_REQUIRED},
    ports::{PageInspector, Screenshotter},
    store::Store,
    Error, Result,
};

pub const FAKE_CERT_EXPIRY: &str = "Jan  1 00:00:00 2030 GMT";

#[derive(Default)]
pub struct MemoryStore {
    doc: Mutex<SiteDocument>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn document(&self) -> SiteDocument {
        self.doc.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load(&self) -> Result<SiteDocument> {
        Ok(self.document())
    }

    async fn save(&self, doc: &SiteDocument) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only store",
            )));
        }
        *self.doc.lock().unwrap() = doc.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeInspector {
    pages: Mutex<HashMap<String, (String, HttpStatus)>>,
    cert_failures: Mutex<HashSet<String>>,
    probes: Mutex<Vec<String>>,
}

impl FakeInspector {
    pub fn set_page(&self, url: &str, title: &str, status: HttpStatus) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), (title.to_string(), status));
    }

    pub fn fail_cert_for(&self, url: &str) {
        self.cert_failures.lock().unwrap().insert(url.to_string());
    }

    /// Urls whose title was fetched, in call order.
    pub fn probed(&self) -> Vec<String> {
        self.probes.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageInspector for FakeInspector {
    async fn fetch_title(&self, url: &str) -> String {
        self.probes.lock().unwrap().push(url.to_string());
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .map(|(t, _)| t.clone())
            .unwrap_or_else(|| crate::model::TITLE_FETCH_ERROR.to_string())
    }

    async fn fetch_status(&self, url: &str) -> HttpStatus {
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .map(|(_, s)| s.clone())
            .unwrap_or_else(HttpStatus::fetch_error)
    }

    async fn fetch_cert_expiry(&self, url: &str) -> Result<String> {
        if self.cert_failures.lock().unwrap().contains(url) {
            return Err(Error::External(format!("tls handshake failed for {url}")));
        }
        if url.starts_with("https") {
            Ok(FAKE_CERT_EXPIRY.to_string())
        } else {
            Ok(CERT_NOT_REQUIRED.to_string())
        }
    }
}

#[derive(Default)]
pub struct FakeScreenshotter {
    failures: Mutex<HashSet<String>>,
    captures: Mutex<Vec<String>>,
}

impl FakeScreenshotter {
    pub fn fail_for(&self, url: &str) {
        self.failures.lock().unwrap().insert(url.to_string());
    }

    pub fn captured(&self) -> Vec<String> {
        self.captures.lock().unwrap().clone()
    }
}

#[async_trait]
impl Screenshotter for FakeScreenshotter {
    async fn capture(&self, url: &str) -> Result<Vec<u8>> {
        self.captures.lock().unwrap().push(url.to_string());
        if self.failures.lock().unwrap().contains(url) {
            return Err(Error::External(format!("browser crashed on {url}")));
        }
        Ok(b"\x89PNG\r\n\x1a\nfake".to_vec())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sent {
    Text {
        msg: MessageRef,
        text: String,
        keyboard: Option<InlineKeyboard>,
    },
    Photo {
        msg: MessageRef,
        path: PathBuf,
        caption: String,
        keyboard: Option<InlineKeyboard>,
    },
    Deleted(MessageRef),
}

impl Sent {
    pub fn body(&self) -> Option<&str> {
        match self {
            Sent::Text { text, .. } => Some(text),
            Sent::Photo { caption, .. } => Some(caption),
            Sent::Deleted(_) => None,
        }
    }

    pub fn message(&self) -> MessageRef {
        match self {
            Sent::Text { msg, .. } | Sent::Photo { msg, .. } | Sent::Deleted(msg) => *msg,
        }
    }

    pub fn keyboard(&self) -> Option<&InlineKeyboard> {
        match self {
            Sent::Text { keyboard, .. } | Sent::Photo { keyboard, .. } => keyboard.as_ref(),
            Sent::Deleted(_) => None,
        }
    }
}

pub struct FakeMessenger {
    next_id: AtomicI32,
    log: Mutex<Vec<Sent>>,
    fail_sends: AtomicBool,
    fail_photos: AtomicBool,
}

impl Default for FakeMessenger {
    fn default() -> Self {
        Self {
            next_id: AtomicI32::new(100),
            log: Mutex::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
            fail_photos: AtomicBool::new(false),
        }
    }
}

impl FakeMessenger {
    pub fn log(&self) -> Vec<Sent> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }

    /// Text messages and photos, without deletions.
    pub fn sends(&self) -> Vec<Sent> {
        self.log()
            .into_iter()
            .filter(|s| !matches!(s, Sent::Deleted(_)))
            .collect()
    }

    pub fn photos(&self) -> Vec<Sent> {
        self.log()
            .into_iter()
            .filter(|s| matches!(s, Sent::Photo { .. }))
            .collect()
    }

    pub fn deleted(&self) -> Vec<MessageRef> {
        self.log()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Deleted(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn last_body(&self) -> Option<String> {
        self.sends().last().and_then(|s| s.body().map(str::to_string))
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn fail_photos(&self, fail: bool) {
        self.fail_photos.store(fail, Ordering::SeqCst);
    }

    fn alloc(&self, chat_id: ChatId) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(self.next_id.fetch_add(1, Ordering::SeqCst)),
        }
    }

    fn send_failure() -> Error {
        Error::External("telegram error: Bad Gateway".to_string())
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(Self::send_failure());
        }
        let msg = self.alloc(chat_id);
        self.log.lock().unwrap().push(Sent::Text {
            msg,
            text: text.to_string(),
            keyboard,
        });
        Ok(msg)
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &Path,
        caption: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef> {
        if self.fail_sends.load(Ordering::SeqCst) || self.fail_photos.load(Ordering::SeqCst) {
            return Err(Self::send_failure());
        }
        let msg = self.alloc(chat_id);
        self.log.lock().unwrap().push(Sent::Photo {
            msg,
            path: photo.to_path_buf(),
            caption: caption.to_string(),
            keyboard,
        });
        Ok(msg)
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.log.lock().unwrap().push(Sent::Deleted(msg));
        Ok(())
    }

    async fn answer_callback_query(&self, _callback_id: &str, _text: Option<&str>) -> Result<()> {
        Ok(())
    }
}

/// Fully wired `Services` over the fakes, with a scratch artifact directory.
pub struct Harness {
    pub store: std::sync::Arc<MemoryStore>,
    pub inspector: std::sync::Arc<FakeInspector>,
    pub screenshotter: std::sync::Arc<FakeScreenshotter>,
    pub messenger: std::sync::Arc<FakeMessenger>,
    pub services: crate::services::Services,
    _artifacts_dir: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_inspector(std::sync::Arc::new(FakeInspector::default()))
    }

    pub fn with_inspector(inspector: std::sync::Arc<FakeInspector>) -> Self {
        Self::build(inspector.clone(), inspector)
    }

    /// Wire a custom inspector; `inspector` is still available for page setup
    /// when the custom one delegates to it.
    pub fn build(
        inspector: std::sync::Arc<FakeInspector>,
        port: std::sync::Arc<dyn PageInspector>,
    ) -> Self {
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::default());
        let screenshotter = Arc::new(FakeScreenshotter::default());
        let messenger = Arc::new(FakeMessenger::default());
        let services = crate::services::Services {
            registry: Arc::new(crate::registry::SiteRegistry::new(store.clone())),
            inspector: port,
            screenshotter: screenshotter.clone(),
            artifacts: Arc::new(crate::artifacts::ArtifactStore::new(dir.path())),
            messenger: messenger.clone(),
            sessions: Arc::new(crate::session::ChatSessions::new()),
            timeouts: crate::services::Timeouts {
                inspect: std::time::Duration::from_secs(2),
                screenshot: std::time::Duration::from_secs(2),
            },
        };
        Self {
            store,
            inspector,
            screenshotter,
            messenger,
            services,
            _artifacts_dir: dir,
        }
    }

    pub fn site(title: &str, status: u16, cert: &str) -> crate::model::Observation {
        crate::model::Observation {
            title: title.to_string(),
            status: HttpStatus::Code(status),
            cert_expiry: cert.to_string(),
            screenshot_path: None,
        }
    }
}

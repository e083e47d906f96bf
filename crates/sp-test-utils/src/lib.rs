//! Testing utilities for the stockpush workspace
//!
//! Scripted fakes for every remote seam, plus fixture folders of real images.

#![allow(missing_docs)]

use parking_lot::Mutex;
use serde_json::Value;
use sp_completion::{CompletionReply, CompletionRequest, CompletionTransport, TransportError};
use sp_enrich::{CaptionError, Captioner};
use sp_record::ImageRecord;
use sp_upload::{Cookie, DriverError, ElementRef, PageDriver};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Install a test subscriber honouring `RUST_LOG`; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Reply carrying a function call with the given arguments
pub fn function_reply(arguments: &Value) -> CompletionReply {
    CompletionReply::with_arguments(arguments.to_string())
}

/// Reply whose arguments are the given raw text
pub fn raw_reply(arguments: &str) -> CompletionReply {
    CompletionReply::with_arguments(arguments)
}

/// Valid keyword payload
pub fn keyword_reply(keywords: &[&str]) -> CompletionReply {
    function_reply(&serde_json::json!({ "gettyKeywords": keywords }))
}

/// Server error as a transport would report it
pub fn server_error() -> TransportError {
    TransportError::Status {
        status: 500,
        body: "internal error".to_string(),
    }
}

/// Completion transport answering from a script
///
/// Replies are handed out in order; once the script runs dry the fallback
/// is repeated. Every request is kept for inspection.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<CompletionReply, TransportError>>>,
    fallback: Option<CompletionReply>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport that always gives this reply
    pub fn always(reply: CompletionReply) -> Self {
        Self {
            fallback: Some(reply),
            ..Self::default()
        }
    }

    pub fn then_reply(self, reply: CompletionReply) -> Self {
        self.script.lock().push_back(Ok(reply));
        self
    }

    pub fn then_error(self, error: TransportError) -> Self {
        self.script.lock().push_back(Err(error));
        self
    }

    /// Number of requests sent so far
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    /// Share the transport so tests keep a handle for inspection
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait::async_trait]
impl CompletionTransport for ScriptedTransport {
    async fn send(&self, request: &CompletionRequest) -> Result<CompletionReply, TransportError> {
        self.requests.lock().push(request.clone());
        let next = self.script.lock().pop_front();
        match (next, &self.fallback) {
            (Some(result), _) => result,
            (None, Some(reply)) => Ok(reply.clone()),
            (None, None) => Err(TransportError::Decode("script exhausted".to_string())),
        }
    }
}

/// Captioner answering per image
///
/// Images are identified by the base64 payload of their data URI; tests
/// usually key by the fixture's file name through [`ScriptedCaptioner::for_folder`].
#[derive(Debug, Default)]
pub struct ScriptedCaptioner {
    by_payload: HashMap<String, Result<String, String>>,
    default: Option<String>,
    calls: Mutex<usize>,
}

impl ScriptedCaptioner {
    /// Captioner giving the same caption for every image
    pub fn always(caption: &str) -> Self {
        Self {
            default: Some(caption.to_string()),
            ..Self::default()
        }
    }

    /// Captioner keyed by files in a fixture folder
    ///
    /// `Ok` entries become captions, `Err` entries fail that image.
    pub fn for_folder(folder: &Path, script: &[(&str, Result<&str, &str>)]) -> Self {
        let by_payload = script
            .iter()
            .map(|(name, outcome)| {
                let record = ImageRecord::new(*name, folder);
                let bytes = std::fs::read(record.path()).unwrap();
                let uri = sp_record::data_uri(record.mime_type(), &bytes);
                let outcome = outcome.map(str::to_string).map_err(str::to_string);
                (payload_of(&uri).to_string(), outcome)
            })
            .collect();
        Self {
            by_payload,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

fn payload_of(uri: &str) -> &str {
    uri.split_once(',').map_or(uri, |(_, payload)| payload)
}

#[async_trait::async_trait]
impl Captioner for ScriptedCaptioner {
    async fn caption(&self, image_data_uri: &str) -> Result<String, CaptionError> {
        *self.calls.lock() += 1;
        match self.by_payload.get(payload_of(image_data_uri)) {
            Some(Ok(caption)) => Ok(caption.clone()),
            Some(Err(message)) => Err(CaptionError::Prediction {
                status: "failed".to_string(),
                message: message.clone(),
            }),
            None => self.default.clone().ok_or(CaptionError::EmptyOutput),
        }
    }
}

/// Something the fake page was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    Goto(String),
    AddCookie(String),
    Click(String),
    SendFile { selector: String, path: PathBuf },
    Close,
}

#[derive(Debug, Clone, Copy)]
struct Presence {
    /// Lookups that miss before the element appears
    misses: usize,
    /// Lookups that hit before it disappears again; `None` is forever
    hits: Option<usize>,
}

#[derive(Debug, Default)]
struct PageState {
    elements: HashMap<String, Presence>,
    actions: Vec<PageAction>,
    finds: usize,
}

/// In-memory page
///
/// Elements are keyed by selector. A selector can be made to appear only
/// after a number of lookups, to vanish after a number of lookups, or never
/// to appear at all.
#[derive(Debug, Default)]
pub struct FakePage {
    state: Mutex<PageState>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page where every listed selector is present right away
    pub fn with_elements(selectors: &[&str]) -> Self {
        let page = Self::new();
        for selector in selectors {
            page.show(selector);
        }
        page
    }

    pub fn show(&self, selector: &str) {
        self.show_after(selector, 0);
    }

    /// Make `selector` match only after `misses` unsuccessful lookups
    pub fn show_after(&self, selector: &str, misses: usize) {
        self.insert(selector, Presence { misses, hits: None });
    }

    /// Make `selector` match for `hits` lookups, then vanish
    pub fn show_for(&self, selector: &str, hits: usize) {
        self.insert(
            selector,
            Presence {
                misses: 0,
                hits: Some(hits),
            },
        );
    }

    fn insert(&self, selector: &str, presence: Presence) {
        self.state
            .lock()
            .elements
            .insert(selector.to_string(), presence);
    }

    pub fn hide(&self, selector: &str) {
        self.state.lock().elements.remove(selector);
    }

    pub fn actions(&self) -> Vec<PageAction> {
        self.state.lock().actions.clone()
    }

    /// Files sent to any input, in order
    pub fn sent_files(&self) -> Vec<PathBuf> {
        self.state
            .lock()
            .actions
            .iter()
            .filter_map(|a| match a {
                PageAction::SendFile { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn finds(&self) -> usize {
        self.state.lock().finds
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait::async_trait]
impl PageDriver for FakePage {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        self.state.lock().actions.push(PageAction::Goto(url.to_string()));
        Ok(())
    }

    async fn add_cookie(&self, cookie: &Cookie) -> Result<(), DriverError> {
        self.state
            .lock()
            .actions
            .push(PageAction::AddCookie(cookie.name.clone()));
        Ok(())
    }

    async fn find(&self, selector: &str) -> Result<Option<ElementRef>, DriverError> {
        let mut state = self.state.lock();
        state.finds += 1;
        let Some(presence) = state.elements.get_mut(selector) else {
            return Ok(None);
        };
        if presence.misses > 0 {
            presence.misses -= 1;
            return Ok(None);
        }
        match &mut presence.hits {
            Some(0) => Ok(None),
            Some(hits) => {
                *hits -= 1;
                Ok(Some(ElementRef::new(selector)))
            }
            None => Ok(Some(ElementRef::new(selector))),
        }
    }

    async fn click(&self, element: &ElementRef) -> Result<(), DriverError> {
        self.state
            .lock()
            .actions
            .push(PageAction::Click(element.id().to_string()));
        Ok(())
    }

    async fn send_file(&self, element: &ElementRef, path: &Path) -> Result<(), DriverError> {
        self.state.lock().actions.push(PageAction::SendFile {
            selector: element.id().to_string(),
            path: path.to_path_buf(),
        });
        Ok(())
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.state.lock().actions.push(PageAction::Close);
        Ok(())
    }
}

/// Temporary folder holding small real images with the given names
///
/// The encoding follows each name's extension.
///
/// Image `i` is `(i + 2) x (i + 1)` pixels so every file differs.
pub fn image_folder(names: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (i, name) in names.iter().enumerate() {
        let width = u32::try_from(i).unwrap() + 2;
        let image = image::RgbImage::from_pixel(width, width - 1, image::Rgb([200, 10, 10]));
        image.save(dir.path().join(name)).unwrap();
    }
    dir
}

/// Record that is ready for upload
pub fn enriched_record(folder: &Path, name: &str) -> ImageRecord {
    let mut record = ImageRecord::new(name, folder);
    record.description = Some(format!("photo {name}"));
    record.keywords = Some(vec!["stock".to_string(), "photo".to_string()]);
    record
}

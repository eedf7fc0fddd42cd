//! Observed Element Module
//!
//! Placeholder for an image or video whose source is filled in lazily.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique handle for an observed element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementId(u64);

impl ElementId {
    fn next() -> Self {
        Self(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "el-{}", self.0)
    }
}

// == Media Kind ==
/// What kind of placeholder the element is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classifies an asset by file extension; `None` for non-media files.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" => Some(MediaKind::Image),
            "mp4" | "webm" | "ogg" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

// == Load State ==
/// Lifecycle of an element: `Unobserved → Pending → Loaded | Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Unobserved,
    Pending,
    Loaded,
    Error,
}

impl LoadState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoadState::Loaded | LoadState::Error)
    }
}

/// Vertical extent of an element in page coordinates (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug)]
struct ElementView {
    state: LoadState,
    source: Option<String>,
    bounds: Rect,
}

// == Asset Element ==
/// An image/video placeholder carrying its asset id and target source.
///
/// Shared as `Arc<AssetElement>` between the page and the loader; the page
/// reads `state()`/`source()`, the loader drives transitions.
#[derive(Debug)]
pub struct AssetElement {
    id: ElementId,
    asset_id: String,
    target_source: String,
    kind: MediaKind,
    view: Mutex<ElementView>,
}

impl AssetElement {
    pub fn new(
        asset_id: impl Into<String>,
        target_source: impl Into<String>,
        kind: MediaKind,
        bounds: Rect,
    ) -> Self {
        Self {
            id: ElementId::next(),
            asset_id: asset_id.into(),
            target_source: target_source.into(),
            kind,
            view: Mutex::new(ElementView {
                state: LoadState::Unobserved,
                source: None,
                bounds,
            }),
        }
    }

    /// Element for `<prefix>/<asset_id>`, or `None` if the name is not an
    /// image or video.
    pub fn for_asset(prefix: &str, asset_id: &str, bounds: Rect) -> Option<Self> {
        let kind = MediaKind::from_name(asset_id)?;
        let source = format!("{}/{}", prefix.trim_end_matches('/'), asset_id);
        Some(Self::new(asset_id, source, kind, bounds))
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    pub fn target_source(&self) -> &str {
        &self.target_source
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn state(&self) -> LoadState {
        self.lock().state
    }

    /// Source currently rendered, if any.
    pub fn source(&self) -> Option<String> {
        self.lock().source.clone()
    }

    pub fn bounds(&self) -> Rect {
        self.lock().bounds
    }

    /// Moves the element, e.g. after a layout change.
    pub fn set_bounds(&self, bounds: Rect) {
        self.lock().bounds = bounds;
    }

    pub(crate) fn mark_pending(&self) {
        let mut view = self.lock();
        if !view.state.is_terminal() {
            view.state = LoadState::Pending;
        }
    }

    pub(crate) fn mark_loaded(&self) {
        let mut view = self.lock();
        view.source = Some(self.target_source.clone());
        view.state = LoadState::Loaded;
    }

    pub(crate) fn mark_error(&self) {
        self.lock().state = LoadState::Error;
    }

    fn lock(&self) -> MutexGuard<'_, ElementView> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

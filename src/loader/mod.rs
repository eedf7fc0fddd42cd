//! Loader Module
//!
//! Visibility-driven lazy materialization of gallery media.

mod element;
mod fetcher;
mod lazy;
mod visibility;

pub use element::{AssetElement, ElementId, LoadState, MediaKind, Rect};
pub use fetcher::{AssetFetcher, FetchedAsset, HttpAssetFetcher};
pub use lazy::{LazyLoader, VisibilityOutcome};
pub use visibility::{Viewport, VisibilityEvent, VisibilityTracker};

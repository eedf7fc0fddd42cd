//! Lazy Loader Module
//!
//! Materializes observed elements when they approach the viewport, asking
//! the coordinator before touching the network and deduplicating
//! concurrent fetches per asset id.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheCoordinator;
use crate::config::Config;
use crate::loader::{
    AssetElement, AssetFetcher, ElementId, HttpAssetFetcher, Viewport, VisibilityEvent,
    VisibilityTracker,
};

/// What a single visibility event led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityOutcome {
    /// Element is not (or no longer) observed
    NotObserved,
    /// Event was a transition out of view
    Ignored,
    /// Another load for the same asset id is in flight
    Deduplicated,
    /// Served from the cache without a network call
    FromCache,
    /// Fetched from the network and cached
    Fetched,
    /// Fetch failed; element is in the error state
    Failed,
}

#[derive(Debug)]
struct Observed {
    elements: HashMap<ElementId, Arc<AssetElement>>,
    tracker: VisibilityTracker,
}

// == Lazy Loader ==
/// Visibility-driven asset loader.
pub struct LazyLoader {
    coordinator: Arc<CacheCoordinator>,
    fetcher: Arc<dyn AssetFetcher>,
    observed: Mutex<Observed>,
    in_flight: Mutex<HashSet<String>>,
}

impl LazyLoader {
    // == Constructor ==
    /// Creates a loader that starts loading `lookahead_margin` pixels before
    /// an element scrolls into view.
    pub fn new(
        coordinator: Arc<CacheCoordinator>,
        fetcher: Arc<dyn AssetFetcher>,
        lookahead_margin: f64,
    ) -> Arc<Self> {
        Arc::new(Self {
            coordinator,
            fetcher,
            observed: Mutex::new(Observed {
                elements: HashMap::new(),
                tracker: VisibilityTracker::new(lookahead_margin),
            }),
            in_flight: Mutex::new(HashSet::new()),
        })
    }

    /// Creates a loader fetching from the configured origin.
    pub fn from_config(config: &Config, coordinator: Arc<CacheCoordinator>) -> Arc<Self> {
        Self::new(
            coordinator,
            Arc::new(HttpAssetFetcher::new(config.origin_url.clone())),
            f64::from(config.lookahead_margin),
        )
    }

    fn observed(&self) -> MutexGuard<'_, Observed> {
        self.observed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn in_flight(&self) -> MutexGuard<'_, HashSet<String>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Observe ==
    /// Registers an element for deferred materialization.
    ///
    /// Elements already in a terminal state are not registered again.
    pub fn observe(&self, element: Arc<AssetElement>) {
        if element.state().is_terminal() {
            debug!(element = %element.id(), "Skipping observe of finished element");
            return;
        }
        element.mark_pending();
        self.observed().elements.insert(element.id(), element);
    }

    // == Unobserve ==
    /// Stops observing an element. A fetch already running for it still
    /// completes and populates the cache, but is not applied to the element.
    pub fn unobserve(&self, id: ElementId) -> bool {
        let mut observed = self.observed();
        observed.tracker.forget(id);
        observed.elements.remove(&id).is_some()
    }

    pub fn is_observing(&self, id: ElementId) -> bool {
        self.observed().elements.contains_key(&id)
    }

    pub fn observed_count(&self) -> usize {
        self.observed().elements.len()
    }

    /// Asset ids with a load currently in progress.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight().len()
    }

    // == Viewport Changed ==
    /// Re-evaluates intersection for every observed element and spawns one
    /// load task per element that entered the look-ahead region.
    pub fn viewport_changed(self: &Arc<Self>, viewport: Viewport) -> Vec<JoinHandle<VisibilityOutcome>> {
        let events = {
            let mut guard = self.observed();
            let Observed { elements, tracker } = &mut *guard;
            let geometry: Vec<_> = elements.values().map(|el| (el.id(), el.bounds())).collect();
            tracker.update(viewport, geometry)
        };

        events
            .into_iter()
            .filter(|event| event.is_intersecting)
            .map(|event| {
                let loader = Arc::clone(self);
                tokio::spawn(async move { loader.handle_visibility(event).await })
            })
            .collect()
    }

    // == Handle Visibility ==
    /// Processes one intersection notification.
    pub async fn handle_visibility(&self, event: VisibilityEvent) -> VisibilityOutcome {
        if !event.is_intersecting {
            return VisibilityOutcome::Ignored;
        }

        let Some(element) = self.observed().elements.get(&event.element).cloned() else {
            return VisibilityOutcome::NotObserved;
        };
        let asset_id = element.asset_id().to_string();

        if !self.in_flight().insert(asset_id.clone()) {
            debug!(asset_id = %asset_id, "Load already in flight, dropping event");
            return VisibilityOutcome::Deduplicated;
        }

        if self.coordinator.is_cached(&asset_id) {
            debug!(asset_id = %asset_id, "Rendering from cache");
            element.mark_loaded();
            self.finish(&element);
            return VisibilityOutcome::FromCache;
        }

        match self.fetcher.fetch(element.target_source()).await {
            Ok(asset) => {
                if self.is_observing(element.id()) {
                    element.mark_loaded();
                } else {
                    debug!(asset_id = %asset_id, "Element unobserved during fetch, result not applied");
                }
                self.coordinator.put(&asset_id, asset.to_payload());
                info!(asset_id = %asset_id, size = asset.size, "Asset loaded");
                self.finish(&element);
                VisibilityOutcome::Fetched
            }
            Err(err) => {
                warn!(asset_id = %asset_id, error = %err, "Asset failed to load");
                if self.is_observing(element.id()) {
                    element.mark_error();
                }
                self.finish(&element);
                VisibilityOutcome::Failed
            }
        }
    }

    fn finish(&self, element: &AssetElement) {
        self.in_flight().remove(element.asset_id());
        self.unobserve(element.id());
    }
}

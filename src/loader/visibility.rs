//! Visibility Tracking Module
//!
//! Turns viewport geometry into intersection transitions, one event per
//! change, with a look-ahead margin around the viewport.

use std::collections::HashMap;

use crate::loader::{ElementId, Rect};

/// Visible window of the page, in the same coordinates as element bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub top: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    /// True if `rect` overlaps the viewport grown by `margin` on both edges.
    pub fn intersects(&self, rect: &Rect, margin: f64) -> bool {
        rect.top < self.top + self.height + margin && rect.bottom() > self.top - margin
    }
}

/// A change in whether an element intersects the look-ahead region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityEvent {
    pub element: ElementId,
    pub is_intersecting: bool,
}

impl VisibilityEvent {
    pub fn entered(element: ElementId) -> Self {
        Self {
            element,
            is_intersecting: true,
        }
    }

    pub fn left(element: ElementId) -> Self {
        Self {
            element,
            is_intersecting: false,
        }
    }
}

// == Visibility Tracker ==
/// Remembers the last known intersection state of each element.
///
/// Elements start out as not intersecting, so one already in view produces
/// an `entered` event on the first update.
#[derive(Debug)]
pub struct VisibilityTracker {
    margin: f64,
    intersecting: HashMap<ElementId, bool>,
}

impl VisibilityTracker {
    pub fn new(margin: f64) -> Self {
        Self {
            margin,
            intersecting: HashMap::new(),
        }
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Recomputes intersection for `elements` and returns the transitions.
    pub fn update<I>(&mut self, viewport: Viewport, elements: I) -> Vec<VisibilityEvent>
    where
        I: IntoIterator<Item = (ElementId, Rect)>,
    {
        let mut events = Vec::new();
        for (id, rect) in elements {
            let now = viewport.intersects(&rect, self.margin);
            let before = self.intersecting.insert(id, now).unwrap_or(false);
            if now != before {
                events.push(VisibilityEvent {
                    element: id,
                    is_intersecting: now,
                });
            }
        }
        events
    }

    /// Stops tracking an element.
    pub fn forget(&mut self, id: ElementId) {
        self.intersecting.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.intersecting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intersecting.is_empty()
    }
}

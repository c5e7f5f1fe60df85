//! Viewport visibility watching
//!
//! A [`VisibilityWatcher`] reports how much of a subject intersects the
//! viewport. Watchers are injected into primitives as a [`SharedWatcher`] so
//! tests can drive scroll positions deterministically.
//!
//! [`ViewportWatcher`] is the geometry-backed implementation: the host keeps
//! subject bounds and the viewport rectangle up to date and calls
//! [`ViewportWatcher::refresh`] after each layout or scroll. Each observation
//! is notified on its first evaluation and then whenever its intersection
//! ratio crosses the observation's threshold, in either direction.

use crate::error::{MotionError, Result};
use crate::geometry::Rect;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::rc::Rc;

new_key_type! {
    /// Handle to an active visibility observation
    pub struct ObserverId;
}

/// Opaque identifier of a renderable subject
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectId(u64);

impl SubjectId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Minimum fraction of a subject that must be inside the viewport to count
/// as visible, in (0, 1]
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Threshold(f64);

impl Threshold {
    /// Fraction used when nothing else is configured
    pub const DEFAULT: Threshold = Threshold(0.1);

    /// Fully visible
    pub const FULL: Threshold = Threshold(1.0);

    /// Validate a threshold
    pub fn new(value: f64) -> Result<Self> {
        if value > 0.0 && value <= 1.0 {
            Ok(Self(value))
        } else {
            Err(MotionError::InvalidThreshold(value))
        }
    }

    /// Saturate into (0, 1]; NaN falls back to the default
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            Self::DEFAULT
        } else {
            Self(value.clamp(f64::EPSILON, 1.0))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Check if a ratio meets this threshold
    pub fn is_met_by(self, ratio: f64) -> bool {
        ratio >= self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One visibility report for an observed subject
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntersectionEntry {
    pub subject: SubjectId,
    /// Fraction of the subject inside the viewport, in [0, 1]
    pub ratio: f64,
    /// Whether any part of the subject touches the viewport
    pub is_intersecting: bool,
}

/// Callback receiving visibility reports
pub type VisibilityCallback = Box<dyn FnMut(IntersectionEntry)>;

/// Visibility-watching capability injected into triggers
pub trait VisibilityWatcher {
    /// Start observing `subject`
    ///
    /// Returns [`MotionError::ObserverUnavailable`] if this runtime can't
    /// watch visibility at all.
    fn observe(
        &self,
        subject: SubjectId,
        threshold: Threshold,
        callback: VisibilityCallback,
    ) -> Result<ObserverId>;

    /// Stop an observation. Unknown or already-removed ids are ignored.
    fn unobserve(&self, observer: ObserverId);
}

/// Shared watcher handle passed to primitives
pub type SharedWatcher = Rc<dyn VisibilityWatcher>;

// ============================================================================
// ViewportWatcher
// ============================================================================

struct Observation {
    subject: SubjectId,
    threshold: Threshold,
    /// Taken out while the callback runs so it can re-enter the watcher
    callback: Option<VisibilityCallback>,
    /// Threshold state at the last notification, `None` before the first
    last_met: Option<bool>,
}

struct WatcherInner {
    viewport: Rect,
    root_margin: f64,
    bounds: FxHashMap<SubjectId, Rect>,
    observations: SlotMap<ObserverId, Observation>,
}

/// Geometry-backed visibility watcher
pub struct ViewportWatcher {
    inner: RefCell<WatcherInner>,
}

impl ViewportWatcher {
    /// Create a watcher for a viewport of the given size at scroll offset 0
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            inner: RefCell::new(WatcherInner {
                viewport: Rect::new(0.0, 0.0, width, height),
                root_margin: 0.0,
                bounds: FxHashMap::default(),
                observations: SlotMap::with_key(),
            }),
        }
    }

    /// Grow (or shrink, when negative) the effective viewport on every side
    pub fn with_root_margin(self, margin: f64) -> Self {
        self.inner.borrow_mut().root_margin = margin;
        self
    }

    pub fn shared(self) -> Rc<Self> {
        Rc::new(self)
    }

    pub fn viewport(&self) -> Rect {
        self.inner.borrow().viewport
    }

    pub fn set_viewport(&self, viewport: Rect) {
        self.inner.borrow_mut().viewport = viewport;
    }

    /// Scroll the viewport vertically to `y`
    pub fn scroll_to(&self, y: f64) {
        self.inner.borrow_mut().viewport.y = y;
    }

    pub fn scroll_by(&self, dy: f64) {
        self.inner.borrow_mut().viewport.y += dy;
    }

    /// Record a subject's laid-out bounds in page coordinates
    pub fn set_bounds(&self, subject: SubjectId, bounds: Rect) {
        self.inner.borrow_mut().bounds.insert(subject, bounds);
    }

    /// Forget a subject's bounds (it left the layout)
    pub fn remove_subject(&self, subject: SubjectId) {
        self.inner.borrow_mut().bounds.remove(&subject);
    }

    /// Current intersection ratio for a subject, `None` if it has no bounds
    pub fn ratio_of(&self, subject: SubjectId) -> Option<f64> {
        let inner = self.inner.borrow();
        let effective = inner.viewport.inflate(inner.root_margin);
        inner
            .bounds
            .get(&subject)
            .map(|bounds| bounds.visible_fraction_in(&effective))
    }

    /// Number of live observations
    pub fn observer_count(&self) -> usize {
        self.inner.borrow().observations.len()
    }

    /// Layout pass: evaluate every observation and notify crossings
    ///
    /// Subjects without bounds are skipped until they are laid out.
    /// Returns the number of notifications delivered.
    pub fn refresh(&self) -> usize {
        let ids: Vec<ObserverId> = self.inner.borrow().observations.keys().collect();
        let mut delivered = 0;

        for id in ids {
            let pending = {
                let mut inner = self.inner.borrow_mut();
                let effective = inner.viewport.inflate(inner.root_margin);
                let WatcherInner {
                    bounds,
                    observations,
                    ..
                } = &mut *inner;

                let Some(observation) = observations.get_mut(id) else {
                    continue;
                };
                let Some(subject_bounds) = bounds.get(&observation.subject) else {
                    continue;
                };

                let ratio = subject_bounds.visible_fraction_in(&effective);
                let met = observation.threshold.is_met_by(ratio);
                if observation.last_met == Some(met) {
                    continue;
                }
                observation.last_met = Some(met);

                let entry = IntersectionEntry {
                    subject: observation.subject,
                    ratio,
                    is_intersecting: subject_bounds.intersection(&effective).is_some(),
                };
                observation.callback.take().map(|callback| (entry, callback))
            };

            let Some((entry, mut callback)) = pending else {
                continue;
            };

            callback(entry);
            delivered += 1;

            // Put the callback back unless the observation was removed meanwhile
            if let Some(observation) = self.inner.borrow_mut().observations.get_mut(id) {
                observation.callback = Some(callback);
            }
        }

        delivered
    }
}

impl VisibilityWatcher for ViewportWatcher {
    fn observe(
        &self,
        subject: SubjectId,
        threshold: Threshold,
        callback: VisibilityCallback,
    ) -> Result<ObserverId> {
        let id = self.inner.borrow_mut().observations.insert(Observation {
            subject,
            threshold,
            callback: Some(callback),
            last_met: None,
        });
        tracing::trace!("ViewportWatcher: observing {:?} at {:?}", subject, threshold);
        Ok(id)
    }

    fn unobserve(&self, observer: ObserverId) {
        self.inner.borrow_mut().observations.remove(observer);
    }
}

/// Watcher for runtimes without any visibility support
///
/// Every `observe` fails, which makes triggers fall back to treating their
/// subject as immediately visible.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableWatcher;

impl VisibilityWatcher for UnavailableWatcher {
    fn observe(
        &self,
        _subject: SubjectId,
        _threshold: Threshold,
        _callback: VisibilityCallback,
    ) -> Result<ObserverId> {
        Err(MotionError::ObserverUnavailable(
            "no intersection observer in this runtime".to_string(),
        ))
    }

    fn unobserve(&self, _observer: ObserverId) {}
}

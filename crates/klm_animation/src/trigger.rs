//! One-shot viewport trigger
//!
//! [`ViewportTrigger`] reports exactly one "entered" event for a subject: the
//! first time its intersection ratio reaches the threshold. It stops observing
//! the moment it fires, so rapid scroll jitter can't deliver a second event,
//! and it never reports the subject leaving the viewport.
//!
//! If the watcher can't observe at all, the trigger degrades by firing on
//! mount, so content never stays hidden forever.

use klm_core::{
    IntersectionEntry, ObserverId, SharedWatcher, SubjectId, Threshold, VisibilityWatcher,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// The single event a trigger emits
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnterEvent {
    pub subject: SubjectId,
    /// Intersection ratio that satisfied the threshold
    pub ratio: f64,
    /// True when visibility was assumed because no observer was available
    pub assumed: bool,
}

/// Lifecycle of a trigger
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerState {
    /// Observing, not yet fired
    Watching,
    /// Fired; no longer observing
    Fired,
}

struct TriggerInner {
    watcher: SharedWatcher,
    subject: SubjectId,
    threshold: Threshold,
    observer: Cell<Option<ObserverId>>,
    fired: Cell<bool>,
    on_enter: RefCell<Option<Box<dyn FnOnce(EnterEvent)>>>,
}

impl TriggerInner {
    fn handle_entry(inner: &Rc<Self>, entry: IntersectionEntry) {
        if inner.fired.get() || !inner.threshold.is_met_by(entry.ratio) {
            return;
        }

        TriggerInner::fire(
            inner,
            EnterEvent {
                subject: entry.subject,
                ratio: entry.ratio,
                assumed: false,
            },
        );
    }

    fn fire(inner: &Rc<Self>, event: EnterEvent) {
        if inner.fired.replace(true) {
            return;
        }

        if let Some(observer) = inner.observer.take() {
            inner.watcher.unobserve(observer);
        }

        tracing::debug!(
            "ViewportTrigger: {:?} entered at ratio {:.2}{}",
            event.subject,
            event.ratio,
            if event.assumed { " (assumed)" } else { "" }
        );

        let on_enter = inner.on_enter.borrow_mut().take();
        if let Some(on_enter) = on_enter {
            on_enter(event);
        }
    }
}

/// Fires `on_enter` once, the first time a subject becomes visible
///
/// Dropping the trigger detaches its observer. A trigger dropped before it
/// fires never calls `on_enter`.
pub struct ViewportTrigger {
    inner: Rc<TriggerInner>,
}

impl ViewportTrigger {
    /// Start watching `subject`
    ///
    /// `on_enter` may run synchronously from inside `mount` when the watcher
    /// is unavailable.
    pub fn mount<F>(
        watcher: SharedWatcher,
        subject: SubjectId,
        threshold: Threshold,
        on_enter: F,
    ) -> Self
    where
        F: FnOnce(EnterEvent) + 'static,
    {
        let inner = Rc::new(TriggerInner {
            watcher: watcher.clone(),
            subject,
            threshold,
            observer: Cell::new(None),
            fired: Cell::new(false),
            on_enter: RefCell::new(Some(Box::new(on_enter))),
        });

        let weak = Rc::downgrade(&inner);
        let observed = watcher.observe(
            subject,
            threshold,
            Box::new(move |entry| match weak.upgrade() {
                Some(inner) => TriggerInner::handle_entry(&inner, entry),
                None => tracing::trace!("ViewportTrigger: report for disposed {:?}", entry.subject),
            }),
        );

        match observed {
            Ok(observer) => {
                if inner.fired.get() {
                    // Watcher reported synchronously and we already fired
                    watcher.unobserve(observer);
                } else {
                    inner.observer.set(Some(observer));
                }
            }
            Err(err) => {
                tracing::warn!(
                    "ViewportTrigger: {}; treating {:?} as visible",
                    err,
                    subject
                );
                TriggerInner::fire(
                    &inner,
                    EnterEvent {
                        subject,
                        ratio: 1.0,
                        assumed: true,
                    },
                );
            }
        }

        Self { inner }
    }

    pub fn subject(&self) -> SubjectId {
        self.inner.subject
    }

    pub fn threshold(&self) -> Threshold {
        self.inner.threshold
    }

    pub fn has_fired(&self) -> bool {
        self.inner.fired.get()
    }

    pub fn state(&self) -> TriggerState {
        if self.inner.fired.get() {
            TriggerState::Fired
        } else {
            TriggerState::Watching
        }
    }

    /// Check if an observer is still attached
    pub fn is_observing(&self) -> bool {
        self.inner.observer.get().is_some()
    }
}

impl Drop for ViewportTrigger {
    fn drop(&mut self) {
        if let Some(observer) = self.inner.observer.take() {
            self.inner.watcher.unobserve(observer);
            tracing::debug!(
                "ViewportTrigger: {:?} unmounted before entering",
                self.inner.subject
            );
        }
        self.inner.on_enter.borrow_mut().take();
    }
}

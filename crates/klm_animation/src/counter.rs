//! Scroll-triggered counter
//!
//! Counts from zero to a target the first time the subject scrolls into
//! view, then stays pinned at the target. Re-entering the viewport later
//! changes nothing.
//!
//! ```text
//!   Idle ──(entered)──▶ Running ──(progress == 1)──▶ Done
//! ```

use crate::interpolate::{Interpolation, InterpolatorHandle, Rounding, Tick, TimeInterpolator};
use crate::trigger::ViewportTrigger;
use klm_core::{Millis, SharedClock, SharedWatcher, SubjectId, Threshold};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Counter settings
#[derive(Clone, Debug, PartialEq)]
pub struct CounterConfig {
    pub target: f64,
    pub duration_ms: Millis,
    pub threshold: Threshold,
    pub rounding: Rounding,
    /// Appended to the number by [`CounterAnimation::display`]
    pub suffix: String,
}

impl CounterConfig {
    /// Count to `target` over two seconds once 10% of the subject is visible
    pub fn new(target: f64) -> Self {
        Self {
            target,
            duration_ms: 2000.0,
            threshold: Threshold::DEFAULT,
            rounding: Rounding::Floor,
            suffix: String::new(),
        }
    }

    pub fn duration_ms(mut self, duration_ms: Millis) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }
}

/// Where a counter is in its lifecycle
pub enum CounterPhase {
    /// Not yet seen; value is 0
    Idle,
    /// Counting
    Running(InterpolatorHandle),
    /// Terminal; value pinned at the final value
    Done(f64),
}

/// Field-less view of [`CounterPhase`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterStatus {
    Idle,
    Running,
    Done,
}

struct CounterInner {
    clock: SharedClock,
    config: CounterConfig,
    phase: RefCell<CounterPhase>,
    value: Cell<f64>,
    trigger: RefCell<Option<ViewportTrigger>>,
    on_change: RefCell<Option<Box<dyn FnMut(f64)>>>,
}

impl CounterInner {
    fn begin(inner: &Rc<Self>) {
        if !matches!(*inner.phase.borrow(), CounterPhase::Idle) {
            return;
        }

        let weak = Rc::downgrade(inner);
        let interpolation = Interpolation::new(0.0, inner.config.target, inner.config.duration_ms)
            .rounding(inner.config.rounding);
        let handle = TimeInterpolator::run(inner.clock.clone(), interpolation, move |tick| {
            if let Some(inner) = weak.upgrade() {
                CounterInner::apply_tick(&inner, tick);
            }
        });

        tracing::debug!(
            "CounterAnimation: counting to {} over {}ms",
            inner.config.target,
            inner.config.duration_ms
        );
        *inner.phase.borrow_mut() = CounterPhase::Running(handle);
    }

    fn apply_tick(inner: &Rc<Self>, tick: Tick) {
        if !matches!(*inner.phase.borrow(), CounterPhase::Running(_)) {
            return;
        }

        let changed = inner.value.replace(tick.value) != tick.value;

        if tick.is_final() {
            // Dropping the handle here is fine; the runner checks for it
            let finished = inner.phase.replace(CounterPhase::Done(tick.value));
            drop(finished);
            tracing::debug!("CounterAnimation: done at {}", tick.value);
        }

        if changed {
            let listener = inner.on_change.borrow_mut().take();
            if let Some(mut listener) = listener {
                listener(tick.value);
                let mut slot = inner.on_change.borrow_mut();
                if slot.is_none() {
                    *slot = Some(listener);
                }
            }
        }
    }
}

/// A number that counts up once its subject becomes visible
///
/// Dropping the counter detaches its observer and cancels any pending frame.
pub struct CounterAnimation {
    inner: Rc<CounterInner>,
}

impl CounterAnimation {
    /// Mount a counter on `subject`
    pub fn mount(
        clock: SharedClock,
        watcher: SharedWatcher,
        subject: SubjectId,
        config: CounterConfig,
    ) -> Self {
        let threshold = config.threshold;
        let inner = Rc::new(CounterInner {
            clock,
            config,
            phase: RefCell::new(CounterPhase::Idle),
            value: Cell::new(0.0),
            trigger: RefCell::new(None),
            on_change: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let trigger = ViewportTrigger::mount(watcher, subject, threshold, move |_event| {
            if let Some(inner) = weak.upgrade() {
                CounterInner::begin(&inner);
            }
        });
        *inner.trigger.borrow_mut() = Some(trigger);

        Self { inner }
    }

    /// Listen for value changes
    pub fn on_change<F>(self, listener: F) -> Self
    where
        F: FnMut(f64) + 'static,
    {
        *self.inner.on_change.borrow_mut() = Some(Box::new(listener));
        self
    }

    /// Current displayed value
    pub fn value(&self) -> f64 {
        self.inner.value.get()
    }

    pub fn target(&self) -> f64 {
        self.inner.config.target
    }

    pub fn config(&self) -> &CounterConfig {
        &self.inner.config
    }

    pub fn status(&self) -> CounterStatus {
        match *self.inner.phase.borrow() {
            CounterPhase::Idle => CounterStatus::Idle,
            CounterPhase::Running(_) => CounterStatus::Running,
            CounterPhase::Done(_) => CounterStatus::Done,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status() == CounterStatus::Done
    }

    /// Value with the configured suffix, e.g. `"100h/mês"`
    ///
    /// Whole numbers are printed without a decimal point.
    pub fn display(&self) -> String {
        let value = self.value();
        if value.fract() == 0.0 {
            format!("{}{}", value as i64, self.inner.config.suffix)
        } else {
            format!("{:.1}{}", value, self.inner.config.suffix)
        }
    }
}

impl Drop for CounterAnimation {
    fn drop(&mut self) {
        // Detach the observer and cancel the pending frame in one step
        self.inner.trigger.borrow_mut().take();
        self.inner.phase.replace(CounterPhase::Idle);
        self.inner.on_change.borrow_mut().take();
    }
}

//! Time-based interpolation
//!
//! [`Interpolation`] is the pure state: start, end, duration, and when it
//! started. Progress is always derived from absolute elapsed time, never from
//! counting frames, so a run takes the same wall-clock duration at 30Hz, 60Hz,
//! or with dropped frames.
//!
//! [`TimeInterpolator::run`] drives an interpolation from the frame clock and
//! reports each sampled value until the end value is reached:
//!
//! ```rust
//! use klm_animation::interpolate::{Interpolation, TimeInterpolator};
//! use klm_core::{AnimationClock, SharedClock};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let clock = Rc::new(AnimationClock::manual());
//! let last = Rc::new(Cell::new(0.0));
//!
//! let sink = last.clone();
//! let run = TimeInterpolator::run(
//!     clock.clone() as SharedClock,
//!     Interpolation::counter(100.0, 2000.0),
//!     move |tick| sink.set(tick.value),
//! );
//!
//! clock.run_for(2000.0, 16.0);
//! assert_eq!(last.get(), 100.0);
//! assert!(run.is_finished());
//! ```

use crate::easing::Easing;
use klm_core::{FrameRequest, Millis, SharedClock};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// How sampled values are rounded
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rounding {
    /// Continuous values, no rounding
    #[default]
    Linear,
    /// Whole-number steps toward the end value (counters)
    ///
    /// `start + floor(progress * (end - start))`. The end value itself is
    /// only emitted once progress reaches 1, even when it is fractional.
    Floor,
}

/// One sampled frame of an interpolation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    pub value: f64,
    /// Linear (un-eased) progress in [0, 1]
    pub progress: f64,
}

impl Tick {
    /// The last tick of a run always carries the exact end value
    pub fn is_final(&self) -> bool {
        self.progress >= 1.0
    }
}

/// Numeric transition from `start` to `end` over `duration_ms`
#[derive(Clone, Debug, PartialEq)]
pub struct Interpolation {
    start: f64,
    end: f64,
    duration_ms: Millis,
    easing: Easing,
    rounding: Rounding,
    started_at: Option<Millis>,
    current: f64,
}

impl Interpolation {
    pub fn new(start: f64, end: f64, duration_ms: Millis) -> Self {
        Self {
            start,
            end,
            duration_ms,
            easing: Easing::Linear,
            rounding: Rounding::Linear,
            started_at: None,
            current: start,
        }
    }

    /// Whole-number count from zero to `end`
    pub fn counter(end: f64, duration_ms: Millis) -> Self {
        Self::new(0.0, end, duration_ms).rounding(Rounding::Floor)
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration_ms(&self) -> Millis {
        self.duration_ms
    }

    pub fn started_at(&self) -> Option<Millis> {
        self.started_at
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// The most recently sampled value (`start` until first sampled)
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Mark the start time. Later calls keep the first timestamp.
    pub fn start_at(&mut self, now: Millis) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    /// Linear progress at `now`, in [0, 1]
    ///
    /// Zero, negative, or NaN durations complete immediately.
    pub fn progress_at(&self, now: Millis) -> f64 {
        let Some(started_at) = self.started_at else {
            return 0.0;
        };

        if !(self.duration_ms > 0.0) {
            return 1.0;
        }

        ((now - started_at) / self.duration_ms).clamp(0.0, 1.0)
    }

    /// Value at a given linear progress
    pub fn value_at_progress(&self, progress: f64) -> f64 {
        if progress >= 1.0 {
            return self.end;
        }

        // Overshooting beziers and floored negative deltas both land outside
        let (lo, hi) = if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        };

        let delta = (self.end - self.start) * self.easing.apply(progress);
        let value = match self.rounding {
            Rounding::Linear => self.start + delta,
            Rounding::Floor => self.start + delta.floor(),
        };
        value.clamp(lo, hi)
    }

    /// Sample at `now`, updating the current value
    pub fn sample(&mut self, now: Millis) -> Tick {
        let progress = self.progress_at(now);
        let value = if self.started_at.is_some() {
            self.value_at_progress(progress)
        } else {
            self.start
        };
        self.current = value;
        Tick { value, progress }
    }
}

// ============================================================================
// TimeInterpolator
// ============================================================================

struct RunnerInner {
    clock: SharedClock,
    interpolation: RefCell<Interpolation>,
    on_tick: RefCell<Box<dyn FnMut(Tick)>>,
    pending: Cell<Option<FrameRequest>>,
    stopped: Cell<bool>,
    finished: Cell<bool>,
}

impl RunnerInner {
    fn schedule(inner: &Rc<Self>) {
        let weak = Rc::downgrade(inner);
        let request = inner.clock.request_frame(Box::new(move |now| {
            if let Some(inner) = weak.upgrade() {
                RunnerInner::on_frame(&inner, now);
            }
        }));
        inner.pending.set(Some(request));
    }

    fn on_frame(inner: &Rc<Self>, now: Millis) {
        inner.pending.set(None);
        if inner.stopped.get() {
            return;
        }

        let tick = inner.interpolation.borrow_mut().sample(now);
        {
            let mut on_tick = inner.on_tick.borrow_mut();
            (*on_tick)(tick);
        }

        if tick.is_final() {
            inner.finished.set(true);
            inner.stopped.set(true);
            tracing::trace!("TimeInterpolator: finished at {}", tick.value);
        } else if !inner.stopped.get() {
            // The tick callback may have stopped us; only continue if not
            RunnerInner::schedule(inner);
        }
    }

    fn stop(&self) {
        self.stopped.set(true);
        if let Some(request) = self.pending.take() {
            self.clock.cancel(request);
        }
    }
}

/// Drives an [`Interpolation`] from the frame clock
pub struct TimeInterpolator;

impl TimeInterpolator {
    /// Start `interpolation` now and call `on_tick` every frame until done
    ///
    /// The start time is captured immediately; the first tick arrives on the
    /// next frame. The final tick always carries the exact end value, after
    /// which no further frames are requested. Dropping the returned handle
    /// cancels the run.
    pub fn run<F>(
        clock: SharedClock,
        mut interpolation: Interpolation,
        on_tick: F,
    ) -> InterpolatorHandle
    where
        F: FnMut(Tick) + 'static,
    {
        interpolation.start_at(clock.now());

        let inner = Rc::new(RunnerInner {
            clock,
            interpolation: RefCell::new(interpolation),
            on_tick: RefCell::new(Box::new(on_tick)),
            pending: Cell::new(None),
            stopped: Cell::new(false),
            finished: Cell::new(false),
        });
        RunnerInner::schedule(&inner);

        InterpolatorHandle { inner }
    }
}

/// Owner of a running interpolation; dropping it cancels the run
pub struct InterpolatorHandle {
    inner: Rc<RunnerInner>,
}

impl InterpolatorHandle {
    /// The most recently emitted value
    pub fn current(&self) -> f64 {
        self.inner.interpolation.borrow().current()
    }

    /// Linear progress at the clock's current time
    pub fn progress(&self) -> f64 {
        let now = self.inner.clock.now();
        self.inner.interpolation.borrow().progress_at(now)
    }

    pub fn started_at(&self) -> Option<Millis> {
        self.inner.interpolation.borrow().started_at()
    }

    /// Check if the final value has been emitted
    pub fn is_finished(&self) -> bool {
        self.inner.finished.get()
    }

    /// Check if frames are still being requested
    pub fn is_running(&self) -> bool {
        !self.inner.stopped.get()
    }

    /// Stop without emitting any further ticks
    pub fn stop(&self) {
        self.inner.stop();
    }
}

impl Drop for InterpolatorHandle {
    fn drop(&mut self) {
        self.inner.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use klm_core::AnimationClock;

    fn collect(
        clock: &Rc<AnimationClock>,
        interpolation: Interpolation,
    ) -> (InterpolatorHandle, Rc<RefCell<Vec<Tick>>>) {
        let ticks = Rc::new(RefCell::new(Vec::new()));
        let sink = ticks.clone();
        let handle = TimeInterpolator::run(clock.clone(), interpolation, move |tick| {
            sink.borrow_mut().push(tick)
        });
        (handle, ticks)
    }

    #[test]
    fn test_value_before_start_is_start() {
        let mut interpolation = Interpolation::new(10.0, 20.0, 100.0);
        assert_eq!(interpolation.current(), 10.0);
        assert_eq!(interpolation.sample(500.0).value, 10.0);
        assert_eq!(interpolation.progress_at(500.0), 0.0);
    }

    #[test]
    fn test_floor_rounding_counts_whole_numbers() {
        let mut interpolation = Interpolation::counter(100.0, 2000.0);
        interpolation.start_at(0.0);

        assert_eq!(interpolation.sample(0.0).value, 0.0);
        assert_eq!(interpolation.sample(1000.0).value, 50.0);
        assert_eq!(interpolation.sample(1999.0).value, 99.0);
        assert_eq!(interpolation.sample(2000.0).value, 100.0);
        assert_eq!(interpolation.sample(9000.0).value, 100.0);
    }

    #[test]
    fn test_floor_with_fractional_target() {
        let mut interpolation = Interpolation::counter(99.5, 1000.0);
        interpolation.start_at(0.0);

        assert_eq!(interpolation.sample(999.0).value, 99.0);
        assert_eq!(interpolation.sample(1000.0).value, 99.5);
    }

    #[test]
    fn test_counting_down_is_non_increasing() {
        let mut interpolation = Interpolation::new(100.0, 0.0, 1000.0).rounding(Rounding::Floor);
        interpolation.start_at(0.0);

        let mut last = f64::INFINITY;
        for t in (0..=1000).step_by(7) {
            let value = interpolation.sample(t as f64).value;
            assert!(value <= last);
            assert!((0.0..=100.0).contains(&value));
            last = value;
        }
        assert_eq!(interpolation.sample(1000.0).value, 0.0);
    }

    #[test]
    fn test_floor_never_passes_fractional_end() {
        let mut interpolation = Interpolation::new(10.0, -3.5, 1000.0).rounding(Rounding::Floor);
        interpolation.start_at(0.0);

        assert_eq!(interpolation.sample(990.0).value, -3.5);
        assert_eq!(interpolation.sample(1000.0).value, -3.5);
    }

    #[test]
    fn test_invalid_duration_jumps_to_end() {
        for duration in [0.0, -50.0, f64::NAN] {
            let mut interpolation = Interpolation::new(0.0, 42.0, duration);
            interpolation.start_at(0.0);
            let tick = interpolation.sample(0.0);
            assert!(tick.is_final());
            assert_eq!(tick.value, 42.0);
        }
    }

    #[test]
    fn test_run_ends_exactly_on_end_value() {
        let clock = Rc::new(AnimationClock::manual());
        let (handle, ticks) = collect(&clock, Interpolation::new(3.0, 17.0, 500.0));

        clock.run_for(600.0, 16.0);

        let ticks = ticks.borrow();
        let last = ticks.last().unwrap();
        assert_eq!(last.value, 17.0);
        assert!(last.is_final());
        assert_eq!(ticks.iter().filter(|t| t.is_final()).count(), 1);
        assert!(ticks.iter().all(|t| (3.0..=17.0).contains(&t.value)));
        assert!(handle.is_finished());
        assert!(!clock.has_pending());
    }

    #[test]
    fn test_duration_independent_of_frame_rate() {
        for frame_ms in [8.0, 16.0, 33.0, 250.0] {
            let clock = Rc::new(AnimationClock::manual());
            let (handle, ticks) = collect(&clock, Interpolation::new(0.0, 1.0, 1000.0));

            clock.run_for(999.0, frame_ms);
            assert!(!handle.is_finished(), "finished early at {}ms frames", frame_ms);

            clock.tick(1.0);
            assert!(handle.is_finished());
            assert_eq!(ticks.borrow().last().unwrap().value, 1.0);
        }
    }

    #[test]
    fn test_zero_duration_run_finishes_on_first_frame() {
        let clock = Rc::new(AnimationClock::manual());
        let (handle, ticks) = collect(&clock, Interpolation::new(0.0, 5.0, 0.0));

        clock.tick(16.0);
        assert_eq!(*ticks.borrow(), vec![Tick { value: 5.0, progress: 1.0 }]);
        assert!(handle.is_finished());
    }

    #[test]
    fn test_drop_cancels_pending_frame() {
        let clock = Rc::new(AnimationClock::manual());
        let (handle, ticks) = collect(&clock, Interpolation::new(0.0, 1.0, 1000.0));

        clock.tick(16.0);
        assert_eq!(clock.pending_count(), 1);

        drop(handle);
        assert_eq!(clock.pending_count(), 0);

        clock.run_for(2000.0, 16.0);
        assert_eq!(ticks.borrow().len(), 1);
    }

    #[test]
    fn test_eased_run_stays_in_range() {
        let clock = Rc::new(AnimationClock::manual());
        let (_handle, ticks) = collect(
            &clock,
            Interpolation::new(0.0, 30.0, 600.0).easing(Easing::EaseOut),
        );

        clock.run_for(700.0, 16.0);

        let ticks = ticks.borrow();
        assert!(ticks.windows(2).all(|w| w[1].value >= w[0].value));
        assert_eq!(ticks.last().unwrap().value, 30.0);
    }

    #[test]
    fn test_overshooting_bezier_is_clamped_to_range() {
        let clock = Rc::new(AnimationClock::manual());
        let back_out = Easing::CubicBezier(0.34, 1.56, 0.64, 1.0);
        let (_handle, ticks) = collect(
            &clock,
            Interpolation::new(0.0, 100.0, 1000.0).easing(back_out),
        );

        clock.run_for(1100.0, 16.0);

        let ticks = ticks.borrow();
        assert!(ticks.iter().all(|t| (0.0..=100.0).contains(&t.value)));
        assert!(ticks.windows(2).all(|w| w[1].value >= w[0].value));
        assert_eq!(ticks.last().unwrap().value, 100.0);
    }
}

//! Ambient looping motion
//!
//! Decorative motion that runs from mount to unmount regardless of scroll
//! position: floating dots, a bobbing logo, icons orbiting a hub. Each motion
//! is a pure function of elapsed time ([`Periodic`]), and
//! [`AmbientLoopMotion`] samples it once per frame.
//!
//! Motions never accumulate state between frames, so a dropped frame just
//! means a skipped sample, never drift.

use crate::easing::Easing;
use klm_core::{FrameRequest, Millis, Offset, SharedClock};
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::f64::consts::TAU;
use std::rc::Rc;

/// A motion defined for every elapsed time t >= 0
pub trait Periodic {
    type Output;

    /// Sample the motion `elapsed_ms` after it started
    fn sample(&self, elapsed_ms: Millis) -> Self::Output;
}

/// Shape of one loop period, as a function of phase in [0, 1)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Waveform {
    /// `sin(2πφ)`: 0 → 1 → 0 → -1 → 0
    #[default]
    Sine,
    /// Piecewise-linear version of the sine shape
    Triangle,
    /// 0 → 1 → 0 with the given easing on each half
    Yoyo(Easing),
}

impl Waveform {
    pub fn at(&self, phase: f64) -> f64 {
        let phase = phase.rem_euclid(1.0);

        match *self {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Triangle => {
                if phase < 0.25 {
                    phase * 4.0
                } else if phase < 0.75 {
                    2.0 - phase * 4.0
                } else {
                    phase * 4.0 - 4.0
                }
            }
            Waveform::Yoyo(easing) => {
                if phase < 0.5 {
                    easing.apply(phase * 2.0)
                } else {
                    easing.apply(2.0 - phase * 2.0)
                }
            }
        }
    }
}

/// One-dimensional oscillation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopMotion {
    pub period_ms: Millis,
    pub amplitude: f64,
    /// Shifts this instance along its period to desynchronise siblings
    pub phase_offset_ms: Millis,
    pub waveform: Waveform,
}

impl LoopMotion {
    /// Sine oscillation with no phase offset
    pub fn new(period_ms: Millis, amplitude: f64) -> Self {
        Self {
            period_ms,
            amplitude,
            phase_offset_ms: 0.0,
            waveform: Waveform::Sine,
        }
    }

    pub fn phase_offset(mut self, phase_offset_ms: Millis) -> Self {
        self.phase_offset_ms = phase_offset_ms;
        self
    }

    pub fn waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    /// Position at time `t`; zero for a non-positive period
    pub fn position(&self, t: Millis) -> f64 {
        if !(self.period_ms > 0.0) {
            return 0.0;
        }

        let phase = ((t + self.phase_offset_ms) / self.period_ms).rem_euclid(1.0);
        self.amplitude * self.waveform.at(phase)
    }
}

impl Periodic for LoopMotion {
    type Output = f64;

    fn sample(&self, elapsed_ms: Millis) -> f64 {
        self.position(elapsed_ms)
    }
}

/// Two-axis drift built from independent per-axis loops
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DriftMotion {
    pub x: Option<LoopMotion>,
    pub y: Option<LoopMotion>,
}

impl DriftMotion {
    /// Drift on both axes with a shared period, easing and phase offset
    ///
    /// Each axis goes out to its amplitude and back once per period.
    pub fn float(
        period_ms: Millis,
        x_amplitude: f64,
        y_amplitude: f64,
        phase_offset_ms: Millis,
    ) -> Self {
        let axis = |amplitude: f64| {
            (amplitude != 0.0).then(|| {
                LoopMotion::new(period_ms, amplitude)
                    .waveform(Waveform::Yoyo(Easing::EaseInOut))
                    .phase_offset(phase_offset_ms)
            })
        };

        Self {
            x: axis(x_amplitude),
            y: axis(y_amplitude),
        }
    }

    /// Vertical bob only
    pub fn bob(period_ms: Millis, amplitude: f64) -> Self {
        Self::float(period_ms, 0.0, amplitude, 0.0)
    }
}

impl Periodic for DriftMotion {
    type Output = Offset;

    fn sample(&self, elapsed_ms: Millis) -> Offset {
        Offset::new(
            self.x.map_or(0.0, |m| m.position(elapsed_ms)),
            self.y.map_or(0.0, |m| m.position(elapsed_ms)),
        )
    }
}

/// Positions of a ring's slots, inline for typical ring sizes
pub type OrbitPositions = SmallVec<[Offset; 4]>;

/// Evenly spaced slots rotating around a centre
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitMotion {
    pub radius: f64,
    /// Time for one full revolution
    pub period_ms: Millis,
    pub slots: usize,
    /// Rotate counter-clockwise
    pub reverse: bool,
    pub phase_offset_ms: Millis,
}

impl OrbitMotion {
    pub fn new(radius: f64, period_ms: Millis, slots: usize) -> Self {
        Self {
            radius,
            period_ms,
            slots,
            reverse: false,
            phase_offset_ms: 0.0,
        }
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Rotation angle of slot 0 in radians
    pub fn angle(&self, t: Millis) -> f64 {
        if !(self.period_ms > 0.0) {
            return 0.0;
        }

        let turns = ((t + self.phase_offset_ms) / self.period_ms).rem_euclid(1.0);
        let direction = if self.reverse { -1.0 } else { 1.0 };
        direction * TAU * turns
    }
}

impl Periodic for OrbitMotion {
    type Output = OrbitPositions;

    fn sample(&self, elapsed_ms: Millis) -> OrbitPositions {
        let base = self.angle(elapsed_ms);
        let spacing = if self.slots > 0 {
            TAU / self.slots as f64
        } else {
            0.0
        };

        (0..self.slots)
            .map(|i| {
                let angle = base + spacing * i as f64;
                Offset::new(self.radius * angle.cos(), self.radius * angle.sin())
            })
            .collect()
    }
}

// ============================================================================
// AmbientLoopMotion
// ============================================================================

struct LoopInner<M: Periodic> {
    clock: SharedClock,
    motion: M,
    mounted_at: Millis,
    on_tick: RefCell<Box<dyn FnMut(M::Output)>>,
    pending: Cell<Option<FrameRequest>>,
    stopped: Cell<bool>,
    frames: Cell<u64>,
}

impl<M: Periodic + 'static> LoopInner<M> {
    fn schedule(inner: &Rc<Self>) {
        let weak = Rc::downgrade(inner);
        let request = inner.clock.request_frame(Box::new(move |now| {
            if let Some(inner) = weak.upgrade() {
                LoopInner::on_frame(&inner, now);
            }
        }));
        inner.pending.set(Some(request));
    }

    fn on_frame(inner: &Rc<Self>, now: Millis) {
        inner.pending.set(None);
        if inner.stopped.get() {
            return;
        }

        let sample = inner.motion.sample((now - inner.mounted_at).max(0.0));
        {
            let mut on_tick = inner.on_tick.borrow_mut();
            (*on_tick)(sample);
        }
        inner.frames.set(inner.frames.get() + 1);

        if !inner.stopped.get() {
            LoopInner::schedule(inner);
        }
    }

    fn stop(&self) {
        if self.stopped.replace(true) {
            return;
        }
        if let Some(request) = self.pending.take() {
            self.clock.cancel(request);
        }
        tracing::trace!("AmbientLoopMotion: stopped after {} frames", self.frames.get());
    }
}

/// Runs a [`Periodic`] motion every frame until dropped
pub struct AmbientLoopMotion<M: Periodic + 'static> {
    inner: Rc<LoopInner<M>>,
}

impl<M: Periodic + 'static> AmbientLoopMotion<M> {
    /// Start looping now; `on_tick` receives a sample every frame
    pub fn start<F>(clock: SharedClock, motion: M, on_tick: F) -> Self
    where
        F: FnMut(M::Output) + 'static,
    {
        let inner = Rc::new(LoopInner {
            mounted_at: clock.now(),
            clock,
            motion,
            on_tick: RefCell::new(Box::new(on_tick)),
            pending: Cell::new(None),
            stopped: Cell::new(false),
            frames: Cell::new(0),
        });
        LoopInner::schedule(&inner);

        Self { inner }
    }

    pub fn motion(&self) -> &M {
        &self.inner.motion
    }

    /// Sample at the clock's current time without waiting for a frame
    pub fn sample_now(&self) -> M::Output {
        let elapsed = self.inner.clock.now() - self.inner.mounted_at;
        self.inner.motion.sample(elapsed.max(0.0))
    }

    /// Number of frames delivered so far
    pub fn frames(&self) -> u64 {
        self.inner.frames.get()
    }

    pub fn is_running(&self) -> bool {
        !self.inner.stopped.get()
    }

    pub fn stop(&self) {
        self.inner.stop();
    }
}

impl<M: Periodic + 'static> Drop for AmbientLoopMotion<M> {
    fn drop(&mut self) {
        self.inner.stop();
    }
}

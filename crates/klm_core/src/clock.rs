//! Frame clock
//!
//! The single source of time and scheduling for every motion primitive.
//! Primitives never read the system time or spin their own loops; they are
//! handed a [`SharedClock`] and ask it for two things:
//!
//! - **Next-frame callbacks** via [`Clock::request_frame`] (interpolation,
//!   ambient loops, springs)
//! - **Absolute-deadline timers** via [`Clock::schedule_at`] (stagger delays)
//!
//! Both return a [`FrameRequest`] that can be cancelled. Cancelling is
//! idempotent, so teardown code never has to track whether a request already
//! fired.
//!
//! # Driving the clock
//!
//! [`AnimationClock`] is the concrete implementation. The host calls
//! [`AnimationClock::run_frame`] once per display refresh. For tests and
//! headless previews, a manual clock is advanced explicitly:
//!
//! ```rust
//! use klm_core::clock::{AnimationClock, Clock};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let clock = AnimationClock::manual();
//! let fired = Rc::new(Cell::new(false));
//!
//! let flag = fired.clone();
//! clock.schedule_at(100.0, Box::new(move |_now| flag.set(true)));
//!
//! clock.tick(50.0);
//! assert!(!fired.get());
//!
//! clock.tick(50.0);
//! assert!(fired.get());
//! ```

use slotmap::{new_key_type, SlotMap};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

/// Milliseconds on the animation clock
pub type Millis = f64;

/// Nominal frame interval at 60Hz
pub const FRAME_MS: Millis = 1000.0 / 60.0;

new_key_type! {
    /// Handle to a pending frame callback or timer
    pub struct FrameRequest;
}

/// Callback invoked with the clock time of the frame it runs on
pub type FrameCallback = Box<dyn FnOnce(Millis)>;

/// Time and scheduling capability injected into every motion primitive
pub trait Clock {
    /// Current monotonic time in milliseconds
    fn now(&self) -> Millis;

    /// Run `callback` on the next frame
    fn request_frame(&self, callback: FrameCallback) -> FrameRequest;

    /// Run `callback` on the first frame whose time is at or past `deadline`
    fn schedule_at(&self, deadline: Millis, callback: FrameCallback) -> FrameRequest;

    /// Cancel a pending request. Unknown or already-fired requests are ignored.
    fn cancel(&self, request: FrameRequest);
}

/// Shared clock handle passed to primitives
pub type SharedClock = Rc<dyn Clock>;

// ============================================================================
// AnimationClock
// ============================================================================

/// Where the clock reads time from
#[derive(Debug)]
enum TimeSource {
    /// Wall-clock time since the clock was created
    Monotonic(Instant),
    /// Time advanced explicitly by the host
    Manual(Cell<Millis>),
}

enum PendingKind {
    Frame,
    Timer { deadline: Millis },
}

struct Pending {
    kind: PendingKind,
    /// Registration order, used to keep dispatch deterministic
    seq: u64,
    callback: FrameCallback,
}

struct ClockInner {
    pending: SlotMap<FrameRequest, Pending>,
    next_seq: u64,
    frames_run: u64,
}

/// The concrete frame clock
///
/// Single-threaded: callbacks run on whichever thread calls
/// [`run_frame`](Self::run_frame). No internal borrow is held while a
/// callback runs, so callbacks may freely schedule or cancel other requests.
pub struct AnimationClock {
    source: TimeSource,
    inner: RefCell<ClockInner>,
}

impl AnimationClock {
    fn with_source(source: TimeSource) -> Self {
        Self {
            source,
            inner: RefCell::new(ClockInner {
                pending: SlotMap::with_key(),
                next_seq: 0,
                frames_run: 0,
            }),
        }
    }

    /// A clock that follows real elapsed time
    pub fn monotonic() -> Self {
        Self::with_source(TimeSource::Monotonic(Instant::now()))
    }

    /// A clock starting at t=0 that only moves when advanced
    pub fn manual() -> Self {
        Self::with_source(TimeSource::Manual(Cell::new(0.0)))
    }

    /// Wrap the clock in an `Rc` so it can be handed out as a [`SharedClock`]
    pub fn shared(self) -> Rc<Self> {
        Rc::new(self)
    }

    /// Check if this clock is driven manually
    pub fn is_manual(&self) -> bool {
        matches!(self.source, TimeSource::Manual(_))
    }

    /// Advance a manual clock by `ms`
    ///
    /// Time never moves backwards; negative amounts are ignored. Has no
    /// effect on a monotonic clock.
    pub fn advance_by(&self, ms: Millis) {
        match &self.source {
            TimeSource::Manual(time) => {
                if ms > 0.0 {
                    time.set(time.get() + ms);
                }
            }
            TimeSource::Monotonic(_) => {
                tracing::warn!("AnimationClock: advance_by({}) ignored on monotonic clock", ms);
            }
        }
    }

    /// Move a manual clock forward to `time` (ignored if `time` is in the past)
    pub fn advance_to(&self, time: Millis) {
        let now = self.now();
        if time > now {
            self.advance_by(time - now);
        }
    }

    /// Advance a manual clock by `ms`, then run one frame
    pub fn tick(&self, ms: Millis) -> usize {
        self.advance_by(ms);
        self.run_frame()
    }

    /// Step a manual clock through `duration` in frames of `frame_ms`
    ///
    /// The final step is shortened so the clock lands exactly on
    /// `now + duration`. Returns the number of callbacks run.
    pub fn run_for(&self, duration: Millis, frame_ms: Millis) -> usize {
        let target = self.now() + duration.max(0.0);
        let step = if frame_ms > 0.0 { frame_ms } else { FRAME_MS };
        let mut ran = 0;

        while self.now() < target {
            let next = (self.now() + step).min(target);
            self.advance_to(next);
            ran += self.run_frame();
        }

        ran
    }

    /// Dispatch one frame
    ///
    /// Runs every timer whose deadline has passed (earliest deadline first,
    /// ties in registration order), then every frame callback that was
    /// registered before this call. Callbacks registered while dispatching
    /// wait for the next frame. Returns the number of callbacks run.
    pub fn run_frame(&self) -> usize {
        let now = self.now();

        let due: Vec<FrameRequest> = {
            let mut inner = self.inner.borrow_mut();
            inner.frames_run += 1;

            let mut timers: Vec<(Millis, u64, FrameRequest)> = Vec::new();
            let mut frames: Vec<(u64, FrameRequest)> = Vec::new();
            for (id, pending) in inner.pending.iter() {
                match pending.kind {
                    PendingKind::Timer { deadline } if deadline <= now => {
                        timers.push((deadline, pending.seq, id));
                    }
                    PendingKind::Timer { .. } => {}
                    PendingKind::Frame => frames.push((pending.seq, id)),
                }
            }

            timers.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            frames.sort_by_key(|f| f.0);

            timers
                .into_iter()
                .map(|(_, _, id)| id)
                .chain(frames.into_iter().map(|(_, id)| id))
                .collect()
        };

        let mut ran = 0;
        for id in due {
            // Re-check each request: an earlier callback may have cancelled it
            let pending = self.inner.borrow_mut().pending.remove(id);
            if let Some(pending) = pending {
                (pending.callback)(now);
                ran += 1;
            }
        }

        if ran > 0 {
            tracing::trace!("AnimationClock: frame at {:.1}ms ran {} callbacks", now, ran);
        }

        ran
    }

    /// Number of requests (frames and timers) still waiting to fire
    pub fn pending_count(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Check if anything is waiting to fire
    pub fn has_pending(&self) -> bool {
        self.pending_count() > 0
    }

    /// Number of frames dispatched so far
    pub fn frames_run(&self) -> u64 {
        self.inner.borrow().frames_run
    }

    fn insert(&self, kind: PendingKind, callback: FrameCallback) -> FrameRequest {
        let mut inner = self.inner.borrow_mut();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.pending.insert(Pending {
            kind,
            seq,
            callback,
        })
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::monotonic()
    }
}

impl Clock for AnimationClock {
    fn now(&self) -> Millis {
        match &self.source {
            TimeSource::Monotonic(origin) => origin.elapsed().as_secs_f64() * 1000.0,
            TimeSource::Manual(time) => time.get(),
        }
    }

    fn request_frame(&self, callback: FrameCallback) -> FrameRequest {
        self.insert(PendingKind::Frame, callback)
    }

    fn schedule_at(&self, deadline: Millis, callback: FrameCallback) -> FrameRequest {
        self.insert(PendingKind::Timer { deadline }, callback)
    }

    fn cancel(&self, request: FrameRequest) {
        self.inner.borrow_mut().pending.remove(request);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> FrameCallback) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let make = move |name: &'static str| -> FrameCallback {
            let sink = sink.clone();
            Box::new(move |_| sink.borrow_mut().push(name))
        };
        (log, make)
    }

    #[test]
    fn test_manual_clock_starts_at_zero() {
        let clock = AnimationClock::manual();
        assert_eq!(clock.now(), 0.0);

        clock.advance_by(16.0);
        assert_eq!(clock.now(), 16.0);

        clock.advance_by(-5.0);
        assert_eq!(clock.now(), 16.0);
    }

    #[test]
    fn test_frame_callbacks_run_once_in_order() {
        let clock = AnimationClock::manual();
        let (log, make) = recorder();

        clock.request_frame(make("a"));
        clock.request_frame(make("b"));

        assert_eq!(clock.tick(16.0), 2);
        assert_eq!(*log.borrow(), vec!["a", "b"]);

        assert_eq!(clock.tick(16.0), 0);
        assert!(!clock.has_pending());
    }

    #[test]
    fn test_timers_fire_by_deadline() {
        let clock = AnimationClock::manual();
        let (log, make) = recorder();

        clock.schedule_at(200.0, make("late"));
        clock.schedule_at(100.0, make("early"));
        clock.schedule_at(100.0, make("early-second"));

        clock.tick(99.0);
        assert!(log.borrow().is_empty());

        clock.tick(200.0);
        assert_eq!(*log.borrow(), vec!["early", "early-second", "late"]);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let clock = AnimationClock::manual();
        let (log, make) = recorder();

        let id = clock.request_frame(make("cancelled"));
        clock.cancel(id);
        clock.cancel(id);

        clock.tick(16.0);
        assert!(log.borrow().is_empty());
        assert_eq!(clock.pending_count(), 0);
    }

    #[test]
    fn test_callbacks_registered_during_dispatch_wait() {
        let clock = Rc::new(AnimationClock::manual());
        let count = Rc::new(Cell::new(0));

        let inner_clock = clock.clone();
        let inner_count = count.clone();
        clock.request_frame(Box::new(move |_| {
            inner_count.set(inner_count.get() + 1);
            let again = inner_count.clone();
            inner_clock.request_frame(Box::new(move |_| again.set(again.get() + 1)));
        }));

        clock.tick(16.0);
        assert_eq!(count.get(), 1);

        clock.tick(16.0);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_earlier_callback_can_cancel_later_one() {
        let clock = Rc::new(AnimationClock::manual());
        let (log, make) = recorder();

        let victim = Rc::new(Cell::new(None));
        let killer_clock = clock.clone();
        let killer_victim = victim.clone();
        clock.request_frame(Box::new(move |_| {
            if let Some(id) = killer_victim.get() {
                killer_clock.cancel(id);
            }
        }));
        victim.set(Some(clock.request_frame(make("victim"))));

        clock.tick(16.0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_run_for_lands_on_target() {
        let clock = AnimationClock::manual();
        clock.run_for(1000.0, 16.0);
        assert_eq!(clock.now(), 1000.0);
    }

    #[test]
    fn test_callback_receives_frame_time() {
        let clock = AnimationClock::manual();
        let seen = Rc::new(Cell::new(-1.0));

        let sink = seen.clone();
        clock.schedule_at(50.0, Box::new(move |now| sink.set(now)));
        clock.tick(64.0);

        assert_eq!(seen.get(), 64.0);
    }

    #[test]
    fn test_monotonic_ignores_advance() {
        let clock = AnimationClock::monotonic();
        assert!(!clock.is_manual());
        let before = clock.now();
        clock.advance_by(10_000.0);
        assert!(clock.now() < before + 10_000.0);
    }
}

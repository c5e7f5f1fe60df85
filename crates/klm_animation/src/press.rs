//! Hover and tap feedback
//!
//! Interactive elements grow slightly under the pointer and shrink while
//! pressed, with a bouncy spring between the two. Cards lift instead of
//! growing. Frames are requested only while a spring is moving; a settled
//! element costs nothing.

use crate::spring::{Spring, SpringConfig};
use klm_core::{FrameRequest, Millis, Offset, SharedClock};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Largest frame gap fed to the spring; longer stalls are treated as this
const MAX_FRAME_GAP_MS: Millis = 64.0;
/// Integration substep
const SUBSTEP_SECS: f64 = 1.0 / 120.0;

/// Lift rest thresholds, in pixels and pixels per second
const LIFT_REST_DELTA: f64 = 0.01;
const LIFT_REST_SPEED: f64 = 0.1;

/// Scale and lift targets for each interaction state
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PressConfig {
    pub hover_scale: f64,
    pub tap_scale: f64,
    /// Vertical offset while hovered, negative moves up
    pub hover_lift: f64,
    pub spring: SpringConfig,
}

impl PressConfig {
    /// Call-to-action buttons: grow on hover, shrink on tap
    pub fn button() -> Self {
        Self {
            hover_scale: 1.05,
            tap_scale: 0.95,
            hover_lift: 0.0,
            spring: SpringConfig::press(),
        }
    }

    /// Header navigation links: grow on hover, no tap response
    pub fn nav_link() -> Self {
        Self {
            hover_scale: 1.1,
            tap_scale: 1.1,
            ..Self::button()
        }
    }

    /// Category and benefit cards: lift on hover without scaling
    pub fn card() -> Self {
        Self {
            hover_scale: 1.0,
            tap_scale: 1.0,
            hover_lift: -10.0,
            ..Self::button()
        }
    }
}

impl Default for PressConfig {
    fn default() -> Self {
        Self::button()
    }
}

/// Visual state handed to listeners every frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PressStyle {
    pub scale: f64,
    pub offset: Offset,
}

struct PressInner {
    clock: SharedClock,
    config: PressConfig,
    spring: RefCell<Spring>,
    lift: RefCell<Spring>,
    hovered: Cell<bool>,
    pressed: Cell<bool>,
    last_frame: Cell<Option<Millis>>,
    pending: Cell<Option<FrameRequest>>,
    on_change: RefCell<Option<Box<dyn FnMut(PressStyle)>>>,
}

impl PressInner {
    fn target(&self) -> f64 {
        if self.pressed.get() {
            self.config.tap_scale
        } else if self.hovered.get() {
            self.config.hover_scale
        } else {
            1.0
        }
    }

    fn target_lift(&self) -> f64 {
        if self.hovered.get() {
            self.config.hover_lift
        } else {
            0.0
        }
    }

    fn is_settled(&self) -> bool {
        self.spring.borrow().is_settled() && self.lift.borrow().is_settled()
    }

    fn style(&self) -> PressStyle {
        PressStyle {
            scale: self.spring.borrow().value(),
            offset: Offset::new(0.0, self.lift.borrow().value()),
        }
    }

    fn retarget(inner: &Rc<Self>) {
        inner.spring.borrow_mut().set_target(inner.target());
        inner.lift.borrow_mut().set_target(inner.target_lift());
        if inner.pending.get().is_none() && !inner.is_settled() {
            inner.last_frame.set(Some(inner.clock.now()));
            PressInner::schedule(inner);
        }
    }

    fn schedule(inner: &Rc<Self>) {
        let weak = Rc::downgrade(inner);
        let request = inner.clock.request_frame(Box::new(move |now| {
            if let Some(inner) = weak.upgrade() {
                PressInner::on_frame(&inner, now);
            }
        }));
        inner.pending.set(Some(request));
    }

    fn on_frame(inner: &Rc<Self>, now: Millis) {
        inner.pending.set(None);

        let last = inner.last_frame.replace(Some(now)).unwrap_or(now);
        let gap_secs = (now - last).clamp(0.0, MAX_FRAME_GAP_MS) / 1000.0;

        {
            let mut spring = inner.spring.borrow_mut();
            let mut lift = inner.lift.borrow_mut();
            let mut remaining = gap_secs;
            while remaining > 0.0 {
                let dt = remaining.min(SUBSTEP_SECS);
                spring.step(dt);
                lift.step(dt);
                remaining -= dt;
            }
        }
        let style = inner.style();
        let settled = inner.is_settled();

        let listener = inner.on_change.borrow_mut().take();
        if let Some(mut listener) = listener {
            listener(style);
            let mut slot = inner.on_change.borrow_mut();
            if slot.is_none() {
                *slot = Some(listener);
            }
        }

        if !settled && inner.pending.get().is_none() {
            PressInner::schedule(inner);
        } else if settled {
            inner.last_frame.set(None);
        }
    }
}

/// Spring-driven scale and lift for hover and press
///
/// Dropping it cancels any pending frame.
pub struct PressFeedback {
    inner: Rc<PressInner>,
}

impl PressFeedback {
    pub fn new(clock: SharedClock, config: PressConfig) -> Self {
        let spring = Spring::new(config.spring, 1.0);
        let lift = Spring::new(
            config.spring.rest_thresholds(LIFT_REST_DELTA, LIFT_REST_SPEED),
            0.0,
        );
        Self {
            inner: Rc::new(PressInner {
                clock,
                config,
                spring: RefCell::new(spring),
                lift: RefCell::new(lift),
                hovered: Cell::new(false),
                pressed: Cell::new(false),
                last_frame: Cell::new(None),
                pending: Cell::new(None),
                on_change: RefCell::new(None),
            }),
        }
    }

    /// Listen for scale and lift changes
    pub fn on_change<F>(self, listener: F) -> Self
    where
        F: FnMut(PressStyle) + 'static,
    {
        *self.inner.on_change.borrow_mut() = Some(Box::new(listener));
        self
    }

    pub fn set_hovered(&self, hovered: bool) {
        if self.inner.hovered.replace(hovered) != hovered {
            PressInner::retarget(&self.inner);
        }
    }

    pub fn set_pressed(&self, pressed: bool) {
        if self.inner.pressed.replace(pressed) != pressed {
            PressInner::retarget(&self.inner);
        }
    }

    pub fn is_hovered(&self) -> bool {
        self.inner.hovered.get()
    }

    pub fn is_pressed(&self) -> bool {
        self.inner.pressed.get()
    }

    pub fn scale(&self) -> f64 {
        self.inner.spring.borrow().value()
    }

    /// Current lift, `Offset::ZERO` at rest
    pub fn offset(&self) -> Offset {
        Offset::new(0.0, self.inner.lift.borrow().value())
    }

    pub fn style(&self) -> PressStyle {
        self.inner.style()
    }

    /// Scale the spring is heading to
    pub fn target_scale(&self) -> f64 {
        self.inner.target()
    }

    /// Check if either spring is moving and requesting frames
    pub fn is_animating(&self) -> bool {
        self.inner.pending.get().is_some()
    }
}

impl Drop for PressFeedback {
    fn drop(&mut self) {
        if let Some(request) = self.inner.pending.take() {
            self.inner.clock.cancel(request);
        }
        self.inner.on_change.borrow_mut().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use klm_core::AnimationClock;

    #[test]
    fn test_idle_requests_no_frames() {
        let clock = Rc::new(AnimationClock::manual());
        let press = PressFeedback::new(clock.clone(), PressConfig::default());

        assert_eq!(press.scale(), 1.0);
        assert!(!press.is_animating());
        assert!(!clock.has_pending());
    }

    #[test]
    fn test_hover_settles_at_hover_scale() {
        let clock = Rc::new(AnimationClock::manual());
        let press = PressFeedback::new(clock.clone(), PressConfig::default());

        press.set_hovered(true);
        assert!(press.is_animating());

        clock.run_for(3000.0, 16.0);
        assert_eq!(press.scale(), 1.05);
        assert!(!press.is_animating());
        assert!(!clock.has_pending());
    }

    #[test]
    fn test_press_overrides_hover() {
        let clock = Rc::new(AnimationClock::manual());
        let press = PressFeedback::new(clock.clone(), PressConfig::default());

        press.set_hovered(true);
        press.set_pressed(true);
        assert_eq!(press.target_scale(), 0.95);

        clock.run_for(3000.0, 16.0);
        assert_eq!(press.scale(), 0.95);

        press.set_pressed(false);
        clock.run_for(3000.0, 16.0);
        assert_eq!(press.scale(), 1.05);
    }

    #[test]
    fn test_long_stall_does_not_explode() {
        let clock = Rc::new(AnimationClock::manual());
        let press = PressFeedback::new(clock.clone(), PressConfig::default());

        press.set_hovered(true);
        clock.tick(5000.0);
        assert!(press.scale().is_finite());
        assert!((0.5..1.5).contains(&press.scale()));
    }

    #[test]
    fn test_drop_cancels_frame() {
        let clock = Rc::new(AnimationClock::manual());
        let press = PressFeedback::new(clock.clone(), PressConfig::default());

        press.set_hovered(true);
        clock.tick(16.0);
        assert!(clock.has_pending());

        drop(press);
        assert!(!clock.has_pending());
    }

    #[test]
    fn test_card_lifts_on_hover_and_drops_back() {
        let clock = Rc::new(AnimationClock::manual());
        let frames = Rc::new(RefCell::new(Vec::new()));
        let sink = frames.clone();
        let card = PressFeedback::new(clock.clone(), PressConfig::card())
            .on_change(move |style| sink.borrow_mut().push(style));

        card.set_hovered(true);
        clock.run_for(3000.0, 16.0);
        assert_eq!(card.offset(), Offset::new(0.0, -10.0));
        assert_eq!(card.scale(), 1.0);
        assert!(!clock.has_pending());
        assert!(frames.borrow().iter().any(|s| s.offset.y < -5.0));
        assert!(frames.borrow().iter().all(|s| s.scale == 1.0));

        card.set_hovered(false);
        clock.run_for(3000.0, 16.0);
        assert_eq!(card.offset(), Offset::ZERO);
        assert!(!card.is_animating());
    }

    #[test]
    fn test_nav_link_grows_and_ignores_tap() {
        let clock = Rc::new(AnimationClock::manual());
        let link = PressFeedback::new(clock.clone(), PressConfig::nav_link());

        link.set_hovered(true);
        clock.run_for(3000.0, 16.0);
        assert_eq!(link.scale(), 1.1);

        link.set_pressed(true);
        assert!(!link.is_animating());
        clock.run_for(500.0, 16.0);
        assert_eq!(link.scale(), 1.1);
        assert_eq!(link.offset(), Offset::ZERO);
    }
}

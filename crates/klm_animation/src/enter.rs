//! Enter transitions
//!
//! The fade-and-slide an element plays when it is revealed. A transition is
//! described by where the element starts (`from_offset`, fully transparent)
//! and how long it takes to settle at rest (offset zero, fully opaque).

use crate::easing::Easing;
use crate::interpolate::Interpolation;
use klm_core::{Millis, Offset};

/// Presentation state of a revealed element
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnterStyle {
    pub opacity: f64,
    pub offset: Offset,
}

impl EnterStyle {
    /// Fully visible at rest
    pub const SHOWN: EnterStyle = EnterStyle {
        opacity: 1.0,
        offset: Offset::ZERO,
    };
}

/// A fade from transparent plus a slide from `from_offset` to rest
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnterTransition {
    pub duration_ms: Millis,
    pub from_offset: Offset,
    pub easing: Easing,
}

impl EnterTransition {
    /// Default duration used across the landing page
    pub const DEFAULT_DURATION_MS: Millis = 600.0;

    pub fn new(duration_ms: Millis, from_offset: Offset) -> Self {
        Self {
            duration_ms,
            from_offset,
            easing: Easing::EaseOut,
        }
    }

    /// Fade in without moving
    pub fn fade_in() -> Self {
        Self::new(Self::DEFAULT_DURATION_MS, Offset::ZERO)
    }

    /// Fade in while rising `distance` pixels
    pub fn fade_in_up(distance: f64) -> Self {
        Self::new(Self::DEFAULT_DURATION_MS, Offset::new(0.0, distance))
    }

    /// Fade in while sliding right from `distance` pixels to the left
    pub fn fade_in_left(distance: f64) -> Self {
        Self::new(Self::DEFAULT_DURATION_MS, Offset::new(-distance, 0.0))
    }

    /// Fade in while sliding left from `distance` pixels to the right
    pub fn fade_in_right(distance: f64) -> Self {
        Self::new(Self::DEFAULT_DURATION_MS, Offset::new(distance, 0.0))
    }

    /// Slide down into place from `distance` pixels above
    pub fn slide_down(distance: f64) -> Self {
        Self::new(Self::DEFAULT_DURATION_MS, Offset::new(0.0, -distance))
    }

    pub fn duration(mut self, duration_ms: Millis) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Style before the transition starts
    pub fn initial_style(&self) -> EnterStyle {
        EnterStyle {
            opacity: 0.0,
            offset: self.from_offset,
        }
    }

    /// Style at an eased progress value in [0, 1]
    pub fn style_at(&self, eased: f64) -> EnterStyle {
        let t = eased.clamp(0.0, 1.0);
        EnterStyle {
            opacity: t,
            offset: self.from_offset.lerp(Offset::ZERO, t),
        }
    }

    /// The 0 → 1 interpolation that drives this transition
    pub fn interpolation(&self) -> Interpolation {
        Interpolation::new(0.0, 1.0, self.duration_ms).easing(self.easing)
    }
}

impl Default for EnterTransition {
    fn default() -> Self {
        Self::fade_in_up(30.0)
    }
}

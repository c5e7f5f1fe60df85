//! KLM Landing Motion
//!
//! Scroll-triggered animation orchestration for the KLM landing page.
//!
//! # Features
//!
//! - **One-shot Viewport Triggers**: fire exactly once when a subject first
//!   becomes visible, degrading to "visible" when no observer is available
//! - **Time Interpolation**: drift-free, frame-rate independent tweens with
//!   easing and whole-number rounding
//! - **Counters**: count up to a target once seen, then stay pinned
//! - **Staggered Groups**: reveal items at absolute offsets from the group's
//!   trigger, forward, reversed or from the center
//! - **Ambient Loops**: floating, bobbing and orbiting motion sampled from
//!   elapsed time
//! - **Press Feedback**: spring-driven hover and tap scaling
//! - **Page Composition**: [`LandingMotion`] wires all of the above from a
//!   TOML-loadable [`MotionConfig`]
//!
//! Every primitive takes its clock and visibility watcher as injected
//! capabilities and tears itself down on `Drop`.
//!
//! # Example
//!
//! ```rust
//! use klm_animation::{CounterAnimation, CounterConfig};
//! use klm_core::{AnimationClock, Rect, SubjectId, ViewportWatcher};
//! use std::rc::Rc;
//!
//! let clock = Rc::new(AnimationClock::manual());
//! let watcher = Rc::new(ViewportWatcher::new(1280.0, 720.0));
//!
//! let stat = SubjectId::new(1);
//! watcher.set_bounds(stat, Rect::new(0.0, 200.0, 200.0, 80.0));
//!
//! let counter = CounterAnimation::mount(
//!     clock.clone(),
//!     watcher.clone(),
//!     stat,
//!     CounterConfig::new(400.0).suffix("+"),
//! );
//!
//! watcher.refresh();
//! clock.run_for(2000.0, 16.0);
//! assert_eq!(counter.display(), "400+");
//! ```

pub mod ambient;
pub mod config;
pub mod counter;
pub mod easing;
pub mod enter;
pub mod interpolate;
pub mod landing;
pub mod press;
pub mod spring;
pub mod stagger;
pub mod trigger;

pub use ambient::{
    AmbientLoopMotion, DriftMotion, LoopMotion, OrbitMotion, OrbitPositions, Periodic, Waveform,
};
pub use config::{
    AmbientSettings, CounterSettings, DotSettings, HeaderSettings, HeroSettings, MotionConfig,
    OrbitSettings, PressSettings, SectionMotion, SectionsSettings, SlideFrom, StatSettings,
};
pub use counter::{CounterAnimation, CounterConfig, CounterPhase, CounterStatus};
pub use easing::Easing;
pub use enter::{EnterStyle, EnterTransition};
pub use interpolate::{Interpolation, InterpolatorHandle, Rounding, Tick, TimeInterpolator};
pub use landing::{LandingLayout, LandingMotion, SectionLayout};
pub use press::{PressConfig, PressFeedback, PressStyle};
pub use spring::{Spring, SpringConfig};
pub use stagger::{ItemState, RevealTrigger, StaggerConfig, StaggerDirection, StaggeredGroupReveal};
pub use trigger::{EnterEvent, TriggerState, ViewportTrigger};
